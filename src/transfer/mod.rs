//! Transfer-function extraction: magnitude, unwrapped/delay-compensated
//! phase, coherence, and group delay from a spectral accumulator.

mod function;

pub use function::{extract, extract_mtw, TransferFunctionResult};
