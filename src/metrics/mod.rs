//! Impulse-response acoustic metrics: C80, D50, RT60.

mod acoustic;

pub use acoustic::{compute, AcousticMetrics};
