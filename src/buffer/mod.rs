//! Fixed-capacity circular buffers for the two synchronous sample streams.

mod ring_buffer;

pub use ring_buffer::{ReadError, RingBuffer};
