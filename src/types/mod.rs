//! Core types for array payloads

mod array;
mod dtype;
mod header;

pub use array::{Data, Element, Fill, Index, NdArray, Sliced};
pub use dtype::DType;
pub use header::{ArrayHeader, HEADER_LEN_OFFSET, MAGIC, PREAMBLE_SIZE, VERSION};
