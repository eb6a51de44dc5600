//! npy payload parser
//!
//! Decodes a raw byte buffer (magic, version, header dictionary, packed
//! little-endian element data) into an [`NdArray`].

mod buffer;
mod header;

pub use buffer::decode_elements;
pub use header::parse_header;

use crate::error::DecodeError;
use crate::types::NdArray;

/// Parsing options
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Widen float16 element data to float32 (on by default)
    pub convert_f16: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { convert_f16: true }
    }
}

/// Parse an npy payload with default options
pub fn parse(bytes: &[u8]) -> Result<NdArray, DecodeError> {
    parse_with(bytes, &ParseOptions::default())
}

/// Parse an npy payload
pub fn parse_with(bytes: &[u8], opts: &ParseOptions) -> Result<NdArray, DecodeError> {
    let header = parse_header(bytes)?;
    let data = decode_elements(bytes, header.data_offset, header.dtype, header.num_elements())?;
    let data = if opts.convert_f16 {
        data.widen_f16()
    } else {
        data
    };
    NdArray::new(data, header.shape)
}
