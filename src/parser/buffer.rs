//! Element buffer decoding
//!
//! Interprets a raw byte range as a packed sequence of fixed-width
//! little-endian elements per dtype.

use crate::error::DecodeError;
use crate::types::{DType, Data};
use half::f16;

/// Decode `count` elements of `dtype` from `bytes[offset..]`.
///
/// No partial reads: if the buffer is shorter than
/// `offset + count * element_size`, fails with `TruncatedBuffer`.
pub fn decode_elements(
    bytes: &[u8],
    offset: usize,
    dtype: DType,
    count: usize,
) -> Result<Data, DecodeError> {
    let width = dtype.element_size();
    let needed = offset + count * width;
    if bytes.len() < needed {
        return Err(DecodeError::TruncatedBuffer {
            needed,
            available: bytes.len(),
        });
    }
    let raw = &bytes[offset..needed];

    let data = match dtype {
        DType::U8 => Data::U8(raw.to_vec()),
        DType::I8 => Data::I8(raw.iter().map(|&b| b as i8).collect()),
        DType::U16 => Data::U16(
            raw.chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect(),
        ),
        DType::I16 => Data::I16(
            raw.chunks_exact(2)
                .map(|c| i16::from_le_bytes([c[0], c[1]]))
                .collect(),
        ),
        DType::U32 => Data::U32(
            raw.chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        DType::I32 => Data::I32(
            raw.chunks_exact(4)
                .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        DType::U64 => Data::U64(
            raw.chunks_exact(8)
                .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect(),
        ),
        DType::I64 => Data::I64(
            raw.chunks_exact(8)
                .map(|c| i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect(),
        ),
        DType::F16 => Data::F16(
            raw.chunks_exact(2)
                .map(|c| f16::from_bits(u16::from_le_bytes([c[0], c[1]])))
                .collect(),
        ),
        DType::F32 => Data::F32(
            raw.chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        DType::F64 => Data::F64(
            raw.chunks_exact(8)
                .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect(),
        ),
    };
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_f32_sequence() {
        let bytes: Vec<u8> = [1.0f32, 2.0, 3.0]
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect();
        let data = decode_elements(&bytes, 0, DType::F32, 3).unwrap();
        assert_eq!(data.as_f32().unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn decodes_at_offset() {
        let mut bytes = vec![0xFF, 0xFF];
        bytes.extend_from_slice(&7u32.to_le_bytes());
        let data = decode_elements(&bytes, 2, DType::U32, 1).unwrap();
        assert_eq!(data.as_u32().unwrap(), &[7]);
    }

    #[test]
    fn decodes_signed_bytes() {
        let data = decode_elements(&[0xFF, 0x00, 0x7F], 0, DType::I8, 3).unwrap();
        assert_eq!(data.as_i8().unwrap(), &[-1, 0, 127]);
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let bytes = vec![0u8; 10];
        assert_eq!(
            decode_elements(&bytes, 0, DType::F64, 2).unwrap_err(),
            DecodeError::TruncatedBuffer {
                needed: 16,
                available: 10
            }
        );
    }

    #[test]
    fn no_partial_read_at_offset() {
        let bytes = vec![0u8; 9];
        assert_eq!(
            decode_elements(&bytes, 2, DType::F64, 1).unwrap_err(),
            DecodeError::TruncatedBuffer {
                needed: 10,
                available: 9
            }
        );
    }

    // float16 piecewise decode: sign bit 15, exponent bits 10-14,
    // fraction bits 0-9.

    #[test]
    fn f16_normal_values() {
        let words: Vec<u8> = [0x3C00u16, 0xC000, 0x3555]
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .collect();
        let data = decode_elements(&words, 0, DType::F16, 3)
            .unwrap()
            .widen_f16();
        let vals = data.as_f32().unwrap();
        assert_eq!(vals[0], 1.0); // exp 15, fraction 0
        assert_eq!(vals[1], -2.0); // sign set, exp 16
        assert!((vals[2] - 0.333_25).abs() < 1e-5); // 2^-2 * (1 + 341/1024)
    }

    #[test]
    fn f16_signed_zero_and_subnormals() {
        let words: Vec<u8> = [0x0000u16, 0x8000, 0x0001, 0x03FF]
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .collect();
        let data = decode_elements(&words, 0, DType::F16, 4)
            .unwrap()
            .widen_f16();
        let vals = data.as_f32().unwrap();
        assert_eq!(vals[0], 0.0);
        assert!(vals[0].is_sign_positive());
        assert_eq!(vals[1], 0.0);
        assert!(vals[1].is_sign_negative());
        // subnormal: 2^-14 * (fraction / 1024)
        assert_eq!(vals[2], 2.0f32.powi(-14) / 1024.0);
        assert_eq!(vals[3], 2.0f32.powi(-14) * 1023.0 / 1024.0);
    }

    #[test]
    fn f16_infinities_and_nan() {
        let words: Vec<u8> = [0x7C00u16, 0xFC00, 0x7C01, 0x7FFF]
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .collect();
        let data = decode_elements(&words, 0, DType::F16, 4)
            .unwrap()
            .widen_f16();
        let vals = data.as_f32().unwrap();
        assert_eq!(vals[0], f32::INFINITY);
        assert_eq!(vals[1], f32::NEG_INFINITY);
        assert!(vals[2].is_nan());
        assert!(vals[3].is_nan());
    }

    #[test]
    fn f16_roundtrip_representable_f32() {
        for v in [0.5f32, 1.0, -1.5, 65504.0, -0.125] {
            let word = f16::from_f32(v).to_bits();
            let data = decode_elements(&word.to_le_bytes(), 0, DType::F16, 1)
                .unwrap()
                .widen_f16();
            assert_eq!(data.as_f32().unwrap()[0], v);
        }
    }
}
