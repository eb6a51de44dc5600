//! Inline array decoding
//!
//! Arrays small enough to live directly inside a JSON document are tagged
//! with a reserved metadata key whose value has the shape
//! `<namespace>:<variant>` (e.g. `"numpy.ndarray:array_b64_meta"`). This
//! module turns such objects — and bare nested lists — into [`NdArray`]s
//! without any binary attachment.

use crate::error::DecodeError;
use crate::parser::{ParseOptions, decode_elements};
use crate::types::{DType, Data, Element, NdArray};
use serde_json::Value;

/// Reserved metadata key marking an inline array
pub const FORMAT_KEY: &str = "__muutils_format__";

/// Inline array encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineFormat {
    /// Bare nested JSON array, no metadata
    List,
    /// Zero-rank scalar with explicit dtype
    ZeroDim,
    /// Nested list plus explicit shape/dtype
    ListMeta,
    /// Hex digit string plus explicit shape/dtype
    HexMeta,
    /// Base64 string plus explicit shape/dtype
    B64Meta,
}

/// Read the inline format of a JSON value, if it has one.
///
/// A bare array literal is `List`; an object carrying [`FORMAT_KEY`] is
/// decoded from the tag's `<variant>` suffix (`UnknownArrayFormat` when the
/// variant is not recognized); anything else is not an array and yields
/// `None` rather than an error.
pub fn infer_format(value: &Value) -> Result<Option<InlineFormat>, DecodeError> {
    if value.is_array() {
        return Ok(Some(InlineFormat::List));
    }
    let Some(obj) = value.as_object() else {
        return Ok(None);
    };
    let Some(tag) = obj.get(FORMAT_KEY) else {
        return Ok(None);
    };
    let tag = tag.as_str().unwrap_or_default();
    let variant = tag.rsplit(':').next().unwrap_or_default();
    match variant {
        "zero_dim" => Ok(Some(InlineFormat::ZeroDim)),
        "array_list_meta" => Ok(Some(InlineFormat::ListMeta)),
        "array_hex_meta" => Ok(Some(InlineFormat::HexMeta)),
        "array_b64_meta" => Ok(Some(InlineFormat::B64Meta)),
        _ => Err(DecodeError::UnknownArrayFormat(tag.to_string())),
    }
}

/// Decode an inline array with default options.
///
/// Returns `Ok(None)` when the value carries no array format at all.
pub fn decode(value: &Value) -> Result<Option<NdArray>, DecodeError> {
    decode_with(value, &ParseOptions::default())
}

/// Decode an inline array, inferring the format
pub fn decode_with(value: &Value, opts: &ParseOptions) -> Result<Option<NdArray>, DecodeError> {
    match infer_format(value)? {
        None => Ok(None),
        Some(format) => decode_as(value, format, opts).map(Some),
    }
}

/// Decode an inline array with an explicit format
pub fn decode_as(
    value: &Value,
    format: InlineFormat,
    opts: &ParseOptions,
) -> Result<NdArray, DecodeError> {
    match format {
        InlineFormat::List => decode_list(value),
        InlineFormat::ZeroDim => decode_zero_dim(value, opts),
        InlineFormat::ListMeta => decode_list_meta(value, opts),
        InlineFormat::HexMeta => decode_bytes_meta(value, opts, |s| {
            hex::decode(s).map_err(|e| DecodeError::InvalidEncoding {
                encoding: "hex",
                reason: e.to_string(),
            })
        }),
        InlineFormat::B64Meta => decode_bytes_meta(value, opts, base64_decode),
    }
}

/// Bare nested list: the full nested shape is inferred from the nesting
/// structure and every level is checked for regularity. Elements decode
/// as float64.
fn decode_list(value: &Value) -> Result<NdArray, DecodeError> {
    let shape = infer_list_shape(value);
    let mut data = Data::with_capacity(DType::F64, shape.iter().product());
    check_and_flatten(value, &shape, 0, &mut data)?;
    NdArray::new(data, shape)
}

fn decode_zero_dim(value: &Value, opts: &ParseOptions) -> Result<NdArray, DecodeError> {
    let dtype = dtype_field(value)?;
    let shape = shape_field(value)?;
    let data_value = value
        .get("data")
        .ok_or(DecodeError::MissingShapeOrDtype("data"))?;
    let mut data = Data::with_capacity(dtype, 1);
    data.push(&leaf_element(data_value));
    let data = widen(data, opts);
    NdArray::new(data, shape)
}

fn decode_list_meta(value: &Value, opts: &ParseOptions) -> Result<NdArray, DecodeError> {
    let dtype = dtype_field(value)?;
    let shape = shape_field(value)?;
    let data_value = value
        .get("data")
        .ok_or(DecodeError::MissingShapeOrDtype("data"))?;
    let expected: usize = shape.iter().product();
    let mut data = Data::with_capacity(dtype, expected);
    flatten_into(data_value, &mut data);
    if data.len() != expected {
        return Err(DecodeError::DataSizeMismatch {
            expected,
            actual: data.len(),
        });
    }
    let data = widen(data, opts);
    NdArray::new(data, shape)
}

/// Shared path for hex and base64: decode the data string to raw bytes,
/// then reinterpret per the declared descriptor.
fn decode_bytes_meta(
    value: &Value,
    opts: &ParseOptions,
    to_bytes: impl Fn(&str) -> Result<Vec<u8>, DecodeError>,
) -> Result<NdArray, DecodeError> {
    let dtype = dtype_field(value)?;
    let shape = shape_field(value)?;
    let text = value
        .get("data")
        .and_then(|v| v.as_str())
        .ok_or(DecodeError::MissingShapeOrDtype("data"))?;
    let bytes = to_bytes(text)?;
    let count: usize = shape.iter().product();
    let data = decode_elements(&bytes, 0, dtype, count)?;
    let data = widen(data, opts);
    NdArray::new(data, shape)
}

fn widen(data: Data, opts: &ParseOptions) -> Data {
    if opts.convert_f16 {
        data.widen_f16()
    } else {
        data
    }
}

fn dtype_field(value: &Value) -> Result<DType, DecodeError> {
    let name = value
        .get("dtype")
        .and_then(|v| v.as_str())
        .ok_or(DecodeError::MissingShapeOrDtype("dtype"))?;
    DType::from_name(name)
}

fn shape_field(value: &Value) -> Result<Vec<usize>, DecodeError> {
    value
        .get("shape")
        .and_then(|v| v.as_array())
        .ok_or(DecodeError::MissingShapeOrDtype("shape"))?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize))
        .collect::<Option<Vec<usize>>>()
        .ok_or(DecodeError::MissingShapeOrDtype("shape"))
}

/// Shape implied by the nesting structure, following first children
fn infer_list_shape(value: &Value) -> Vec<usize> {
    let mut shape = Vec::new();
    let mut cursor = value;
    while let Some(items) = cursor.as_array() {
        shape.push(items.len());
        match items.first() {
            Some(first) => cursor = first,
            None => break,
        }
    }
    shape
}

/// Verify each nesting level against the inferred shape while flattening
fn check_and_flatten(
    value: &Value,
    shape: &[usize],
    depth: usize,
    data: &mut Data,
) -> Result<(), DecodeError> {
    match value.as_array() {
        Some(items) => {
            let expected = shape.get(depth).copied().unwrap_or(0);
            if items.len() != expected {
                return Err(DecodeError::DataSizeMismatch {
                    expected,
                    actual: items.len(),
                });
            }
            for item in items {
                check_and_flatten(item, shape, depth + 1, data)?;
            }
            Ok(())
        }
        None if depth == shape.len() => {
            data.push(&leaf_element(value));
            Ok(())
        }
        None => Err(DecodeError::DataSizeMismatch {
            expected: shape.get(depth).copied().unwrap_or(0),
            actual: 0,
        }),
    }
}

fn flatten_into(value: &Value, data: &mut Data) {
    match value.as_array() {
        Some(items) => {
            for item in items {
                flatten_into(item, data);
            }
        }
        None => data.push(&leaf_element(value)),
    }
}

/// JSON leaf as an element. 64-bit integers go through the full-precision
/// integer accessors; everything else coerces through f64 (non-numbers
/// become NaN, as in JS number coercion).
fn leaf_element(value: &Value) -> Element {
    if let Some(i) = value.as_i64() {
        Element::I64(i)
    } else if let Some(u) = value.as_u64() {
        Element::U64(u)
    } else {
        Element::F64(value.as_f64().unwrap_or(f64::NAN))
    }
}

// ── base64 (standard alphabet, no external dep) ──────────────────────────

const B64_CHARS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn base64_decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    fn val(c: u8) -> Result<u32, DecodeError> {
        match c {
            b'A'..=b'Z' => Ok((c - b'A') as u32),
            b'a'..=b'z' => Ok((c - b'a' + 26) as u32),
            b'0'..=b'9' => Ok((c - b'0' + 52) as u32),
            b'+' => Ok(62),
            b'/' => Ok(63),
            _ => Err(DecodeError::InvalidEncoding {
                encoding: "base64",
                reason: format!("invalid character: {}", c as char),
            }),
        }
    }

    let bytes: Vec<u8> = input
        .bytes()
        .filter(|&b| b != b'\n' && b != b'\r')
        .collect();
    let mut result = Vec::with_capacity(bytes.len() * 3 / 4);

    for chunk in bytes.chunks(4) {
        if chunk.len() < 2 {
            break;
        }
        let a = val(chunk[0])?;
        let b = val(chunk[1])?;
        result.push(((a << 2) | (b >> 4)) as u8);

        if chunk.len() > 2 && chunk[2] != b'=' {
            let c = val(chunk[2])?;
            result.push((((b & 0xF) << 4) | (c >> 2)) as u8);

            if chunk.len() > 3 && chunk[3] != b'=' {
                let d = val(chunk[3])?;
                result.push((((c & 0x3) << 6) | d) as u8);
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn infers_all_tagged_formats() {
        let tag = |s: &str| json!({ FORMAT_KEY: s, "data": 0 });
        assert_eq!(
            infer_format(&tag("numpy.ndarray:array_list_meta")).unwrap(),
            Some(InlineFormat::ListMeta)
        );
        assert_eq!(
            infer_format(&tag("torch.Tensor:array_b64_meta")).unwrap(),
            Some(InlineFormat::B64Meta)
        );
        assert_eq!(
            infer_format(&tag("numpy.ndarray:array_hex_meta")).unwrap(),
            Some(InlineFormat::HexMeta)
        );
        assert_eq!(
            infer_format(&tag("numpy.ndarray:zero_dim")).unwrap(),
            Some(InlineFormat::ZeroDim)
        );
    }

    #[test]
    fn infers_list_for_bare_arrays() {
        assert_eq!(
            infer_format(&json!([1, 2, 3])).unwrap(),
            Some(InlineFormat::List)
        );
    }

    #[test]
    fn plain_objects_are_not_arrays() {
        assert_eq!(infer_format(&json!({})).unwrap(), None);
        assert_eq!(infer_format(&json!({ "foo": "bar" })).unwrap(), None);
        assert_eq!(infer_format(&json!("hello")).unwrap(), None);
    }

    #[test]
    fn unknown_variant_is_an_error() {
        let v = json!({ FORMAT_KEY: "numpy.ndarray:array_tensor_meta" });
        assert_eq!(
            infer_format(&v).unwrap_err(),
            DecodeError::UnknownArrayFormat("numpy.ndarray:array_tensor_meta".to_string())
        );
    }

    #[test]
    fn decodes_list_meta() {
        let v = json!({
            FORMAT_KEY: "numpy.ndarray:array_list_meta",
            "shape": [2, 3],
            "dtype": "float32",
            "data": [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            "n_elements": 6
        });
        let arr = decode(&v).unwrap().unwrap();
        assert_eq!(arr.shape(), &[2, 3]);
        assert_eq!(arr.dtype(), DType::F32);
        assert_eq!(arr.to_f64_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn decodes_b64_meta() {
        let v = json!({
            FORMAT_KEY: "numpy.ndarray:array_b64_meta",
            "shape": [3],
            "dtype": "float32",
            "data": "AACAPwAAAEAAAEBA",
            "n_elements": 3
        });
        let arr = decode(&v).unwrap().unwrap();
        assert_eq!(arr.shape(), &[3]);
        assert_eq!(arr.to_f64_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn decodes_hex_meta() {
        let v = json!({
            FORMAT_KEY: "numpy.ndarray:array_hex_meta",
            "shape": [3],
            "dtype": "uint8",
            "data": "010203",
            "n_elements": 3
        });
        let arr = decode(&v).unwrap().unwrap();
        assert_eq!(arr.dtype(), DType::U8);
        assert_eq!(arr.data().as_u8().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn decodes_zero_dim() {
        let v = json!({
            FORMAT_KEY: "numpy.ndarray:zero_dim",
            "shape": [],
            "dtype": "float32",
            "data": 42.0,
            "n_elements": 1
        });
        let arr = decode(&v).unwrap().unwrap();
        assert_eq!(arr.ndim(), 0);
        assert_eq!(arr.dtype(), DType::F32);
        assert_eq!(arr.to_f64_vec(), vec![42.0]);
    }

    #[test]
    fn int64_values_keep_full_precision() {
        let v = json!({
            FORMAT_KEY: "numpy.ndarray:array_list_meta",
            "shape": [2],
            "dtype": "int64",
            "data": [9_007_199_254_740_993i64, -9_007_199_254_740_993i64],
        });
        let arr = decode(&v).unwrap().unwrap();
        assert_eq!(
            arr.data().as_i64().unwrap(),
            &[9_007_199_254_740_993, -9_007_199_254_740_993]
        );
    }

    #[test]
    fn uint64_max_roundtrips() {
        let v = json!({
            FORMAT_KEY: "numpy.ndarray:zero_dim",
            "shape": [],
            "dtype": "uint64",
            "data": u64::MAX,
        });
        let arr = decode(&v).unwrap().unwrap();
        assert_eq!(arr.data().as_u64().unwrap(), &[u64::MAX]);
    }

    #[test]
    fn bare_list_infers_nested_shape() {
        let arr = decode(&json!([[1, 2], [3, 4], [5, 6]])).unwrap().unwrap();
        assert_eq!(arr.shape(), &[3, 2]);
        assert_eq!(arr.dtype(), DType::F64);
        assert_eq!(arr.to_f64_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn bare_flat_list() {
        let arr = decode(&json!([1.5, 2.5])).unwrap().unwrap();
        assert_eq!(arr.shape(), &[2]);
        assert_eq!(arr.to_f64_vec(), vec![1.5, 2.5]);
    }

    #[test]
    fn ragged_list_is_rejected() {
        let err = decode(&json!([[1, 2], [3]])).unwrap_err();
        assert_eq!(
            err,
            DecodeError::DataSizeMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn missing_shape_or_dtype() {
        let v = json!({
            FORMAT_KEY: "numpy.ndarray:array_b64_meta",
            "data": "AQI="
        });
        assert_eq!(
            decode(&v).unwrap_err(),
            DecodeError::MissingShapeOrDtype("dtype")
        );
    }

    #[test]
    fn hex_and_b64_match_raw_buffer_decode() {
        let raw: Vec<u8> = [1.0f32, 2.0, 3.0]
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect();
        let direct = decode_elements(&raw, 0, DType::F32, 3).unwrap();

        let hex_v = json!({
            FORMAT_KEY: "numpy.ndarray:array_hex_meta",
            "shape": [3],
            "dtype": "float32",
            "data": hex::encode(&raw),
        });
        let b64 = decode(&json!({
            FORMAT_KEY: "numpy.ndarray:array_b64_meta",
            "shape": [3],
            "dtype": "float32",
            "data": "AACAPwAAAEAAAEBA",
        }))
        .unwrap()
        .unwrap();
        let hexed = decode(&hex_v).unwrap().unwrap();
        assert_eq!(hexed.data(), &direct);
        assert_eq!(b64.data(), &direct);
    }

    #[test]
    fn f16_meta_widens() {
        let words: Vec<u8> = [half::f16::from_f32(0.5), half::f16::from_f32(2.0)]
            .iter()
            .flat_map(|w| w.to_bits().to_le_bytes())
            .collect();
        let v = json!({
            FORMAT_KEY: "numpy.ndarray:array_hex_meta",
            "shape": [2],
            "dtype": "float16",
            "data": hex::encode(&words),
        });
        let arr = decode(&v).unwrap().unwrap();
        assert_eq!(arr.dtype(), DType::F32);
        assert_eq!(arr.to_f64_vec(), vec![0.5, 2.0]);
    }

    #[test]
    fn base64_decode_known_values() {
        assert_eq!(base64_decode("AQI=").unwrap(), vec![1, 2]);
        assert_eq!(base64_decode("").unwrap(), Vec::<u8>::new());
        assert!(base64_decode("a!b").is_err());
    }
}
