//! npy header parsing
//!
//! The header is a Python-dict literal, not JSON. A tolerant normalization
//! pass rewrites it (single quotes, `True`/`False`, tuple parens, trailing
//! commas) so `serde_json` can take it from there.

use crate::error::DecodeError;
use crate::types::{ArrayHeader, DType, HEADER_LEN_OFFSET, MAGIC, PREAMBLE_SIZE, VERSION};

/// Parse the fixed preamble plus header dictionary.
///
/// Returns the decoded header; `data_offset` is the byte offset where
/// element data begins (`10 + header length`).
pub fn parse_header(bytes: &[u8]) -> Result<ArrayHeader, DecodeError> {
    if bytes.len() < PREAMBLE_SIZE {
        return Err(DecodeError::TruncatedBuffer {
            needed: PREAMBLE_SIZE,
            available: bytes.len(),
        });
    }
    if &bytes[..6] != MAGIC {
        return Err(DecodeError::InvalidMagic);
    }
    let (major, minor) = (bytes[6], bytes[7]);
    if major != VERSION {
        // Version 2+ headers switch to a u32 length field.
        return Err(DecodeError::UnsupportedVersion { major, minor });
    }
    let header_len =
        u16::from_le_bytes([bytes[HEADER_LEN_OFFSET], bytes[HEADER_LEN_OFFSET + 1]]) as usize;
    let end = PREAMBLE_SIZE + header_len;
    if bytes.len() < end {
        return Err(DecodeError::TruncatedBuffer {
            needed: end,
            available: bytes.len(),
        });
    }
    let text = std::str::from_utf8(&bytes[PREAMBLE_SIZE..end])
        .map_err(|_| DecodeError::MalformedHeader("header is not valid UTF-8".to_string()))?;

    let dict: serde_json::Value = serde_json::from_str(&normalize(text))
        .map_err(|e| DecodeError::MalformedHeader(e.to_string()))?;

    let descr = dict
        .get("descr")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DecodeError::MalformedHeader("missing descr".to_string()))?;
    let dtype = DType::from_descr(descr)?;

    let fortran_order = dict
        .get("fortran_order")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| DecodeError::MalformedHeader("missing fortran_order".to_string()))?;

    let shape = dict
        .get("shape")
        .and_then(|v| v.as_array())
        .ok_or_else(|| DecodeError::MalformedHeader("missing shape".to_string()))?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize))
        .collect::<Option<Vec<usize>>>()
        .ok_or_else(|| DecodeError::MalformedHeader("non-integer shape entry".to_string()))?;

    Ok(ArrayHeader {
        shape,
        dtype,
        fortran_order,
        data_offset: end,
    })
}

/// Rewrite a Python-dict literal into JSON.
fn normalize(text: &str) -> String {
    let src = text.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(src.len());
    let mut in_str = false;
    let mut i = 0;
    while i < src.len() {
        let b = src[i];
        if in_str {
            if b == b'\'' || b == b'"' {
                out.push(b'"');
                in_str = false;
            } else {
                out.push(b);
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' => {
                out.push(b'"');
                in_str = true;
                i += 1;
            }
            b'(' => {
                out.push(b'[');
                i += 1;
            }
            b')' | b']' | b'}' => {
                strip_trailing_comma(&mut out);
                out.push(if b == b')' { b']' } else { b });
                i += 1;
            }
            b'T' if src[i..].starts_with(b"True") => {
                out.extend_from_slice(b"true");
                i += 4;
            }
            b'F' if src[i..].starts_with(b"False") => {
                out.extend_from_slice(b"false");
                i += 5;
            }
            b'N' if src[i..].starts_with(b"None") => {
                out.extend_from_slice(b"null");
                i += 4;
            }
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }
    // Only ASCII bytes were rewritten, so the output stays valid UTF-8.
    String::from_utf8_lossy(&out).into_owned()
}

fn strip_trailing_comma(out: &mut Vec<u8>) {
    while matches!(out.last(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
        out.pop();
    }
    if out.last() == Some(&b',') {
        out.pop();
    }
}
