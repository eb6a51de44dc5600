//! Element dtypes for typed arrays

use crate::error::DecodeError;

/// Element type of a typed array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F16,
    F32,
    F64,
}

/// One registry entry per supported element kind.
struct DTypeInfo {
    dtype: DType,
    /// Human-readable name (numpy naming)
    name: &'static str,
    /// Accepted descriptor codes; the first is canonical
    codes: &'static [&'static str],
    size: usize,
}

/// Canonical dtype table. Both lookup directions scan this single list,
/// so code and name mappings cannot diverge. Adding a dtype means adding
/// exactly one entry here (plus its enum variant).
const DTYPES: &[DTypeInfo] = &[
    DTypeInfo {
        dtype: DType::U8,
        name: "uint8",
        codes: &["|u1", "<u1"],
        size: 1,
    },
    DTypeInfo {
        dtype: DType::I8,
        name: "int8",
        codes: &["|i1", "<i1"],
        size: 1,
    },
    DTypeInfo {
        dtype: DType::U16,
        name: "uint16",
        codes: &["<u2"],
        size: 2,
    },
    DTypeInfo {
        dtype: DType::I16,
        name: "int16",
        codes: &["<i2"],
        size: 2,
    },
    DTypeInfo {
        dtype: DType::U32,
        name: "uint32",
        codes: &["<u4"],
        size: 4,
    },
    DTypeInfo {
        dtype: DType::I32,
        name: "int32",
        codes: &["<i4"],
        size: 4,
    },
    DTypeInfo {
        dtype: DType::U64,
        name: "uint64",
        codes: &["<u8"],
        size: 8,
    },
    DTypeInfo {
        dtype: DType::I64,
        name: "int64",
        codes: &["<i8"],
        size: 8,
    },
    DTypeInfo {
        dtype: DType::F16,
        name: "float16",
        codes: &["<f2"],
        size: 2,
    },
    DTypeInfo {
        dtype: DType::F32,
        name: "float32",
        codes: &["<f4"],
        size: 4,
    },
    DTypeInfo {
        dtype: DType::F64,
        name: "float64",
        codes: &["<f8"],
        size: 8,
    },
];

impl DType {
    /// Size in bytes of a single element
    pub fn element_size(self) -> usize {
        self.info().size
    }

    /// Human-readable name, e.g. `"float32"`
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Canonical descriptor code, e.g. `"<f4"`
    pub fn descr(self) -> &'static str {
        self.info().codes[0]
    }

    /// Look up by descriptor code (`"<f4"`, `"|u1"`, ...).
    ///
    /// A known code with big-endian or native byte order is rejected with
    /// `UnsupportedByteOrder`; anything else unknown with `UnsupportedDtype`.
    pub fn from_descr(descr: &str) -> Result<Self, DecodeError> {
        for info in DTYPES {
            if info.codes.contains(&descr) {
                return Ok(info.dtype);
            }
        }
        if let Some(tail) = descr.strip_prefix('>').or_else(|| descr.strip_prefix('=')) {
            let little = format!("<{tail}");
            if DTYPES.iter().any(|i| i.codes.contains(&little.as_str())) {
                return Err(DecodeError::UnsupportedByteOrder(descr.to_string()));
            }
        }
        Err(DecodeError::UnsupportedDtype(descr.to_string()))
    }

    /// Look up by human-readable name (`"float32"`, `"uint8"`, ...)
    pub fn from_name(name: &str) -> Result<Self, DecodeError> {
        DTYPES
            .iter()
            .find(|info| info.name == name)
            .map(|info| info.dtype)
            .ok_or_else(|| DecodeError::UnsupportedDtype(name.to_string()))
    }

    fn info(self) -> &'static DTypeInfo {
        // The table carries every variant; the scan cannot miss.
        DTYPES
            .iter()
            .find(|info| info.dtype == self)
            .unwrap_or(&DTYPES[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_and_name_lookups_agree() {
        for info in DTYPES {
            for code in info.codes {
                let by_code = DType::from_descr(code).unwrap();
                let by_name = DType::from_name(info.name).unwrap();
                assert_eq!(by_code, by_name);
                assert_eq!(by_code.name(), info.name);
            }
        }
    }

    #[test]
    fn canonical_descr_roundtrip() {
        for info in DTYPES {
            let dtype = info.dtype;
            assert_eq!(DType::from_descr(dtype.descr()).unwrap(), dtype);
        }
    }

    #[test]
    fn element_sizes() {
        assert_eq!(DType::U8.element_size(), 1);
        assert_eq!(DType::F16.element_size(), 2);
        assert_eq!(DType::F32.element_size(), 4);
        assert_eq!(DType::I64.element_size(), 8);
    }

    #[test]
    fn big_endian_rejected() {
        assert_eq!(
            DType::from_descr(">f4"),
            Err(DecodeError::UnsupportedByteOrder(">f4".to_string()))
        );
        assert_eq!(
            DType::from_descr(">i8"),
            Err(DecodeError::UnsupportedByteOrder(">i8".to_string()))
        );
    }

    #[test]
    fn unknown_descr_rejected() {
        assert!(matches!(
            DType::from_descr("<c16"),
            Err(DecodeError::UnsupportedDtype(_))
        ));
        assert!(matches!(
            DType::from_name("complex64"),
            Err(DecodeError::UnsupportedDtype(_))
        ));
    }
}
