//! Multi-entry archive reading (npz)
//!
//! Decompression is the injected collaborator's job: callers hand over an
//! iterator of already-decompressed `(name, bytes)` entries (for npz, the
//! entries of the ZIP container) and get back named arrays.

use crate::error::DecodeError;
use crate::parser::{ParseOptions, parse_with};
use crate::types::NdArray;

/// File extension identifying an npy entry inside an archive
pub const NPY_SUFFIX: &str = ".npy";

/// Decode every npy entry of an archive with default options
pub fn read_entries<I>(entries: I) -> Result<Vec<(String, NdArray)>, DecodeError>
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    read_entries_with(entries, &ParseOptions::default())
}

/// Decode every npy entry of an archive.
///
/// Directory entries and entries without the `.npy` suffix are skipped; the
/// suffix is stripped to form the array's logical name. Output order follows
/// archive enumeration order.
pub fn read_entries_with<I>(
    entries: I,
    opts: &ParseOptions,
) -> Result<Vec<(String, NdArray)>, DecodeError>
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    let mut arrays = Vec::new();
    for (name, bytes) in entries {
        if name.ends_with('/') {
            continue;
        }
        let Some(stem) = name.strip_suffix(NPY_SUFFIX) else {
            continue;
        };
        let array = parse_with(&bytes, opts)?;
        arrays.push((stem.to_string(), array));
    }
    Ok(arrays)
}
