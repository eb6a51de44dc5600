//! Transport capability for reference resolution

use std::io;
use std::path::PathBuf;

/// Byte-fetch capability injected into the loader.
///
/// Paths are container-relative (e.g. `"big_array.npy"`); how they map to a
/// filesystem, HTTP origin, or anything else is the implementor's business.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// Filesystem-backed fetcher rooted at a directory
#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirFetcher { root: root.into() }
    }
}

impl Fetcher for DirFetcher {
    fn fetch(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(path.trim_start_matches('/')))
    }
}
