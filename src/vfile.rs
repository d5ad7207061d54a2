//! The virtual-file boundary served by the host's HTTP layer, and the
//! sample-file directory backing it.

use std::fs::File;
use std::io::{self, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::Result;

/// A file-like object whose bytes are synthesized on demand. Implementors
/// must produce deterministic content: the same range always yields the
/// same bytes, so `etag` identifies one exact byte stream and range
/// requests can resume across connections.
pub trait VirtualFile: Send + Sync {
    /// Total size in bytes (the response `Content-Length`).
    fn size(&self) -> u64;

    /// Modification time in seconds since the Unix epoch.
    fn last_modified(&self) -> i64;

    /// Strong entity tag, already quoted for the `ETag` header.
    fn etag(&self) -> &str;

    fn mime_type(&self) -> &'static str;

    /// Write the bytes of `range` to `out`. Requires
    /// `range.start <= range.end <= size()`. On error, bytes already
    /// written to `out` remain there.
    fn add_range(&self, range: Range<u64>, out: &mut dyn Write) -> Result<()>;
}

/// A directory of sample files, one per recording, named by UUID.
///
/// Shared immutably (via `Arc`) by every virtual file that references it;
/// reads open their own handle so concurrent range requests never contend.
#[derive(Debug)]
pub struct SampleFileDir {
    path: PathBuf,
}

impl SampleFileDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the sample file for the given recording.
    pub fn open_sample_file(&self, uuid: Uuid) -> io::Result<File> {
        File::open(self.path.join(uuid.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_sample_file_by_uuid() {
        let dir = tempfile::tempdir().unwrap();
        let uuid = Uuid::new_v4();
        std::fs::write(dir.path().join(uuid.to_string()), b"frames").unwrap();

        let d = SampleFileDir::new(dir.path());
        let mut buf = Vec::new();
        use std::io::Read;
        d.open_sample_file(uuid).unwrap().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"frames");
        assert!(d.open_sample_file(Uuid::new_v4()).is_err());
    }
}
