//! vod-media: virtual `.mp4` file construction for serving spliced
//! recordings over HTTP.
//!
//! Given recordings stored as raw sample files plus compact sample indexes,
//! this crate splices time windows of them into a single standards-compliant
//! ISO/IEC 14496-12 `.mp4` without ever materializing it. The resulting
//! [`Mp4File`] knows its exact size, a strong etag, and a modification time
//! up front, and serves arbitrary byte ranges by synthesizing only the
//! requested bytes: box metadata from RAM, sample tables from the index,
//! sample data straight from the files on disk.
//!
//! # Modules
//!
//! - [`mp4`] - box serialization, sample-table projection, file assembly
//! - [`sample_index`] - compact per-recording sample index codec
//! - [`slices`] - ordered virtual byte slices with random range reads
//! - [`vfile`] - the virtual-file trait served by the HTTP layer, and the
//!   sample-file directory
//! - [`error`] - crate error type

pub mod error;
pub mod mp4;
pub mod sample_index;
pub mod slices;
pub mod vfile;

pub use error::{Error, Result};
pub use mp4::{Mp4File, Mp4FileBuilder, Recording, VideoSampleEntry};
pub use sample_index::{SampleIndexEncoder, SampleIndexIterator};
pub use vfile::{SampleFileDir, VirtualFile};

/// 90 kHz ticks per second, the MPEG video timescale used for all
/// durations and timestamps in this crate.
pub const TIME_UNITS_PER_SEC: i64 = 90_000;
