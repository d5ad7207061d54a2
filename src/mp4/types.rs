//! Input model for virtual `.mp4` construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::TIME_UNITS_PER_SEC;

/// One finished recording, as stored by the host: a sample file on disk
/// plus the compact sample index and aggregate counters describing it.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Recording {
    /// Name of the sample file within the sample file directory.
    pub sample_file_uuid: Uuid,
    /// SHA-1 of the complete sample file, taken when it was written.
    pub sample_file_sha1: [u8; 20],
    /// Total byte size of the sample file.
    pub sample_file_bytes: i32,
    /// Frame count.
    pub video_samples: i32,
    /// Key-frame count.
    pub video_sync_samples: i32,
    /// Wall-clock start, in 90 kHz ticks since the Unix epoch.
    pub start_time_90k: i64,
    /// Wall-clock end, in 90 kHz ticks since the Unix epoch.
    pub end_time_90k: i64,
    /// Which video sample entry the frames were encoded against.
    pub video_sample_entry_id: i32,
    /// Encoded sample index (see [`crate::sample_index`]).
    pub video_index: Vec<u8>,
}

impl Recording {
    /// Recording length in 90 kHz ticks.
    pub fn duration_90k(&self) -> i32 {
        (self.end_time_90k - self.start_time_90k) as i32
    }

    /// Recording length in whole seconds, rounded down.
    pub fn duration_secs(&self) -> i64 {
        (self.end_time_90k - self.start_time_90k) / TIME_UNITS_PER_SEC
    }
}

/// A codec initialization record: the raw bytes of one `stsd` child entry
/// (an `avc1` box with its `avcC` configuration) plus the metadata needed
/// to fill the track headers. Every segment of one output file must share
/// the same entry.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VideoSampleEntry {
    pub id: i32,
    /// SHA-1 of `data`, for diagnostics when entries mismatch.
    pub sha1: [u8; 20],
    pub width: u16,
    pub height: u16,
    /// Serialized sample entry box, appended verbatim inside `stsd`.
    pub data: Vec<u8>,
}
