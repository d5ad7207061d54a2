//! Projection of one recording onto its sample-table contributions.
//!
//! A [`Segment`] views `[rel_start_90k, rel_end_90k)` of a single recording.
//! The viewed range is widened to start on the latest key frame at or before
//! the requested start (a decoder cannot enter a stream mid-GOP) and ends at
//! the first frame starting at or past the requested end. Projection yields
//! the frame/key counts and the byte range within the sample file; the
//! per-frame `stts`/`stsz`/`stss` table bytes are generated on demand by
//! re-walking the index from a checkpointed iterator.

use std::ops::Range;

use crate::error::{Error, Result};
use crate::sample_index::SampleIndexIterator;

use super::types::Recording;

/// One recording's contribution to a virtual `.mp4` file.
#[derive(Debug)]
pub(crate) struct Segment {
    pub recording: Recording,
    /// Iterator checkpoint at the first included frame (or unstarted when
    /// the whole recording is included and the index was never walked).
    begin: SampleIndexIterator,
    /// Byte position within the sample file just past the last included frame.
    file_end_pos: i32,
    pub frames: i32,
    pub key_frames: i32,
    /// End time of the last included frame, relative to recording start.
    actual_end_90k: i32,
    /// 1-based sample number of this segment's first frame within the
    /// whole file; dense across segments.
    pub first_sample_num: u32,
}

impl Segment {
    /// Project `desired_90k` (relative to recording start) onto the
    /// recording's sample index.
    ///
    /// When the window covers the whole recording, the counts and byte
    /// range come straight from the recording row and the index is not
    /// decoded. Otherwise a single forward scan locates the boundaries;
    /// the scan fails if the recording does not begin with a key frame or
    /// if the index is corrupt.
    pub fn new(
        recording: Recording,
        first_sample_num: u32,
        desired_90k: Range<i32>,
    ) -> Result<Segment> {
        let recording_duration = recording.duration_90k();
        if desired_90k.start == 0 && desired_90k.end >= recording_duration {
            tracing::debug!(
                frames = recording.video_samples,
                key_frames = recording.video_sync_samples,
                "projecting whole recording"
            );
            return Ok(Segment {
                begin: SampleIndexIterator::new(),
                file_end_pos: recording.sample_file_bytes,
                frames: recording.video_samples,
                key_frames: recording.video_sync_samples,
                actual_end_90k: recording_duration,
                first_sample_num,
                recording,
            });
        }

        let mut it = SampleIndexIterator::new();
        let mut have_frame = it.next(&recording.video_index)?;
        if have_frame && !it.is_key {
            return Err(Error::invalid_input("First frame must be a key frame."));
        }
        let mut begin = SampleIndexIterator::new();
        let mut frames = 0;
        let mut key_frames = 0;
        let mut actual_end_90k = 0;
        while have_frame {
            if it.start_90k <= desired_90k.start && it.is_key {
                tracing::trace!(start_90k = it.start_90k, "new begin candidate");
                begin = it;
                frames = 0;
                key_frames = 0;
            }
            if it.start_90k >= desired_90k.end {
                break;
            }
            frames += 1;
            key_frames += it.is_key as i32;
            actual_end_90k = it.end_90k();
            have_frame = it.next(&recording.video_index)?;
        }
        tracing::debug!(
            desired_start = desired_90k.start,
            desired_end = desired_90k.end,
            actual_start = begin.start_90k,
            actual_end = actual_end_90k,
            frames,
            key_frames,
            "projected partial recording"
        );
        Ok(Segment {
            begin,
            file_end_pos: it.pos,
            frames,
            key_frames,
            actual_end_90k,
            first_sample_num,
            recording,
        })
    }

    /// Byte range of this segment's frames within the sample file.
    pub fn sample_file_range(&self) -> Range<u64> {
        self.begin.pos as u64..self.file_end_pos as u64
    }

    /// Viewed duration in 90 kHz ticks (first included frame start to last
    /// included frame end).
    pub fn duration_90k(&self) -> i32 {
        self.actual_end_90k - self.begin.start_90k
    }

    /// End of the viewed range, relative to recording start.
    pub fn end_90k(&self) -> i32 {
        self.actual_end_90k
    }

    /// Walk the included frames in order, re-decoding from the checkpoint.
    fn for_each_frame<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&SampleIndexIterator) -> Result<()>,
    {
        if self.frames == 0 {
            return Ok(());
        }
        let index = &self.recording.video_index;
        let mut it = self.begin;
        if it.is_unstarted() && !it.next(index)? {
            return Err(Error::index(format!(
                "sample index empty but {} frames expected",
                self.frames
            )));
        }
        for i in 0..self.frames {
            f(&it)?;
            if i + 1 < self.frames && !it.next(index)? {
                return Err(Error::index(format!(
                    "sample index ended after {} of {} frames",
                    i + 1,
                    self.frames
                )));
            }
        }
        Ok(())
    }

    pub fn stts_len(&self) -> u64 {
        8 * self.frames as u64
    }

    pub fn stsz_len(&self) -> u64 {
        4 * self.frames as u64
    }

    pub fn stss_len(&self) -> u64 {
        4 * self.key_frames as u64
    }

    /// `stts` entries: one `(count=1, duration)` row per frame.
    pub fn stts_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.stts_len() as usize);
        self.for_each_frame(|it| {
            out.extend_from_slice(&1u32.to_be_bytes());
            out.extend_from_slice(&(it.duration_90k as u32).to_be_bytes());
            Ok(())
        })?;
        Ok(out)
    }

    /// `stsz` entries: per-frame byte sizes.
    pub fn stsz_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.stsz_len() as usize);
        self.for_each_frame(|it| {
            out.extend_from_slice(&(it.bytes as u32).to_be_bytes());
            Ok(())
        })?;
        Ok(out)
    }

    /// `stss` entries: 1-based sample numbers of this segment's key frames.
    pub fn stss_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.stss_len() as usize);
        let mut sample_num = self.first_sample_num;
        self.for_each_frame(|it| {
            if it.is_key {
                out.extend_from_slice(&sample_num.to_be_bytes());
            }
            sample_num += 1;
            Ok(())
        })?;
        Ok(out)
    }
}
