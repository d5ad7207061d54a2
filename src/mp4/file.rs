//! Virtual `.mp4` assembly.
//!
//! [`Mp4FileBuilder`] collects segments; [`Mp4File`] lays out the whole
//! container as a slice list. Box metadata (a few hundred bytes) is built
//! eagerly so the total size, etag, and modification time are known at
//! construction; sample-table entries and sample data are produced only for
//! the byte ranges actually requested. Boxes are arranged in the order
//! suggested by ISO/IEC 14496-12 section 6.2.3 (Table 1):
//!
//! * ftyp
//! * moov
//!   * mvhd
//!   * trak
//!     * tkhd
//!     * mdia
//!       * mdhd
//!       * hdlr
//!       * minf
//!         * vmhd
//!         * dinf (dref with one self-contained url entry)
//!         * stbl (stsd, stts, stsc, stsz, co64, stss)
//! * mdat

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::ops::Range;
use std::sync::Arc;

use sha1::{Digest, Sha1};

use crate::error::{Error, Result};
use crate::slices::{RangeWrite, SliceList};
use crate::vfile::{SampleFileDir, VirtualFile};
use crate::TIME_UNITS_PER_SEC;

use super::boxes;
use super::segment::Segment;
use super::types::{Recording, VideoSampleEntry};

/// Incremented whenever a change to this module alters the bytes emitted
/// for a given set of builder inputs, so stale cached copies are dropped.
const FORMAT_VERSION: [u8; 1] = [0x00];

/// One slice of the virtual file. Box headers and other fixed metadata are
/// resident bytes; the table and sample-data variants hold an index into
/// the owning file's segment list and generate content per read.
#[derive(Debug)]
enum Slice {
    Static(&'static [u8]),
    Owned(Vec<u8>),
    VideoSampleEntry,
    Stts(usize),
    Stsz(usize),
    Stss(usize),
    Stsc,
    Co64,
    SampleData(usize),
}

fn write_sub(bytes: &[u8], range: Range<u64>, out: &mut dyn Write) -> Result<()> {
    let sub = bytes
        .get(range.start as usize..range.end as usize)
        .ok_or_else(|| Error::invalid_input("generated slice shorter than declared"))?;
    out.write_all(sub)?;
    Ok(())
}

impl RangeWrite<Mp4File> for Slice {
    fn write_range(&self, f: &Mp4File, range: Range<u64>, out: &mut dyn Write) -> Result<()> {
        match self {
            Slice::Static(bytes) => write_sub(bytes, range, out),
            Slice::Owned(bytes) => write_sub(bytes, range, out),
            Slice::VideoSampleEntry => write_sub(&f.video_sample_entry.data, range, out),
            Slice::Stts(i) => write_sub(&f.segments[*i].stts_bytes()?, range, out),
            Slice::Stsz(i) => write_sub(&f.segments[*i].stsz_bytes()?, range, out),
            Slice::Stss(i) => write_sub(&f.segments[*i].stss_bytes()?, range, out),
            Slice::Stsc => write_sub(&f.stsc_bytes(), range, out),
            Slice::Co64 => write_sub(&f.co64_bytes(), range, out),
            Slice::SampleData(i) => f.write_sample_data(*i, range, out),
        }
    }
}

/// An immutable virtual `.mp4` file, safe to share across concurrent range
/// reads.
#[derive(Debug)]
pub struct Mp4File {
    dir: Arc<SampleFileDir>,
    segments: Vec<Segment>,
    video_sample_entry: VideoSampleEntry,
    slices: SliceList<Slice>,
    /// Absolute byte position of the first sample byte (just past the
    /// `mdat` header); base of every `co64` entry.
    initial_sample_byte_pos: u64,
    etag: String,
    last_modified: i64,
}

impl Mp4File {
    fn new(
        dir: Arc<SampleFileDir>,
        segments: Vec<Segment>,
        video_sample_entry: VideoSampleEntry,
    ) -> Mp4File {
        let mut duration_90k: u32 = 0;
        let mut max_end_90k = i64::MIN;
        let mut total_frames: u64 = 0;
        let mut total_key_frames: u64 = 0;
        let mut total_sample_bytes: u64 = 0;
        for s in &segments {
            duration_90k = duration_90k.wrapping_add(s.duration_90k() as u32);
            max_end_90k = max_end_90k.max(s.recording.start_time_90k + s.end_90k() as i64);
            total_frames += s.frames as u64;
            total_key_frames += s.key_frames as u64;
            let r = s.sample_file_range();
            total_sample_bytes += r.end - r.start;
        }
        let last_modified = max_end_90k / TIME_UNITS_PER_SEC;
        let creation_ts = boxes::to_iso14496_timestamp(max_end_90k);

        // All table sizes are fixed by the projections, so every box size
        // can be computed before a single byte is laid down.
        let num_segments = segments.len() as u64;
        let stsd_len = 16 + video_sample_entry.data.len() as u64;
        let stts_len = 16 + 8 * total_frames;
        let stsc_len = 16 + 12 * num_segments;
        let stsz_len = 20 + 4 * total_frames;
        let co64_len = 16 + 8 * num_segments;
        let stss_len = 16 + 4 * total_key_frames;
        let stbl_len = 8 + stsd_len + stts_len + stsc_len + stsz_len + co64_len + stss_len;
        let minf_len = 8 + boxes::VMHD_DINF_BOXES.len() as u64 + stbl_len;
        let mdia_len = 8 + 32 + boxes::VIDEO_HDLR_BOX.len() as u64 + minf_len;
        let trak_len = 8 + 92 + mdia_len;
        let moov_len = 8 + 108 + trak_len;

        let mut slices = SliceList::new();
        let append_owned = |slices: &mut SliceList<Slice>, bytes: Vec<u8>| {
            slices.append(bytes.len() as u64, Slice::Owned(bytes));
        };

        slices.append(boxes::FTYP_BOX.len() as u64, Slice::Static(boxes::FTYP_BOX));

        append_owned(&mut slices, boxes::container_header(b"moov", moov_len - 8));
        append_owned(&mut slices, boxes::write_mvhd(creation_ts, duration_90k));
        append_owned(&mut slices, boxes::container_header(b"trak", trak_len - 8));
        append_owned(
            &mut slices,
            boxes::write_tkhd(
                creation_ts,
                duration_90k,
                video_sample_entry.width,
                video_sample_entry.height,
            ),
        );
        append_owned(&mut slices, boxes::container_header(b"mdia", mdia_len - 8));
        append_owned(&mut slices, boxes::write_mdhd(creation_ts, duration_90k));
        slices.append(
            boxes::VIDEO_HDLR_BOX.len() as u64,
            Slice::Static(boxes::VIDEO_HDLR_BOX),
        );
        append_owned(&mut slices, boxes::container_header(b"minf", minf_len - 8));
        slices.append(
            boxes::VMHD_DINF_BOXES.len() as u64,
            Slice::Static(boxes::VMHD_DINF_BOXES),
        );
        append_owned(&mut slices, boxes::container_header(b"stbl", stbl_len - 8));

        let mut stsd = boxes::full_box_header(b"stsd", stsd_len - 12, 0);
        stsd.extend_from_slice(&1u32.to_be_bytes()); // entry_count
        append_owned(&mut slices, stsd);
        slices.append(video_sample_entry.data.len() as u64, Slice::VideoSampleEntry);

        let mut stts = boxes::full_box_header(b"stts", stts_len - 12, 0);
        stts.extend_from_slice(&(total_frames as u32).to_be_bytes()); // entry_count
        append_owned(&mut slices, stts);
        for (i, s) in segments.iter().enumerate() {
            slices.append(s.stts_len(), Slice::Stts(i));
        }

        let mut stsc = boxes::full_box_header(b"stsc", stsc_len - 12, 0);
        stsc.extend_from_slice(&(num_segments as u32).to_be_bytes()); // entry_count
        append_owned(&mut slices, stsc);
        slices.append(12 * num_segments, Slice::Stsc);

        let mut stsz = boxes::full_box_header(b"stsz", stsz_len - 12, 0);
        stsz.extend_from_slice(&0u32.to_be_bytes()); // sample_size: sizes follow
        stsz.extend_from_slice(&(total_frames as u32).to_be_bytes()); // sample_count
        append_owned(&mut slices, stsz);
        for (i, s) in segments.iter().enumerate() {
            slices.append(s.stsz_len(), Slice::Stsz(i));
        }

        let mut co64 = boxes::full_box_header(b"co64", co64_len - 12, 0);
        co64.extend_from_slice(&(num_segments as u32).to_be_bytes()); // entry_count
        append_owned(&mut slices, co64);
        slices.append(8 * num_segments, Slice::Co64);

        let mut stss = boxes::full_box_header(b"stss", stss_len - 12, 0);
        stss.extend_from_slice(&(total_key_frames as u32).to_be_bytes()); // entry_count
        append_owned(&mut slices, stss);
        for (i, s) in segments.iter().enumerate() {
            slices.append(s.stss_len(), Slice::Stss(i));
        }

        append_owned(&mut slices, boxes::write_mdat_header(total_sample_bytes));
        let initial_sample_byte_pos = slices.len();
        for (i, s) in segments.iter().enumerate() {
            let r = s.sample_file_range();
            slices.append(r.end - r.start, Slice::SampleData(i));
        }
        debug_assert_eq!(
            slices.len(),
            boxes::FTYP_BOX.len() as u64 + moov_len + 16 + total_sample_bytes
        );

        let mut digest = Sha1::new();
        digest.update(FORMAT_VERSION);
        for s in &segments {
            let r = s.sample_file_range();
            digest.update(r.start.to_be_bytes());
            digest.update(r.end.to_be_bytes());
            digest.update(s.recording.sample_file_sha1);
        }
        let etag = format!("\"{}\"", hex::encode(digest.finalize()));

        tracing::debug!(
            segments = segments.len(),
            size = slices.len(),
            etag = %etag,
            "assembled virtual .mp4"
        );
        Mp4File {
            dir,
            segments,
            video_sample_entry,
            slices,
            initial_sample_byte_pos,
            etag,
            last_modified,
        }
    }

    /// `stsc` entries: each segment is one chunk holding all its frames,
    /// described against the file's single sample entry.
    fn stsc_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 * self.segments.len());
        for (i, s) in self.segments.iter().enumerate() {
            out.extend_from_slice(&(i as u32 + 1).to_be_bytes()); // first_chunk
            out.extend_from_slice(&(s.frames as u32).to_be_bytes()); // samples_per_chunk
            out.extend_from_slice(&1u32.to_be_bytes()); // sample_description_index
        }
        out
    }

    /// `co64` entries: absolute position of each segment's first sample
    /// byte within the virtual file.
    fn co64_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 * self.segments.len());
        let mut pos = self.initial_sample_byte_pos;
        for s in &self.segments {
            out.extend_from_slice(&pos.to_be_bytes());
            let r = s.sample_file_range();
            pos += r.end - r.start;
        }
        out
    }

    fn write_sample_data(&self, i: usize, range: Range<u64>, out: &mut dyn Write) -> Result<()> {
        let s = &self.segments[i];
        let file_range = s.sample_file_range();
        let mut file = self.dir.open_sample_file(s.recording.sample_file_uuid)?;
        file.seek(SeekFrom::Start(file_range.start + range.start))?;
        let len = range.end - range.start;
        let copied = io::copy(&mut file.take(len), out)?;
        if copied < len {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "sample file {} ended {} bytes early",
                    s.recording.sample_file_uuid,
                    len - copied
                ),
            )));
        }
        Ok(())
    }
}

impl VirtualFile for Mp4File {
    fn size(&self) -> u64 {
        self.slices.len()
    }

    fn last_modified(&self) -> i64 {
        self.last_modified
    }

    fn etag(&self) -> &str {
        &self.etag
    }

    fn mime_type(&self) -> &'static str {
        "video/mp4"
    }

    fn add_range(&self, range: Range<u64>, out: &mut dyn Write) -> Result<()> {
        self.slices.write_range(self, range, out)
    }
}

/// Collects recording windows and the shared sample entry, then emits an
/// [`Mp4File`].
#[derive(Default)]
pub struct Mp4FileBuilder {
    segments: Vec<(Recording, Range<i32>)>,
    video_sample_entry: Option<VideoSampleEntry>,
}

impl Mp4FileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `[rel_start_90k, rel_end_90k)` of a recording (times relative
    /// to the recording's start) as the next segment.
    pub fn append(
        &mut self,
        recording: Recording,
        rel_start_90k: i32,
        rel_end_90k: i32,
    ) -> &mut Self {
        self.segments.push((recording, rel_start_90k..rel_end_90k));
        self
    }

    /// Set the sample entry every appended recording must match.
    pub fn set_sample_entry(&mut self, entry: VideoSampleEntry) -> &mut Self {
        self.video_sample_entry = Some(entry);
        self
    }

    /// Validate the segments, project each onto its sample tables, and
    /// assemble the virtual file.
    pub fn build(self, dir: Arc<SampleFileDir>) -> Result<Mp4File> {
        if self.segments.is_empty() {
            return Err(Error::invalid_input("Can't construct empty .mp4"));
        }
        let entry = self
            .video_sample_entry
            .ok_or_else(|| Error::invalid_input("no video sample entry set"))?;
        let mut segments = Vec::with_capacity(self.segments.len());
        let mut next_sample_num: u32 = 1;
        for (recording, desired) in self.segments {
            if recording.video_sample_entry_id != entry.id {
                return Err(Error::invalid_input(format!(
                    "inconsistent video sample entries: builder has {} (sha1 {}), segment has {}",
                    entry.id,
                    hex::encode(entry.sha1),
                    recording.video_sample_entry_id
                )));
            }
            let s = Segment::new(recording, next_sample_num, desired)?;
            next_sample_num += s.frames as u32;
            segments.push(s);
        }
        Ok(Mp4File::new(dir, segments, entry))
    }
}
