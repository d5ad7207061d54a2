//! ISO BMFF box serialization primitives.
//!
//! Every header is sized bottom-up: callers compute each box's content
//! length first (all variable-length table sizes are known before layout
//! begins), so no size field is ever patched after the fact. All multi-byte
//! fields are big-endian per ISO/IEC 14496-12.

use crate::TIME_UNITS_PER_SEC;

/// Seconds between the ISO 14496 epoch (1904-01-01 UTC) and the Unix epoch
/// (1970-01-01 UTC): 24107 days.
const ISO14496_EPOCH_OFFSET: i64 = 24107 * 86400;

/// Convert 90 kHz ticks since the Unix epoch to 32-bit seconds since the
/// ISO 14496 epoch.
pub(crate) fn to_iso14496_timestamp(time_90k: i64) -> u32 {
    (time_90k / TIME_UNITS_PER_SEC + ISO14496_EPOCH_OFFSET) as u32
}

/// A complete `ftyp` box: isom major brand, minor version 0x200.
pub(crate) const FTYP_BOX: &[u8] = &[
    0x00, 0x00, 0x00, 0x20, // length = 32
    b'f', b't', b'y', b'p', // type
    b'i', b's', b'o', b'm', // major_brand
    0x00, 0x00, 0x02, 0x00, // minor_version
    b'i', b's', b'o', b'm', // compatible_brands[0]
    b'i', b's', b'o', b'2', // compatible_brands[1]
    b'a', b'v', b'c', b'1', // compatible_brands[2]
    b'm', b'p', b'4', b'1', // compatible_brands[3]
];

/// A complete `hdlr` box for a video track: handler `vide`, empty name.
pub(crate) const VIDEO_HDLR_BOX: &[u8] = &[
    0x00, 0x00, 0x00, 0x21, // length = 33
    b'h', b'd', b'l', b'r', // type
    0x00, 0x00, 0x00, 0x00, // version + flags
    0x00, 0x00, 0x00, 0x00, // pre_defined
    b'v', b'i', b'd', b'e', // handler_type
    0x00, 0x00, 0x00, 0x00, // reserved[0]
    0x00, 0x00, 0x00, 0x00, // reserved[1]
    0x00, 0x00, 0x00, 0x00, // reserved[2]
    0x00, // name (empty, NUL-terminated)
];

/// Adjacent `vmhd` and `dinf` boxes, both fully static. The `dinf` holds a
/// single self-contained `url ` entry (flags=1): all media data lives in
/// this file, no external references.
pub(crate) const VMHD_DINF_BOXES: &[u8] = &[
    0x00, 0x00, 0x00, 0x14, // vmhd length = 20
    b'v', b'm', b'h', b'd', // type
    0x00, 0x00, 0x00, 0x01, // version + flags (flags=1 is required)
    0x00, 0x00, 0x00, 0x00, // graphicsmode, opcolor[0]
    0x00, 0x00, 0x00, 0x00, // opcolor[1], opcolor[2]
    0x00, 0x00, 0x00, 0x24, // dinf length = 36
    b'd', b'i', b'n', b'f', // type
    0x00, 0x00, 0x00, 0x1c, // dref length = 28
    b'd', b'r', b'e', b'f', // type
    0x00, 0x00, 0x00, 0x00, // version + flags
    0x00, 0x00, 0x00, 0x01, // entry_count
    0x00, 0x00, 0x00, 0x0c, // url length = 12
    b'u', b'r', b'l', b' ', // type
    0x00, 0x00, 0x00, 0x01, // version=0, flags=1 (self-contained)
];

/// 8-byte header of a plain container box whose content is `content_len`
/// bytes of child boxes appended afterwards.
pub(crate) fn container_header(box_type: &[u8; 4], content_len: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(8);
    out.extend_from_slice(&((8 + content_len) as u32).to_be_bytes());
    out.extend_from_slice(box_type);
    out
}

/// 12-byte header of a version-0 full box (size + type + version/flags).
pub(crate) fn full_box_header(box_type: &[u8; 4], content_len: u64, flags: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(12);
    out.extend_from_slice(&((12 + content_len) as u32).to_be_bytes());
    out.extend_from_slice(box_type);
    out.extend_from_slice(&(flags & 0x00ff_ffff).to_be_bytes());
    out
}

/// Identity transform matrix, 16.16 / 2.30 fixed point.
fn append_matrix(out: &mut Vec<u8>) {
    out.extend_from_slice(&0x00010000u32.to_be_bytes());
    out.extend_from_slice(&[0u8; 12]);
    out.extend_from_slice(&0x00010000u32.to_be_bytes());
    out.extend_from_slice(&[0u8; 12]);
    out.extend_from_slice(&0x40000000u32.to_be_bytes());
}

/// Complete `mvhd` version 0 box (108 bytes): timescale 90000, rate 1.0,
/// volume 1.0, next track id 2.
pub(crate) fn write_mvhd(creation_ts: u32, duration_90k: u32) -> Vec<u8> {
    let mut out = full_box_header(b"mvhd", 96, 0);
    out.extend_from_slice(&creation_ts.to_be_bytes()); // creation_time
    out.extend_from_slice(&creation_ts.to_be_bytes()); // modification_time
    out.extend_from_slice(&(TIME_UNITS_PER_SEC as u32).to_be_bytes());
    out.extend_from_slice(&duration_90k.to_be_bytes());
    out.extend_from_slice(&0x00010000u32.to_be_bytes()); // rate = 1.0 (16.16)
    out.extend_from_slice(&0x0100u16.to_be_bytes()); // volume = 1.0 (8.8)
    out.extend_from_slice(&[0u8; 10]); // reserved
    append_matrix(&mut out);
    out.extend_from_slice(&[0u8; 24]); // pre_defined
    out.extend_from_slice(&2u32.to_be_bytes()); // next_track_id
    out
}

/// Complete `tkhd` version 0 box (92 bytes) for the single video track:
/// flags 7 (enabled | in_movie | in_preview), track id 1, 16.16 dimensions.
pub(crate) fn write_tkhd(creation_ts: u32, duration_90k: u32, width: u16, height: u16) -> Vec<u8> {
    let mut out = full_box_header(b"tkhd", 80, 7);
    out.extend_from_slice(&creation_ts.to_be_bytes()); // creation_time
    out.extend_from_slice(&creation_ts.to_be_bytes()); // modification_time
    out.extend_from_slice(&1u32.to_be_bytes()); // track_id
    out.extend_from_slice(&[0u8; 4]); // reserved
    out.extend_from_slice(&duration_90k.to_be_bytes());
    out.extend_from_slice(&[0u8; 8]); // reserved
    out.extend_from_slice(&[0u8; 2]); // layer
    out.extend_from_slice(&[0u8; 2]); // alternate_group
    out.extend_from_slice(&[0u8; 2]); // volume (0 for video)
    out.extend_from_slice(&[0u8; 2]); // reserved
    append_matrix(&mut out);
    out.extend_from_slice(&((width as u32) << 16).to_be_bytes());
    out.extend_from_slice(&((height as u32) << 16).to_be_bytes());
    out
}

/// Complete `mdhd` version 0 box (32 bytes): timescale 90000, language
/// "und" (0x55c4).
pub(crate) fn write_mdhd(creation_ts: u32, duration_90k: u32) -> Vec<u8> {
    let mut out = full_box_header(b"mdhd", 20, 0);
    out.extend_from_slice(&creation_ts.to_be_bytes()); // creation_time
    out.extend_from_slice(&creation_ts.to_be_bytes()); // modification_time
    out.extend_from_slice(&(TIME_UNITS_PER_SEC as u32).to_be_bytes());
    out.extend_from_slice(&duration_90k.to_be_bytes());
    out.extend_from_slice(&0x55c4u16.to_be_bytes()); // language
    out.extend_from_slice(&[0u8; 2]); // pre_defined
    out
}

/// 16-byte `mdat` header using the 64-bit `largesize` form (size=1), so
/// files past 2^32-1 bytes work. `largesize` covers the header itself.
pub(crate) fn write_mdat_header(payload_len: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(16);
    out.extend_from_slice(&1u32.to_be_bytes());
    out.extend_from_slice(b"mdat");
    out.extend_from_slice(&(16 + payload_len).to_be_bytes());
    out
}
