//! Ordered list of virtual byte slices with random range reads.
//!
//! A [`SliceList`] records, for each slice, only its declared length and a
//! small descriptor; slice content is produced on access. The total length
//! is therefore known as soon as the list is assembled, while a multi-GB
//! virtual file costs a few hundred bytes of RAM until someone reads it.

use std::io::Write;
use std::ops::Range;

use crate::error::{Error, Result};

/// Contract for a slice descriptor: write a slice-relative sub-range to
/// `out`. Must write exactly `range.end - range.start` bytes on success,
/// must be repeatable (same inputs, same bytes), and must not mutate shared
/// state. `ctx` carries whatever the descriptor indexes into (typically the
/// owning file), so descriptors stay plain values instead of closures
/// borrowing their owner.
pub trait RangeWrite<C> {
    fn write_range(&self, ctx: &C, range: Range<u64>, out: &mut dyn Write) -> Result<()>;
}

#[derive(Debug)]
struct Entry<S> {
    /// Cumulative end offset of this slice within the virtual file.
    end: u64,
    slice: S,
}

/// An ordered collection of slices addressed by absolute byte position.
#[derive(Debug)]
pub struct SliceList<S> {
    slices: Vec<Entry<S>>,
    len: u64,
}

impl<S> SliceList<S> {
    pub fn new() -> Self {
        Self { slices: Vec::new(), len: 0 }
    }

    /// Append a slice of `len` declared bytes.
    pub fn append(&mut self, len: u64, slice: S) {
        self.len += len;
        self.slices.push(Entry { end: self.len, slice });
    }

    /// Total virtual size in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Write the bytes of `range` to `out`, delegating each overlapped
    /// slice's sub-range to its descriptor. Partial output may remain in
    /// `out` if a descriptor fails mid-way.
    pub fn write_range<C>(&self, ctx: &C, range: Range<u64>, out: &mut dyn Write) -> Result<()>
    where
        S: RangeWrite<C>,
    {
        if range.start > range.end || range.end > self.len {
            return Err(Error::invalid_input(format!(
                "bad range [{}, {}) for file of size {}",
                range.start, range.end, self.len
            )));
        }
        let mut pos = range.start;
        let mut i = self.slices.partition_point(|e| e.end <= range.start);
        while pos < range.end {
            let e = &self.slices[i];
            let slice_start = if i == 0 { 0 } else { self.slices[i - 1].end };
            let sub_end = e.end.min(range.end);
            e.slice.write_range(ctx, pos - slice_start..sub_end - slice_start, out)?;
            pos = sub_end;
            i += 1;
        }
        Ok(())
    }
}

impl<S> Default for SliceList<S> {
    fn default() -> Self {
        Self::new()
    }
}
