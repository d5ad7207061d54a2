//! Virtual `.mp4` construction: box serialization, per-recording sample
//! table projection, and file assembly.

mod boxes;
mod file;
mod segment;
mod types;

pub use file::{Mp4File, Mp4FileBuilder};
pub use types::{Recording, VideoSampleEntry};
