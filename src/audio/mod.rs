pub mod source;

pub use source::{MemorySource, StereoFrame, StereoSource, WavFileSource};
