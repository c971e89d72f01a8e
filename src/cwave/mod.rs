pub mod crc32;
pub mod format;
pub mod header;

pub use crc32::Crc32;
pub use format::{ClipCounters, EncodedPayload, Producer, SampleEncoder, SampleFormat};
pub use header::{CwaveHeader, FFT_FILTER_ORDER, HeaderVersion, MIN_CWAVE_SAMPLES};
