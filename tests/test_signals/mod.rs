pub mod generate;

#[allow(unused_imports)]
pub use generate::{read_cwave, silence, stereo_tone, write_wav};
