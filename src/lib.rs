pub mod audio;
pub mod config;
pub mod constants;
pub mod convert;
pub mod cwave;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod signal_processing;
pub mod verify;
pub mod wav;

pub use config::{Algorithm, ConvertConfig, ResolvedConfig};
pub use convert::{ConversionReport, convert};
pub use error::{CwaveError, Result};
pub use verify::{VerifyOutcome, VerifyReport, verify};
pub use wav::save_wav;
