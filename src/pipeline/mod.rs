pub mod fir;
pub mod sink;
pub mod spectral;
pub mod worker;

pub use fir::{FirSettings, run_inline, run_threaded};
pub use sink::ComplexSink;
pub use spectral::{FftSettings, run_in_memory, run_safe};
pub use worker::{ChannelWorker, WorkChunk};
