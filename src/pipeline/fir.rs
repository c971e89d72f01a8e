//! FIR drivers: inline and threaded.
//!
//! Both feed the input followed by M/2 zero samples through one Hilbert FIR
//! per channel. With delay compensation the first M/2 outputs are dropped so
//! the output has exactly as many samples as the input; without it every
//! output is emitted.

use std::sync::Arc;

use num_complex::Complex64;

use crate::audio::StereoSource;
use crate::constants::CHUNK_SAMPLES;
use crate::error::Result;
use crate::pipeline::sink::ComplexSink;
use crate::pipeline::worker::{ChannelWorker, WorkChunk};
use crate::progress::Progress;
use crate::signal_processing::{FilterTaps, HilbertFir, ScanOrder};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirSettings {
    pub scan: ScanOrder,
    pub gain: f64,
    pub compensate_delay: bool,
}

/// Number of output samples for `input_len` input samples
pub fn output_len(input_len: usize, delay: usize, compensate_delay: bool) -> usize {
    if compensate_delay {
        input_len
    } else {
        input_len + delay
    }
}

/// Filter both channels on the calling thread, sample by sample
///
/// Returns the number of records written.
pub fn run_inline<S, K>(
    source: &mut S,
    sink: &mut K,
    taps: &Arc<FilterTaps>,
    settings: &FirSettings,
) -> Result<u64>
where
    S: StereoSource + ?Sized,
    K: ComplexSink + ?Sized,
{
    let delay = taps.spec().delay();
    let total = (source.len() + delay) as u64;
    let mut left = HilbertFir::new(taps.clone(), settings.scan);
    let mut right = HilbertFir::new(taps.clone(), settings.scan);
    let mut progress = Progress::new("FIR conversion", total);
    let mut written = 0;

    for n in 0..total {
        let frame = source.next_frame()?.unwrap_or_default();
        let l = left.process(frame.left * settings.gain);
        let r = right.process(frame.right * settings.gain);
        if !settings.compensate_delay || n >= delay as u64 {
            sink.write(l, r)?;
            written += 1;
        }
        progress.update(n + 1);
    }

    progress.finish();
    Ok(written)
}

/// Filter each channel on its own worker thread, one chunk at a time
///
/// Returns the number of records written.
pub fn run_threaded<S, K>(
    source: &mut S,
    sink: &mut K,
    taps: &Arc<FilterTaps>,
    settings: &FirSettings,
) -> Result<u64>
where
    S: StereoSource + ?Sized,
    K: ComplexSink + ?Sized,
{
    let delay = taps.spec().delay() as u64;
    let total = source.len() as u64 + delay;

    let left_worker = ChannelWorker::spawn("left", taps.clone(), settings.scan, settings.gain)?;
    let right_worker = ChannelWorker::spawn("right", taps.clone(), settings.scan, settings.gain)?;

    let mut left = WorkChunk::with_capacity(CHUNK_SAMPLES);
    let mut right = WorkChunk::with_capacity(CHUNK_SAMPLES);
    let mut progress = Progress::new("FIR conversion", total);
    let mut fed = 0u64;
    let mut emitted = 0u64;
    let mut written = 0;

    loop {
        let count = (total - fed).min(CHUNK_SAMPLES as u64) as usize;
        left.input.clear();
        right.input.clear();
        for _ in 0..count {
            let frame = source.next_frame()?.unwrap_or_default();
            left.input.push(frame.left);
            right.input.push(frame.right);
        }
        fed += count as u64;
        let end = fed == total;
        left.end = end;
        right.end = end;

        left_worker.submit(left)?;
        right_worker.submit(right)?;
        left = left_worker.collect()?;
        right = right_worker.collect()?;

        for i in 0..count {
            if !settings.compensate_delay || emitted >= delay {
                sink.write(
                    Complex64::new(left.re[i], left.im[i]),
                    Complex64::new(right.re[i], right.im[i]),
                )?;
                written += 1;
            }
            emitted += 1;
        }
        progress.update(emitted);

        if end {
            break;
        }
    }

    left_worker.join()?;
    right_worker.join()?;
    progress.finish();
    Ok(written)
}
