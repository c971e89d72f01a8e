//! Conversion run orchestration.
//!
//! A run writes a placeholder header (version BAD, CRC 0), streams the
//! payload through the selected path, then seeks back and rewrites the header
//! with the final record count, version and CRC.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::audio::{StereoSource, WavFileSource};
use crate::config::{Algorithm, ResolvedConfig};
use crate::cwave::{
    ClipCounters, CwaveHeader, FFT_FILTER_ORDER, MIN_CWAVE_SAMPLES, Producer, SampleEncoder,
    SampleFormat,
};
use crate::error::{CwaveError, Result};
use crate::pipeline::{self, FftSettings, FirSettings};
use crate::signal_processing::{BandRemoval, FilterSpec, FilterTaps, RustFftProvider};

/// Summary of a completed conversion
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub algorithm: Algorithm,
    pub format: SampleFormat,
    pub input_samples: u32,
    /// Records written; equals the header sample count
    pub samples: u32,
    pub sample_rate: u32,
    pub filter_order: i32,
    pub beta: f64,
    pub gain: f64,
    pub crc: u32,
    pub clips: ClipCounters,
    /// FFT length (FFT only)
    pub fft_len: Option<usize>,
    /// Effective pass band in Hz after band removal (FFT only)
    pub pass_band_hz: Option<(f64, f64)>,
    pub threads: usize,
    pub elapsed_secs: f64,
}

fn to_u32(count: usize, what: &str) -> Result<u32> {
    u32::try_from(count).map_err(|_| {
        CwaveError::Format(format!("{} ({}) does not fit a CWAVE header", what, count))
    })
}

/// Convert a WAV file into a CWAVE file
pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
    config: &ResolvedConfig,
    input: P,
    output: Q,
) -> Result<ConversionReport> {
    let mut source = WavFileSource::open(input)?;
    let writer = BufWriter::new(File::create(output.as_ref())?);
    let (report, writer) = convert_source(config, &mut source, writer)?;
    writer
        .into_inner()
        .map_err(|e| CwaveError::Io(e.into_error()))?
        .sync_all()?;
    Ok(report)
}

/// Convert any stereo source into a CWAVE stream, returning the writer
pub fn convert_source<S, W>(
    config: &ResolvedConfig,
    source: &mut S,
    mut writer: W,
) -> Result<(ConversionReport, W)>
where
    S: StereoSource + ?Sized,
    W: Write + Seek,
{
    let start = Instant::now();
    let input_samples = source.len();
    if input_samples < MIN_CWAVE_SAMPLES as usize {
        return Err(CwaveError::Format(format!(
            "input holds {} samples, at least {} are required",
            input_samples, MIN_CWAVE_SAMPLES
        )));
    }
    let sample_rate = source.sample_rate();
    let format = config.format();

    log::info!(
        "Gain multiplier {} ({:.1}% == {:.2} dB)",
        config.gain(),
        config.gain() * 100.0,
        20.0 * config.gain().log10()
    );
    log::info!("Output sample format: {}", format);

    let mut fft_len = None;
    let mut pass_band_hz = None;

    let (header, payload) = match config.algorithm() {
        Algorithm::Fir => {
            let fir = config.fir();
            let spec = FilterSpec::new(fir.order as usize, fir.beta)?;
            log::info!(
                "Real to analytic conversion: FIR filter order {}, Kaiser beta {}",
                spec.order(),
                spec.beta()
            );
            let taps = Arc::new(FilterTaps::design(spec));
            let samples =
                pipeline::fir::output_len(input_samples, spec.delay(), fir.compensate_delay);

            let order = i32::try_from(spec.order()).map_err(|_| {
                CwaveError::Config(format!("filter order {} does not fit a CWAVE header", spec.order()))
            })?;
            let header = CwaveHeader::placeholder(
                format,
                to_u32(samples, "output sample count")?,
                sample_rate,
                order,
                fir.beta,
            );
            header.write_to(&mut writer)?;

            let mut encoder = SampleEncoder::new(writer, format, Producer::Fir);
            let settings = FirSettings {
                scan: fir.scan,
                gain: config.gain(),
                compensate_delay: fir.compensate_delay,
            };
            if config.threads() < 2 {
                pipeline::run_inline(source, &mut encoder, &taps, &settings)?;
            } else {
                pipeline::run_threaded(source, &mut encoder, &taps, &settings)?;
            }
            (header, encoder.finish()?)
        }
        Algorithm::Fft => {
            let fft = config.fft();
            let len = fft.parity.transform_len(input_samples);
            let band = BandRemoval::resolve(len, sample_rate, fft.low_band_hz, fft.high_band_hz);
            log::info!("Real to analytic conversion: direct FFT of {} points", len);
            if band.is_active() {
                let (lo, hi) = band.pass_band_hz(len, sample_rate);
                log::info!("FFT pass band {:.3} .. {:.3} Hz", lo, hi);
                pass_band_hz = Some((lo, hi));
            }
            fft_len = Some(len);

            let header = CwaveHeader::placeholder(
                format,
                to_u32(input_samples, "input sample count")?,
                sample_rate,
                FFT_FILTER_ORDER,
                0.0,
            );
            header.write_to(&mut writer)?;

            let mut encoder = SampleEncoder::new(writer, format, Producer::Fft);
            let mut provider = RustFftProvider::new();
            let settings = FftSettings {
                fft_len: len,
                band,
                gain: config.gain(),
                parallel: config.threads() >= 2,
                scratch_dir: fft.scratch_dir.clone(),
            };
            if fft.safe_mode {
                pipeline::run_safe(source, &mut encoder, &mut provider, &settings)?;
            } else {
                pipeline::run_in_memory(source, &mut encoder, &mut provider, &settings)?;
            }
            (header, encoder.finish()?)
        }
    };

    let mut header = header;
    header.samples = u32::try_from(payload.records).map_err(|_| {
        CwaveError::Format(format!("{} records do not fit a CWAVE header", payload.records))
    })?;
    let header = header.complete(payload.crc);
    let mut writer = payload.writer;
    header.rewrite(&mut writer)?;

    let elapsed = start.elapsed();
    log::info!("Conversion took {:.3} s", elapsed.as_secs_f64());

    let report = ConversionReport {
        algorithm: config.algorithm(),
        format,
        input_samples: to_u32(input_samples, "input sample count")?,
        samples: header.samples,
        sample_rate,
        filter_order: header.filter_order,
        beta: header.beta,
        gain: config.gain(),
        crc: header.crc,
        clips: payload.clips,
        fft_len,
        pass_band_hz,
        threads: config.threads(),
        elapsed_secs: elapsed.as_secs_f64(),
    };
    Ok((report, writer))
}
