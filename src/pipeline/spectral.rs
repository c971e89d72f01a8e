//! FFT drivers: in-memory and disk-spooling safe mode.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use num_complex::Complex64;
use tempfile::NamedTempFile;

use crate::audio::{StereoFrame, StereoSource};
use crate::error::{CwaveError, Result};
use crate::pipeline::sink::ComplexSink;
use crate::progress::Progress;
use crate::signal_processing::{AnalyticSignalBuilder, BandRemoval, FftProvider};

/// Bytes per spilled sample: re and im as little-endian f64
const SCRATCH_RECORD_SIZE: u64 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct FftSettings {
    /// Transform length N, at least the input length
    pub fft_len: usize,
    pub band: BandRemoval,
    pub gain: f64,
    /// Process the two channels concurrently (in-memory mode only)
    pub parallel: bool,
    pub scratch_dir: Option<PathBuf>,
}

fn read_channel<S>(
    source: &mut S,
    fft_len: usize,
    gain: f64,
    pick: fn(&StereoFrame) -> f64,
) -> Result<Vec<f64>>
where
    S: StereoSource + ?Sized,
{
    let mut samples = Vec::with_capacity(fft_len);
    while let Some(frame) = source.next_frame()? {
        samples.push(pick(&frame) * gain);
    }
    Ok(samples)
}

fn read_both_channels<S>(source: &mut S, fft_len: usize, gain: f64) -> Result<(Vec<f64>, Vec<f64>)>
where
    S: StereoSource + ?Sized,
{
    let mut left = Vec::with_capacity(fft_len);
    let mut right = Vec::with_capacity(fft_len);
    while let Some(frame) = source.next_frame()? {
        left.push(frame.left * gain);
        right.push(frame.right * gain);
    }
    Ok((left, right))
}

fn check_length(fft_len: usize, samples: usize) -> Result<()> {
    if fft_len < samples {
        return Err(CwaveError::Config(format!(
            "FFT length {} is shorter than the input ({} samples)",
            fft_len, samples
        )));
    }
    Ok(())
}

/// Transform both channels held fully in memory
///
/// Returns the number of records written.
pub fn run_in_memory<S, K>(
    source: &mut S,
    sink: &mut K,
    provider: &mut dyn FftProvider,
    settings: &FftSettings,
) -> Result<u64>
where
    S: StereoSource + ?Sized,
    K: ComplexSink + ?Sized,
{
    let samples = source.len();
    check_length(settings.fft_len, samples)?;
    let builder = AnalyticSignalBuilder::new(provider, settings.fft_len, settings.band)?;

    log::info!("Reading {} samples", samples);
    let (left, right) = read_both_channels(source, settings.fft_len, settings.gain)?;

    let (left, right) = if settings.parallel {
        log::info!("Transforming both channels in parallel");
        std::thread::scope(|s| {
            let left_job = s.spawn(|| builder.build(left));
            let right = builder.build(right);
            let left = left_job
                .join()
                .map_err(|_| CwaveError::Resource("left channel FFT thread panicked".into()))?;
            Ok::<_, CwaveError>((left?, right?))
        })?
    } else {
        log::info!("Transforming the left channel");
        let left = builder.build(left)?;
        log::info!("Transforming the right channel");
        let right = builder.build(right)?;
        (left, right)
    };
    drop(builder);

    let mut progress = Progress::new("FFT output", samples as u64);
    for (n, (l, r)) in left.iter().zip(right.iter()).take(samples).enumerate() {
        sink.write(*l, *r)?;
        progress.update(n as u64 + 1);
    }
    progress.finish();
    Ok(samples as u64)
}

/// Scratch file holding one channel's analytic signal
struct Spool {
    file: NamedTempFile,
    records: u64,
}

impl Spool {
    fn create(dir: Option<&Path>) -> Result<Self> {
        let file = match dir {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };
        log::debug!("Scratch file {}", file.path().display());
        Ok(Self { file, records: 0 })
    }

    fn spill(&mut self, signal: &[Complex64]) -> Result<()> {
        let mut writer = BufWriter::new(self.file.as_file_mut());
        for z in signal {
            writer.write_all(&z.re.to_le_bytes())?;
            writer.write_all(&z.im.to_le_bytes())?;
        }
        writer.flush()?;
        self.records = signal.len() as u64;
        Ok(())
    }

    fn replay(&mut self) -> Result<SpoolReader<'_>> {
        let file = self.file.as_file_mut();
        let expected = self.records * SCRATCH_RECORD_SIZE;
        let actual = file.seek(SeekFrom::End(0))?;
        if actual != expected {
            return Err(CwaveError::Io(std::io::Error::other(format!(
                "scratch file holds {} bytes, expected {}",
                actual, expected
            ))));
        }
        file.seek(SeekFrom::Start(0))?;
        Ok(SpoolReader {
            reader: BufReader::new(file),
        })
    }

    fn close(self) -> Result<()> {
        self.file.close()?;
        Ok(())
    }
}

struct SpoolReader<'a> {
    reader: BufReader<&'a mut File>,
}

impl SpoolReader<'_> {
    fn next_sample(&mut self) -> Result<Complex64> {
        let mut buf = [0u8; SCRATCH_RECORD_SIZE as usize];
        self.reader.read_exact(&mut buf)?;
        let mut re = [0u8; 8];
        let mut im = [0u8; 8];
        re.copy_from_slice(&buf[..8]);
        im.copy_from_slice(&buf[8..]);
        Ok(Complex64::new(f64::from_le_bytes(re), f64::from_le_bytes(im)))
    }
}

/// Transform one channel at a time, spilling the left channel to disk
///
/// Peak memory holds a single channel's complex signal. The input is read
/// twice. Returns the number of records written.
pub fn run_safe<S, K>(
    source: &mut S,
    sink: &mut K,
    provider: &mut dyn FftProvider,
    settings: &FftSettings,
) -> Result<u64>
where
    S: StereoSource + ?Sized,
    K: ComplexSink + ?Sized,
{
    let samples = source.len();
    check_length(settings.fft_len, samples)?;
    let builder = AnalyticSignalBuilder::new(provider, settings.fft_len, settings.band)?;

    log::info!("Reading and transforming the left channel");
    let left = read_channel(source, settings.fft_len, settings.gain, |f| f.left)?;
    let left = builder.build(left)?;

    let mut spool = Spool::create(settings.scratch_dir.as_deref())?;
    log::info!("Spilling the left channel to disk");
    spool.spill(&left[..samples.min(left.len())])?;
    drop(left);

    log::info!("Reading and transforming the right channel");
    source.rewind()?;
    let right = read_channel(source, settings.fft_len, settings.gain, |f| f.right)?;
    let right = builder.build(right)?;
    drop(builder);

    let mut progress = Progress::new("FFT output", samples as u64);
    {
        let mut reader = spool.replay()?;
        for (n, r) in right.iter().take(samples).enumerate() {
            let l = reader.next_sample()?;
            sink.write(l, *r)?;
            progress.update(n as u64 + 1);
        }
    }
    spool.close()?;
    progress.finish();
    Ok(samples as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemorySource;
    use crate::signal_processing::RustFftProvider;
    use approx::assert_abs_diff_eq;

    fn two_tone_source(frames: usize) -> MemorySource {
        let samples: Vec<i16> = (0..frames)
            .flat_map(|i| {
                let t = i as f64 / 8000.0;
                let l = 8000.0 * (2.0 * std::f64::consts::PI * 440.0 * t).sin();
                let r = 5000.0 * (2.0 * std::f64::consts::PI * 1250.0 * t).cos();
                [l.round() as i16, r.round() as i16]
            })
            .collect();
        MemorySource::from_interleaved(&samples, 8000)
    }

    fn settings(fft_len: usize, parallel: bool) -> FftSettings {
        FftSettings {
            fft_len,
            band: BandRemoval::none(),
            gain: 1.0,
            parallel,
            scratch_dir: None,
        }
    }

    #[test]
    fn test_safe_mode_matches_in_memory() {
        let frames = 1000;
        let mut provider = RustFftProvider::new();

        let mut memory_out: Vec<(Complex64, Complex64)> = Vec::new();
        let n = run_in_memory(&mut two_tone_source(frames), &mut memory_out, &mut provider, &settings(1001, false)).unwrap();
        assert_eq!(n, 1000);

        let mut safe_out: Vec<(Complex64, Complex64)> = Vec::new();
        let n = run_safe(&mut two_tone_source(frames), &mut safe_out, &mut provider, &settings(1001, false)).unwrap();
        assert_eq!(n, 1000);

        assert_eq!(memory_out, safe_out);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut provider = RustFftProvider::new();
        let mut sequential: Vec<(Complex64, Complex64)> = Vec::new();
        run_in_memory(&mut two_tone_source(777), &mut sequential, &mut provider, &settings(778, false)).unwrap();
        let mut parallel: Vec<(Complex64, Complex64)> = Vec::new();
        run_in_memory(&mut two_tone_source(777), &mut parallel, &mut provider, &settings(778, true)).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_real_part_reconstructs_input() {
        let mut provider = RustFftProvider::new();
        let mut source = two_tone_source(501);
        let mut out: Vec<(Complex64, Complex64)> = Vec::new();
        run_in_memory(&mut source, &mut out, &mut provider, &settings(501, false)).unwrap();

        source.rewind().unwrap();
        for (l, r) in &out {
            let frame = source.next_frame().unwrap().unwrap();
            assert_abs_diff_eq!(l.re, frame.left, epsilon = 1e-6);
            assert_abs_diff_eq!(r.re, frame.right, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_scratch_dir_is_used_and_cleaned() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = RustFftProvider::new();
        let mut s = settings(201, false);
        s.scratch_dir = Some(dir.path().to_path_buf());

        let mut out: Vec<(Complex64, Complex64)> = Vec::new();
        run_safe(&mut two_tone_source(200), &mut out, &mut provider, &s).unwrap();
        assert_eq!(out.len(), 200);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_short_fft_length_is_rejected() {
        let mut provider = RustFftProvider::new();
        let mut out: Vec<(Complex64, Complex64)> = Vec::new();
        assert!(run_in_memory(&mut two_tone_source(100), &mut out, &mut provider, &settings(99, false)).is_err());
    }
}
