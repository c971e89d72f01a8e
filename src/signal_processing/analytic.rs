//! FFT-based analytic signal construction.
//!
//! The forward real transform yields the non-negative half of the spectrum.
//! Doubling the positive bins, keeping DC once, and dropping the negative
//! frequencies gives the spectrum of the analytic signal; the inverse
//! transform then returns x(n) + j H{x}(n).

use num_complex::Complex64;

use crate::error::Result;
use crate::signal_processing::fft::{FftProvider, ForwardPlan, InversePlan};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Spectral band removal expressed in FFT bins
///
/// `low_bins` removes bins [0, low_bins); `high_bin` removes bins from
/// `high_bin` up to the last positive-frequency bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BandRemoval {
    pub low_bins: Option<usize>,
    pub high_bin: Option<usize>,
}

impl BandRemoval {
    /// No band removal
    pub fn none() -> Self {
        Self::default()
    }

    /// Convert pass-band edges in Hz into bin bounds for an FFT of `fft_len` points
    ///
    /// Edges at or above the Nyquist frequency are dropped with a warning.
    pub fn resolve(
        fft_len: usize,
        sample_rate: u32,
        low_hz: Option<f64>,
        high_hz: Option<f64>,
    ) -> Self {
        if low_hz.is_none() && high_hz.is_none() {
            return Self::none();
        }

        let nyquist = sample_rate as f64 / 2.0;
        let low_hz = low_hz.filter(|&f| {
            if f >= nyquist {
                log::warn!("Low pass-band edge {} Hz is too high, ignored", f);
                false
            } else {
                true
            }
        });
        let high_hz = high_hz.filter(|&f| {
            if f >= nyquist {
                log::warn!("High pass-band edge {} Hz is too high, ignored", f);
                false
            } else {
                true
            }
        });
        if low_hz.is_none() && high_hz.is_none() {
            log::warn!("FFT band filter disabled");
            return Self::none();
        }

        let fres = frequency_resolution(fft_len, sample_rate);
        Self {
            low_bins: low_hz.map(|f| (fres * f).floor() as usize),
            high_bin: high_hz.map(|f| (fres * f).floor() as usize),
        }
    }

    pub fn is_active(&self) -> bool {
        self.low_bins.is_some() || self.high_bin.is_some()
    }

    /// Effective pass band in Hz after rounding the edges down to whole bins
    pub fn pass_band_hz(&self, fft_len: usize, sample_rate: u32) -> (f64, f64) {
        let fres = frequency_resolution(fft_len, sample_rate);
        (
            self.low_bins.map_or(0.0, |b| b as f64 / fres),
            self.high_bin
                .map_or(sample_rate as f64 / 2.0, |b| b as f64 / fres),
        )
    }
}

/// Bins per Hz for an FFT of `fft_len` points
fn frequency_resolution(fft_len: usize, sample_rate: u32) -> f64 {
    fft_len as f64 / sample_rate as f64
}

/// Number of bins holding DC and the strictly positive frequencies below Nyquist
pub fn positive_bins(fft_len: usize) -> usize {
    fft_len.div_ceil(2)
}

/// Turn a full-length buffer holding the forward half-spectrum in its first
/// N/2 + 1 bins into the normalised analytic-signal spectrum, in place
///
/// Positive bins are scaled by 2/N, DC by 1/N with its imaginary part cleared,
/// negative frequencies and (for even N) the Nyquist bin are zeroed. Band
/// removal is applied last.
pub fn shape_spectrum(spectrum: &mut [Complex64], band: &BandRemoval) {
    let n = spectrum.len();
    if n == 0 {
        return;
    }
    let positive = positive_bins(n);
    let mid = n / 2;
    let norm = 2.0 / n as f64;

    for bin in &mut spectrum[1..positive] {
        *bin *= norm;
    }
    spectrum[0] = Complex64::new(spectrum[0].re / n as f64, 0.0);
    spectrum[mid + 1..].fill(ZERO);
    if n % 2 == 0 {
        spectrum[mid] = ZERO;
    }

    if let Some(low) = band.low_bins {
        spectrum[..low.min(positive)].fill(ZERO);
    }
    if let Some(high) = band.high_bin {
        if high < positive {
            spectrum[high..positive].fill(ZERO);
        }
    }
}

/// Analytic signal builder for one transform length
///
/// Holds the forward and inverse plans; each `build` call converts one
/// channel.
pub struct AnalyticSignalBuilder {
    fft_len: usize,
    forward: Box<dyn ForwardPlan>,
    inverse: Box<dyn InversePlan>,
    band: BandRemoval,
}

impl AnalyticSignalBuilder {
    pub fn new(provider: &mut dyn FftProvider, fft_len: usize, band: BandRemoval) -> Result<Self> {
        log::info!("Creating FFT plans for {} points ({})", fft_len, provider.name());
        let forward = provider.plan_forward(fft_len)?;
        let inverse = provider.plan_inverse(fft_len)?;
        Ok(Self {
            fft_len,
            forward,
            inverse,
            band,
        })
    }

    /// Convert one channel
    ///
    /// `samples` is zero-padded or truncated to the transform length and
    /// consumed. Returns the full-length analytic signal.
    pub fn build(&self, mut samples: Vec<f64>) -> Result<Vec<Complex64>> {
        samples.resize(self.fft_len, 0.0);

        let mut spectrum = vec![ZERO; self.fft_len];
        let half = self.fft_len / 2 + 1;
        self.forward.execute(&mut samples, &mut spectrum[..half])?;
        drop(samples);

        shape_spectrum(&mut spectrum, &self.band);
        self.inverse.execute(&mut spectrum)?;
        Ok(spectrum)
    }
}
