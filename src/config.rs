//! Conversion configuration.
//!
//! `ConvertConfig` is the user-facing, partially specified configuration,
//! loadable from TOML and overridden from the command line. `finalize()`
//! validates it once and produces the immutable `ResolvedConfig` the
//! converter runs with.
//!
//! ```toml
//! algorithm = "fft"
//! gain = 0.5
//!
//! [fft]
//! parity = "even"
//! low_band_hz = 21.0
//! high_band_hz = 21000.0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FILTER_ORDER, DEFAULT_GAIN, DEFAULT_KAISER_BETA};
use crate::cwave::SampleFormat;
use crate::error::{CwaveError, Result};
use crate::signal_processing::{ScanOrder, normalize_order};

/// Analytic signal construction method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Streaming Kaiser-windowed Hilbert FIR filter
    #[default]
    Fir,
    /// Whole-file FFT spectral construction
    Fft,
}

/// Parity forced on the FFT length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FftParity {
    #[default]
    Odd,
    Even,
}

impl FftParity {
    /// Transform length for `samples` input samples
    pub fn transform_len(self, samples: usize) -> usize {
        match self {
            FftParity::Odd => samples | 1,
            FftParity::Even => (samples + 1) & !1,
        }
    }
}

/// Hilbert FIR settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FirConfig {
    /// Filter order M; repaired to an even value with an odd half
    pub order: u32,
    /// Kaiser window shape parameter
    pub beta: f64,
    pub scan: ScanOrder,
    /// Drop the first M/2 outputs so output lines up with input
    pub compensate_delay: bool,
}

impl Default for FirConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_FILTER_ORDER,
            beta: DEFAULT_KAISER_BETA,
            scan: ScanOrder::default(),
            compensate_delay: true,
        }
    }
}

/// FFT path settings
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct FftConfig {
    pub parity: FftParity,
    /// Spill the left channel to disk to bound peak memory
    pub safe_mode: bool,
    /// Remove spectrum from 0 Hz up to this frequency
    pub low_band_hz: Option<f64>,
    /// Remove spectrum from this frequency up to Nyquist
    pub high_band_hz: Option<f64>,
    /// Directory for the safe-mode scratch file (system temp dir if unset)
    pub scratch_dir: Option<PathBuf>,
}

/// Conversion configuration before validation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub algorithm: Algorithm,
    pub fir: FirConfig,
    pub fft: FftConfig,
    /// Input sample multiplier
    pub gain: f64,
    /// Worker threads; 1 forces single-threaded processing
    pub threads: Option<usize>,
    /// Output encoding; defaults depend on the algorithm
    pub format: Option<SampleFormat>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            fir: FirConfig::default(),
            fft: FftConfig::default(),
            gain: DEFAULT_GAIN,
            threads: None,
            format: None,
        }
    }
}

impl ConvertConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CwaveError::Config(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Validate and fill in defaults
    ///
    /// # Errors
    /// `CwaveError::Config` for a zero order, negative beta, non-positive
    /// gain, negative band edges, or an empty FFT pass band.
    pub fn finalize(self) -> Result<ResolvedConfig> {
        if self.fir.order == 0 {
            return Err(CwaveError::Config("filter order must be positive".into()));
        }
        if !(self.fir.beta >= 0.0) {
            return Err(CwaveError::Config(format!(
                "Kaiser beta must be non-negative, got {}",
                self.fir.beta
            )));
        }
        if !(self.gain > 0.0) {
            return Err(CwaveError::Config(format!(
                "gain must be positive, got {}",
                self.gain
            )));
        }
        if let Some(low) = self.fft.low_band_hz {
            if !(low >= 0.0) {
                return Err(CwaveError::Config(format!(
                    "low band edge must be non-negative, got {} Hz",
                    low
                )));
            }
        }
        if let Some(high) = self.fft.high_band_hz {
            if !(high > 0.0) {
                return Err(CwaveError::Config(format!(
                    "high band edge must be positive, got {} Hz",
                    high
                )));
            }
        }

        let mut fir = self.fir;
        let mut fft = self.fft;
        match self.algorithm {
            Algorithm::Fir => {
                fir.order = normalize_order(fir.order)?;
                if fft.low_band_hz.is_some() || fft.high_band_hz.is_some() {
                    log::warn!("Band filtering is available in FFT mode only, ignored");
                    fft.low_band_hz = None;
                    fft.high_band_hz = None;
                }
            }
            Algorithm::Fft => {
                if let (Some(low), Some(high)) = (fft.low_band_hz, fft.high_band_hz) {
                    if low >= high {
                        return Err(CwaveError::Config(format!(
                            "low band edge ({} Hz) must be below the high edge ({} Hz)",
                            low, high
                        )));
                    }
                }
            }
        }

        let format = self.format.unwrap_or(match self.algorithm {
            Algorithm::Fir => SampleFormat::Int16Float32,
            Algorithm::Fft => SampleFormat::Float32,
        });
        let threads = self
            .threads
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, |n| n.get()))
            .max(1);

        Ok(ResolvedConfig {
            algorithm: self.algorithm,
            fir,
            fft,
            gain: self.gain,
            threads,
            format,
        })
    }
}

/// Validated, immutable conversion configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    algorithm: Algorithm,
    fir: FirConfig,
    fft: FftConfig,
    gain: f64,
    threads: usize,
    format: SampleFormat,
}

impl ResolvedConfig {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn fir(&self) -> &FirConfig {
        &self.fir
    }

    pub fn fft(&self) -> &FftConfig {
        &self.fft
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }
}
