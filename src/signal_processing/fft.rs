//! FFT provider used by the spectral analytic-signal builder.
//!
//! The builder only needs two transforms: a real-to-complex forward DFT and a
//! complex-to-complex inverse DFT, both unnormalised and of arbitrary positive
//! length. Planning and execution are fallible; a failure aborts the run.

use std::sync::Arc;

use num_complex::Complex64;
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};

use crate::error::{CwaveError, Result};

/// Real-to-complex forward transform of a fixed length
pub trait ForwardPlan: Send + Sync {
    /// Transform length N
    fn len(&self) -> usize;

    /// Transform `input` (N values, used as scratch) into N/2 + 1 bins
    fn execute(&self, input: &mut [f64], output: &mut [Complex64]) -> Result<()>;
}

/// Complex-to-complex inverse transform of a fixed length, in place
pub trait InversePlan: Send + Sync {
    fn len(&self) -> usize;

    fn execute(&self, buffer: &mut [Complex64]) -> Result<()>;
}

/// Source of transform plans
///
/// Dropping a plan releases it.
pub trait FftProvider {
    fn plan_forward(&mut self, len: usize) -> Result<Box<dyn ForwardPlan>>;
    fn plan_inverse(&mut self, len: usize) -> Result<Box<dyn InversePlan>>;

    /// Short description for logs
    fn name(&self) -> &'static str;
}

/// FFT provider backed by `realfft` / `rustfft`
pub struct RustFftProvider {
    real_planner: RealFftPlanner<f64>,
    complex_planner: FftPlanner<f64>,
}

impl RustFftProvider {
    pub fn new() -> Self {
        Self {
            real_planner: RealFftPlanner::new(),
            complex_planner: FftPlanner::new(),
        }
    }
}

impl Default for RustFftProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FftProvider for RustFftProvider {
    fn plan_forward(&mut self, len: usize) -> Result<Box<dyn ForwardPlan>> {
        check_plan_length(len)?;
        Ok(Box::new(RealForward {
            r2c: self.real_planner.plan_fft_forward(len),
        }))
    }

    fn plan_inverse(&mut self, len: usize) -> Result<Box<dyn InversePlan>> {
        check_plan_length(len)?;
        Ok(Box::new(ComplexInverse {
            fft: self.complex_planner.plan_fft_inverse(len),
        }))
    }

    fn name(&self) -> &'static str {
        "rustfft"
    }
}

fn check_plan_length(len: usize) -> Result<()> {
    if len == 0 {
        return Err(CwaveError::Resource(
            "cannot create an FFT plan of length 0".into(),
        ));
    }
    Ok(())
}

struct RealForward {
    r2c: Arc<dyn RealToComplex<f64>>,
}

impl ForwardPlan for RealForward {
    fn len(&self) -> usize {
        self.r2c.len()
    }

    fn execute(&self, input: &mut [f64], output: &mut [Complex64]) -> Result<()> {
        self.r2c
            .process(input, output)
            .map_err(|e| CwaveError::Resource(format!("forward FFT failed: {}", e)))
    }
}

struct ComplexInverse {
    fft: Arc<dyn Fft<f64>>,
}

impl InversePlan for ComplexInverse {
    fn len(&self) -> usize {
        self.fft.len()
    }

    fn execute(&self, buffer: &mut [Complex64]) -> Result<()> {
        if buffer.len() != self.fft.len() {
            return Err(CwaveError::Resource(format!(
                "inverse FFT buffer has {} points, plan expects {}",
                buffer.len(),
                self.fft.len()
            )));
        }
        self.fft.process(buffer);
        Ok(())
    }
}
