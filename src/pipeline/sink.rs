use std::io::Write;

use num_complex::Complex64;

use crate::cwave::SampleEncoder;
use crate::error::Result;

/// Consumer of stereo analytic samples, in output order
pub trait ComplexSink {
    fn write(&mut self, left: Complex64, right: Complex64) -> Result<()>;
}

impl<W: Write> ComplexSink for SampleEncoder<W> {
    fn write(&mut self, left: Complex64, right: Complex64) -> Result<()> {
        self.write_record(left, right)
    }
}

/// Collects samples in memory
impl ComplexSink for Vec<(Complex64, Complex64)> {
    fn write(&mut self, left: Complex64, right: Complex64) -> Result<()> {
        self.push((left, right));
        Ok(())
    }
}
