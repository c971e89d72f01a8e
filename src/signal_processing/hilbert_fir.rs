use std::sync::Arc;

use num_complex::Complex64;

use crate::signal_processing::kaiser::FilterTaps;

/// Memory scan order of the Hilbert FIR delay line
///
/// Both orders produce bit-identical output; they only differ in which
/// direction the convolution walks memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOrder {
    /// Write index moves forward, past samples are read backward
    #[default]
    Reverse,
    /// Write index moves backward, past samples are read forward
    Direct,
}

/// Streaming Hilbert FIR for one channel
///
/// Holds a circular delay line of M samples. Each input produces one analytic
/// sample: the real part is the input delayed by M/2 samples, the imaginary
/// part the Hilbert FIR output.
pub struct HilbertFir {
    taps: Arc<FilterTaps>,
    delay_line: Vec<f64>,
    pos: usize,
    delayed_pos: usize,
    scan: ScanOrder,
}

impl HilbertFir {
    pub fn new(taps: Arc<FilterTaps>, scan: ScanOrder) -> Self {
        let order = taps.spec().order();
        let delay = taps.spec().delay();
        let (pos, delayed_pos) = match scan {
            ScanOrder::Reverse => (0, delay),
            ScanOrder::Direct => (order - 1, delay - 1),
        };
        Self {
            taps,
            delay_line: vec![0.0; order],
            pos,
            delayed_pos,
            scan,
        }
    }

    /// Process a single sample, returning (in-phase, quadrature) as a complex value
    #[inline]
    pub fn process(&mut self, sample: f64) -> Complex64 {
        match self.scan {
            ScanOrder::Reverse => self.step_reverse(sample),
            ScanOrder::Direct => self.step_direct(sample),
        }
    }

    /// Process a block of samples into parallel real/imaginary outputs
    pub fn process_block(&mut self, input: &[f64], re: &mut [f64], im: &mut [f64]) {
        debug_assert!(re.len() >= input.len() && im.len() >= input.len());
        match self.scan {
            ScanOrder::Reverse => self.fill_block(input, re, im, Self::step_reverse),
            ScanOrder::Direct => self.fill_block(input, re, im, Self::step_direct),
        }
    }

    fn fill_block<F>(&mut self, input: &[f64], re: &mut [f64], im: &mut [f64], step: F)
    where
        F: Fn(&mut Self, f64) -> Complex64,
    {
        for ((&s, r), i) in input.iter().zip(re.iter_mut()).zip(im.iter_mut()) {
            let out = step(self, s);
            *r = out.re;
            *i = out.im;
        }
    }

    /// Group delay in samples
    pub fn delay(&self) -> usize {
        self.taps.spec().delay()
    }

    fn step_reverse(&mut self, sample: f64) -> Complex64 {
        let order = self.delay_line.len();
        let taps = self.taps.taps();

        let mut hilb = sample * taps[0];
        let mut ix = self.pos;
        for &tap in &taps[1..] {
            ix = if ix < 2 { ix + order - 2 } else { ix - 2 };
            hilb += self.delay_line[ix] * tap;
        }

        let real = self.delay_line[self.delayed_pos];
        self.delay_line[self.pos] = sample;

        self.pos += 1;
        if self.pos == order {
            self.pos = 0;
        }
        self.delayed_pos += 1;
        if self.delayed_pos == order {
            self.delayed_pos = 0;
        }
        Complex64::new(real, hilb)
    }

    fn step_direct(&mut self, sample: f64) -> Complex64 {
        let order = self.delay_line.len();
        let taps = self.taps.taps();

        let mut hilb = sample * taps[0];
        let mut ix = self.pos;
        for &tap in &taps[1..] {
            ix += 2;
            if ix >= order {
                ix -= order;
            }
            hilb += self.delay_line[ix] * tap;
        }

        let real = self.delay_line[self.delayed_pos];
        self.delay_line[self.pos] = sample;

        self.pos = if self.pos == 0 { order - 1 } else { self.pos - 1 };
        self.delayed_pos = if self.delayed_pos == 0 {
            order - 1
        } else {
            self.delayed_pos - 1
        };
        Complex64::new(real, hilb)
    }
}
