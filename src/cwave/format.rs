use std::io::Write;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::constants::{INT16_MAX, INT16_MIN};
use crate::cwave::crc32::Crc32;
use crate::error::Result;

/// On-disk encoding of one payload record (L-real, L-imag, R-real, R-imag)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SampleFormat {
    /// Paired 64-bit floats
    Float64 = 0,
    /// Paired 16-bit integers
    Int16 = 1,
    /// 16-bit integer real part with 32-bit float imaginary part
    Int16Float32 = 2,
    /// Paired 32-bit floats
    Float32 = 3,
}

impl SampleFormat {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Float64),
            1 => Some(Self::Int16),
            2 => Some(Self::Int16Float32),
            3 => Some(Self::Float32),
            _ => None,
        }
    }

    /// Bytes per stereo record
    pub fn record_size(self) -> usize {
        match self {
            Self::Float64 => 32,
            Self::Int16 => 8,
            Self::Int16Float32 => 12,
            Self::Float32 => 16,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Float64 => "64-bit float",
            Self::Int16 => "16-bit integer",
            Self::Int16Float32 => "16-bit integer + 32-bit float",
            Self::Float32 => "32-bit float",
        }
    }
}

impl std::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Algorithm that produced the samples being encoded
///
/// FIR real parts are verbatim delayed input samples and are truncated when
/// stored as integers; everything else rounds to nearest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Producer {
    Fir,
    Fft,
}

/// Number of integer fields clipped to the 16-bit range, per channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClipCounters {
    pub left: u64,
    pub right: u64,
}

impl ClipCounters {
    pub fn total(&self) -> u64 {
        self.left + self.right
    }
}

const MAX_RECORD_SIZE: usize = 32;

fn to_i16(value: f64, truncate: bool, clips: &mut u64) -> i16 {
    let v = if truncate { value.trunc() } else { value.round() };
    if v > INT16_MAX as f64 {
        *clips += 1;
        i16::MAX
    } else if v < INT16_MIN as f64 {
        *clips += 1;
        i16::MIN
    } else {
        v as i16
    }
}

/// Encode one channel's sample into `out`, returning the bytes used
fn encode_channel(
    format: SampleFormat,
    producer: Producer,
    z: Complex64,
    clips: &mut u64,
    out: &mut [u8],
) -> usize {
    let truncate_re = producer == Producer::Fir;
    match format {
        SampleFormat::Float64 => {
            out[0..8].copy_from_slice(&z.re.to_le_bytes());
            out[8..16].copy_from_slice(&z.im.to_le_bytes());
            16
        }
        SampleFormat::Int16 => {
            out[0..2].copy_from_slice(&to_i16(z.re, truncate_re, clips).to_le_bytes());
            out[2..4].copy_from_slice(&to_i16(z.im, false, clips).to_le_bytes());
            4
        }
        SampleFormat::Int16Float32 => {
            out[0..2].copy_from_slice(&to_i16(z.re, truncate_re, clips).to_le_bytes());
            out[2..6].copy_from_slice(&(z.im as f32).to_le_bytes());
            6
        }
        SampleFormat::Float32 => {
            out[0..4].copy_from_slice(&(z.re as f32).to_le_bytes());
            out[4..8].copy_from_slice(&(z.im as f32).to_le_bytes());
            8
        }
    }
}

/// Encode a stereo record into `out`, returning the record length
pub fn encode_record(
    format: SampleFormat,
    producer: Producer,
    left: Complex64,
    right: Complex64,
    clips: &mut ClipCounters,
    out: &mut [u8],
) -> usize {
    let n = encode_channel(format, producer, left, &mut clips.left, out);
    n + encode_channel(format, producer, right, &mut clips.right, &mut out[n..])
}

/// Writes payload records, keeping the running CRC and clip statistics
pub struct SampleEncoder<W: Write> {
    writer: W,
    format: SampleFormat,
    producer: Producer,
    crc: Crc32,
    clips: ClipCounters,
    records: u64,
}

impl<W: Write> SampleEncoder<W> {
    pub fn new(writer: W, format: SampleFormat, producer: Producer) -> Self {
        Self {
            writer,
            format,
            producer,
            crc: Crc32::new(),
            clips: ClipCounters::default(),
            records: 0,
        }
    }

    pub fn write_record(&mut self, left: Complex64, right: Complex64) -> Result<()> {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        let n = encode_record(
            self.format,
            self.producer,
            left,
            right,
            &mut self.clips,
            &mut buf,
        );
        self.writer.write_all(&buf[..n])?;
        self.crc.update(&buf[..n]);
        self.records += 1;
        Ok(())
    }

    /// Flush and hand back the writer
    pub fn finish(mut self) -> Result<EncodedPayload<W>> {
        self.writer.flush()?;
        Ok(EncodedPayload {
            crc: self.crc.finalize(),
            clips: self.clips,
            records: self.records,
            writer: self.writer,
        })
    }
}

/// Result of a completed payload
pub struct EncodedPayload<W> {
    pub writer: W,
    pub crc: u32,
    pub clips: ClipCounters,
    pub records: u64,
}
