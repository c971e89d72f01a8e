//! Defaults and fixed sizes shared across the converter.

/// Default Hilbert FIR filter order (M). M/2 is odd.
pub const DEFAULT_FILTER_ORDER: u32 = 140_002;

/// Default Kaiser window shape parameter.
pub const DEFAULT_KAISER_BETA: f64 = 2.629;

/// Default input gain multiplier.
pub const DEFAULT_GAIN: f64 = 1.0;

/// Samples per channel handed to a FIR worker in one handshake cycle.
pub const CHUNK_SAMPLES: usize = 512;

/// Size of the canonical PCM WAV header accepted on input.
pub const WAV_HEADER_SIZE: usize = 44;

/// Size of the on-disk CWAVE header (V1 and V2).
pub const CWAVE_HEADER_SIZE: u32 = 48;

/// 16-bit integer sample range.
pub const INT16_MIN: i64 = i16::MIN as i64;
pub const INT16_MAX: i64 = i16::MAX as i64;
