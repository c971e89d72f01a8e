use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use cwave::cwave::{CwaveHeader, SampleFormat};
use num_complex::Complex64;

/// Interleaved all-zero stereo samples
#[allow(dead_code)]
pub fn silence(frames: usize) -> Vec<i16> {
    vec![0; frames * 2]
}

/// Interleaved stereo sine tones: left = A sin(2 pi f_l t), right = A sin(2 pi f_r t)
#[allow(dead_code)]
pub fn stereo_tone(
    frames: usize,
    sample_rate: u32,
    left_hz: f64,
    right_hz: f64,
    amplitude: f64,
) -> Vec<i16> {
    let mut samples = Vec::with_capacity(frames * 2);
    for n in 0..frames {
        let t = n as f64 / sample_rate as f64;
        samples.push((amplitude * (2.0 * PI * left_hz * t).sin()).round() as i16);
        samples.push((amplitude * (2.0 * PI * right_hz * t).sin()).round() as i16);
    }
    samples
}

/// Save samples as a canonical WAV file inside `dir`
#[allow(dead_code)]
pub fn write_wav(dir: &Path, name: &str, samples: &[i16], sample_rate: u32) -> PathBuf {
    let path = dir.join(name);
    cwave::save_wav(&path, samples, sample_rate).expect("Failed to write WAV fixture");
    path
}

fn take<const N: usize>(reader: &mut impl Read) -> [u8; N] {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).expect("Truncated CWAVE payload");
    buf
}

/// Read a CWAVE file into its header and decoded (left, right) records
#[allow(dead_code)]
pub fn read_cwave(path: &Path) -> (CwaveHeader, Vec<(Complex64, Complex64)>) {
    let mut reader = BufReader::new(File::open(path).expect("Failed to open CWAVE file"));
    let header = CwaveHeader::read_from(&mut reader).expect("Invalid CWAVE header");

    let mut records = Vec::with_capacity(header.samples as usize);
    for _ in 0..header.samples {
        let mut channel = || -> Complex64 {
            match header.format {
                SampleFormat::Float64 => Complex64::new(
                    f64::from_le_bytes(take(&mut reader)),
                    f64::from_le_bytes(take(&mut reader)),
                ),
                SampleFormat::Int16 => Complex64::new(
                    i16::from_le_bytes(take(&mut reader)) as f64,
                    i16::from_le_bytes(take(&mut reader)) as f64,
                ),
                SampleFormat::Int16Float32 => Complex64::new(
                    i16::from_le_bytes(take(&mut reader)) as f64,
                    f32::from_le_bytes(take(&mut reader)) as f64,
                ),
                SampleFormat::Float32 => Complex64::new(
                    f32::from_le_bytes(take(&mut reader)) as f64,
                    f32::from_le_bytes(take(&mut reader)) as f64,
                ),
            }
        };
        let left = channel();
        let right = channel();
        records.push((left, right));
    }

    let mut rest = Vec::new();
    reader.read_to_end(&mut rest).expect("Failed to read CWAVE file");
    assert!(rest.is_empty(), "{} trailing bytes after payload", rest.len());
    (header, records)
}
