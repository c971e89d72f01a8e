use std::io::Read;
use std::path::Path;

use hound::{WavSpec, WavWriter};

use crate::constants::WAV_HEADER_SIZE;
use crate::error::{CwaveError, Result};

/// Bytes per stereo 16-bit frame
pub const WAV_FRAME_SIZE: usize = 4;

/// Fields of a canonical 16-bit stereo PCM WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub sample_rate: u32,
    /// Stereo frames in the data chunk
    pub frames: u32,
}

impl WavHeader {
    /// Parse a canonical 44-byte header
    ///
    /// Only a plain RIFF/WAVE file whose `fmt ` chunk is 16 bytes of 16-bit
    /// stereo PCM, immediately followed by the `data` chunk, is accepted.
    pub fn parse(buf: &[u8; WAV_HEADER_SIZE]) -> Result<Self> {
        const FMT: &[u8; 16] = b"WAVEfmt \x10\x00\x00\x00\x01\x00\x02\x00";
        const DATA: &[u8; 8] = b"\x04\x00\x10\x00data";

        if &buf[0..4] != b"RIFF" || &buf[8..24] != FMT || &buf[32..40] != DATA {
            return Err(CwaveError::Format(
                "invalid or unsupported WAVE file, only 16-bit stereo PCM in canonical form is allowed"
                    .into(),
            ));
        }
        let sample_rate = u32::from_le_bytes([buf[24], buf[25], buf[26], buf[27]]);
        let data_size = u32::from_le_bytes([buf[40], buf[41], buf[42], buf[43]]);
        Ok(Self {
            sample_rate,
            frames: data_size / WAV_FRAME_SIZE as u32,
        })
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; WAV_HEADER_SIZE];
        reader.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                CwaveError::Format("WAVE file is shorter than its header".into())
            } else {
                CwaveError::Io(e)
            }
        })?;
        Self::parse(&buf)
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Map a decoder error onto the crate taxonomy
pub fn wav_error(err: hound::Error) -> CwaveError {
    match err {
        hound::Error::IoError(e) => CwaveError::Io(e),
        other => CwaveError::Format(format!("WAVE decoding failed: {}", other)),
    }
}

/// Write interleaved 16-bit stereo samples as a canonical WAV file
pub fn save_wav<P: AsRef<Path>>(
    path: P,
    samples: &[i16],
    sample_rate: u32,
) -> std::result::Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;

    for &sample in samples {
        writer.write_sample(sample)?;
    }

    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_saved_wav_has_canonical_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        save_wav(&path, &[1, -1, 2, -2, 3, -3], 22_050).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_SIZE + 12);
        let header = WavHeader::read_from(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(header.sample_rate, 22_050);
        assert_eq!(header.frames, 3);
        assert_eq!(i16::from_le_bytes([bytes[46], bytes[47]]), -1);
    }

    #[test]
    fn test_rejects_non_canonical_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(matches!(
            WavHeader::read_from(&mut Cursor::new(&bytes)),
            Err(CwaveError::Format(_))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let bytes = b"RIFF\x00\x00".to_vec();
        assert!(matches!(
            WavHeader::read_from(&mut Cursor::new(bytes)),
            Err(CwaveError::Format(_))
        ));
    }

    #[test]
    fn test_decoder_errors_map_to_taxonomy() {
        let io = hound::Error::IoError(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
        assert!(matches!(wav_error(io), CwaveError::Io(_)));
        assert!(matches!(
            wav_error(hound::Error::FormatError("no data chunk")),
            CwaveError::Format(_)
        ));
    }
}
