use std::io::{Read, Seek, SeekFrom, Write};

use serde::Serialize;

use crate::constants::CWAVE_HEADER_SIZE;
use crate::cwave::format::SampleFormat;
use crate::error::{CwaveError, Result};

pub const CWAVE_MAGIC: [u8; 8] = *b"cPLXwAVE";

/// Filter order field value marking FFT-produced data
pub const FFT_FILTER_ORDER: i32 = -1;

/// Fewest samples a valid CWAVE file can hold
pub const MIN_CWAVE_SAMPLES: u32 = 2;

/// CWAVE header revision
///
/// `Bad` is the placeholder written before the payload; a completed run
/// always rewrites it with `V2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderVersion {
    Bad = 0,
    V1 = 1,
    V2 = 2,
}

impl HeaderVersion {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Bad),
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            _ => None,
        }
    }
}

/// 48-byte little-endian CWAVE file header
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CwaveHeader {
    pub version: HeaderVersion,
    pub format: SampleFormat,
    pub channels: u32,
    pub samples: u32,
    pub sample_rate: u32,
    pub filter_order: i32,
    pub crc: u32,
    pub beta: f64,
}

impl CwaveHeader {
    /// Placeholder header written before any payload
    pub fn placeholder(
        format: SampleFormat,
        samples: u32,
        sample_rate: u32,
        filter_order: i32,
        beta: f64,
    ) -> Self {
        Self {
            version: HeaderVersion::Bad,
            format,
            channels: 2,
            samples,
            sample_rate,
            filter_order,
            crc: 0,
            beta,
        }
    }

    /// Mark the header complete with the final payload checksum
    pub fn complete(mut self, crc: u32) -> Self {
        self.version = HeaderVersion::V2;
        self.crc = crc;
        self
    }

    pub fn is_fft(&self) -> bool {
        self.filter_order == FFT_FILTER_ORDER
    }

    pub fn encode(&self) -> [u8; CWAVE_HEADER_SIZE as usize] {
        let mut buf = [0u8; CWAVE_HEADER_SIZE as usize];
        buf[0..8].copy_from_slice(&CWAVE_MAGIC);
        buf[8..12].copy_from_slice(&CWAVE_HEADER_SIZE.to_le_bytes());
        buf[12..16].copy_from_slice(&(self.version as u32).to_le_bytes());
        buf[16..20].copy_from_slice(&(self.format as u32).to_le_bytes());
        buf[20..24].copy_from_slice(&self.channels.to_le_bytes());
        buf[24..28].copy_from_slice(&self.samples.to_le_bytes());
        buf[28..32].copy_from_slice(&self.sample_rate.to_le_bytes());
        buf[32..36].copy_from_slice(&self.filter_order.to_le_bytes());
        buf[36..40].copy_from_slice(&self.crc.to_le_bytes());
        buf[40..48].copy_from_slice(&self.beta.to_le_bytes());
        buf
    }

    /// Parse and validate a header
    ///
    /// # Errors
    /// `CwaveError::Format` for a wrong magic or header size, an unknown or
    /// incomplete version, a channel count other than 2, fewer than 2
    /// samples, or an unknown sample format code.
    pub fn decode(buf: &[u8; CWAVE_HEADER_SIZE as usize]) -> Result<Self> {
        let u32_at = |off: usize| u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]]);

        if buf[0..8] != CWAVE_MAGIC {
            return Err(CwaveError::Format("not a CWAVE file (bad magic)".into()));
        }
        let hsize = u32_at(8);
        if hsize != CWAVE_HEADER_SIZE {
            return Err(CwaveError::Format(format!(
                "unsupported CWAVE header size {}",
                hsize
            )));
        }
        let version = match HeaderVersion::from_code(u32_at(12)) {
            Some(HeaderVersion::Bad) => {
                return Err(CwaveError::Format(
                    "CWAVE file is incomplete (header never finalised)".into(),
                ));
            }
            Some(v) => v,
            None => {
                return Err(CwaveError::Format(format!(
                    "unknown CWAVE version {}",
                    u32_at(12)
                )));
            }
        };
        let format = SampleFormat::from_code(u32_at(16)).ok_or_else(|| {
            CwaveError::Format(format!("unknown CWAVE sample format {}", u32_at(16)))
        })?;
        let channels = u32_at(20);
        if channels != 2 {
            return Err(CwaveError::Format(format!(
                "CWAVE file has {} channels, expected 2",
                channels
            )));
        }
        let samples = u32_at(24);
        if samples < MIN_CWAVE_SAMPLES {
            return Err(CwaveError::Format(format!(
                "CWAVE file holds only {} samples",
                samples
            )));
        }

        let mut beta = [0u8; 8];
        beta.copy_from_slice(&buf[40..48]);
        Ok(Self {
            version,
            format,
            channels,
            samples,
            sample_rate: u32_at(28),
            filter_order: u32_at(32) as i32,
            crc: u32_at(36),
            beta: f64::from_le_bytes(beta),
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.encode())?;
        Ok(())
    }

    /// Seek to the start of the file and overwrite the header in place
    pub fn rewrite<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        writer.seek(SeekFrom::Start(0))?;
        self.write_to(writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; CWAVE_HEADER_SIZE as usize];
        reader.read_exact(&mut buf)?;
        Self::decode(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_header() -> CwaveHeader {
        CwaveHeader::placeholder(SampleFormat::Int16Float32, 88_200, 44_100, 140_002, 2.629)
            .complete(0xCBF4_3926)
    }

    #[test]
    fn test_write_then_read_reproduces_fields() {
        let header = sample_header();
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), 48);

        let decoded = CwaveHeader::read_from(&mut Cursor::new(buf)).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_layout() {
        let bytes = sample_header().encode();
        assert_eq!(&bytes[0..8], b"cPLXwAVE");
        assert_eq!(&bytes[8..12], &48u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &2u32.to_le_bytes());
        assert_eq!(&bytes[16..20], &2u32.to_le_bytes());
        assert_eq!(&bytes[32..36], &140_002i32.to_le_bytes());
        assert_eq!(&bytes[40..48], &2.629f64.to_le_bytes());
    }

    #[test]
    fn test_fft_header_order() {
        let header = CwaveHeader::placeholder(SampleFormat::Float32, 10, 8000, FFT_FILTER_ORDER, 0.0);
        assert!(header.is_fft());
        let bytes = header.complete(1).encode();
        assert_eq!(&bytes[32..36], &[0xff; 4]);
    }

    #[test]
    fn test_placeholder_is_rejected() {
        let header = CwaveHeader::placeholder(SampleFormat::Float64, 100, 44_100, 6, 1.0);
        let err = CwaveHeader::decode(&header.encode()).unwrap_err();
        assert!(matches!(err, CwaveError::Format(msg) if msg.contains("incomplete")));
    }

    #[test]
    fn test_invalid_headers_are_rejected() {
        let good = sample_header().encode();

        let mut bad_magic = good;
        bad_magic[0] = b'C';
        assert!(CwaveHeader::decode(&bad_magic).is_err());

        let mut bad_size = good;
        bad_size[8] = 44;
        assert!(CwaveHeader::decode(&bad_size).is_err());

        let mut bad_version = good;
        bad_version[12] = 3;
        assert!(CwaveHeader::decode(&bad_version).is_err());

        let mut bad_format = good;
        bad_format[16] = 4;
        assert!(CwaveHeader::decode(&bad_format).is_err());

        let mut mono = good;
        mono[20] = 1;
        assert!(CwaveHeader::decode(&mono).is_err());

        let mut short = good;
        short[24..28].copy_from_slice(&1u32.to_le_bytes());
        assert!(CwaveHeader::decode(&short).is_err());
    }

    #[test]
    fn test_rewrite_in_place() {
        let mut file = Cursor::new(Vec::new());
        let placeholder = CwaveHeader::placeholder(SampleFormat::Int16, 4, 8000, 6, 1.5);
        placeholder.write_to(&mut file).unwrap();
        file.write_all(&[1, 2, 3, 4]).unwrap();

        placeholder.complete(0xDEAD_BEEF).rewrite(&mut file).unwrap();
        let bytes = file.into_inner();
        assert_eq!(bytes.len(), 52);
        assert_eq!(&bytes[48..], &[1, 2, 3, 4]);

        let decoded = CwaveHeader::read_from(&mut Cursor::new(&bytes[..48])).unwrap();
        assert_eq!(decoded.version, HeaderVersion::V2);
        assert_eq!(decoded.crc, 0xDEAD_BEEF);
    }
}
