//! CWAVE integrity verification.
//!
//! The whole payload is always scanned so the true CRC can be reported even
//! when it disagrees with the header.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;

use crate::cwave::{Crc32, CwaveHeader, HeaderVersion};
use crate::error::Result;

const READ_BLOCK: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyOutcome {
    Match { crc: u32 },
    Mismatch { stored: u32, computed: u32 },
    /// Version 1 files carry no checksum
    NoChecksum { computed: u32 },
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub header: CwaveHeader,
    pub payload_bytes: u64,
    pub outcome: VerifyOutcome,
}

impl VerifyReport {
    /// True unless the stored and computed checksums disagree
    pub fn is_intact(&self) -> bool {
        !matches!(self.outcome, VerifyOutcome::Mismatch { .. })
    }
}

/// Verify a CWAVE stream positioned at its header
pub fn verify_reader<R: Read>(reader: &mut R) -> Result<VerifyReport> {
    let header = CwaveHeader::read_from(reader)?;
    let payload_bytes = header.samples as u64 * header.format.record_size() as u64;

    let mut crc = Crc32::new();
    let mut buf = vec![0u8; READ_BLOCK];
    let mut remaining = payload_bytes;
    while remaining > 0 {
        let n = remaining.min(READ_BLOCK as u64) as usize;
        reader.read_exact(&mut buf[..n])?;
        crc.update(&buf[..n]);
        remaining -= n as u64;
    }
    let computed = crc.finalize();

    let outcome = match header.version {
        HeaderVersion::V1 => VerifyOutcome::NoChecksum { computed },
        _ if computed == header.crc => VerifyOutcome::Match { crc: computed },
        _ => VerifyOutcome::Mismatch {
            stored: header.crc,
            computed,
        },
    };
    if let VerifyOutcome::Mismatch { stored, computed } = outcome {
        log::warn!(
            "CRC mismatch: header {:08X}, payload {:08X}",
            stored,
            computed
        );
    }

    Ok(VerifyReport {
        header,
        payload_bytes,
        outcome,
    })
}

/// Verify a CWAVE file
pub fn verify<P: AsRef<Path>>(path: P) -> Result<VerifyReport> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    verify_reader(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cwave::crc32::checksum;
    use crate::cwave::{FFT_FILTER_ORDER, SampleFormat};
    use crate::error::CwaveError;
    use std::io::Cursor;

    fn file_with_payload(payload: &[u8], crc: u32, version: HeaderVersion) -> Vec<u8> {
        let mut header = CwaveHeader::placeholder(
            SampleFormat::Int16,
            (payload.len() / 8) as u32,
            8000,
            FFT_FILTER_ORDER,
            0.0,
        )
        .complete(crc);
        header.version = version;
        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_matching_crc() {
        let payload: Vec<u8> = (0..80).collect();
        let bytes = file_with_payload(&payload, checksum(&payload), HeaderVersion::V2);
        let report = verify_reader(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(report.outcome, VerifyOutcome::Match { crc: checksum(&payload) });
        assert_eq!(report.payload_bytes, 80);
        assert!(report.is_intact());
    }

    #[test]
    fn test_mismatch_reports_true_crc() {
        let payload: Vec<u8> = (0..80).collect();
        let bytes = file_with_payload(&payload, 0x1234_5678, HeaderVersion::V2);
        let report = verify_reader(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(
            report.outcome,
            VerifyOutcome::Mismatch {
                stored: 0x1234_5678,
                computed: checksum(&payload)
            }
        );
        assert!(!report.is_intact());
    }

    #[test]
    fn test_v1_has_no_checksum() {
        let payload = vec![7u8; 16];
        let bytes = file_with_payload(&payload, 0, HeaderVersion::V1);
        let report = verify_reader(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(
            report.outcome,
            VerifyOutcome::NoChecksum {
                computed: checksum(&payload)
            }
        );
    }

    #[test]
    fn test_truncated_payload_is_io_error() {
        let payload: Vec<u8> = (0..80).collect();
        let mut bytes = file_with_payload(&payload, checksum(&payload), HeaderVersion::V2);
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(
            verify_reader(&mut Cursor::new(bytes)),
            Err(CwaveError::Io(_))
        ));
    }

    #[test]
    fn test_incomplete_file_is_rejected() {
        let payload: Vec<u8> = (0..80).collect();
        let bytes = file_with_payload(&payload, 0, HeaderVersion::Bad);
        assert!(matches!(
            verify_reader(&mut Cursor::new(bytes)),
            Err(CwaveError::Format(_))
        ));
    }
}
