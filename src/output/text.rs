use super::Formatter;
use crate::config::Algorithm;
use crate::convert::ConversionReport;
use crate::verify::{VerifyOutcome, VerifyReport};

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn conversion(&self, report: &ConversionReport) -> String {
        let mut lines = vec![format!(
            "Conversion OK: {} samples at {} Hz, CRC32 {:08X}",
            report.samples, report.sample_rate, report.crc
        )];
        if report.clips.total() > 0 {
            lines.push(format!(
                "Clipped values: left {}, right {}",
                report.clips.left, report.clips.right
            ));
        }
        if self.verbose {
            match report.algorithm {
                Algorithm::Fir => lines.push(format!(
                    "FIR order {}, Kaiser beta {}, {} thread(s)",
                    report.filter_order, report.beta, report.threads
                )),
                Algorithm::Fft => {
                    if let Some(len) = report.fft_len {
                        lines.push(format!("FFT length {}", len));
                    }
                    if let Some((lo, hi)) = report.pass_band_hz {
                        lines.push(format!("Pass band {:.3} .. {:.3} Hz", lo, hi));
                    }
                }
            }
            lines.push(format!(
                "Format: {}, gain {}, elapsed {:.3} s",
                report.format, report.gain, report.elapsed_secs
            ));
        }
        lines.join("\n")
    }

    fn verification(&self, report: &VerifyReport) -> String {
        let h = &report.header;
        let mut lines = Vec::new();
        if self.verbose {
            let source = if h.is_fft() {
                "FFT".to_string()
            } else {
                format!("FIR order {}, Kaiser beta {}", h.filter_order, h.beta)
            };
            lines.push(format!(
                "CWAVE v{}: {} samples at {} Hz, {}, {}",
                h.version as u32, h.samples, h.sample_rate, h.format, source
            ));
        }
        lines.push(match report.outcome {
            VerifyOutcome::Match { crc } => format!("CRC32 OK ({:08X})", crc),
            VerifyOutcome::Mismatch { stored, computed } => format!(
                "DATA SEEMS CORRUPTED: stored CRC32 {:08X}, computed {:08X}",
                stored, computed
            ),
            VerifyOutcome::NoChecksum { computed } => format!(
                "Version 1 file has no checksum; computed CRC32 {:08X}",
                computed
            ),
        });
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cwave::{ClipCounters, CwaveHeader, SampleFormat};

    fn report() -> ConversionReport {
        ConversionReport {
            algorithm: Algorithm::Fir,
            format: SampleFormat::Int16,
            input_samples: 10,
            samples: 10,
            sample_rate: 44_100,
            filter_order: 30,
            beta: 2.629,
            gain: 1.0,
            crc: 0xCBF4_3926,
            clips: ClipCounters { left: 2, right: 0 },
            fft_len: None,
            pass_band_hz: None,
            threads: 2,
            elapsed_secs: 0.5,
        }
    }

    #[test]
    fn test_conversion_text() {
        let text = TextFormatter::new(false).conversion(&report());
        assert!(text.contains("CBF43926"));
        assert!(text.contains("left 2, right 0"));
        assert!(!text.contains("FIR order"));
        assert!(TextFormatter::new(true).conversion(&report()).contains("FIR order 30"));
    }

    #[test]
    fn test_mismatch_text() {
        let header = CwaveHeader::placeholder(SampleFormat::Float32, 4, 8000, -1, 0.0).complete(1);
        let report = VerifyReport {
            header,
            payload_bytes: 64,
            outcome: VerifyOutcome::Mismatch {
                stored: 1,
                computed: 2,
            },
        };
        let text = TextFormatter::new(true).verification(&report);
        assert!(text.contains("CORRUPTED"));
        assert!(text.contains("CWAVE v2"));
    }
}
