use super::Formatter;
use crate::convert::ConversionReport;
use crate::verify::VerifyReport;

/// One JSON object per report
pub struct JsonFormatter;

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
}

impl Formatter for JsonFormatter {
    fn conversion(&self, report: &ConversionReport) -> String {
        to_json(report)
    }

    fn verification(&self, report: &VerifyReport) -> String {
        to_json(report)
    }
}
