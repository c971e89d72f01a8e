mod json;
mod text;

pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

use crate::convert::ConversionReport;
use crate::verify::VerifyReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub trait Formatter {
    fn conversion(&self, report: &ConversionReport) -> String;
    fn verification(&self, report: &VerifyReport) -> String;
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}
