//! File exports for reports and period summaries

use thiserror::Error;

pub mod csv;
pub mod json;

pub use self::csv::{export_periods_csv, write_periods_csv};
pub use self::json::{export_json, to_json_string};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] ::csv::Error),
}
