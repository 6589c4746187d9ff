mod csv;
mod json;
mod validate;

use std::borrow::Cow;

use thiserror::Error;

use crate::Candle;

/// Everything that can reject an uploaded dataset file.
/// Rows are 1-indexed; for CSV files they are line numbers with the header as row 1.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unsupported file format. Please use CSV or JSON.")]
    UnsupportedFormat,
    #[error("Invalid JSON format: {0}")]
    MalformedJson(String),
    #[error("JSON must contain an array of candles")]
    NotAnArray,
    #[error("CSV must contain at least a header row and one data row")]
    EmptyOrHeaderOnly,
    #[error("Missing required field: {0}")]
    MissingColumn(&'static str),
    #[error("Row {row}: Missing field '{field}'")]
    MissingField { row: usize, field: &'static str },
    #[error("Row {row}: Invalid time format")]
    InvalidTimeFormat { row: usize },
    #[error("Row {row}: All OHLCV values must be valid numbers")]
    NonNumericOhlcv { row: usize },
    #[error("Row {row}: High must be >= Low")]
    HighLessThanLow { row: usize },
    #[error("Row {row}: All values must be non-negative")]
    NegativeValue { row: usize },
    #[error("No valid candles found in CSV")]
    NoValidRows,
}

impl ParseError {
    /// The offending row, for errors that are tied to one.
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::MissingField { row, .. }
            | Self::InvalidTimeFormat { row }
            | Self::NonNumericOhlcv { row }
            | Self::HighLessThanLow { row }
            | Self::NegativeValue { row } => Some(*row),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Json,
}

impl DatasetFormat {
    /// Pick the format from the file extension, ignoring case.
    pub fn from_filename(filename: &str) -> Result<Self, ParseError> {
        let (_, extension) = filename
            .rsplit_once('.')
            .ok_or(ParseError::UnsupportedFormat)?;
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Ok(DatasetFormat::Csv),
            "json" => Ok(DatasetFormat::Json),
            _ => Err(ParseError::UnsupportedFormat),
        }
    }

    pub fn parse(self, content: &str) -> Result<Vec<Candle>, ParseError> {
        match self {
            DatasetFormat::Csv => csv::parse(content),
            DatasetFormat::Json => json::parse(content),
        }
    }
}

/// Parse the decoded text of an uploaded file into candles.
/// All-or-nothing: the first invalid row fails the whole file.
pub fn parse_dataset_file(filename: &str, content: &str) -> Result<Vec<Candle>, ParseError> {
    let format = DatasetFormat::from_filename(filename)?;
    let candles = format.parse(content)?;
    log::debug!("Parsed {} candles from {}.", candles.len(), filename);
    Ok(candles)
}

/// Same as [`parse_dataset_file`] for raw upload bytes.
/// The format is checked before the bytes are decoded; invalid UTF-8 is replaced.
pub fn parse_dataset_bytes(filename: &str, bytes: &[u8]) -> Result<Vec<Candle>, ParseError> {
    let format = DatasetFormat::from_filename(filename)?;
    let content: Cow<'_, str> = String::from_utf8_lossy(bytes);
    let candles = format.parse(&content)?;
    log::debug!("Parsed {} candles from {}.", candles.len(), filename);
    Ok(candles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(DatasetFormat::from_filename("btc.csv"), Ok(DatasetFormat::Csv));
        assert_eq!(DatasetFormat::from_filename("BTC.CSV"), Ok(DatasetFormat::Csv));
        assert_eq!(
            DatasetFormat::from_filename("eth.1h.Json"),
            Ok(DatasetFormat::Json)
        );
        assert_eq!(
            DatasetFormat::from_filename("data.txt"),
            Err(ParseError::UnsupportedFormat)
        );
        assert_eq!(
            DatasetFormat::from_filename("csv"),
            Err(ParseError::UnsupportedFormat)
        );
    }

    #[test]
    fn unsupported_format_ignores_content() {
        // Not valid UTF-8 and not a dataset; the extension alone decides.
        let err = parse_dataset_bytes("data.txt", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert_eq!(err, ParseError::UnsupportedFormat);
        assert_eq!(err.row(), None);
    }

    #[test]
    fn bytes_are_decoded() {
        let bytes = b"time,open,high,low,close,volume\n1000,1,2,0.5,1.5,10\n";
        let candles = parse_dataset_bytes("upload.csv", bytes).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].time, 1_000_000_000);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            ParseError::HighLessThanLow { row: 2 }.to_string(),
            "Row 2: High must be >= Low"
        );
        assert_eq!(
            ParseError::MissingField {
                row: 1,
                field: "volume"
            }
            .to_string(),
            "Row 1: Missing field 'volume'"
        );
        assert_eq!(
            ParseError::MissingColumn("time").to_string(),
            "Missing required field: time"
        );
        assert_eq!(ParseError::NegativeValue { row: 7 }.row(), Some(7));
    }
}
