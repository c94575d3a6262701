//! # Table Decoder
//!
//! Turns uploaded bytes into a [`Table`]. The format is taken from the declared file
//! extension only; content is never sniffed. CSV and xlsx share one inference rule:
//! a column is numeric iff every non-missing value parses as a number.
use crate::config::ConfigError;
use crate::config::DecodeOptions;
use crate::delimited;
use crate::format::FileIdentity;
use crate::format::TableFormat;
use crate::format::Upload;
use crate::spreadsheet;
use crate::table::Table;
use crate::table::TableError;
use thiserror::Error;

/// Errors raised while decoding an upload.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unsupported file type '{0}'")]
    UnsupportedFormat(String),

    #[error("No columns to parse from file")]
    EmptyError,

    #[error("Input is not valid {0} text")]
    EncodingError(String),

    #[error("Line {line} has {found} fields, expected {expected}")]
    RaggedRow { line: u64, expected: usize, found: usize },

    #[error("Workbook is encrypted or not an xlsx package")]
    EncryptedError,

    #[error("Invalid workbook: {0}")]
    SpreadsheetError(String),

    #[error("Invalid value in sheet '{0}' at {1}: {2}")]
    CellValueError(String, String, String),

    #[error("{0}")]
    SchemaError(#[from] TableError),

    #[error("{0}")]
    OptionsError(#[from] ConfigError),

    // Standard library errors
    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    CsvError(#[from] csv::Error),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),
}

/// Decodes bytes of the given format into a table.
pub fn decode(bytes: &[u8], format: TableFormat, options: &DecodeOptions) -> Result<Table, DecodeError> {
    let table = match format {
        TableFormat::Csv => delimited::read_table(bytes, options)?,
        TableFormat::Spreadsheet => spreadsheet::reader::read_first_sheet(bytes, options)?,
    };
    tracing::debug!(
        format = %format,
        rows = table.row_count(),
        columns = table.column_count(),
        "decoded table"
    );
    Ok(table)
}

/// Decodes a named file, resolving its format from the trailing extension.
pub fn decode_file(name: &str, bytes: &[u8], options: &DecodeOptions) -> Result<Table, DecodeError> {
    let identity = FileIdentity::new(name);
    let format = identity
        .format()
        .ok_or_else(|| DecodeError::UnsupportedFormat(identity.extension().unwrap_or_default()))?;
    decode(bytes, format, options)
}

/// Decodes an upload.
pub fn decode_upload(upload: &Upload, options: &DecodeOptions) -> Result<Table, DecodeError> {
    decode_file(&upload.name, &upload.bytes, options)
}
