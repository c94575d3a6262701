//! # Table Encoder
//!
//! Serializes a table to CSV or a single-sheet xlsx workbook. Encoding never
//! mutates its input; column and row order are written verbatim with no index column.
use crate::config::ConfigError;
use crate::config::EncodeOptions;
use crate::delimited;
use crate::format::TableFormat;
use crate::spreadsheet;
use crate::table::Table;
use thiserror::Error;

/// Errors raised while encoding a table.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Unsupported output format '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid worksheet name '{0}'")]
    InvalidSheetName(String),

    #[error("{0}")]
    OptionsError(#[from] ConfigError),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    // Third-party library errors
    #[error("{0}")]
    CsvError(#[from] csv::Error),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),
}

/// Encoded output with the media type a download should carry.
#[derive(Clone, Debug, PartialEq)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
}

/// Encodes the table in the requested format.
pub fn encode(table: &Table, format: TableFormat, options: &EncodeOptions) -> Result<Encoded, EncodeError> {
    let bytes = match format {
        TableFormat::Csv => delimited::write_table(table, options)?,
        TableFormat::Spreadsheet => spreadsheet::writer::write_workbook(table, options)?,
    };
    tracing::debug!(format = %format, size = bytes.len(), "encoded table");
    Ok(Encoded {
        bytes,
        media_type: format.media_type(),
    })
}

/// Encodes the table in the format named by a collaborator tag such as `"csv"` or `"Excel"`.
pub fn encode_as(table: &Table, tag: &str, options: &EncodeOptions) -> Result<Encoded, EncodeError> {
    let format = tag.parse::<TableFormat>().map_err(EncodeError::UnsupportedFormat)?;
    encode(table, format, options)
}
