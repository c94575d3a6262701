//! Configuration for decoding, encoding, previews and logging.
//!
//! Every section is optional; a missing file or section falls back to the defaults,
//! which reproduce the behaviour of common dataframe readers and writers.
use encoding_rs::Encoding;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors related to loading and validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Read config file '{0}' failed: {1}")]
    ReadError(String, std::io::Error),

    #[error("Parse config file '{0}' failed: {1}")]
    ParseError(String, toml::de::Error),

    #[error("Delimiter {0:?} is not a single ASCII character other than a quote or line break")]
    InvalidDelimiter(char),

    #[error("Unknown text encoding '{0}'")]
    UnknownEncoding(String),
}

/// Values read as missing unless configured otherwise.
pub const DEFAULT_NULL_LITERALS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A",
    "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Worksheet cells read into a table unless configured otherwise.
pub const DEFAULT_MAX_SHEET_CELLS: usize = 10_000_000;

/// Options controlling how uploads are decoded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Field delimiter for CSV input
    pub delimiter: char,
    /// Encoding label used when the input carries no byte order mark
    pub encoding: String,
    /// Literal values treated as missing
    pub null_literals: HashSet<String>,
    /// Largest worksheet used range, in cells, that is read into a table
    pub max_sheet_cells: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            delimiter: ',',
            encoding: "utf-8".to_owned(),
            null_literals: DEFAULT_NULL_LITERALS.iter().map(|literal| literal.to_string()).collect(),
            max_sheet_cells: DEFAULT_MAX_SHEET_CELLS,
        }
    }
}

impl DecodeOptions {
    /// Returns true if the raw value denotes a missing cell.
    #[inline]
    pub(crate) fn is_null(&self, value: &str) -> bool {
        value.is_empty() || self.null_literals.contains(value)
    }

    pub(crate) fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        to_delimiter_byte(self.delimiter)
    }

    /// Resolves the configured fallback encoding.
    pub(crate) fn text_encoding(&self) -> Result<&'static Encoding, ConfigError> {
        Encoding::for_label(self.encoding.trim().as_bytes())
            .ok_or_else(|| ConfigError::UnknownEncoding(self.encoding.to_owned()))
    }
}

/// Options controlling how tables are encoded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Field delimiter for CSV output
    pub delimiter: char,
    /// Worksheet name for spreadsheet output
    pub sheet_name: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            delimiter: ',',
            sheet_name: "Sheet1".to_owned(),
        }
    }
}

impl EncodeOptions {
    pub(crate) fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        to_delimiter_byte(self.delimiter)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Rows shown when previewing a table
    pub rows: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        PreviewConfig { rows: 5 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_owned(),
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweeperConfig {
    pub decode: DecodeOptions,
    pub encode: EncodeOptions,
    pub preview: PreviewConfig,
    pub logging: LoggingConfig,
}

impl SweeperConfig {
    /// Parses and validates configuration from TOML text.
    pub fn from_toml(source: &str, content: &str) -> Result<Self, ConfigError> {
        let config: SweeperConfig =
            toml::from_str(content).map_err(|error| ConfigError::ParseError(source.to_owned(), error))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|error| ConfigError::ReadError(path.display().to_string(), error))?;
        Self::from_toml(&path.display().to_string(), &content)
    }

    /// Loads configuration from `path` when given, otherwise returns the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Checks values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.decode.delimiter_byte()?;
        self.decode.text_encoding()?;
        self.encode.delimiter_byte()?;
        Ok(())
    }
}

fn to_delimiter_byte(delimiter: char) -> Result<u8, ConfigError> {
    match delimiter {
        '"' | '\n' | '\r' => Err(ConfigError::InvalidDelimiter(delimiter)),
        _ if delimiter.is_ascii() => Ok(delimiter as u8),
        _ => Err(ConfigError::InvalidDelimiter(delimiter)),
    }
}
