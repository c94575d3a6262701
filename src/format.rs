//! File formats, upload identities and download naming.
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

/// Media type of CSV output.
pub const CSV_MEDIA_TYPE: &str = "text/csv";
/// Media type of OOXML spreadsheet output.
pub const XLSX_MEDIA_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Tabular formats understood by the decoder and encoder.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TableFormat {
    /// Comma separated values (`.csv`)
    Csv,
    /// Office Open XML workbook (`.xlsx`)
    Spreadsheet,
}

impl TableFormat {
    /// Resolves a format from a file extension, with or without the leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Some(TableFormat::Csv),
            "xlsx" => Some(TableFormat::Spreadsheet),
            _ => None,
        }
    }

    /// File extension without the leading dot.
    pub const fn extension(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Spreadsheet => "xlsx",
        }
    }

    /// Media type label attached to encoded output.
    pub const fn media_type(&self) -> &'static str {
        match self {
            TableFormat::Csv => CSV_MEDIA_TYPE,
            TableFormat::Spreadsheet => XLSX_MEDIA_TYPE,
        }
    }
}

impl Display for TableFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableFormat::Csv => write!(f, "CSV"),
            TableFormat::Spreadsheet => write!(f, "Excel"),
        }
    }
}

impl FromStr for TableFormat {
    type Err = String;

    /// Parses a collaborator format tag.
    /// Accepts extensions and the labels shown to users ("CSV", "Excel").
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let normalized = tag.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "xlsx" | "excel" | "spreadsheet" => Ok(TableFormat::Spreadsheet),
            _ => Err(tag.to_owned()),
        }
    }
}

/// Identity of an uploaded file: its name and the format declared by its extension.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    name: String,
    format: Option<TableFormat>,
}

impl FileIdentity {
    /// Creates an identity from a file name. The format is `None` for unsupported extensions.
    pub fn new<N: Into<String>>(name: N) -> Self {
        let name = name.into();
        let format = extension_of(&name).and_then(TableFormat::from_extension);
        FileIdentity { name, format }
    }

    /// File name, used as the session key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-cased trailing extension, if any.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name).map(|extension| extension.to_ascii_lowercase())
    }

    /// Declared format.
    pub fn format(&self) -> Option<TableFormat> {
        self.format
    }

    /// Derives the download name for `target` by replacing only the trailing extension.
    pub fn download_name(&self, target: TableFormat) -> String {
        let stem = match extension_of(&self.name) {
            Some(extension) => &self.name[..self.name.len() - extension.len() - 1],
            None => self.name.as_str(),
        };
        format!("{}.{}", stem, target.extension())
    }
}

impl Display for FileIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn extension_of(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|extension| extension.to_str())
}

/// Raw bytes of an uploaded file together with its name.
#[derive(Clone, Debug)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new<N: Into<String>>(name: N, bytes: Vec<u8>) -> Self {
        Upload {
            name: name.into(),
            bytes,
        }
    }

    pub fn identity(&self) -> FileIdentity {
        FileIdentity::new(self.name.to_owned())
    }

    /// Upload size in KiB.
    pub fn size_kib(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }
}
