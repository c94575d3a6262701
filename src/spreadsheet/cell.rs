use crate::spreadsheet::reference::index_to_reference;
use chrono::Duration;
use chrono::NaiveDate;

/// Types of cell data in xlsx worksheets.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as 0/1
    Boolean,
    /// Plain numeric values
    Number,
    /// Date/time serial numbers, 1900 epoch
    NumberDateTime1900,
    /// Date serial numbers, 1900 epoch
    NumberDate1900,
    /// Time fractions, 1900 epoch
    NumberTime1900,
    /// Date/time serial numbers, 1904 epoch
    NumberDateTime1904,
    /// Date serial numbers, 1904 epoch
    NumberDate1904,
    /// Time fractions, 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// Inline string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values such as `#DIV/0!`
    Error,
}

impl CellType {
    /// Maps built-in number format IDs that denote dates or times.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        let (datetime, date, time) = Self::temporal_types(is_1904);
        match id {
            "22" => Some(datetime),
            "14" | "15" | "16" | "17" => Some(date),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(time),
            _ => None,
        }
    }

    /// Classifies a custom number format code by its date and time tokens.
    /// Quoted literals, escaped characters and bracketed sections are skipped.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_literal => is_escaped = true,
                '"' if !is_bracket => is_literal = !is_literal,
                '[' if !is_literal => is_bracket = true,
                ']' if is_bracket => is_bracket = false,
                _ if is_literal || is_bracket => (),
                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        let (datetime, date, time) = Self::temporal_types(is_1904);
        match (is_date, is_time) {
            (true, true) => datetime,
            (true, false) => date,
            (false, true) => time,
            (false, false) => Self::Number,
        }
    }

    fn temporal_types(is_1904: bool) -> (Self, Self, Self) {
        if is_1904 {
            (Self::NumberDateTime1904, Self::NumberDate1904, Self::NumberTime1904)
        } else {
            (Self::NumberDateTime1900, Self::NumberDate1900, Self::NumberTime1900)
        }
    }
}

/// A single non-empty worksheet cell with position, type and raw value.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Raw cell value as stored in the worksheet
    pub(crate) value: String,
}

impl Cell {
    /// Returns the A1-style cell reference.
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Renders the cell as the text handed to column inference.
    /// Returns `Ok(None)` for cells that carry no value, `Err` with a message for malformed values.
    pub(crate) fn to_text(&self, shared_strings: &[String]) -> Result<Option<String>, String> {
        let text = match self.kind {
            CellType::Empty | CellType::Error => return Ok(None),
            CellType::Boolean => if self.value.trim() == "1" { "TRUE" } else { "FALSE" }.to_owned(),
            CellType::Number => self.to_double()?.to_string(),
            CellType::NumberDateTime1900 => to_datetime_string(self.to_double()?, false)?,
            CellType::NumberDateTime1904 => to_datetime_string(self.to_double()?, true)?,
            CellType::NumberDate1900 => to_date_string(self.to_double()?, false)?,
            CellType::NumberDate1904 => to_date_string(self.to_double()?, true)?,
            CellType::NumberTime1900 | CellType::NumberTime1904 => to_time_string(self.to_double()?),
            CellType::IsoDateTime => self.value.replace('T', " "),
            CellType::InlineString => self.value.to_owned(),
            CellType::SharedString => {
                let index = self
                    .value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| format!("invalid shared string index '{}'", self.value))?;
                shared_strings
                    .get(index)
                    .cloned()
                    .ok_or_else(|| format!("shared string index {} out of range", index))?
            }
        };
        Ok(Some(text))
    }

    /// Converts cell value to double-precision floating point.
    fn to_double(&self) -> Result<f64, String> {
        self.value
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("parse '{}' to double failed", self.value))
    }
}

/// Converts a serial day number to an ISO date string.
/// Serial 60 is the fictitious 1900-02-29 inherited from Lotus 1-2-3.
fn to_date_string(serial: f64, is_1904: bool) -> Result<String, String> {
    let days = serial.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.checked_add_signed(Duration::days(days + offset)))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| format!("serial date {} out of range", serial))
}

/// Converts the fractional part of a serial number to an ISO time string.
fn to_time_string(serial: f64) -> String {
    let mut milliseconds = (serial.fract().abs() * 86_400_000f64).round() as i64;
    let millis = milliseconds % 1_000;
    milliseconds /= 1_000;
    let seconds = milliseconds % 60;
    milliseconds /= 60;
    let minutes = milliseconds % 60;
    let hours = milliseconds / 60;
    if millis > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

/// Converts a serial number to an ISO date/time string.
fn to_datetime_string(serial: f64, is_1904: bool) -> Result<String, String> {
    Ok(format!("{} {}", to_date_string(serial, is_1904)?, to_time_string(serial)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(kind: CellType, value: &str) -> Cell {
        Cell {
            row: 0,
            col: 0,
            kind,
            value: value.to_owned(),
        }
    }

    #[test]
    fn builtin_formats() {
        assert_eq!(CellType::parse_builtin_number_format_id("14", false), Some(CellType::NumberDate1900));
        assert_eq!(CellType::parse_builtin_number_format_id("22", true), Some(CellType::NumberDateTime1904));
        assert_eq!(CellType::parse_builtin_number_format_id("2", false), None);
    }

    #[test]
    fn custom_formats() {
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd", false), CellType::NumberDate1900);
        assert_eq!(CellType::parse_custom_number_format("hh:mm:ss", false), CellType::NumberTime1900);
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd hh:mm", true), CellType::NumberDateTime1904);
        assert_eq!(CellType::parse_custom_number_format("0.00", false), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("[Red]0.00", false), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("0.0\"days\"", false), CellType::Number);
    }

    #[test]
    fn renders_numbers_and_booleans() {
        assert_eq!(cell(CellType::Number, "4").to_text(&[]), Ok(Some("4".to_owned())));
        assert_eq!(cell(CellType::Number, "1.5E-3").to_text(&[]), Ok(Some("0.0015".to_owned())));
        assert_eq!(cell(CellType::Boolean, "1").to_text(&[]), Ok(Some("TRUE".to_owned())));
        assert_eq!(cell(CellType::Boolean, "0").to_text(&[]), Ok(Some("FALSE".to_owned())));
        assert!(cell(CellType::Number, "abc").to_text(&[]).is_err());
    }

    #[test]
    fn renders_dates_and_times() {
        assert_eq!(cell(CellType::NumberDate1900, "45292").to_text(&[]), Ok(Some("2024-01-01".to_owned())));
        assert_eq!(cell(CellType::NumberDate1900, "1").to_text(&[]), Ok(Some("1900-01-01".to_owned())));
        assert_eq!(cell(CellType::NumberDate1904, "0").to_text(&[]), Ok(Some("1904-01-01".to_owned())));
        assert_eq!(cell(CellType::NumberTime1900, "0.5").to_text(&[]), Ok(Some("12:00:00".to_owned())));
        assert_eq!(
            cell(CellType::NumberDateTime1900, "45292.75").to_text(&[]),
            Ok(Some("2024-01-01 18:00:00".to_owned()))
        );
        assert_eq!(
            cell(CellType::IsoDateTime, "2024-01-01T08:30:00").to_text(&[]),
            Ok(Some("2024-01-01 08:30:00".to_owned()))
        );
    }

    #[test]
    fn renders_strings_and_errors() {
        let shared = vec!["alpha".to_owned(), "beta".to_owned()];
        assert_eq!(cell(CellType::SharedString, "1").to_text(&shared), Ok(Some("beta".to_owned())));
        assert!(cell(CellType::SharedString, "7").to_text(&shared).is_err());
        assert_eq!(cell(CellType::InlineString, "gamma").to_text(&shared), Ok(Some("gamma".to_owned())));
        assert_eq!(cell(CellType::Error, "#DIV/0!").to_text(&shared), Ok(None));
    }

    #[test]
    fn reference_uses_a1_style() {
        let cell = Cell {
            row: 4,
            col: 27,
            kind: CellType::Number,
            value: "1".to_owned(),
        };
        assert_eq!(cell.reference(), "AB5");
    }
}
