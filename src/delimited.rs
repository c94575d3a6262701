//! CSV codec: byte order mark aware text decoding, header-first records and
//! RFC 4180 output.
use crate::config::DecodeOptions;
use crate::config::EncodeOptions;
use crate::decoder::DecodeError;
use crate::encoder::EncodeError;
use crate::table::Column;
use crate::table::Table;
use csv::ReaderBuilder;
use csv::Terminator;
use csv::WriterBuilder;
use encoding_rs::Encoding;
use std::borrow::Cow;

/// Reads CSV bytes into a table; the first record is the header.
pub(crate) fn read_table(bytes: &[u8], options: &DecodeOptions) -> Result<Table, DecodeError> {
    let text = decode_text(bytes, options)?;
    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter_byte()?)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(DecodeError::EmptyError),
    };
    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(index, name)| {
            if name.is_empty() {
                format!("Unnamed: {index}")
            } else {
                name.to_owned()
            }
        })
        .collect();

    let width = names.len();
    let mut values: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
    for result in records {
        let record = result?;
        if record.len() > width {
            Err(DecodeError::RaggedRow {
                line: record.position().map(|position| position.line()).unwrap_or_default(),
                expected: width,
                found: record.len(),
            })?;
        }
        for (col, cells) in values.iter_mut().enumerate() {
            let value = record.get(col).filter(|value| !options.is_null(value));
            cells.push(value.map(|value| value.to_owned()));
        }
    }
    tracing::debug!(columns = width, rows = values.first().map(Vec::len).unwrap_or(0), "read csv records");

    let columns = names
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column::infer(name, values))
        .collect();
    Ok(Table::new(columns)?)
}

/// Decodes raw bytes to text. A byte order mark wins over the configured encoding.
fn decode_text<'a>(bytes: &'a [u8], options: &DecodeOptions) -> Result<Cow<'a, str>, DecodeError> {
    let (encoding, payload) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_length)) => (encoding, &bytes[bom_length..]),
        None => (options.text_encoding()?, bytes),
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(payload)
        .ok_or_else(|| DecodeError::EncodingError(encoding.name().to_owned()))
}

/// Writes the table as CSV: header row, then one record per row, `\n` terminated.
/// A table without columns has nothing to write.
pub(crate) fn write_table(table: &Table, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    if table.column_count() == 0 {
        return Ok(Vec::new());
    }

    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter_byte()?)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer.into_inner().map_err(|error| EncodeError::IoError(error.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;
    use crate::table::ColumnType;
    use crate::table::TableError;

    fn read(text: &str) -> Result<Table, DecodeError> {
        read_table(text.as_bytes(), &DecodeOptions::default())
    }

    #[test]
    fn infers_column_types() {
        let table = read("id,name,score\n1,ann,3.5\n2,bob,\n").unwrap();
        assert_eq!(table.column("id").unwrap().kind(), ColumnType::Number);
        assert_eq!(table.column("name").unwrap().kind(), ColumnType::Text);
        let score = table.column("score").unwrap();
        assert_eq!(score.kind(), ColumnType::Number);
        assert_eq!(score.cells(), &[CellValue::Number(3.5), CellValue::Missing]);
    }

    #[test]
    fn null_literals_are_missing() {
        let table = read("a,b\nNA,x\nnull,N/A\n7,n/a\n").unwrap();
        assert_eq!(
            table.column("a").unwrap().cells(),
            &[CellValue::Missing, CellValue::Missing, CellValue::Number(7.0)]
        );
        assert_eq!(table.column("b").unwrap().missing_count(), 2);
    }

    #[test]
    fn short_rows_are_padded() {
        let table = read("a,b,c\n1,2\n").unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.column("c").unwrap().cells(), &[CellValue::Missing]);
    }

    #[test]
    fn long_rows_are_rejected() {
        let error = read("a,b\n1,2\n1,2,3\n").unwrap_err();
        assert!(matches!(
            error,
            DecodeError::RaggedRow {
                line: 3,
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn empty_input_has_no_columns() {
        assert!(matches!(read(""), Err(DecodeError::EmptyError)));
        assert!(matches!(read("\n\n"), Err(DecodeError::EmptyError)));
    }

    #[test]
    fn header_only_gives_zero_rows() {
        let table = read("a,b\n").unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn blank_and_duplicate_headers() {
        let table = read("a,,c\n1,2,3\n").unwrap();
        assert_eq!(table.column_names(), vec!["a", "Unnamed: 1", "c"]);
        let error = read("a,a\n1,2\n").unwrap_err();
        assert!(matches!(error, DecodeError::SchemaError(TableError::DuplicateColumn(ref name)) if name == "a"));
    }

    #[test]
    fn byte_order_marks_select_encoding() {
        let mut utf8 = vec![0xEF, 0xBB, 0xBF];
        utf8.extend_from_slice("név\nÁrvíz\n".as_bytes());
        let table = read_table(&utf8, &DecodeOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["név"]);

        let mut utf16 = vec![0xFF, 0xFE];
        for unit in "a\n1\n".encode_utf16() {
            utf16.extend_from_slice(&unit.to_le_bytes());
        }
        let table = read_table(&utf16, &DecodeOptions::default()).unwrap();
        assert_eq!(table.column("a").unwrap().cells(), &[CellValue::Number(1.0)]);
    }

    #[test]
    fn malformed_text_fails() {
        let error = read_table(b"a\n\xFF\n", &DecodeOptions::default()).unwrap_err();
        assert!(matches!(error, DecodeError::EncodingError(ref name) if name == "UTF-8"));

        let options = DecodeOptions {
            encoding: "latin1".to_owned(),
            ..DecodeOptions::default()
        };
        let table = read_table(b"caf\xE9\n1\n", &options).unwrap();
        assert_eq!(table.column_names(), vec!["café"]);
    }

    #[test]
    fn custom_delimiter() {
        let options = DecodeOptions {
            delimiter: ';',
            ..DecodeOptions::default()
        };
        let table = read_table(b"a;b\n1,5;x\n", &options).unwrap();
        assert_eq!(table.column("a").unwrap().cells(), &[CellValue::from("1,5")]);
    }

    #[test]
    fn writes_header_and_rows() {
        let table = read("a,b\n1,x\n,\"y, z\"\n4.0,w\n").unwrap();
        let bytes = write_table(&table, &EncodeOptions::default()).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "a,b\n1,x\n,\"y, z\"\n4,w\n");
    }

    #[test]
    fn zero_columns_write_nothing() {
        let table = Table::new(Vec::new()).unwrap();
        assert!(write_table(&table, &EncodeOptions::default()).unwrap().is_empty());
    }
}
