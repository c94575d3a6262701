use crate::config::DecodeOptions;
use crate::decoder::DecodeError;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::is_compound_file;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::excel::MAX_COLUMNS;
use crate::spreadsheet::excel::MAX_ROWS;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::reference::row_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::table::Column;
use crate::table::Table;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;
use std::io::Cursor;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_VALUE: QName = QName(b"v");                 // Cell value content

/// An xlsx workbook opened from in-memory bytes
pub(crate) struct XlsxWorkbook<'a> {
    /// ZIP archive containing the workbook parts
    zip: ZipArchive<Cursor<&'a [u8]>>,
    /// Parsed number formats for cell type detection, indexed by style ID
    number_formats: Vec<CellType>,
    /// Worksheets in workbook order as (name, zip_path) pairs
    sheets: Vec<(String, String)>,
}

impl<'a> XlsxWorkbook<'a> {
    /// Opens a workbook and parses its structure
    pub(crate) fn open(bytes: &'a [u8]) -> Result<XlsxWorkbook<'a>, DecodeError> {
        if is_compound_file(bytes) {
            Err(DecodeError::EncryptedError)?;
        }

        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(DecodeError::SpreadsheetError("workbook has no worksheets".to_owned()))?;
        }

        let number_formats = load_number_formats(&mut zip, is_1904)?;
        Ok(XlsxWorkbook {
            zip,
            number_formats,
            sheets,
        })
    }

    /// Loads the shared string table; workbooks without one have no shared strings
    pub(crate) fn load_shared_strings(&mut self) -> Result<Vec<String>, DecodeError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_reader("xl/sharedStrings.xml")? {
            Some(reader) => reader,
            None => return Ok(shared_strings),
        };

        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
            }
        });
        Ok(shared_strings)
    }

    /// Reads every non-empty cell of the first worksheet
    pub(crate) fn read_first_sheet(&mut self) -> Result<Sheet, DecodeError> {
        let (sheet_name, zip_path) = self
            .sheets
            .first()
            .cloned()
            .ok_or_else(|| DecodeError::SpreadsheetError("workbook has no worksheets".to_owned()))?;

        let mut sheet = Sheet::new(&sheet_name);
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut reader = self
            .zip
            .xml_reader(&zip_path)?
            .ok_or_else(|| DecodeError::SpreadsheetError(format!("missing part '{zip_path}'")))?;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                if let Some(number) = event.get_attribute_value("r")? {
                    row_count = row_to_index(&number)
                        .filter(|index| *index < MAX_ROWS)
                        .ok_or_else(|| DecodeError::SpreadsheetError(format!(
                            "row '{number}' of sheet '{sheet_name}' is outside the worksheet grid"
                        )))?;
                }
                col_count = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => {
                row_count += 1;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                let reference = event.get_attribute_value("r")?.map(Cow::into_owned);
                (row, col) = match &reference {
                    Some(reference) => reference_to_index(reference).unwrap_or((MAX_ROWS, MAX_COLUMNS)),
                    None => (row_count, col_count),
                };
                if row >= MAX_ROWS || col >= MAX_COLUMNS {
                    Err(DecodeError::CellValueError(
                        sheet_name.to_owned(),
                        reference.unwrap_or_else(|| index_to_reference(row, col)),
                        "cell reference is outside the worksheet grid".to_owned(),
                    ))?;
                }
                col_count = col + 1;
                value.clear();
                kind = match event.get_attribute_value("t")?.as_deref() {
                    Some("inlineStr") | Some("str") => CellType::InlineString,
                    Some("s") => CellType::SharedString,
                    Some("d") => CellType::IsoDateTime,
                    Some("b") => CellType::Boolean,
                    Some("e") => CellType::Error,
                    _ => CellType::Number,
                };
                if kind == CellType::Number {
                    if let Some(format_id) = event.get_attribute_value("s")?.filter(|id| !id.is_empty()) {
                        let index = format_id.parse::<usize>()?;
                        kind = self.number_formats.get(index).copied().unwrap_or(CellType::Number);
                    }
                }
            }
            Event::Start(event) if kind != CellType::Empty && event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if kind != CellType::Empty && event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if event.name() == TAG_CELL => {
                if kind != CellType::Empty && !value.is_empty() {
                    sheet.push(Cell {
                        row,
                        col,
                        kind,
                        value: std::mem::take(&mut value),
                    });
                }
                kind = CellType::Empty;
            }
        });
        Ok(sheet)
    }
}

/// Decodes the first worksheet of an xlsx workbook into a table.
/// The first non-empty row is the header; columns span the used range.
pub(crate) fn read_first_sheet(bytes: &[u8], options: &DecodeOptions) -> Result<Table, DecodeError> {
    let mut workbook = XlsxWorkbook::open(bytes)?;
    let shared_strings = workbook.load_shared_strings()?;
    let sheet = workbook.read_first_sheet()?;
    if sheet.is_empty() {
        Err(DecodeError::EmptyError)?;
    }
    tracing::debug!(sheet = %sheet.name, cells = sheet.cells.len(), "read worksheet");
    sheet_to_table(&sheet, &shared_strings, options)
}

fn sheet_to_table(sheet: &Sheet, shared_strings: &[String], options: &DecodeOptions) -> Result<Table, DecodeError> {
    let Some((rows, width)) = sheet.dimensions() else {
        return Err(DecodeError::EmptyError);
    };
    match rows.checked_mul(width) {
        Some(slots) if slots <= options.max_sheet_cells => {}
        _ => Err(DecodeError::SpreadsheetError(format!(
            "used range of sheet '{}' spans {rows} rows by {width} columns, more than {} cells",
            sheet.name, options.max_sheet_cells
        )))?,
    }

    let render = |cell: &Cell| -> Result<Option<String>, DecodeError> {
        cell.to_text(shared_strings)
            .map_err(|message| DecodeError::CellValueError(sheet.name.to_owned(), cell.reference(), message))
    };

    // The first row of the used range is the header
    let mut columns = Vec::<Column>::with_capacity(width);
    for (index, cells) in sheet.columns().into_iter().enumerate() {
        let mut name = None;
        let mut values: Vec<Option<String>> = vec![None; rows - 1];
        for (row, cell) in cells {
            let text = render(cell)?;
            match row.checked_sub(1) {
                Some(record) => values[record] = text.filter(|text| !options.is_null(text)),
                None => name = text,
            }
        }
        let name = name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Unnamed: {index}"));
        columns.push(Column::infer(name, values));
    }
    Ok(Table::new(columns)?)
}

/// Loads workbook structure: worksheet (name, zip_path) pairs in workbook order and the date system
fn load_workbook(zip: &mut ZipArchive<Cursor<&[u8]>>) -> Result<(Vec<(String, String)>, bool), DecodeError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip
        .xml_reader("xl/workbook.xml")?
        .ok_or_else(|| DecodeError::SpreadsheetError("missing part 'xl/workbook.xml'".to_owned()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value == "1" || value == "true")
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads number formats from styles.xml, indexed by cell style ID
fn load_number_formats(zip: &mut ZipArchive<Cursor<&[u8]>>, is_1904: bool) -> Result<Vec<CellType>, DecodeError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), CellType::parse_custom_number_format(&format, is_1904));
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = false,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?;
            format_indexes.push(id.map(|id| id.to_string()).unwrap_or_else(|| "0".to_owned()));
        }
    });

    Ok(excel::load_number_formats(format_indexes, custom_formats, is_1904))
}

/// Reads string content up to `end_tag`, skipping phonetic annotations
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, DecodeError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;
    use crate::table::ColumnType;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <workbookPr date1904="false"/>
  <sheets>
    <sheet name="Data" sheetId="1" r:id="rId2"/>
    <sheet name="Other" sheetId="2" r:id="rId1"/>
  </sheets>
</workbook>"#;

    const RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet1.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
</Relationships>"#;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd"/></numFmts>
  <cellXfs count="3"><xf numFmtId="0"/><xf numFmtId="164"/><xf numFmtId="22"/></cellXfs>
</styleSheet>"#;

    const SHARED_STRINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">
  <si><t>name</t></si>
  <si><t>joined</t></si>
  <si><r><t>Ann</t></r><r><t xml:space="preserve"> Lee</t></r><rPh><t>アン</t></rPh></si>
  <si><t>NA</t></si>
</sst>"#;

    const FIRST_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="2">
      <c r="B2" t="s"><v>0</v></c><c r="C2" t="s"><v>1</v></c><c r="D2" t="inlineStr"><is><t>active</t></is></c>
      <c r="F2"><v>7</v></c>
    </row>
    <row r="3">
      <c r="B3" t="s"><v>2</v></c><c r="C3" s="1"><v>45292</v></c><c r="D3" t="b"><v>1</v></c>
      <c r="E3" t="e"><v>#DIV/0!</v></c><c r="F3"><v>1.5</v></c>
    </row>
    <row r="5">
      <c r="B5" t="s"><v>3</v></c><c r="C5" s="2"><v>45292.5</v></c><c r="D5" t="b"><v>0</v></c>
    </row>
  </sheetData>
</worksheet>"#;

    const SECOND_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>ignored</t></is></c></row></sheetData>
</worksheet>"#;

    fn package(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, content) in parts {
            zip.start_file(*path, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn workbook(first_sheet: &str) -> Vec<u8> {
        package(&[
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", RELATIONSHIPS),
            ("xl/styles.xml", STYLES),
            ("xl/sharedStrings.xml", SHARED_STRINGS),
            ("xl/worksheets/sheet1.xml", first_sheet),
            ("xl/worksheets/sheet2.xml", SECOND_SHEET),
        ])
    }

    #[test]
    fn reads_first_sheet_in_workbook_order() {
        let table = read_first_sheet(&workbook(FIRST_SHEET), &DecodeOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["name", "joined", "active", "Unnamed: 3", "7"]);
        // The empty fourth row inside the used range is kept
        assert_eq!(table.row_count(), 3);

        let name = table.column("name").unwrap();
        assert_eq!(name.kind(), ColumnType::Text);
        assert_eq!(name.cells(), &[CellValue::from("Ann Lee"), CellValue::Missing, CellValue::Missing]);

        let joined = table.column("joined").unwrap();
        assert_eq!(
            joined.cells(),
            &[CellValue::from("2024-01-01"), CellValue::Missing, CellValue::from("2024-01-01 12:00:00")]
        );

        let active = table.column("active").unwrap();
        assert_eq!(active.cells(), &[CellValue::from("TRUE"), CellValue::Missing, CellValue::from("FALSE")]);

        let errors = table.column("Unnamed: 3").unwrap();
        assert_eq!(errors.kind(), ColumnType::Number);
        assert_eq!(errors.missing_count(), 3);
    }

    #[test]
    fn numeric_header_cells_become_names() {
        let table = read_first_sheet(&workbook(FIRST_SHEET), &DecodeOptions::default()).unwrap();
        let last = table.column("7").unwrap();
        assert_eq!(last.kind(), ColumnType::Number);
        assert_eq!(last.cells(), &[CellValue::Number(1.5), CellValue::Missing, CellValue::Missing]);
    }

    #[test]
    fn empty_sheet_has_no_columns() {
        let empty = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData/></worksheet>"#;
        let error = read_first_sheet(&workbook(empty), &DecodeOptions::default()).unwrap_err();
        assert!(matches!(error, DecodeError::EmptyError));
    }

    #[test]
    fn missing_workbook_part_is_reported() {
        let bytes = package(&[("xl/_rels/workbook.xml.rels", RELATIONSHIPS)]);
        let error = read_first_sheet(&bytes, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(error, DecodeError::SpreadsheetError(_)));
    }

    #[test]
    fn bad_shared_string_index_names_the_cell() {
        let sheet = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>99</v></c></row></sheetData></worksheet>"#;
        let error = read_first_sheet(&workbook(sheet), &DecodeOptions::default()).unwrap_err();
        assert!(matches!(error, DecodeError::CellValueError(ref sheet, ref cell, _) if sheet == "Data" && cell == "A1"));
    }

    #[test]
    fn oversized_cell_reference_is_rejected() {
        let sheet = r#"<worksheet><sheetData><row r="1">
            <c r="A1" t="inlineStr"><is><t>id</t></is></c>
            <c r="A18446744073709551615"><v>1</v></c>
        </row></sheetData></worksheet>"#;
        let error = read_first_sheet(&workbook(sheet), &DecodeOptions::default()).unwrap_err();
        assert!(
            matches!(error, DecodeError::CellValueError(ref sheet, ref cell, _) if sheet == "Data" && cell == "A18446744073709551615")
        );

        let sheet = r#"<worksheet><sheetData><row r="1"><c r="XFE1"><v>1</v></c></row></sheetData></worksheet>"#;
        let error = read_first_sheet(&workbook(sheet), &DecodeOptions::default()).unwrap_err();
        assert!(matches!(error, DecodeError::CellValueError(_, ref cell, _) if cell == "XFE1"));
    }

    #[test]
    fn oversized_row_number_is_rejected() {
        let sheet = r#"<worksheet><sheetData><row r="1048577"><c><v>1</v></c></row></sheetData></worksheet>"#;
        let error = read_first_sheet(&workbook(sheet), &DecodeOptions::default()).unwrap_err();
        assert!(matches!(error, DecodeError::SpreadsheetError(_)));
    }

    #[test]
    fn used_range_above_cell_limit_is_rejected() {
        let sheet = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="inlineStr"><is><t>id</t></is></c></row>
            <row r="1048576"><c r="XFD1048576"><v>1</v></c></row>
        </sheetData></worksheet>"#;
        let error = read_first_sheet(&workbook(sheet), &DecodeOptions::default()).unwrap_err();
        assert!(matches!(error, DecodeError::SpreadsheetError(ref message) if message.contains("1048576 rows by 16384 columns")));

        let options = DecodeOptions {
            max_sheet_cells: 4,
            ..DecodeOptions::default()
        };
        let sheet = r#"<worksheet><sheetData><row r="1"><c r="A1"><v>1</v></c><c r="C2"><v>2</v></c></row></sheetData></worksheet>"#;
        assert!(read_first_sheet(&workbook(sheet), &options).is_err());
        let sheet = r#"<worksheet><sheetData><row r="1"><c r="A1"><v>1</v></c><c r="B2"><v>2</v></c></row></sheetData></worksheet>"#;
        let table = read_first_sheet(&workbook(sheet), &options).unwrap();
        assert_eq!(table.column_names(), vec!["1", "Unnamed: 1"]);
        assert_eq!(table.column("Unnamed: 1").unwrap().cells(), &[CellValue::Number(2.0)]);
    }
}
