//! Minimal Office Open XML workbook writer.
//!
//! Produces a single-sheet package: header row and text as inline strings, numbers as
//! numeric cells, missing values as absent cells.
use crate::config::EncodeOptions;
use crate::encoder::EncodeError;
use crate::spreadsheet::reference::index_to_reference;
use crate::table::CellValue;
use crate::table::Table;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Writer;
use std::io::Cursor;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    r#"</Types>"#,
);

const PACKAGE_RELATIONSHIPS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#,
);

const WORKBOOK_RELATIONSHIPS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    r#"</Relationships>"#,
);

const STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>"#,
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    r#"</styleSheet>"#,
);

/// Characters Excel refuses in worksheet names
const FORBIDDEN_SHEET_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Serializes the table as an xlsx workbook with one worksheet.
pub(crate) fn write_workbook(table: &Table, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    validate_sheet_name(&options.sheet_name)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let file_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let parts: [(&str, Vec<u8>); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes().to_vec()),
        ("_rels/.rels", PACKAGE_RELATIONSHIPS.as_bytes().to_vec()),
        ("xl/workbook.xml", workbook_xml(&options.sheet_name)?),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELATIONSHIPS.as_bytes().to_vec()),
        ("xl/styles.xml", STYLES.as_bytes().to_vec()),
        ("xl/worksheets/sheet1.xml", worksheet_xml(table)?),
    ];
    for (path, content) in parts {
        zip.start_file(path, file_options)?;
        zip.write_all(&content)?;
    }
    Ok(zip.finish()?.into_inner())
}

fn validate_sheet_name(name: &str) -> Result<(), EncodeError> {
    let length = name.chars().count();
    if length == 0 || length > 31 || name.contains(FORBIDDEN_SHEET_NAME_CHARS) || name.starts_with('\'') {
        Err(EncodeError::InvalidSheetName(name.to_owned()))?;
    }
    Ok(())
}

fn workbook_xml(sheet_name: &str) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(
        BytesStart::new("workbook").with_attributes([("xmlns", NS_MAIN), ("xmlns:r", NS_RELATIONSHIPS)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("sheets")))?;
    writer.write_event(Event::Empty(
        BytesStart::new("sheet").with_attributes([("name", sheet_name), ("sheetId", "1"), ("r:id", "rId1")]),
    ))?;
    writer.write_event(Event::End(BytesEnd::new("sheets")))?;
    writer.write_event(Event::End(BytesEnd::new("workbook")))?;
    Ok(writer.into_inner())
}

fn worksheet_xml(table: &Table) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(BytesStart::new("worksheet").with_attributes([("xmlns", NS_MAIN)])))?;
    writer.write_event(Event::Start(BytesStart::new("sheetData")))?;
    if table.column_count() > 0 {
        let header: Vec<CellValue> = table.column_names().into_iter().map(CellValue::from).collect();
        write_row(&mut writer, 0, header.iter())?;
        for (index, row) in table.rows().enumerate() {
            write_row(&mut writer, index + 1, row)?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
    writer.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(writer.into_inner())
}

fn write_row<'v, I>(writer: &mut Writer<Vec<u8>>, row: usize, cells: I) -> Result<(), EncodeError>
where
    I: IntoIterator<Item = &'v CellValue>,
{
    let number = (row + 1).to_string();
    writer.write_event(Event::Start(BytesStart::new("row").with_attributes([("r", number.as_str())])))?;
    for (col, cell) in cells.into_iter().enumerate() {
        let reference = index_to_reference(row, col);
        match cell {
            CellValue::Missing => (),
            CellValue::Number(value) if value.is_nan() => (),
            CellValue::Number(value) if value.is_finite() => {
                writer.write_event(Event::Start(BytesStart::new("c").with_attributes([("r", reference.as_str())])))?;
                writer.write_event(Event::Start(BytesStart::new("v")))?;
                writer.write_event(Event::Text(BytesText::new(&value.to_string())))?;
                writer.write_event(Event::End(BytesEnd::new("v")))?;
                writer.write_event(Event::End(BytesEnd::new("c")))?;
            }
            // Infinities have no numeric cell representation
            CellValue::Number(value) => write_inline_string(writer, &reference, &value.to_string())?,
            CellValue::Text(text) => write_inline_string(writer, &reference, text)?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new("row")))?;
    Ok(())
}

fn write_inline_string(writer: &mut Writer<Vec<u8>>, reference: &str, text: &str) -> Result<(), EncodeError> {
    writer.write_event(Event::Start(
        BytesStart::new("c").with_attributes([("r", reference), ("t", "inlineStr")]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("is")))?;
    let mut tag = BytesStart::new("t");
    if text.trim() != text || text.contains('\n') {
        tag.push_attribute(("xml:space", "preserve"));
    }
    writer.write_event(Event::Start(tag))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("t")))?;
    writer.write_event(Event::End(BytesEnd::new("is")))?;
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}
