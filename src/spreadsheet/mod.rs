//! # Spreadsheet Codec
//!
//! Reads the first worksheet of Office Open XML workbooks (`.xlsx`) into tables and
//! writes tables back out as single-sheet workbooks. Cell types are detected from the
//! cell type attribute and the number format of the cell style, so date and time
//! serials surface as ISO text rather than raw numbers.
pub(crate) mod cell;
pub(crate) mod excel;
pub(crate) mod reader;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod writer;
