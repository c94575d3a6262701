//! Low-level helpers shared by the spreadsheet reader.
pub(crate) mod xml;
pub(crate) mod zip;
