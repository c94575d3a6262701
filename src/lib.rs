//! # Data Sweeper
//!
//! Cleans and converts tabular files. An uploaded CSV or Excel (`.xlsx`) file is decoded
//! into an in-memory [`Table`], optionally deduplicated, mean-imputed and reduced to a
//! chosen set of columns, then encoded back to CSV or xlsx for download.
//!
//! ## Features
//!
//! - **Two formats**: CSV (byte order mark aware, configurable delimiter and encoding)
//!   and Office Open XML workbooks, first worksheet only
//! - **Type inference**: a column is numeric iff every non-missing value parses as a number
//! - **Cleaning**: exact-duplicate row removal and mean imputation of numeric columns
//! - **Column selection**: reorder or drop columns, failing cleanly on unknown names
//! - **Sessions**: each upload is decoded once and its cleaned state kept per file
//!
//! ## Pipeline
//!
//! ```text
//! Upload -> decode -> [deduplicate] -> [impute_missing] -> [project] -> encode -> download
//! ```
pub mod cleaner;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod format;
pub mod projector;
pub mod session;
pub mod table;

mod delimited;
mod helpers;
mod spreadsheet;

pub use cleaner::deduplicate;
pub use cleaner::impute_missing;
pub use cleaner::impute_missing_with_report;
pub use config::SweeperConfig;
pub use decoder::decode;
pub use decoder::decode_file;
pub use encoder::encode;
pub use encoder::encode_as;
pub use error::Result;
pub use error::SweeperError;
pub use format::FileIdentity;
pub use format::TableFormat;
pub use format::Upload;
pub use projector::project;
pub use session::FileSession;
pub use table::Table;
