//! # File Session
//!
//! Holds the current table for each uploaded file. An upload is decoded once; later
//! operations read the stored table and replace it only when they succeed.
use crate::config::DecodeOptions;
use crate::decoder::decode_upload;
use crate::decoder::DecodeError;
use crate::error::SweeperError;
use crate::format::FileIdentity;
use crate::format::Upload;
use crate::table::Table;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No file named '{0}' in session")]
    NoEntry(String),
}

/// Per-user store of the latest table for each file identity.
#[derive(Debug, Default)]
pub struct FileSession {
    entries: HashMap<FileIdentity, Table>,
}

impl FileSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current table for the identity.
    pub fn get(&self, identity: &FileIdentity) -> Option<&Table> {
        self.entries.get(identity)
    }

    /// Stores a table, replacing any previous entry.
    pub fn put(&mut self, identity: FileIdentity, table: Table) {
        tracing::info!(file = %identity, rows = table.row_count(), "stored table");
        self.entries.insert(identity, table);
    }

    pub fn has_entry(&self, identity: &FileIdentity) -> bool {
        self.entries.contains_key(identity)
    }

    /// Returns the table for the upload, decoding it only if the session has no entry yet.
    /// A failed decode leaves the session unchanged.
    pub fn open(&mut self, upload: &Upload, options: &DecodeOptions) -> Result<&Table, DecodeError> {
        match self.entries.entry(upload.identity()) {
            Entry::Occupied(entry) => {
                tracing::debug!(file = %entry.key(), "reusing decoded table");
                let table: &Table = entry.into_mut();
                Ok(table)
            }
            Entry::Vacant(entry) => {
                let table = decode_upload(upload, options)?;
                tracing::info!(
                    file = %entry.key(),
                    size_kib = upload.size_kib(),
                    rows = table.row_count(),
                    columns = table.column_count(),
                    "opened file"
                );
                let table: &Table = entry.insert(table);
                Ok(table)
            }
        }
    }

    /// Runs a fallible operation on the current table and stores its result on success.
    /// On failure the entry is left as it was.
    pub fn apply<F, E>(&mut self, identity: &FileIdentity, operation: F) -> Result<&Table, SweeperError>
    where
        F: FnOnce(&Table) -> Result<Table, E>,
        E: Into<SweeperError>,
    {
        let entry = self
            .entries
            .get_mut(identity)
            .ok_or_else(|| SessionError::NoEntry(identity.name().to_owned()))?;
        match operation(entry) {
            Ok(table) => *entry = table,
            Err(error) => return Err(error.into()),
        }
        tracing::info!(file = %identity, rows = entry.row_count(), "updated table");
        let table: &Table = entry;
        Ok(table)
    }

    /// Runs an infallible operation on the current table and stores its result.
    pub fn update<F>(&mut self, identity: &FileIdentity, operation: F) -> Result<&Table, SessionError>
    where
        F: FnOnce(&Table) -> Table,
    {
        let entry = self
            .entries
            .get_mut(identity)
            .ok_or_else(|| SessionError::NoEntry(identity.name().to_owned()))?;
        *entry = operation(entry);
        tracing::info!(file = %identity, rows = entry.row_count(), "updated table");
        let table: &Table = entry;
        Ok(table)
    }

    pub fn remove(&mut self, identity: &FileIdentity) -> Option<Table> {
        self.entries.remove(identity)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identities with an entry, ordered by file name.
    pub fn identities(&self) -> Vec<&FileIdentity> {
        let mut identities: Vec<&FileIdentity> = self.entries.keys().collect();
        identities.sort_by(|a, b| a.name().cmp(b.name()));
        identities
    }
}
