use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use super::RecordEntry;
use super::document::{append_record, load_records};

/// The lifetime log of every completed session.
///
/// Sessions are appended one line at a time and the whole file is only
/// read back for searching.
#[derive(Debug, Clone)]
pub(crate) struct GlobalRecord {
    path: PathBuf,
    entries: Vec<RecordEntry>,
}

impl GlobalRecord {
    pub(crate) fn at(path: PathBuf) -> Self {
        Self {
            path,
            entries: Vec::new(),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn load(&mut self) -> Result<()> {
        self.entries = load_records(&self.path)?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "loaded global record");
        Ok(())
    }

    pub(crate) fn matching_entries<'a, P>(
        &'a self,
        mut predicate: P,
    ) -> impl Iterator<Item = &'a RecordEntry> + 'a
    where
        P: FnMut(&RecordEntry) -> bool + 'a,
    {
        self.entries.iter().filter(move |entry| predicate(entry))
    }

    /// Durably appends one session without loading the existing log.
    pub(crate) fn append(&self, record: &RecordEntry) -> Result<()> {
        append_record(&self.path, record)?;
        debug!(path = %self.path.display(), media = record.media.as_str(), "appended global record");
        Ok(())
    }
}
