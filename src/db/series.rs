use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use super::MediaEntry;
use super::document::{load_document, save_document};
use crate::error::MediaError;
use crate::paths::series_store_path;

/// The queue of media entries persisted inside one directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SeriesStore {
    entries: Vec<MediaEntry>,
}

/// The entry to play next along with where it sits in its store.
#[derive(Debug, Clone)]
pub(crate) struct NextEntry {
    pub(crate) index: usize,
    pub(crate) entry: MediaEntry,
    pub(crate) alias: Option<AliasTarget>,
}

/// The store of the directory an aliased entry points into, as it was
/// when the entry was resolved.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AliasTarget {
    pub(crate) dir: PathBuf,
    pub(crate) store: SeriesStore,
}

impl SeriesStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn from_entries(entries: Vec<MediaEntry>) -> Self {
        Self { entries }
    }

    pub(crate) fn path_has_store(dir: &Path) -> bool {
        series_store_path(dir).is_file()
    }

    /// Replaces the in-memory sequence with the one stored in `dir`.
    /// Returns `false`, leaving the store empty, when `dir` holds no store.
    pub(crate) fn load(&mut self, dir: &Path) -> Result<bool> {
        let path = series_store_path(dir);
        match load_document::<Vec<MediaEntry>>(&path)? {
            Some(entries) => {
                debug!(path = %path.display(), entries = entries.len(), "loaded series");
                self.entries = entries;
                Ok(true)
            }
            None => {
                self.entries.clear();
                Ok(false)
            }
        }
    }

    pub(crate) fn persist(&self, dir: &Path) -> Result<()> {
        let path = series_store_path(dir);
        save_document(&path, &self.entries)?;
        debug!(path = %path.display(), entries = self.entries.len(), "persisted series");
        Ok(())
    }

    pub(crate) fn entries(&self) -> &[MediaEntry] {
        &self.entries
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> Option<&mut MediaEntry> {
        self.entries.get_mut(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn next_index(&self) -> Option<usize> {
        self.entries.iter().position(|entry| !entry.is_complete())
    }

    /// Resolves the next entry to watch. An empty store has no next entry;
    /// a non-empty store where everything has been watched is `SeriesComplete`.
    ///
    /// Aliased entries come back with the aliased directory's store loaded.
    pub(crate) fn next(&self, dir: &Path) -> Result<Option<NextEntry>> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        let index = self
            .next_index()
            .ok_or_else(|| MediaError::SeriesComplete(dir.to_path_buf()))?;
        let entry = self.entries[index].clone();

        let alias = match entry.alias.as_deref() {
            Some(alias) => {
                let alias_dir = dir.join(alias);
                let mut store = SeriesStore::new();
                if !store.load(&alias_dir)? {
                    return Err(MediaError::NotFound(series_store_path(&alias_dir)).into());
                }
                Some(AliasTarget {
                    dir: alias_dir,
                    store,
                })
            }
            None => None,
        };

        Ok(Some(NextEntry {
            index,
            entry,
            alias,
        }))
    }

    pub(crate) fn append(&mut self, entry: MediaEntry) {
        self.entries.push(entry);
    }

    /// Drops every entry before `index`.
    pub(crate) fn prune_before(&mut self, index: Option<usize>) {
        match index {
            Some(index) if index > 0 => {
                let index = index.min(self.entries.len());
                self.entries.drain(..index);
            }
            _ => {}
        }
    }

    pub(crate) fn video_set(&self) -> HashSet<String> {
        self.entries
            .iter()
            .map(|entry| entry.media.as_str().to_string())
            .collect()
    }

    pub(crate) fn filter<P>(&mut self, mut predicate: P)
    where
        P: FnMut(&MediaEntry) -> bool,
    {
        self.entries.retain(|entry| predicate(entry));
    }

    pub(crate) fn matching_entries<'a, P>(
        &'a self,
        mut predicate: P,
    ) -> impl Iterator<Item = &'a MediaEntry> + 'a
    where
        P: FnMut(&MediaEntry) -> bool + 'a,
    {
        self.entries.iter().filter(move |entry| predicate(entry))
    }
}
