//! On-disk corpus of scraped listings and the in-memory working set built from it.
//!
//! The JSON file is both the scraper's output and its dedup ledger: every link
//! in it is skipped on later runs.

use crate::models::PropertyRecord;
use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

/// JSON array of [`PropertyRecord`] objects on disk
#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored corpus. A missing or unreadable file yields an empty corpus;
    /// an unreadable one is first renamed aside so the next save cannot destroy it.
    pub fn load(&self) -> CorpusState {
        if !self.path.exists() {
            info!("No existing results at {}, starting empty", self.path.display());
            return CorpusState::default();
        }

        match self.read_records() {
            Ok(records) => {
                let corpus = CorpusState::from_records(records);
                info!(
                    "Loaded existing results: {} links from {}",
                    corpus.len(),
                    self.path.display()
                );
                corpus
            }
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    error = ?e,
                    "Failed to load existing results, starting empty"
                );
                self.set_aside();
                CorpusState::default()
            }
        }
    }

    fn set_aside(&self) {
        let mut backup = self.path.clone().into_os_string();
        backup.push(format!(".unreadable-{}", Utc::now().format("%Y%m%dT%H%M%S")));
        let backup = PathBuf::from(backup);

        match std::fs::rename(&self.path, &backup) {
            Ok(()) => warn!(backup = %backup.display(), "Moved unreadable results aside"),
            Err(e) => error!(
                path = %self.path.display(),
                error = ?e,
                "Failed to move unreadable results aside, next save will replace them"
            ),
        }
    }

    fn read_records(&self) -> Result<Vec<PropertyRecord>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    /// Overwrite the store with `records`.
    ///
    /// Writes a temporary file next to the target and renames it into place, so
    /// a crash mid-write leaves the previous file intact.
    pub fn save(&self, records: &[PropertyRecord]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let json = serde_json::to_string_pretty(records).context("Failed to serialize records")?;

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        tmp.write_all(json.as_bytes())
            .context("Failed to write temporary results file")?;
        tmp.as_file()
            .sync_all()
            .context("Failed to sync temporary results file")?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }
}

/// Working set for one run: records in insertion order plus their links
#[derive(Debug, Default)]
pub struct CorpusState {
    records: Vec<PropertyRecord>,
    known_links: HashSet<String>,
}

impl CorpusState {
    pub fn from_records(records: Vec<PropertyRecord>) -> Self {
        let mut corpus = Self::default();
        for record in records {
            if !corpus.push(record) {
                warn!("Dropping repeated link found in stored results");
            }
        }
        corpus
    }

    pub fn contains(&self, link: &str) -> bool {
        self.known_links.contains(link)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PropertyRecord] {
        &self.records
    }

    pub fn known_links(&self) -> &HashSet<String> {
        &self.known_links
    }

    /// Append a record; returns `false` and leaves the corpus untouched if its link is already known.
    fn push(&mut self, record: PropertyRecord) -> bool {
        if !self.known_links.insert(record.link.clone()) {
            return false;
        }
        self.records.push(record);
        true
    }
}

/// Result of committing one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Appended and flushed to disk
    Saved,
    /// Appended, but the flush failed; the record lives only in memory until the next flush
    Unflushed,
    /// Link already present, nothing changed
    Duplicate,
}

/// Appends records to the corpus and flushes the whole corpus after each one
#[derive(Debug, Clone)]
pub struct IncrementalWriter {
    store: ResultStore,
}

impl IncrementalWriter {
    pub fn new(store: ResultStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn commit(&self, corpus: &mut CorpusState, record: PropertyRecord) -> Commit {
        let link = record.link.clone();
        if !corpus.push(record) {
            warn!(link = %link, "Record already in corpus, not saving again");
            return Commit::Duplicate;
        }

        match self.store.save(corpus.records()) {
            Ok(()) => {
                info!(
                    "Saved results to {}, current number of properties: {}",
                    self.store.path().display(),
                    corpus.len()
                );
                Commit::Saved
            }
            Err(e) => {
                error!(
                    link = %link,
                    error = ?e,
                    "Failed to save results, keeping record in memory"
                );
                Commit::Unflushed
            }
        }
    }
}
