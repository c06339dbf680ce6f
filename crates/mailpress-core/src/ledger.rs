//! Append-only processed-message ledger.
//!
//! One JSON object per line. The set of `gmail_id` values in the file
//! is the durable idempotency state for hosted-mail runs; entries are
//! never rewritten or compacted. Malformed lines are skipped on load so
//! a corrupted or future-format line never blocks a run.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Maximum subject excerpt length stored per entry.
const SUBJECT_EXCERPT_CHARS: usize = 120;

/// One processed-message record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Processing time, ISO-8601 UTC.
    pub ts: DateTime<Utc>,
    /// Source message id (ledger key).
    pub gmail_id: String,
    /// Subject excerpt, truncated to 120 characters.
    pub subject: String,
    /// Output directory the message was materialized into.
    pub dir: String,
}

impl LedgerEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(gmail_id: impl Into<String>, subject: &str, dir: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            gmail_id: gmail_id.into(),
            subject: subject.chars().take(SUBJECT_EXCERPT_CHARS).collect(),
            dir: dir.into(),
        }
    }
}

/// Append-only ledger of processed source ids.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    seen: HashSet<String>,
}

impl Ledger {
    /// Loads the ledger, reconstructing the processed-id set.
    ///
    /// A missing file is an empty ledger. Lines that fail to parse are
    /// skipped silently.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut seen = HashSet::new();

        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<LedgerEntry>(&line) {
                    Ok(entry) => {
                        seen.insert(entry.gmail_id);
                    }
                    Err(err) => {
                        debug!(%err, "skipping malformed ledger line");
                    }
                }
            }
        }

        debug!(path = %path.display(), entries = seen.len(), "ledger loaded");
        Ok(Self { path, seen })
    }

    /// Ledger file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when `id` has already been processed.
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Number of known processed ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// True when no id has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Appends one record and registers its id.
    ///
    /// The file is opened, appended, and closed per call; a crash
    /// mid-batch loses at most the in-flight entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or written.
    pub fn append(&mut self, entry: &LedgerEntry) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(entry)?;
        writeln!(file, "{line}")?;

        self.seen.insert(entry.gmail_id.clone());
        Ok(())
    }
}
