//! Per-message materialization: the orchestration state machine.
//!
//! Each message runs to exactly one [`Outcome`]; failures are values,
//! not exceptions, and never abort the batch. The materializer owns the
//! output tree: it creates project and message folders, writes
//! attachments and archival copies, and (hosted mode) appends the
//! idempotency ledger.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::admission::{Admission, AdmissionPolicy};
use crate::allocate::allocate_unique;
use crate::classify::Classifier;
use crate::error::{Error, Result};
use crate::ledger::{Ledger, LedgerEntry};
use crate::message::NormalizedMessage;
use crate::sanitize::sanitize;

/// Subfolder holding archived original messages in local mode.
const ARCHIVE_DIR: &str = "archive";

/// Subfolder holding admitted attachments in hosted mode.
const ATTACHMENTS_DIR: &str = "attachments";

/// Materializer configuration for one run.
#[derive(Debug, Clone)]
pub struct MaterializeConfig {
    /// Root directory messages are materialized under.
    ///
    /// Local mode: project folders are created directly below it.
    /// Hosted mode: the caller points this at the per-query directory.
    pub output_root: PathBuf,
    /// Directory of reference/template files copied once into each
    /// project folder (local mode). `None` disables the copy.
    pub refs_dir: Option<PathBuf>,
    /// Evaluate all decisions but perform no filesystem or ledger
    /// writes.
    pub dry_run: bool,
}

impl MaterializeConfig {
    /// Creates a config with refs disabled and dry-run off.
    #[must_use]
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            refs_dir: None,
            dry_run: false,
        }
    }
}

/// Terminal state of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Fully materialized.
    Processed {
        /// Extracted project code.
        code: String,
        /// Directory the message landed in.
        dir: PathBuf,
        /// Attachments written.
        saved: usize,
        /// Attachments rejected by the admission policy.
        blocked: usize,
    },
    /// Source id already present in the ledger.
    Skipped,
    /// The active pattern extracted no project code; the id is not
    /// recorded, so a corrected pattern can reprocess the message.
    NoMatch {
        /// Cleaned subject that failed to classify.
        subject: String,
    },
    /// An error was caught at the message boundary; the batch
    /// continues.
    Failed {
        /// Human-readable cause.
        reason: String,
    },
}

/// Aggregated counts for a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Messages fully materialized.
    pub processed: usize,
    /// Messages skipped via the ledger.
    pub skipped: usize,
    /// Messages with no extractable project code.
    pub no_match: usize,
    /// Messages failed by an I/O or collaborator error.
    pub failed: usize,
    /// Attachments rejected across all messages.
    pub blocked: usize,
}

impl Summary {
    /// Folds one outcome into the counts.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Processed { blocked, .. } => {
                self.processed += 1;
                self.blocked += blocked;
            }
            Outcome::Skipped => self.skipped += 1,
            Outcome::NoMatch { .. } => self.no_match += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Failures of any kind (classification miss or error).
    #[must_use]
    pub const fn failed_total(&self) -> usize {
        self.failed + self.no_match
    }
}

/// Per-message manifest written in hosted mode.
#[derive(Debug, Serialize)]
struct Manifest<'a> {
    gmail_id: &'a str,
    subject: &'a str,
    from: &'a str,
    date: &'a str,
    attachments_saved: Vec<String>,
    dir: String,
}

/// Converts a caught per-message error into a terminal outcome.
fn failed(msg: &NormalizedMessage, err: &Error) -> Outcome {
    warn!(source_id = %msg.source_id, %err, "message failed");
    Outcome::Failed {
        reason: format!("{}: {err}", msg.source_id),
    }
}

/// Rejects the collaborator contract violation of a blank source id.
fn check_source_id(msg: &NormalizedMessage) -> Result<()> {
    if msg.source_id.trim().is_empty() {
        return Err(Error::EmptySourceId);
    }
    Ok(())
}

/// Orchestrates classification, admission, allocation, and writes.
#[derive(Debug)]
pub struct Materializer {
    classifier: Classifier,
    config: MaterializeConfig,
}

impl Materializer {
    /// Creates a materializer from explicit configuration.
    #[must_use]
    pub const fn new(classifier: Classifier, config: MaterializeConfig) -> Self {
        Self { classifier, config }
    }

    /// The configured output root.
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.config.output_root
    }

    /// Materializes one locally archived message.
    ///
    /// Local mode trusts its source: no admission filter, no ledger.
    /// Reprocessing the same file creates new deduplicated copies
    /// rather than being skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only for contract violations (empty source id);
    /// per-message I/O failures surface as [`Outcome::Failed`].
    pub fn process_local(&self, msg: &NormalizedMessage) -> Result<Outcome> {
        check_source_id(msg)?;

        let Some(code) = self.classifier.classify(msg.subject.as_deref()) else {
            return Ok(self.no_match(msg));
        };

        match self.write_local(msg, &code) {
            Ok(outcome) => Ok(outcome),
            Err(err) => Ok(failed(msg, &err)),
        }
    }

    /// Materializes one hosted-mail message.
    ///
    /// `ordinal` is the message's 1-based position in the search result
    /// order; it fixes the `email_<NNN>` directory name so an
    /// interrupted run resumes into the same directory.
    ///
    /// # Errors
    ///
    /// Returns an error only for contract violations (empty source id);
    /// per-message I/O failures surface as [`Outcome::Failed`].
    pub fn process_hosted(
        &self,
        msg: &NormalizedMessage,
        ordinal: usize,
        policy: &AdmissionPolicy,
        ledger: &mut Ledger,
    ) -> Result<Outcome> {
        check_source_id(msg)?;

        if ledger.has(&msg.source_id) {
            debug!(source_id = %msg.source_id, "already in ledger");
            return Ok(Outcome::Skipped);
        }

        let Some(code) = self.classifier.classify(msg.subject.as_deref()) else {
            return Ok(self.no_match(msg));
        };

        match self.write_hosted(msg, ordinal, &code, policy, ledger) {
            Ok(outcome) => Ok(outcome),
            Err(err) => Ok(failed(msg, &err)),
        }
    }

    fn no_match(&self, msg: &NormalizedMessage) -> Outcome {
        let subject = self.classifier.clean_subject(msg.subject.as_deref());
        debug!(source_id = %msg.source_id, %subject, "no project code extracted");
        Outcome::NoMatch { subject }
    }

    /// Local branch: project folder, refs, archive copy, attachments.
    fn write_local(&self, msg: &NormalizedMessage, code: &str) -> Result<Outcome> {
        let project_dir = self.config.output_root.join(code);
        let archive_dir = project_dir.join(ARCHIVE_DIR);

        if !self.config.dry_run {
            fs::create_dir_all(&archive_dir).map_err(|source| Error::OutputRoot {
                path: archive_dir.display().to_string(),
                source,
            })?;
            self.copy_refs(&project_dir)?;

            if let Some(raw) = &msg.raw_bytes {
                let archived = allocate_unique(&archive_dir.join(sanitize(&msg.source_id)));
                fs::write(&archived, raw)?;
            }
        }

        let mut saved = 0;
        for attachment in &msg.attachments {
            let dest = allocate_unique(&project_dir.join(sanitize(&attachment.name)));
            if !self.config.dry_run {
                fs::write(&dest, &attachment.bytes)?;
            }
            saved += 1;
        }

        debug!(source_id = %msg.source_id, code, saved, "materialized");
        Ok(Outcome::Processed {
            code: code.to_string(),
            dir: project_dir,
            saved,
            blocked: 0,
        })
    }

    /// Hosted branch: per-message folder, admission, manifest, ledger.
    fn write_hosted(
        &self,
        msg: &NormalizedMessage,
        ordinal: usize,
        code: &str,
        policy: &AdmissionPolicy,
        ledger: &mut Ledger,
    ) -> Result<Outcome> {
        let message_dir = self.config.output_root.join(format!("email_{ordinal:03}"));
        let attachments_dir = message_dir.join(ATTACHMENTS_DIR);

        if !self.config.dry_run {
            fs::create_dir_all(&attachments_dir).map_err(|source| Error::OutputRoot {
                path: attachments_dir.display().to_string(),
                source,
            })?;

            if let Some(raw) = &msg.raw_bytes {
                fs::write(message_dir.join("email.eml"), raw)?;
            }
        }

        let mut saved_names = Vec::new();
        let mut blocked = 0;
        for attachment in &msg.attachments {
            let safe_name = sanitize(&attachment.name);
            let byte_length = attachment.bytes.len() as u64;
            match policy.admit(&safe_name, byte_length) {
                Admission::Accepted => {
                    let dest = allocate_unique(&attachments_dir.join(&safe_name));
                    if !self.config.dry_run {
                        fs::write(&dest, &attachment.bytes)?;
                    }
                    saved_names.push(
                        dest.file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or(safe_name),
                    );
                }
                Admission::Rejected(reason) => {
                    debug!(
                        source_id = %msg.source_id,
                        name = %safe_name,
                        reason = reason.tag(),
                        "attachment blocked"
                    );
                    blocked += 1;
                }
            }
        }

        let subject = self.classifier.clean_subject(msg.subject.as_deref());
        if !self.config.dry_run {
            let manifest = Manifest {
                gmail_id: &msg.source_id,
                subject: &subject,
                from: msg.from.as_deref().unwrap_or_default(),
                date: msg.date.as_deref().unwrap_or_default(),
                attachments_saved: saved_names.clone(),
                dir: message_dir.display().to_string(),
            };
            let json = serde_json::to_string_pretty(&manifest)?;
            fs::write(message_dir.join("manifest.json"), json)?;

            let entry =
                LedgerEntry::new(&msg.source_id, &subject, message_dir.display().to_string());
            ledger.append(&entry)?;
        }

        debug!(source_id = %msg.source_id, code, saved = saved_names.len(), blocked, "materialized");
        Ok(Outcome::Processed {
            code: code.to_string(),
            dir: message_dir,
            saved: saved_names.len(),
            blocked,
        })
    }

    /// Copies reference files into the project folder, first-write-wins.
    fn copy_refs(&self, project_dir: &Path) -> Result<()> {
        let Some(refs_dir) = &self.config.refs_dir else {
            return Ok(());
        };
        if !refs_dir.is_dir() {
            return Ok(());
        }

        for entry in fs::read_dir(refs_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let dest = project_dir.join(entry.file_name());
            if !dest.exists() {
                fs::copy(entry.path(), &dest)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::classify::SubjectPattern;
    use std::fs;

    fn local_materializer(root: &Path, refs: Option<PathBuf>) -> Materializer {
        let config = MaterializeConfig {
            output_root: root.to_path_buf(),
            refs_dir: refs,
            dry_run: false,
        };
        Materializer::new(Classifier::new(SubjectPattern::Invoice), config)
    }

    fn invoice_message() -> NormalizedMessage {
        NormalizedMessage::new("msg-001.eml")
            .with_subject("Invoice INV-2024-01")
            .with_raw_bytes(b"raw message bytes".to_vec())
            .with_attachment("report.pdf", b"%PDF".to_vec())
            .with_attachment("tool.exe", b"MZ".to_vec())
    }

    #[test]
    fn test_local_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let m = local_materializer(dir.path(), None);

        let outcome = m.process_local(&invoice_message()).unwrap();
        let Outcome::Processed { code, saved, blocked, .. } = outcome else {
            panic!("expected Processed, got {outcome:?}");
        };
        assert_eq!(code, "INV-2024-01");
        // Local mode has no admission filter: the .exe is saved too.
        assert_eq!(saved, 2);
        assert_eq!(blocked, 0);

        let project = dir.path().join("INV-2024-01");
        assert!(project.join("archive").join("msg-001.eml").exists());
        assert!(project.join("report.pdf").exists());
        assert!(project.join("tool.exe").exists());
    }

    #[test]
    fn test_local_reprocessing_dedupes() {
        let dir = tempfile::tempdir().unwrap();
        let m = local_materializer(dir.path(), None);

        m.process_local(&invoice_message()).unwrap();
        m.process_local(&invoice_message()).unwrap();

        let project = dir.path().join("INV-2024-01");
        assert!(project.join("report.pdf").exists());
        assert!(project.join("report (1).pdf").exists());
        assert!(project.join("archive").join("msg-001 (1).eml").exists());
    }

    #[test]
    fn test_refs_copied_once_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let refs = dir.path().join("refs");
        fs::create_dir(&refs).unwrap();
        fs::write(refs.join("README.txt"), b"template v1").unwrap();

        let out = dir.path().join("out");
        let m = local_materializer(&out, Some(refs.clone()));
        m.process_local(&invoice_message()).unwrap();

        let copied = out.join("INV-2024-01").join("README.txt");
        assert_eq!(fs::read(&copied).unwrap(), b"template v1");

        // Second pass with changed template must not overwrite.
        fs::write(refs.join("README.txt"), b"template v2").unwrap();
        m.process_local(&invoice_message()).unwrap();
        assert_eq!(fs::read(&copied).unwrap(), b"template v1");
    }

    #[test]
    fn test_no_match_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let m = local_materializer(dir.path(), None);

        let msg = NormalizedMessage::new("odd.eml").with_subject("no codes here");
        let outcome = m.process_local(&msg).unwrap();
        assert!(matches!(outcome, Outcome::NoMatch { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_source_id_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let m = local_materializer(dir.path(), None);

        let msg = NormalizedMessage::new("   ").with_subject("Invoice #1");
        assert!(matches!(m.process_local(&msg), Err(Error::EmptySourceId)));
    }

    #[test]
    fn test_hosted_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let m = local_materializer(dir.path(), None);
        let policy = AdmissionPolicy::default();
        let mut ledger = Ledger::load(dir.path().join("processed.jsonl")).unwrap();

        let outcome = m
            .process_hosted(&invoice_message(), 1, &policy, &mut ledger)
            .unwrap();
        let Outcome::Processed { saved, blocked, dir: msg_dir, .. } = outcome else {
            panic!("expected Processed");
        };
        // Hosted mode filters: the .exe is blocked.
        assert_eq!(saved, 1);
        assert_eq!(blocked, 1);
        assert_eq!(msg_dir, dir.path().join("email_001"));

        assert!(msg_dir.join("email.eml").exists());
        assert!(msg_dir.join("attachments").join("report.pdf").exists());
        assert!(!msg_dir.join("attachments").join("tool.exe").exists());

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(msg_dir.join("manifest.json")).unwrap())
                .unwrap();
        assert_eq!(manifest["gmail_id"], "msg-001.eml");
        assert_eq!(manifest["subject"], "Invoice INV-2024-01");
        assert_eq!(manifest["attachments_saved"][0], "report.pdf");

        assert!(ledger.has("msg-001.eml"));
    }

    #[test]
    fn test_hosted_second_run_skips_via_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let m = local_materializer(dir.path(), None);
        let policy = AdmissionPolicy::default();
        let ledger_path = dir.path().join("processed.jsonl");

        let mut ledger = Ledger::load(&ledger_path).unwrap();
        m.process_hosted(&invoice_message(), 1, &policy, &mut ledger)
            .unwrap();

        // Fresh load simulates a new run.
        let mut ledger = Ledger::load(&ledger_path).unwrap();
        let outcome = m
            .process_hosted(&invoice_message(), 1, &policy, &mut ledger)
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped);
    }

    #[test]
    fn test_hosted_no_match_not_ledgered() {
        let dir = tempfile::tempdir().unwrap();
        let m = local_materializer(dir.path(), None);
        let policy = AdmissionPolicy::default();
        let mut ledger = Ledger::load(dir.path().join("processed.jsonl")).unwrap();

        let msg = NormalizedMessage::new("id-9").with_subject("nothing to extract");
        let outcome = m.process_hosted(&msg, 1, &policy, &mut ledger).unwrap();
        assert!(matches!(outcome, Outcome::NoMatch { .. }));
        assert!(!ledger.has("id-9"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = MaterializeConfig {
            output_root: dir.path().join("out"),
            refs_dir: None,
            dry_run: true,
        };
        let m = Materializer::new(Classifier::new(SubjectPattern::Invoice), config);
        let policy = AdmissionPolicy::default();
        let mut ledger = Ledger::load(dir.path().join("processed.jsonl")).unwrap();

        let outcome = m
            .process_hosted(&invoice_message(), 1, &policy, &mut ledger)
            .unwrap();
        assert!(matches!(outcome, Outcome::Processed { .. }));
        assert!(!dir.path().join("out").exists());
        assert!(!dir.path().join("processed.jsonl").exists());
        assert!(!ledger.has("msg-001.eml"));
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = Summary::default();
        summary.record(&Outcome::Processed {
            code: "X".into(),
            dir: PathBuf::from("x"),
            saved: 2,
            blocked: 1,
        });
        summary.record(&Outcome::Skipped);
        summary.record(&Outcome::NoMatch { subject: "s".into() });
        summary.record(&Outcome::Failed { reason: "r".into() });

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.no_match, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.blocked, 1);
        assert_eq!(summary.failed_total(), 2);
    }
}
