//! Drop-folder runner: organizes local `.eml` files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use mailpress_core::{
    Classifier, MaterializeConfig, Materializer, NormalizedMessage, Outcome, SubjectPattern,
    Summary,
};
use mailpress_mime::Message;

use crate::report;

/// Arguments for the `drop` subcommand.
#[derive(Debug, Args)]
pub struct DropArgs {
    /// Folder scanned for .eml message files
    #[arg(long, default_value = "drop")]
    pub drop_dir: PathBuf,

    /// Output root for project folders
    #[arg(long, default_value = "out")]
    pub out_dir: PathBuf,

    /// Folder of reference files copied once into each project folder
    #[arg(long, default_value = "refs")]
    pub refs_dir: PathBuf,

    /// Active subject extraction pattern
    #[arg(long, default_value = "default")]
    pub pattern: SubjectPattern,
}

/// Runs the local drop-folder pipeline.
pub fn run(args: &DropArgs) -> Result<()> {
    report::print_banner(&[
        format!("Active pattern: {}", args.pattern),
        format!("Drop folder:    {}", args.drop_dir.display()),
        format!("Output folder:  {}", args.out_dir.display()),
    ]);

    let mut files = list_eml_files(&args.drop_dir)
        .with_context(|| format!("cannot read drop folder {}", args.drop_dir.display()))?;
    if files.is_empty() {
        println!("No .eml files found in {}.", args.drop_dir.display());
        println!("\n💡 Save a test email with a subject that fits your pattern");
        println!("   into the drop folder and rerun.");
        return Ok(());
    }
    files.sort();

    let config = MaterializeConfig {
        output_root: args.out_dir.clone(),
        refs_dir: Some(args.refs_dir.clone()),
        dry_run: false,
    };
    let materializer = Materializer::new(Classifier::new(args.pattern), config);

    let mut summary = Summary::default();
    for path in &files {
        let source_id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let outcome = match read_message(path, &source_id) {
            Ok(message) => materializer.process_local(&message)?,
            Err(err) => Outcome::Failed {
                reason: format!("{source_id}: {err}"),
            },
        };

        report::print_progress(&source_id, &outcome);
        summary.record(&outcome);
    }

    report::print_summary(&summary, materializer.output_root());
    Ok(())
}

/// Reads and normalizes one message file.
fn read_message(path: &Path, source_id: &str) -> Result<NormalizedMessage> {
    let raw = fs::read(path)?;
    let parsed = Message::parse(&raw)?;

    let mut message = NormalizedMessage::new(source_id).with_raw_bytes(raw);
    message.subject = parsed.subject();
    message.from = parsed.from();
    message.date = parsed.date();
    for attachment in parsed.attachments()? {
        message = message.with_attachment(attachment.name, attachment.data);
    }

    debug!(source_id, attachments = message.attachments.len(), "message read");
    Ok(message)
}

/// Lists `.eml` files directly under `dir`; a missing folder is empty.
fn list_eml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("eml"))
        {
            files.push(path);
        }
    }
    Ok(files)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"From: billing@example.com\r\n\
Subject: Invoice INV-2024-01\r\n\
Content-Type: multipart/mixed; boundary=b\r\n\
\r\n\
--b\r\n\
Content-Disposition: attachment; filename=\"report.pdf\"\r\n\
\r\n\
%PDF\r\n\
--b\r\n\
Content-Disposition: attachment; filename=\"tool.exe\"\r\n\
\r\n\
MZ\r\n\
--b--\r\n";

    #[test]
    fn test_end_to_end_drop_run() {
        let dir = tempfile::tempdir().unwrap();
        let drop_dir = dir.path().join("drop");
        fs::create_dir(&drop_dir).unwrap();
        fs::write(drop_dir.join("msg1.eml"), SAMPLE).unwrap();
        fs::write(drop_dir.join("notes.txt"), b"ignored").unwrap();

        let args = DropArgs {
            drop_dir,
            out_dir: dir.path().join("out"),
            refs_dir: dir.path().join("refs"),
            pattern: SubjectPattern::Invoice,
        };
        run(&args).unwrap();

        let project = dir.path().join("out").join("INV-2024-01");
        // Local mode saves everything, .exe included.
        assert!(project.join("report.pdf").exists());
        assert!(project.join("tool.exe").exists());
        assert!(project.join("archive").join("msg1.eml").exists());
    }

    #[test]
    fn test_empty_drop_folder_is_zero_work() {
        let dir = tempfile::tempdir().unwrap();
        let args = DropArgs {
            drop_dir: dir.path().join("missing"),
            out_dir: dir.path().join("out"),
            refs_dir: dir.path().join("refs"),
            pattern: SubjectPattern::Default,
        };
        run(&args).unwrap();
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_unparsable_file_counts_failed_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let drop_dir = dir.path().join("drop");
        fs::create_dir(&drop_dir).unwrap();
        // Declares multipart but carries no boundary: a parse error.
        fs::write(
            drop_dir.join("bad.eml"),
            b"Content-Type: multipart/mixed\r\n\r\nx",
        )
        .unwrap();
        fs::write(drop_dir.join("good.eml"), SAMPLE).unwrap();

        let args = DropArgs {
            drop_dir,
            out_dir: dir.path().join("out"),
            refs_dir: dir.path().join("refs"),
            pattern: SubjectPattern::Invoice,
        };
        run(&args).unwrap();

        // The good message still landed.
        assert!(dir.path().join("out").join("INV-2024-01").exists());
    }
}
