//! Progress lines and the end-of-run summary.

use std::path::Path;

use mailpress_core::{Outcome, Summary};

/// One progress line per message.
pub fn print_progress(source_id: &str, outcome: &Outcome) {
    match outcome {
        Outcome::Processed {
            code,
            saved,
            blocked,
            ..
        } => {
            if *blocked > 0 {
                println!("✅ {code} ({saved} attachments, {blocked} blocked)");
            } else {
                println!("✅ {code} ({saved} attachments)");
            }
        }
        Outcome::Skipped => println!("⏭️  Already processed: {source_id}"),
        Outcome::NoMatch { subject } => println!("⚠️  No match in: {subject}"),
        Outcome::Failed { reason } => println!("❌ Error processing {reason}"),
    }
}

/// Final summary block.
pub fn print_summary(summary: &Summary, output_root: &Path) {
    println!("\n{}", "=".repeat(60));
    println!("✅ Successfully processed: {}", summary.processed);
    if summary.skipped > 0 {
        println!("⏭️  Skipped (already processed): {}", summary.skipped);
    }
    if summary.blocked > 0 {
        println!("🚫 Attachments blocked: {}", summary.blocked);
    }
    println!("❌ Failed: {}", summary.failed_total());
    println!("📁 Output folder: {}", output_root.display());
    println!("{}", "=".repeat(60));
}

/// Banner printed before a run.
pub fn print_banner(lines: &[String]) {
    println!("{}", "=".repeat(60));
    println!("mailpress v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", "=".repeat(60));
    for line in lines {
        println!("{line}");
    }
    println!("{}\n", "=".repeat(60));
}
