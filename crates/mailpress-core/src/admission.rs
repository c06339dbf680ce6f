//! Attachment admission policy for untrusted mailbox input.
//!
//! Hosted-mail attachments pass through an [`AdmissionPolicy`] before
//! anything touches disk. Local drop-folder runs skip admission
//! entirely: a pre-vetted archive is trusted input.

use std::collections::HashSet;
use std::path::Path;

/// Default byte ceiling per attachment (25 MB).
pub const DEFAULT_MAX_BYTES: u64 = 25 * 1024 * 1024;

/// Default extension allow-list.
const DEFAULT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "txt", "csv", "rtf", "png",
    "jpg", "jpeg", "gif", "tif", "tiff", "zip", "eml",
];

/// Why an attachment was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Extension is not on the allow-list.
    UnsupportedType,
    /// Byte length exceeds the configured ceiling.
    TooLarge,
}

impl RejectReason {
    /// Short tag used in progress output.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::UnsupportedType => "unsupported-type",
            Self::TooLarge => "too-large",
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Safe to persist.
    Accepted,
    /// Refused; counted and logged, never aborts the message.
    Rejected(RejectReason),
}

impl Admission {
    /// True when the attachment was accepted.
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Type and size gate for hosted-mail attachments.
///
/// Constructed explicitly per run and passed in; there is no
/// process-wide policy state.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    allowed_extensions: HashSet<String>,
    max_bytes: u64,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_EXTENSIONS.iter().map(ToString::to_string),
            DEFAULT_MAX_BYTES,
        )
    }
}

impl AdmissionPolicy {
    /// Creates a policy from an extension allow-list and byte ceiling.
    ///
    /// Extensions are matched without their leading dot,
    /// case-insensitively.
    pub fn new(allowed_extensions: impl IntoIterator<Item = String>, max_bytes: u64) -> Self {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            max_bytes,
        }
    }

    /// The configured byte ceiling.
    #[must_use]
    pub const fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Checks a candidate attachment by filename extension and length.
    #[must_use]
    pub fn admit(&self, filename: &str, byte_length: u64) -> Admission {
        let extension = Path::new(filename)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if !self.allowed_extensions.contains(&extension) {
            return Admission::Rejected(RejectReason::UnsupportedType);
        }
        if byte_length > self.max_bytes {
            return Admission::Rejected(RejectReason::TooLarge);
        }
        Admission::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_type_rejected() {
        let policy = AdmissionPolicy::default();
        assert_eq!(
            policy.admit("x.exe", 10),
            Admission::Rejected(RejectReason::UnsupportedType)
        );
    }

    #[test]
    fn test_over_ceiling_rejected() {
        let policy = AdmissionPolicy::default();
        assert_eq!(
            policy.admit("x.pdf", 30_000_000),
            Admission::Rejected(RejectReason::TooLarge)
        );
    }

    #[test]
    fn test_accepted() {
        let policy = AdmissionPolicy::default();
        assert_eq!(policy.admit("x.pdf", 1000), Admission::Accepted);
        assert!(policy.admit("SCAN.PDF", 1000).is_accepted());
    }

    #[test]
    fn test_no_extension_rejected() {
        let policy = AdmissionPolicy::default();
        assert_eq!(
            policy.admit("README", 10),
            Admission::Rejected(RejectReason::UnsupportedType)
        );
    }

    #[test]
    fn test_custom_policy() {
        let policy = AdmissionPolicy::new(vec![".BIN".to_string()], 100);
        assert!(policy.admit("fw.bin", 100).is_accepted());
        assert_eq!(
            policy.admit("fw.bin", 101),
            Admission::Rejected(RejectReason::TooLarge)
        );
    }
}
