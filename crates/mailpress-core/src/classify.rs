//! Subject classification: extracting a project code from a subject line.
//!
//! A [`Classifier`] is built from exactly one [`SubjectPattern`]: the
//! active extraction strategy for the run. Classification is
//! deterministic: there is no fallback chain across patterns.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::sanitize::sanitize_joined;

/// Subject used when a message carries none.
pub const NO_SUBJECT: &str = "No Subject";

/// Reply/forward markers stripped once from the start of a subject.
const SUBJECT_PREFIX: &str = r"(?i)^(?:re|fwd?|aw|sv)\s*:\s*";

/// The closed registry of subject extraction strategies.
///
/// Each variant looks for a different subject style; the capture-group
/// convention is shared: earlier groups are keyword labels, the last
/// non-empty group is the discriminating code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectPattern {
    /// `Invoice #12-34`, `INV: 9` styles.
    Invoice,
    /// `Project: ALPHA-1` styles.
    Project,
    /// `Client: Acme Corp - ...` styles (name runs to the next dash/colon).
    Client,
    /// `Case 8841`, `Ticket: AB-12` styles.
    Case,
    /// `Order #551`, `PO-99` styles.
    Order,
    /// `Contract C-17`, `Agreement 2024-1` styles.
    Contract,
    /// `Quote Q-3`, `RFQ 12` styles.
    Quote,
    /// `Proposal P-9`, `RFP 2024` styles.
    Proposal,
    /// `HW 3`, `Assignment A2` styles.
    Homework,
    /// `Class MATH 1010`, `Course CS101` styles.
    Class,
    /// Everything before the first dash/colon.
    Default,
    /// A ten-character code starting with a digit, delimited by
    /// non-alphanumerics.
    AerospaceCode,
    /// A bracketed/parenthesized token, or the token after a colon.
    Generic,
}

impl SubjectPattern {
    /// All registered patterns, in registry order.
    pub const ALL: [Self; 13] = [
        Self::Invoice,
        Self::Project,
        Self::Client,
        Self::Case,
        Self::Order,
        Self::Contract,
        Self::Quote,
        Self::Proposal,
        Self::Homework,
        Self::Class,
        Self::Default,
        Self::AerospaceCode,
        Self::Generic,
    ];

    /// Registry name of this pattern.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Project => "project",
            Self::Client => "client",
            Self::Case => "case",
            Self::Order => "order",
            Self::Contract => "contract",
            Self::Quote => "quote",
            Self::Proposal => "proposal",
            Self::Homework => "homework",
            Self::Class => "class",
            Self::Default => "default",
            Self::AerospaceCode => "aerospace-code",
            Self::Generic => "generic",
        }
    }

    /// Regex source for this pattern.
    const fn source(self) -> &'static str {
        match self {
            Self::Invoice => r"(?i)(invoice|inv)[:\s#-]*([A-Z0-9-]+)",
            Self::Project => r"(?i)(project|proj)[:\s#-]*([A-Z0-9-]+)",
            Self::Client => r"(?i)(client|customer)[:\s#-]*([A-Za-z0-9 ]+?)\s*(?:[-:]|$)",
            Self::Case => r"(?i)(case|ticket)[:\s#-]*([A-Z0-9-]+)",
            Self::Order => r"(?i)(order|po)[:\s#-]*([A-Z0-9-]+)",
            Self::Contract => r"(?i)(contract|agreement)[:\s#-]*([A-Z0-9-]+)",
            Self::Quote => r"(?i)(quote|rfq)[:\s#-]*([A-Z0-9-]+)",
            Self::Proposal => r"(?i)(proposal|rfp)[:\s#-]*([A-Z0-9-]+)",
            Self::Homework => r"(?i)(hw|homework|assignment)[:\s#-]*(\d+|[A-Z]+\d+)",
            Self::Class => r"(?i)(class|course)[:\s#-]*([A-Z]{2,4}\s?\d{3,4})",
            Self::Default => r"(?i)^([A-Za-z0-9&'().\s]+?)\s*[-:]",
            Self::AerospaceCode => r"(?:^|[^A-Za-z0-9])([0-9][A-Za-z0-9]{9})(?:[^A-Za-z0-9]|$)",
            Self::Generic => r"[\[\(]([A-Za-z0-9\-_\s]+)[\]\)]|:\s*([A-Za-z0-9\-_]+)",
        }
    }
}

impl fmt::Display for SubjectPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SubjectPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|p| p.name()).collect();
                format!("unknown pattern `{s}`; known patterns: {}", known.join(", "))
            })
    }
}

/// Compiles a fixed pattern literal; a failure here is a bug.
#[allow(clippy::expect_used)]
fn compile(src: &str) -> Regex {
    Regex::new(src).expect("pattern literal compiles")
}

/// Subject classifier configured with one active extraction pattern.
#[derive(Debug)]
pub struct Classifier {
    pattern: SubjectPattern,
    regex: Regex,
    prefix: Regex,
}

impl Classifier {
    /// Creates a classifier for the given pattern.
    #[must_use]
    pub fn new(pattern: SubjectPattern) -> Self {
        Self {
            pattern,
            regex: compile(pattern.source()),
            prefix: compile(SUBJECT_PREFIX),
        }
    }

    /// The active pattern.
    #[must_use]
    pub const fn pattern(&self) -> SubjectPattern {
        self.pattern
    }

    /// Defaults an absent subject and strips one leading reply/forward
    /// marker.
    ///
    /// Stripping is single-pass: `"FWD: fwd: x"` loses only the
    /// outermost marker.
    #[must_use]
    pub fn clean_subject(&self, subject: Option<&str>) -> String {
        let s = subject.unwrap_or(NO_SUBJECT).trim();
        self.prefix.replace(s, "").into_owned()
    }

    /// Extracts a sanitized project code from a subject line.
    ///
    /// Returns `None` when the pattern does not match or matches with
    /// no non-empty captured group; the caller treats that as a
    /// recoverable per-message failure.
    #[must_use]
    pub fn classify(&self, subject: Option<&str>) -> Option<String> {
        let cleaned = self.clean_subject(subject);
        let captures = self.regex.captures(&cleaned)?;

        // Later groups carry the discriminating code; keyword groups
        // come first.
        let mut code = None;
        for group in captures.iter().skip(1).flatten() {
            if !group.as_str().is_empty() {
                code = Some(group.as_str());
            }
        }
        Some(sanitize_joined(code?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn classifier(pattern: SubjectPattern) -> Classifier {
        Classifier::new(pattern)
    }

    #[test]
    fn test_all_patterns_compile() {
        for pattern in SubjectPattern::ALL {
            let _ = classifier(pattern);
        }
    }

    #[test]
    fn test_pattern_from_str() {
        assert_eq!(
            "invoice".parse::<SubjectPattern>().unwrap(),
            SubjectPattern::Invoice
        );
        assert_eq!(
            " Aerospace-Code ".parse::<SubjectPattern>().unwrap(),
            SubjectPattern::AerospaceCode
        );
        assert!("nonesuch".parse::<SubjectPattern>().is_err());
    }

    #[test]
    fn test_invoice_with_reply_prefix() {
        let c = classifier(SubjectPattern::Invoice);
        assert_eq!(c.classify(Some("Re: Invoice #12-34")).as_deref(), Some("12-34"));
        assert_eq!(c.classify(Some("Invoice #12-34")).as_deref(), Some("12-34"));
    }

    #[test]
    fn test_stacked_prefixes_strip_once() {
        let c = classifier(SubjectPattern::Invoice);
        // Only the outermost marker is stripped; the pattern still finds
        // the invoice keyword further in.
        assert_eq!(c.clean_subject(Some("FWD: fwd: Re: Invoice: 9")), "fwd: Re: Invoice: 9");
        assert_eq!(c.classify(Some("FWD: fwd: Re: Invoice: 9")).as_deref(), Some("9"));
    }

    #[test]
    fn test_no_match_yields_none() {
        let c = classifier(SubjectPattern::Invoice);
        assert_eq!(c.classify(Some("no codes here")), None);
    }

    #[test]
    fn test_absent_subject_defaults() {
        let c = classifier(SubjectPattern::Invoice);
        assert_eq!(c.clean_subject(None), NO_SUBJECT);
        assert_eq!(c.classify(None), None);
    }

    #[test]
    fn test_client_name_runs_to_delimiter() {
        let c = classifier(SubjectPattern::Client);
        assert_eq!(
            c.classify(Some("Client: Acme Corp - March deliverables")).as_deref(),
            Some("Acme_Corp")
        );
        assert_eq!(c.classify(Some("Customer Initech")).as_deref(), Some("Initech"));
    }

    #[test]
    fn test_default_takes_leading_segment() {
        let c = classifier(SubjectPattern::Default);
        assert_eq!(
            c.classify(Some("Orion Build - weekly sync")).as_deref(),
            Some("Orion_Build")
        );
        assert_eq!(c.classify(Some("no delimiter at all")), None);
    }

    #[test]
    fn test_aerospace_code_boundaries() {
        let c = classifier(SubjectPattern::AerospaceCode);
        assert_eq!(c.classify(Some("unit 3TB71K9Q2Z shipped")).as_deref(), Some("3TB71K9Q2Z"));
        // Eleven alphanumerics in a row is not a code.
        assert_eq!(c.classify(Some("serial 3TB71K9Q2ZX")), None);
    }

    #[test]
    fn test_generic_last_nonempty_group() {
        let c = classifier(SubjectPattern::Generic);
        // Bracketed form captures group 1, colon form group 2; the last
        // non-empty one wins either way.
        assert_eq!(c.classify(Some("[ALPHA-7] minutes")).as_deref(), Some("ALPHA-7"));
        assert_eq!(c.classify(Some("status: GAMMA_2")).as_deref(), Some("GAMMA_2"));
    }

    #[test]
    fn test_homework_and_class() {
        let hw = classifier(SubjectPattern::Homework);
        assert_eq!(hw.classify(Some("HW #3")).as_deref(), Some("3"));
        assert_eq!(hw.classify(Some("Assignment A2")).as_deref(), Some("A2"));

        let class = classifier(SubjectPattern::Class);
        assert_eq!(class.classify(Some("Course CS 101 syllabus")).as_deref(), Some("CS_101"));
        assert_eq!(class.classify(Some("Course C 1 syllabus")).as_deref(), None);
    }

    #[test]
    fn test_code_is_sanitized() {
        let c = classifier(SubjectPattern::Generic);
        assert_eq!(c.classify(Some("[a  b]")).as_deref(), Some("a_b"));
    }
}
