//! Normalized message types at the collaborator boundary.
//!
//! Collaborators (the local `.eml` reader, the Gmail client) produce
//! [`NormalizedMessage`] values; the pipeline never depends on a
//! collaborator's concrete message shape.

/// A single attachment as delivered by a collaborator.
#[derive(Debug, Clone)]
pub struct AttachmentData {
    /// Raw filename as reported by the source (unsanitized).
    pub name: String,
    /// Attachment bytes, fully decoded.
    pub bytes: Vec<u8>,
}

impl AttachmentData {
    /// Creates an attachment record.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// A message normalized to the shape the pipeline consumes.
#[derive(Debug, Clone, Default)]
pub struct NormalizedMessage {
    /// Stable unique identifier within the source system.
    ///
    /// Filename for local files, provider message id for hosted mail.
    /// Never empty; the materializer fails fast otherwise.
    pub source_id: String,
    /// Subject line, if the message carries one.
    pub subject: Option<String>,
    /// Attachments in source order; may be empty.
    pub attachments: Vec<AttachmentData>,
    /// Verbatim original message bytes, archived when present.
    pub raw_bytes: Option<Vec<u8>>,
    /// Sender display string (hosted mode manifest).
    pub from: Option<String>,
    /// Date header string (hosted mode manifest).
    pub date: Option<String>,
}

impl NormalizedMessage {
    /// Creates a message with the given source id.
    #[must_use]
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            ..Self::default()
        }
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Appends an attachment.
    #[must_use]
    pub fn with_attachment(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.attachments.push(AttachmentData::new(name, bytes));
        self
    }

    /// Sets the raw original bytes.
    #[must_use]
    pub fn with_raw_bytes(mut self, raw: Vec<u8>) -> Self {
        self.raw_bytes = Some(raw);
        self
    }
}
