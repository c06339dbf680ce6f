//! Serde models for the Gmail REST API v1.

use serde::Deserialize;

/// Response of `users/me/messages` (search).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageList {
    /// Matching message references; absent when there are no hits.
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    /// Token for the next page, if any.
    pub next_page_token: Option<String>,
    /// Server-side estimate of the total result count.
    pub result_size_estimate: Option<u64>,
}

/// Reference to a message in a search result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    /// Message id.
    pub id: String,
    /// Thread id.
    pub thread_id: Option<String>,
}

/// A full message (`format=full`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message id.
    pub id: String,
    /// Short snippet of the message text.
    pub snippet: Option<String>,
    /// Root of the MIME part tree.
    pub payload: Option<MessagePart>,
    /// Internal date, epoch milliseconds as a string.
    pub internal_date: Option<String>,
}

impl Message {
    /// First header value with the given name (case-insensitive),
    /// searched on the root payload part.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload.as_ref()?.header(name)
    }

    /// Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.header("Subject")
    }

    /// From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.header("From")
    }

    /// Date header.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.header("Date")
    }

    /// Every part in the tree that declares a filename: the message's
    /// attachments, in document order.
    #[must_use]
    pub fn attachment_parts(&self) -> Vec<&MessagePart> {
        let mut found = Vec::new();
        if let Some(payload) = &self.payload {
            payload.collect_attachments(&mut found);
        }
        found
    }
}

/// One node of the MIME part tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    /// Part id, used to fetch attachment bodies.
    pub part_id: Option<String>,
    /// MIME type of the part.
    pub mime_type: Option<String>,
    /// Declared filename; empty for non-attachment parts.
    #[serde(default)]
    pub filename: String,
    /// Part headers.
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Part body.
    pub body: Option<PartBody>,
    /// Child parts.
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl MessagePart {
    /// First header value with the given name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Declared body size in bytes, when known.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.body.as_ref().and_then(|b| b.size).unwrap_or(0)
    }

    fn collect_attachments<'a>(&'a self, found: &mut Vec<&'a Self>) {
        if !self.filename.is_empty() {
            found.push(self);
        }
        for part in &self.parts {
            part.collect_attachments(found);
        }
    }
}

/// One message or part header.
#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

/// Body of a part: inline data or an attachment reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    /// Id for the attachments endpoint, when the data is not inline.
    pub attachment_id: Option<String>,
    /// Size in bytes.
    pub size: Option<u64>,
    /// Inline base64url data.
    pub data: Option<String>,
}

/// Response of the attachments endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentBody {
    /// Size in bytes.
    pub size: Option<u64>,
    /// Base64url data.
    pub data: Option<String>,
}

/// A message fetched with `format=raw`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    /// Message id.
    pub id: String,
    /// Base64url-encoded original message bytes.
    pub raw: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_message_header_lookup() {
        let json = r#"{
            "id": "m1",
            "payload": {
                "headers": [
                    {"name": "Subject", "value": "Invoice #1"},
                    {"name": "From", "value": "a@example.com"}
                ],
                "parts": [
                    {"partId": "1", "filename": "", "mimeType": "text/plain"},
                    {"partId": "2", "filename": "report.pdf",
                     "body": {"attachmentId": "att-1", "size": 4}}
                ]
            }
        }"#;

        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.subject(), Some("Invoice #1"));
        assert_eq!(msg.header("subject"), Some("Invoice #1"));
        assert_eq!(msg.from(), Some("a@example.com"));
        assert!(msg.date().is_none());

        let attachments = msg.attachment_parts();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].filename, "report.pdf");
        assert_eq!(attachments[0].size(), 4);
    }

    #[test]
    fn test_nested_parts_walked() {
        let json = r#"{
            "id": "m2",
            "payload": {
                "parts": [
                    {"partId": "1", "mimeType": "multipart/alternative", "parts": [
                        {"partId": "1.1", "filename": "inline.png",
                         "body": {"data": "aGk="}}
                    ]}
                ]
            }
        }"#;

        let msg: Message = serde_json::from_str(json).unwrap();
        let attachments = msg.attachment_parts();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].filename, "inline.png");
    }

    #[test]
    fn test_empty_search_result() {
        let list: MessageList = serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        assert!(list.messages.is_empty());
        assert!(list.next_page_token.is_none());
    }
}
