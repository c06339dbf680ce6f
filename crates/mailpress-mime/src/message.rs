//! MIME message structure and parsing.
//!
//! [`Message::parse`] is the crate's entry point: it reads a raw RFC 822
//! message, walks the multipart tree, and exposes the headers and
//! attachments the pipeline needs.

use crate::content::{ContentDisposition, ContentType};
use crate::encoding::{decode_base64, decode_quoted_printable, decode_rfc2047};
use crate::error::{Error, Result};
use crate::header::Headers;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

/// An attachment extracted from a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    /// Filename as declared in the part headers; may be empty when the
    /// part only carries an `attachment` disposition.
    pub name: String,
    /// Decoded attachment bytes.
    pub data: Vec<u8>,
}

/// One MIME part: headers plus its raw (still-encoded) body.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body, before transfer decoding.
    pub body: Vec<u8>,
}

impl Part {
    /// Parses a part from its raw bytes.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let (header_text, body) = split_headers_body(raw);
        Self {
            headers: Headers::parse(&header_text),
            body: body.to_vec(),
        }
    }

    /// Gets the content type, defaulting to `text/plain`.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Gets the content disposition, if any.
    #[must_use]
    pub fn content_disposition(&self) -> Option<ContentDisposition> {
        self.headers
            .get("content-disposition")
            .map(ContentDisposition::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Declared filename: `Content-Disposition: filename` first, then
    /// the legacy `Content-Type: name` parameter. Encoded words are
    /// decoded.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        if let Some(disposition) = self.content_disposition()
            && let Some(name) = disposition.filename()
        {
            return Some(decode_rfc2047(name));
        }
        self.content_type()
            .ok()
            .and_then(|ct| ct.name().map(decode_rfc2047))
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(&self.body)),
            TransferEncoding::QuotedPrintable => decode_quoted_printable(&self.body),
            _ => Ok(self.body.clone()),
        }
    }
}

/// A parsed MIME message.
#[derive(Debug, Clone)]
pub struct Message {
    /// Top-level headers.
    pub headers: Headers,
    /// Direct parts (empty for single-part messages).
    pub parts: Vec<Part>,
    /// Body for single-part messages.
    pub body: Option<Vec<u8>>,
}

impl Message {
    /// Parses a raw RFC 822 message.
    ///
    /// # Errors
    ///
    /// Returns an error when the header block or a declared multipart
    /// structure is malformed (a multipart content type without a
    /// boundary, for example).
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let (header_text, body) = split_headers_body(raw);
        let headers = Headers::parse(&header_text);

        let content_type = headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)?;

        if content_type.is_multipart() {
            let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
            let parts = split_multipart(body, boundary)
                .into_iter()
                .map(Part::parse)
                .collect();
            Ok(Self {
                headers,
                parts,
                body: None,
            })
        } else {
            Ok(Self {
                headers,
                parts: Vec::new(),
                body: Some(body.to_vec()),
            })
        }
    }

    /// Decoded Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.headers.get_decoded("subject")
    }

    /// Decoded From header.
    #[must_use]
    pub fn from(&self) -> Option<String> {
        self.headers.get_decoded("from")
    }

    /// Date header.
    #[must_use]
    pub fn date(&self) -> Option<String> {
        self.headers.get_decoded("date")
    }

    /// Collects every attachment in the message, walking nested
    /// multipart levels.
    ///
    /// A part counts as an attachment when it declares a filename or an
    /// `attachment` disposition.
    ///
    /// # Errors
    ///
    /// Returns an error when a part's structure or transfer encoding is
    /// invalid.
    pub fn attachments(&self) -> Result<Vec<AttachmentFile>> {
        let mut found = Vec::new();
        for part in &self.parts {
            collect_attachments(part, &mut found)?;
        }

        // A single-part message can itself be an attachment.
        if self.parts.is_empty()
            && let Some(body) = &self.body
        {
            let as_part = Part {
                headers: self.headers.clone(),
                body: body.clone(),
            };
            if is_attachment_part(&as_part) {
                push_attachment(&as_part, &mut found)?;
            }
        }

        Ok(found)
    }
}

/// Recursively collects attachments below `part`.
fn collect_attachments(part: &Part, found: &mut Vec<AttachmentFile>) -> Result<()> {
    let content_type = part.content_type()?;
    if content_type.is_multipart() {
        let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
        for raw in split_multipart(&part.body, boundary) {
            collect_attachments(&Part::parse(raw), found)?;
        }
        return Ok(());
    }

    if is_attachment_part(part) {
        push_attachment(part, found)?;
    }
    Ok(())
}

fn is_attachment_part(part: &Part) -> bool {
    part.filename().is_some()
        || part
            .content_disposition()
            .is_some_and(|d| d.is_attachment())
}

fn push_attachment(part: &Part, found: &mut Vec<AttachmentFile>) -> Result<()> {
    found.push(AttachmentFile {
        name: part.filename().unwrap_or_default(),
        data: part.decode_body()?,
    });
    Ok(())
}

/// Splits a raw message into header text and body bytes at the first
/// blank line.
fn split_headers_body(raw: &[u8]) -> (String, &[u8]) {
    if let Some(idx) = find_subsequence(raw, b"\r\n\r\n") {
        (
            String::from_utf8_lossy(&raw[..idx]).into_owned(),
            &raw[idx + 4..],
        )
    } else if let Some(idx) = find_subsequence(raw, b"\n\n") {
        (
            String::from_utf8_lossy(&raw[..idx]).into_owned(),
            &raw[idx + 2..],
        )
    } else {
        (String::from_utf8_lossy(raw).into_owned(), &[])
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Splits a multipart body into raw part segments.
///
/// Boundary lines delimit segments; the closing `--boundary--` line
/// ends the walk. The line break preceding a delimiter belongs to the
/// delimiter, not the part.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let close = format!("--{boundary}--");

    let mut parts = Vec::new();
    let mut current_start: Option<usize> = None;
    let mut pos = 0;

    while pos < body.len() {
        let line_end = body[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| pos + i + 1);
        let line = trim_line_ending(&body[pos..line_end]);

        if line == close.as_bytes() {
            if let Some(start) = current_start.take() {
                parts.push(trim_trailing_newline(&body[start..pos]));
            }
            return parts;
        }
        if line == delimiter.as_bytes() {
            if let Some(start) = current_start {
                parts.push(trim_trailing_newline(&body[start..pos]));
            }
            current_start = Some(line_end);
        }

        pos = line_end;
    }

    // Unterminated multipart: keep what we have.
    if let Some(start) = current_start {
        parts.push(trim_trailing_newline(&body[start..]));
    }
    parts
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn trim_trailing_newline(segment: &[u8]) -> &[u8] {
    let segment = segment.strip_suffix(b"\n").unwrap_or(segment);
    segment.strip_suffix(b"\r").unwrap_or(segment)
}
