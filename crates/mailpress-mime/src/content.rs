//! Content-Type and Content-Disposition header values.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Parses `key=value` parameters from a `;`-separated header tail.
fn parse_parameters<'a>(parts: impl Iterator<Item = &'a str>) -> HashMap<String, String> {
    let mut parameters = HashMap::new();
    for param in parts {
        if let Some((key, value)) = param.trim().split_once('=') {
            parameters.insert(
                key.trim().to_lowercase(),
                value.trim().trim_matches('"').to_string(),
            );
        }
    }
    parameters
}

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Parameters (e.g., charset=utf-8, boundary=xxx).
    pub parameters: HashMap<String, String>,
}

impl ContentType {
    /// The implicit type of a part with no Content-Type header.
    #[must_use]
    pub fn text_plain() -> Self {
        Self {
            main_type: "text".to_string(),
            sub_type: "plain".to_string(),
            parameters: HashMap::new(),
        }
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get("boundary").map(String::as_str)
    }

    /// Returns the name parameter if present (legacy attachment naming).
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.parameters.get("name").map(String::as_str)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2=value2`
    ///
    /// # Errors
    ///
    /// Returns an error if the type/subtype segment is malformed.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');

        let type_str = parts
            .next()
            .ok_or_else(|| Error::InvalidContentType("empty content type".to_string()))?
            .trim();

        let (main_type, sub_type) = type_str
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(format!("missing subtype in `{type_str}`")))?;

        Ok(Self {
            main_type: main_type.trim().to_lowercase(),
            sub_type: sub_type.trim().to_lowercase(),
            parameters: parse_parameters(parts),
        })
    }
}

/// MIME content disposition with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// Disposition token ("attachment", "inline", ...).
    pub disposition: String,
    /// Parameters (filename=..., size=...).
    pub parameters: HashMap<String, String>,
}

impl ContentDisposition {
    /// Parses a content disposition string.
    ///
    /// Format: `attachment; filename="report.pdf"`
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let mut parts = s.split(';');
        let disposition = parts.next().unwrap_or_default().trim().to_lowercase();

        Self {
            disposition,
            parameters: parse_parameters(parts),
        }
    }

    /// True when the part is an explicit attachment.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.disposition == "attachment"
    }

    /// Returns the filename parameter if present.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.parameters.get("filename").map(String::as_str)
    }
}
