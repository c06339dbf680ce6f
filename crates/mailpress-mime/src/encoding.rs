//! Transfer and header decodings.
//!
//! Decode-only: base64, quoted-printable, and RFC 2047 encoded words.
//! Nothing in this workspace generates MIME, so the encode direction is
//! not provided.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decodes base64 data, tolerating embedded whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Decodes quoted-printable bytes (RFC 2045).
///
/// Byte-oriented: attachment bodies are binary and not guaranteed to be
/// UTF-8. Soft line breaks (`=` before CRLF/LF) are removed.
///
/// # Errors
///
/// Returns an error on an incomplete or non-hex escape sequence.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break: "=\r\n" or "=\n".
        if data.get(i + 1) == Some(&b'\r') && data.get(i + 2) == Some(&b'\n') {
            i += 3;
            continue;
        }
        if data.get(i + 1) == Some(&b'\n') {
            i += 2;
            continue;
        }

        let (Some(&hi), Some(&lo)) = (data.get(i + 1), data.get(i + 2)) else {
            return Err(Error::InvalidEncoding(
                "incomplete escape sequence".to_string(),
            ));
        };
        let hex = [hi, lo];
        let hex_str = std::str::from_utf8(&hex)
            .map_err(|_| Error::InvalidEncoding("non-ASCII escape".to_string()))?;
        let value = u8::from_str_radix(hex_str, 16)
            .map_err(|e| Error::InvalidEncoding(format!("invalid hex: {e}")))?;
        result.push(value);
        i += 3;
    }

    Ok(result)
}

/// Decodes RFC 2047 encoded words in a header value.
///
/// Every `=?charset?B|Q?text?=` word is decoded in place; surrounding
/// literal text is kept, and whitespace between two adjacent encoded
/// words is dropped per the RFC. A word that fails to decode is kept
/// literally: header display should never fail outright.
#[must_use]
pub fn decode_rfc2047(text: &str) -> String {
    let mut result = String::new();
    let mut rest = text;
    let mut last_was_encoded = false;

    while let Some(start) = rest.find("=?") {
        let literal = &rest[..start];
        if !(last_was_encoded && literal.chars().all(char::is_whitespace)) {
            result.push_str(literal);
        }

        match parse_encoded_word(&rest[start..]) {
            Some((decoded, consumed)) => {
                result.push_str(&decoded);
                rest = &rest[start + consumed..];
                last_was_encoded = true;
            }
            None => {
                result.push_str("=?");
                rest = &rest[start + 2..];
                last_was_encoded = false;
            }
        }
    }

    result.push_str(rest);
    result
}

/// Parses one encoded word at the start of `text`.
///
/// Returns the decoded string and the number of bytes consumed, or
/// `None` when `text` does not start with a well-formed word.
fn parse_encoded_word(text: &str) -> Option<(String, usize)> {
    let inner = text.strip_prefix("=?")?;
    let (charset, rest) = inner.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let (payload, _) = rest.split_once("?=")?;

    // charset is accepted as-is; non-UTF-8 text decodes lossily.
    let _ = charset;

    let bytes = match encoding {
        "B" | "b" => decode_base64(payload).ok()?,
        "Q" | "q" => {
            // Q encoding writes spaces as underscores.
            let unescaped = payload.replace('_', " ");
            decode_quoted_printable(unescaped.as_bytes()).ok()?
        }
        _ => return None,
    };

    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + payload.len() + 2;
    Some((String::from_utf8_lossy(&bytes).into_owned(), consumed))
}
