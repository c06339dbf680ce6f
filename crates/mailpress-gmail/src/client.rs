//! Blocking Gmail REST API v1 client.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{AttachmentBody, Message, MessageList, MessagePart, MessageRef, RawMessage};

/// Production API endpoint.
const DEFAULT_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

/// Page size requested from the search endpoint.
const PAGE_SIZE: usize = 100;

/// Appends `in:inbox` / `-in:spam` qualifiers when the user query does
/// not already pin scope or spam handling.
///
/// The fetch pipeline must never pull from spam, and defaults to
/// inbox-only unless the query says otherwise.
#[must_use]
pub fn scoped_query(query: &str) -> String {
    let mut scoped = query.trim().to_string();

    let has_scope = scoped
        .split_whitespace()
        .any(|t| t.trim_start_matches('-').starts_with("in:"));
    if !has_scope {
        if !scoped.is_empty() {
            scoped.push(' ');
        }
        scoped.push_str("in:inbox");
    }

    let mentions_spam = scoped
        .split_whitespace()
        .any(|t| t == "in:spam" || t == "-in:spam");
    if !mentions_spam {
        scoped.push_str(" -in:spam");
    }

    scoped
}

/// Decodes Gmail's base64url payloads (padding optional).
fn decode_base64url(data: &str) -> Result<Vec<u8>> {
    let trimmed = data.trim_end_matches('=');
    URL_SAFE_NO_PAD.decode(trimmed).map_err(Into::into)
}

/// Shape of a Gmail error response body.
#[derive(Debug, serde::Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Blocking Gmail API client authenticated with a bearer token.
#[derive(Debug)]
pub struct GmailClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    /// Creates a client for the production endpoint.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: access_token.into(),
        }
    }

    /// Overrides the API base URL (tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Searches `users/me/messages`, following pages until `limit` ids
    /// are collected (or the results are exhausted; `None` = no limit).
    ///
    /// # Errors
    ///
    /// Returns an error on a failed request or error response.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<MessageRef>> {
        let mut refs: Vec<MessageRef> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let remaining = limit.map(|l| l.saturating_sub(refs.len()));
            if remaining == Some(0) {
                break;
            }
            let page_size = remaining.map_or(PAGE_SIZE, |r| r.min(PAGE_SIZE));
            let max_results = page_size.to_string();

            let mut params: Vec<(&str, &str)> =
                vec![("q", query), ("maxResults", &max_results)];
            if let Some(token) = &page_token {
                params.push(("pageToken", token));
            }

            let list: MessageList = self.get_json("users/me/messages", &params)?;
            debug!(
                page_hits = list.messages.len(),
                estimate = list.result_size_estimate,
                "search page fetched"
            );
            refs.extend(list.messages);

            match list.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        if let Some(l) = limit {
            refs.truncate(l);
        }
        Ok(refs)
    }

    /// Fetches a full message (headers plus MIME part tree).
    ///
    /// # Errors
    ///
    /// Returns an error on a failed request or error response.
    pub fn fetch_message(&self, id: &str) -> Result<Message> {
        self.get_json(&format!("users/me/messages/{id}"), &[("format", "full")])
    }

    /// Fetches the verbatim original message bytes.
    ///
    /// # Errors
    ///
    /// Returns an error on a failed request, an error response, or a
    /// response with no raw payload.
    pub fn fetch_raw(&self, id: &str) -> Result<Vec<u8>> {
        let raw: RawMessage =
            self.get_json(&format!("users/me/messages/{id}"), &[("format", "raw")])?;
        let data = raw
            .raw
            .ok_or_else(|| Error::MissingData(format!("no raw payload for message {id}")))?;
        decode_base64url(&data)
    }

    /// Fetches an attachment's bytes, from inline data when the part
    /// carries it, otherwise via the attachments endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error on a failed request, an error response, or a
    /// part with neither inline data nor an attachment id.
    pub fn fetch_attachment(&self, message_id: &str, part: &MessagePart) -> Result<Vec<u8>> {
        if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref()) {
            return decode_base64url(data);
        }

        let attachment_id = part
            .body
            .as_ref()
            .and_then(|b| b.attachment_id.as_deref())
            .ok_or_else(|| {
                Error::MissingData(format!(
                    "part `{}` of message {message_id} has no data and no attachment id",
                    part.filename
                ))
            })?;

        let body: AttachmentBody = self.get_json(
            &format!("users/me/messages/{message_id}/attachments/{attachment_id}"),
            &[],
        )?;
        let data = body
            .data
            .ok_or_else(|| Error::MissingData(format!("empty attachment {attachment_id}")))?;
        decode_base64url(&data)
    }

    /// Issues an authenticated GET and parses the JSON response.
    fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(params)
            .send()?;

        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map_or_else(|_| status.to_string(), |e| e.error.message);
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}
