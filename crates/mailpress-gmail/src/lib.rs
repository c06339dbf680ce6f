//! # mailpress-gmail
//!
//! Blocking Gmail REST API v1 client for `mailpress`.
//!
//! Provides the four calls the fetch pipeline needs: paginated
//! message search, full message fetch (headers + MIME part tree),
//! attachment blob fetch, and raw original fetch: plus the
//! inbox/spam query scoping rule.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
pub mod types;

pub use client::{GmailClient, scoped_query};
pub use error::{Error, Result};
pub use types::{Header, Message, MessageList, MessagePart, MessageRef, PartBody};
