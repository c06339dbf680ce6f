//! # mailpress-core
//!
//! Classification and materialization pipeline for `mailpress`.
//!
//! This crate provides:
//! - Filesystem-safe name sanitization
//! - Subject classification (project code extraction)
//! - Collision-free path allocation
//! - Attachment admission filtering (type + size)
//! - Append-only idempotency ledger
//! - The per-message materialization state machine
//!
//! Collaborators hand the pipeline [`NormalizedMessage`] values; the
//! pipeline owns everything below the output root.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod admission;
pub mod allocate;
pub mod classify;
mod error;
pub mod ledger;
pub mod materialize;
pub mod message;
pub mod sanitize;

pub use admission::{Admission, AdmissionPolicy, RejectReason};
pub use allocate::allocate_unique;
pub use classify::{Classifier, SubjectPattern};
pub use error::{Error, Result};
pub use ledger::{Ledger, LedgerEntry};
pub use materialize::{MaterializeConfig, Materializer, Outcome, Summary};
pub use message::{AttachmentData, NormalizedMessage};
pub use sanitize::{sanitize, sanitize_joined};
