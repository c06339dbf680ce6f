//! # mailpress-oauth
//!
//! `OAuth2` authentication for the mailpress Gmail collaborator.
//!
//! Provides the authorization code flow with PKCE (CLI paste-code
//! style), token refresh, and the on-disk credential/token files:
//!
//! ```ignore
//! use mailpress_oauth::{AuthorizationCodeFlow, ClientSecrets, OAuthClient, Provider, TokenCache};
//!
//! let secrets = ClientSecrets::load(std::path::Path::new("credentials.json"))?;
//! let provider = Provider::google()?;
//! let mut client = OAuthClient::new(&secrets.client_id, provider);
//! if let Some(secret) = &secrets.client_secret {
//!     client = client.with_client_secret(secret);
//! }
//!
//! let flow = AuthorizationCodeFlow::new(client).with_pkce();
//! println!("Visit: {}", flow.authorization_url(None, None)?);
//! let token = flow.exchange_code("pasted-code")?;
//! TokenCache::new("token.json").store(&token)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod flow;
pub mod provider;
pub mod store;
pub mod token;

pub use error::{Error, Result};
pub use flow::{AuthorizationCodeFlow, OAuthClient, PkceChallenge};
pub use provider::Provider;
pub use store::{ClientSecrets, TokenCache};
pub use token::Token;
