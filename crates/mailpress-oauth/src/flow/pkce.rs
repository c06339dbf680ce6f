//! PKCE (Proof Key for Code Exchange, RFC 7636).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

/// PKCE code challenge and verifier pair (S256 method).
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    verifier: String,
    challenge: String,
}

impl PkceChallenge {
    /// Challenge method sent to the authorization endpoint.
    pub const METHOD: &'static str = "S256";

    /// Generates a random verifier and its SHA-256 challenge.
    #[must_use]
    pub fn generate() -> Self {
        let random_bytes: Vec<u8> = (0..32).map(|_| rand::thread_rng().r#gen::<u8>()).collect();
        let verifier = URL_SAFE_NO_PAD.encode(random_bytes);
        let challenge = Self::compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    /// Computes the S256 challenge for a verifier.
    fn compute_challenge(verifier: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    /// Returns the verifier.
    #[must_use]
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// Returns the challenge.
    #[must_use]
    pub fn challenge(&self) -> &str {
        &self.challenge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkce_generation() {
        let pkce = PkceChallenge::generate();
        // RFC 7636 requires a 43-128 character verifier.
        assert!(pkce.verifier().len() >= 43);
        assert!(pkce.verifier().len() <= 128);
        assert_ne!(pkce.verifier(), pkce.challenge());
    }

    #[test]
    fn test_challenge_is_deterministic() {
        let challenge = PkceChallenge::compute_challenge("test_verifier_string");
        assert_eq!(challenge, PkceChallenge::compute_challenge("test_verifier_string"));
    }

    #[test]
    fn test_generations_are_unique() {
        let a = PkceChallenge::generate();
        let b = PkceChallenge::generate();
        assert_ne!(a.verifier(), b.verifier());
    }
}
