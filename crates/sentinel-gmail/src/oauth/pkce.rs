//! PKCE (RFC 7636) code verifier and challenge.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

/// PKCE code challenge and verifier pair.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    verifier: String,
    challenge: String,
}

impl PkceChallenge {
    /// Challenge method sent with the authorization request.
    pub const METHOD: &'static str = "S256";

    /// Generates a fresh verifier and its SHA-256 challenge.
    #[must_use]
    pub fn generate() -> Self {
        let random_bytes: [u8; 32] = rand::thread_rng().r#gen();
        Self::from_verifier(URL_SAFE_NO_PAD.encode(random_bytes))
    }

    fn from_verifier(verifier: String) -> Self {
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
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
    fn test_verifier_length() {
        let pkce = PkceChallenge::generate();
        assert_eq!(pkce.verifier().len(), 43);
        assert_ne!(pkce.verifier(), pkce.challenge());
    }

    #[test]
    fn test_rfc7636_vector() {
        // Appendix B of RFC 7636
        let pkce =
            PkceChallenge::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string());
        assert_eq!(
            pkce.challenge(),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_generations_unique() {
        assert_ne!(
            PkceChallenge::generate().verifier(),
            PkceChallenge::generate().verifier()
        );
    }
}
