//! One-time password-reset secrets.
//!
//! The raw secret goes to the account holder out-of-band and is never stored;
//! only its sha256 digest lands on the account record. The digest is
//! deliberately unsalted: the secret carries 32 bytes of entropy, and lookup
//! has to be by equality on the digest rather than by per-candidate
//! re-verification.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Validity window for a pending reset secret.
const RESET_WINDOW_MINUTES: i64 = 10;

/// A freshly generated reset secret: the raw value for the account holder,
/// the digest and expiry for the account record.
#[derive(Debug)]
pub struct ResetSecret {
    pub raw: String,
    pub hashed: String,
    pub expires_at: DateTime<Utc>,
}

/// Generates a new reset secret from 32 bytes of OS randomness. The expiry
/// derives from the caller-supplied `now`, so the window is deterministic
/// under test.
pub fn generate(now: DateTime<Utc>) -> ResetSecret {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let raw = hex::encode(bytes);

    ResetSecret {
        hashed: hash_token(&raw),
        raw,
        expires_at: now + Duration::minutes(RESET_WINDOW_MINUTES),
    }
}

/// Deterministic digest of a raw secret, used to look up the pending record
/// when the raw value comes back from a reset link.
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_produces_high_entropy_raw_secret() {
        let secret = generate(Utc::now());
        // 32 random bytes, hex-encoded.
        assert_eq!(secret.raw.len(), 64);
        assert!(secret.raw.chars().all(|c| c.is_ascii_hexdigit()));

        let other = generate(Utc::now());
        assert_ne!(secret.raw, other.raw);
    }

    #[test]
    fn test_hash_is_deterministic_and_matches_generate() {
        let secret = generate(Utc::now());
        assert_eq!(secret.hashed, hash_token(&secret.raw));
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        // The stored value is never the raw secret.
        assert_ne!(secret.hashed, secret.raw);
    }

    #[test]
    fn test_expiry_window_is_exactly_ten_minutes_from_now() {
        let now = Utc::now();
        let secret = generate(now);

        assert_eq!(
            secret.expires_at,
            now + Duration::minutes(RESET_WINDOW_MINUTES)
        );
    }
}
