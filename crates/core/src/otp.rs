//! One-time password generation and hashing for phone login.
//!
//! Codes are numeric, short-lived, and single-use. Only the SHA-256 hash
//! of a code is stored so a database leak does not expose live codes.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Number of digits in an OTP code.
pub const OTP_CODE_LEN: usize = 6;

/// How long a code stays valid.
pub const OTP_EXPIRY_SECS: i64 = 120;

/// Minimum seconds between two code requests for the same phone number.
pub const OTP_RESEND_COOLDOWN_SECS: i64 = 60;

const DIGITS: &[u8] = b"0123456789";

/// Generate a random numeric code of [`OTP_CODE_LEN`] digits.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..OTP_CODE_LEN)
        .map(|_| DIGITS[rng.random_range(0..DIGITS.len())] as char)
        .collect()
}

/// SHA-256 hash of a code, hex-encoded, for at-rest storage and lookup.
pub fn hash_code(code: &str) -> String {
    let digest = Sha256::digest(code.as_bytes());
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_shape() {
        let code = generate_code();
        assert_eq!(code.len(), OTP_CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = hash_code("123456");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_code("123456"), hash_code("123456"));
        assert_ne!(hash_code("123456"), hash_code("654321"));
    }

    #[test]
    fn test_expiry_longer_than_cooldown() {
        assert!(OTP_EXPIRY_SECS > OTP_RESEND_COOLDOWN_SECS);
    }
}
