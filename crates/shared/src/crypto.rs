//! Token generation and hashing for admin sessions.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a session token (hex encoded to 64 chars).
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Computes SHA-256 hash of the input and returns it as a hex string.
///
/// Session tokens are stored by this digest so a leaked table cannot be
/// replayed as cookies.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates `len` bytes from the OS-seeded thread RNG, hex encoded.
pub fn random_hex(len: usize) -> String {
    let mut buf = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Generates a fresh opaque admin session token.
pub fn generate_session_token() -> String {
    random_hex(SESSION_TOKEN_BYTES)
}

/// Returns true if `token` has the shape of a session token (64 lowercase hex chars).
///
/// Used to reject garbage cookies before touching the store.
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == SESSION_TOKEN_BYTES * 2
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex("test"),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_deterministic() {
        assert_eq!(sha256_hex("same_input"), sha256_hex("same_input"));
        assert_ne!(sha256_hex("input1"), sha256_hex("input2"));
    }

    #[test]
    fn test_generate_session_token_shape() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(is_well_formed_token(&token));
    }

    #[test]
    fn test_generate_session_token_unique() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_random_hex_length() {
        assert_eq!(random_hex(4).len(), 8);
        assert_eq!(random_hex(0), "");
    }

    #[test]
    fn test_is_well_formed_token_rejects_garbage() {
        assert!(!is_well_formed_token(""));
        assert!(!is_well_formed_token("abc"));
        assert!(!is_well_formed_token(&"G".repeat(64)));
        assert!(!is_well_formed_token(&"A".repeat(64))); // uppercase hex is never issued
        assert!(!is_well_formed_token(&"a".repeat(65)));
        assert!(is_well_formed_token(&"0f".repeat(32)));
    }
}
