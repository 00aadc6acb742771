//! Password digests.
//!
//! Stored hashes are unsalted hex SHA-256 of `"{username}:{password}"`.
//! The username prefix keeps equal passwords of different users apart.

use sha2::{Digest, Sha256};

/// Hash a credential pair for storage in `[auth.credentials.<username>]`.
pub fn hash_password(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a password against a stored hex digest in constant time.
pub fn verify_password(username: &str, password: &str, stored_hex: &str) -> bool {
    let computed = hash_password(username, password);
    let stored = stored_hex.trim().to_ascii_lowercase();
    if stored.len() != computed.len() {
        return false;
    }
    stored
        .bytes()
        .zip(computed.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_sha256() {
        let hash = hash_password("alice", "secret");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn verify_accepts_matching_password() {
        let hash = hash_password("alice", "secret");
        assert!(verify_password("alice", "secret", &hash));
        assert!(verify_password("alice", "secret", &hash.to_uppercase()));
    }

    #[test]
    fn verify_rejects_wrong_password_or_user() {
        let hash = hash_password("alice", "secret");
        assert!(!verify_password("alice", "Secret", &hash));
        assert!(!verify_password("bob", "secret", &hash));
        assert!(!verify_password("alice", "secret", "not-hex"));
        assert!(!verify_password("alice", "secret", &hash[..63]));
    }

    #[test]
    fn verify_matches_hash_password_digest() {
        let hash = hash_password("carol", "pw");
        assert!(verify_password("carol", "pw", &format!("  {hash}\n")));
        let mut flipped = hash.clone().into_bytes();
        flipped[0] = if flipped[0] == b'0' { b'1' } else { b'0' };
        assert!(!verify_password("carol", "pw", std::str::from_utf8(&flipped).unwrap()));
    }

    #[test]
    fn username_prefix_separates_digests() {
        assert_ne!(hash_password("alice", "pw"), hash_password("bob", "pw"));
    }
}
