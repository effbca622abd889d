//! SHA-256 helpers and the seed commit/reveal scheme.

use sha2::{Digest, Sha256};

/// Lowercase 64-hex SHA-256 digest.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Commitment published in `MATCH_START`: the hash of the UTF-8 seed.
pub fn commit_seed(seed: &str) -> String {
    sha256_hex(seed.as_bytes())
}

/// Check a revealed seed against its commitment in constant time.
pub fn verify_seed(seed: &str, commitment: &str) -> bool {
    constant_time_eq(commit_seed(seed).as_bytes(), commitment.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
