//! One-way password digests.
//!
//! SHA-256 over the UTF-8 password bytes, rendered as lowercase hex. The
//! digest is unsalted, so equal passwords share a hash across accounts.
//! Adding a salt changes the stored format and is left to a deliberate
//! migration.

use sha2::{Digest, Sha256};

/// Hashes `password` into its stored representation.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Returns whether `password` hashes to `stored_hash`.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    hash_password(password) == stored_hash
}
