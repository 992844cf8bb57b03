//! Content hashing for base documents.

use sha2::{Digest, Sha256};

/// Compute the staleness token for a base document.
///
/// Lowercase hex SHA-256 of the document's UTF-8 bytes.
pub fn hash_document(document: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.as_bytes());
    hex::encode(hasher.finalize())
}
