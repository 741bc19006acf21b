//! Keccak-256 primitives shared by the encoder and the verifier side.

use alloy_primitives::{keccak256, B256};

/// Hashes the UTF-8 bytes of `s`.
pub fn hash_str(s: &str) -> B256 {
    keccak256(s.as_bytes())
}

/// Hashes the concatenation of 32-byte words.
pub fn hash_words<'a>(words: impl IntoIterator<Item = &'a B256>) -> B256 {
    let mut preimage = Vec::new();
    for word in words {
        preimage.extend_from_slice(word.as_slice());
    }
    keccak256(preimage)
}
