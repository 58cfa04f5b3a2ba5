// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content-address fingerprints.
//!
//! A chunk's fingerprint is the first 16 bytes of SHA-256 over its UTF-8
//! text, read big-endian as an unsigned 128-bit integer. Identical text
//! always produces an identical fingerprint.

use ring::digest::{digest, SHA256};

/// Compute the 128-bit fingerprint of a chunk's text.
pub fn fingerprint(text: &str) -> u128 {
    let hash = digest(&SHA256, text.as_bytes());
    let mut prefix = [0u8; 16];
    prefix.copy_from_slice(&hash.as_ref()[..16]);
    u128::from_be_bytes(prefix)
}

/// Fixed-width lowercase hex rendering, the storage form.
pub fn to_hex(fp: u128) -> String {
    format!("{fp:032x}")
}

/// Parse the storage form back into an integer.
pub fn from_hex(s: &str) -> Option<u128> {
    if s.len() != 32 {
        return None;
    }
    u128::from_str_radix(s, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_sha256_prefixes() {
        // SHA-256("") begins e3b0c44298fc1c149afbf4c8996fb924...
        assert_eq!(to_hex(fingerprint("")), "e3b0c44298fc1c149afbf4c8996fb924");
        // SHA-256("abc") begins ba7816bf8f01cfea414140de5dae2223...
        assert_eq!(
            to_hex(fingerprint("abc")),
            "ba7816bf8f01cfea414140de5dae2223"
        );
    }

    #[test]
    fn deterministic_and_content_sensitive() {
        assert_eq!(fingerprint("hello world"), fingerprint("hello world"));
        assert_ne!(fingerprint("hello world"), fingerprint("hello world "));
    }

    #[test]
    fn hex_roundtrip() {
        for text in ["", "a", "the quick brown fox", "ünïcödé"] {
            let fp = fingerprint(text);
            assert_eq!(from_hex(&to_hex(fp)), Some(fp));
        }
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert_eq!(from_hex("zz"), None);
        assert_eq!(from_hex(""), None);
        assert_eq!(from_hex(&"f".repeat(33)), None);
    }
}
