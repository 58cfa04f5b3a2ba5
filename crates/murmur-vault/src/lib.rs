// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential encryption-at-rest for the murmur agent runtime.
//!
//! Provider API secrets live in a [`CredentialBundle`]. At rest the bundle
//! is either plain JSON or an AES-256-GCM envelope keyed by
//! PBKDF2-HMAC-SHA256 (100,000 iterations) over a user passphrase.
//! Decryption is authenticated; a bad tag is reported as
//! `InvalidPassphrase`, never as garbage plaintext.

pub mod bundle;
pub mod kdf;

pub use bundle::{CredentialBundle, Envelope, StoredCredentials};
