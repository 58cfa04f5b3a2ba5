// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential bundles and their encrypted-at-rest envelope.
//!
//! A bundle maps provider IDs to API secrets. At rest it is either plain
//! JSON (non-sensitive deploys) or an envelope `{data, salt, iv,
//! encrypted: true}`: the bundle serialized, then sealed with
//! AES-256-GCM under a passphrase-derived key. Every seal draws a fresh
//! 96-bit nonce; the envelope is decryptable iff the caller supplies the
//! passphrase used at encryption time, and any authentication failure
//! surfaces as `InvalidPassphrase`, never as garbage plaintext.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use murmur_core::MurmurError;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::kdf;

/// A mapping from provider ID to API secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialBundle {
    secrets: HashMap<String, String>,
}

impl CredentialBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the secret for a provider.
    pub fn insert(&mut self, provider: impl Into<String>, secret: impl Into<String>) {
        self.secrets.insert(provider.into(), secret.into());
    }

    /// The secret for a provider, if present.
    pub fn get(&self, provider: &str) -> Option<&str> {
        self.secrets.get(provider).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Provider IDs carrying a secret.
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.secrets.keys().map(String::as_str)
    }

    /// Seal this bundle into an encrypted envelope.
    pub fn seal(
        &self,
        passphrase: &SecretString,
        iterations: u32,
    ) -> Result<Envelope, MurmurError> {
        let mut sealed = serde_json::to_vec(&self.secrets)
            .map_err(|e| MurmurError::Vault(format!("bundle serialization failed: {e}")))?;

        let salt = kdf::generate_salt()?;
        let key = kdf::derive_key(
            passphrase.expose_secret().as_bytes(),
            &salt,
            iterations,
        )?;

        // One nonce per seal. Reusing one under the same passphrase-derived
        // key would let two envelopes leak each other's secrets.
        let rng = SystemRandom::new();
        let mut iv = [0u8; 12];
        rng.fill(&mut iv)
            .map_err(|_| MurmurError::Vault("nonce generation failed".into()))?;

        // Sealed in place: the serialized secrets become ciphertext plus
        // the 16-byte authentication tag.
        bundle_cipher(&key)?
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(iv),
                Aad::empty(),
                &mut sealed,
            )
            .map_err(|_| MurmurError::Vault("bundle encryption failed".into()))?;

        Ok(Envelope {
            data: B64.encode(sealed),
            salt: B64.encode(salt),
            iv: B64.encode(iv),
            encrypted: true,
        })
    }
}

/// Encrypted-at-rest form of a credential bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Base64 ciphertext including the 16-byte GCM tag.
    pub data: String,
    /// Base64 16-byte PBKDF2 salt.
    pub salt: String,
    /// Base64 96-bit GCM nonce.
    pub iv: String,
    /// Always true; distinguishes envelopes from plain bundles at rest.
    pub encrypted: bool,
}

impl Envelope {
    /// Decrypt the envelope back into a bundle.
    ///
    /// Authentication failure (wrong passphrase, tampered data) and any
    /// malformed field all surface as [`MurmurError::InvalidPassphrase`].
    pub fn open(
        &self,
        passphrase: &SecretString,
        iterations: u32,
    ) -> Result<CredentialBundle, MurmurError> {
        let mut ciphertext = B64
            .decode(&self.data)
            .map_err(|_| MurmurError::InvalidPassphrase)?;
        let salt: [u8; 16] = B64
            .decode(&self.salt)
            .ok()
            .and_then(|v| v.try_into().ok())
            .ok_or(MurmurError::InvalidPassphrase)?;
        let iv: [u8; 12] = B64
            .decode(&self.iv)
            .ok()
            .and_then(|v| v.try_into().ok())
            .ok_or(MurmurError::InvalidPassphrase)?;

        let key = kdf::derive_key(
            passphrase.expose_secret().as_bytes(),
            &salt,
            iterations,
        )?;

        let plaintext = bundle_cipher(&key)?
            .open_in_place(
                Nonce::assume_unique_for_key(iv),
                Aad::empty(),
                &mut ciphertext,
            )
            .map_err(|_| MurmurError::InvalidPassphrase)?;

        let secrets: HashMap<String, String> = serde_json::from_slice(plaintext)
            .map_err(|_| MurmurError::InvalidPassphrase)?;
        Ok(CredentialBundle { secrets })
    }
}

/// AES-256-GCM cipher over a bundle key.
fn bundle_cipher(key: &[u8; 32]) -> Result<LessSafeKey, MurmurError> {
    UnboundKey::new(&AES_256_GCM, key)
        .map(LessSafeKey::new)
        .map_err(|_| MurmurError::Vault("bundle cipher setup failed".into()))
}

/// Persisted form of credentials: plain or sealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredCredentials {
    /// The envelope shape is tried first; it is unambiguous thanks to
    /// its `encrypted` marker field.
    Encrypted(Envelope),
    Plain(CredentialBundle),
}

impl StoredCredentials {
    /// Recover the bundle, supplying a passphrase when sealed.
    pub fn unseal(
        &self,
        passphrase: Option<&SecretString>,
        iterations: u32,
    ) -> Result<CredentialBundle, MurmurError> {
        match self {
            StoredCredentials::Plain(bundle) => Ok(bundle.clone()),
            StoredCredentials::Encrypted(envelope) => {
                let passphrase = passphrase.ok_or(MurmurError::InvalidPassphrase)?;
                envelope.open(passphrase, iterations)
            }
        }
    }
}
