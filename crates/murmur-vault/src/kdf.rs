// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PBKDF2-HMAC-SHA256 key derivation from a passphrase.
//!
//! Derives a 256-bit key with a 16-byte random salt. The iteration count
//! comes from VaultConfig (default 100,000).

use std::num::NonZeroU32;

use murmur_core::MurmurError;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// Derive a 32-byte key from a passphrase using PBKDF2-HMAC-SHA256.
///
/// The returned key is wrapped in [`Zeroizing`] for automatic memory
/// zeroing on drop.
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8; 16],
    iterations: u32,
) -> Result<Zeroizing<[u8; 32]>, MurmurError> {
    let iterations = NonZeroU32::new(iterations)
        .ok_or_else(|| MurmurError::Config("kdf_iterations must be non-zero".into()))?;

    let mut output = Zeroizing::new([0u8; 32]);
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        passphrase,
        output.as_mut(),
    );
    Ok(output)
}

/// Generate a random 16-byte salt.
pub fn generate_salt() -> Result<[u8; 16], MurmurError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; 16];
    rng.fill(&mut salt)
        .map_err(|_| MurmurError::Vault("salt generation failed".into()))?;
    Ok(salt)
}
