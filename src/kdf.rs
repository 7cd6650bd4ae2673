//! Password to key derivation using Argon2id
//!
//! The cost parameters are fixed. They are not stored next to the
//! ciphertext, so changing any of them makes every existing vault
//! undecryptable.

use crate::blob::{KEY_LEN, SALT_LEN};
use crate::error::{PasslockError, Result};
use crate::secmem::secure_zero;
use argon2::{Algorithm, Argon2, Params, Version};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Argon2id memory cost in KiB (64 MiB).
pub const KDF_MEMORY_KIB: u32 = 64 * 1024;

/// Argon2id number of passes over memory.
pub const KDF_ITERATIONS: u32 = 2;

/// Argon2id lanes.
pub const KDF_PARALLELISM: u32 = 1;

/// A key derived from a password. Wiped on drop; never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Get the key bytes.
    ///
    /// The returned reference should be used immediately and not copied out.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey([REDACTED])")
    }
}

pub(crate) fn fixed_params() -> Result<Params> {
    Params::new(
        KDF_MEMORY_KIB,
        KDF_ITERATIONS,
        KDF_PARALLELISM,
        Some(KEY_LEN),
    )
    .map_err(|e| {
        PasslockError::crypto_failure(format!("key derivation parameters rejected: {}", e))
    })
}

/// Derive a key from `password` and `salt`.
///
/// `password` must be non-empty and `salt` exactly [`SALT_LEN`] bytes.
/// The same inputs always produce the same key.
///
/// Requires [`crate::init`] to have run.
pub fn derive_key(password: &[u8], salt: &[u8]) -> Result<DerivedKey> {
    let mut key = DerivedKey { key: [0u8; KEY_LEN] };
    derive_key_into(password, salt, &mut key.key)?;
    Ok(key)
}

/// Derive into a caller-owned slot. On error the slot is zeroed.
pub(crate) fn derive_key_into(password: &[u8], salt: &[u8], out: &mut [u8]) -> Result<()> {
    debug_assert!(
        crate::init::is_initialized(),
        "passlock::init() must be called before deriving keys"
    );

    if password.is_empty() {
        return Err(PasslockError::invalid_input("password must not be empty"));
    }
    if salt.len() != SALT_LEN {
        return Err(PasslockError::invalid_input(format!(
            "invalid salt length: expected {}, got {}",
            SALT_LEN,
            salt.len()
        )));
    }
    if out.len() != KEY_LEN {
        return Err(PasslockError::invalid_input(format!(
            "invalid key buffer length: expected {}, got {}",
            KEY_LEN,
            out.len()
        )));
    }

    #[cfg(test)]
    DERIVATIONS.with(|n| n.set(n.get() + 1));

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, fixed_params()?);
    argon2.hash_password_into(password, salt, out).map_err(|e| {
        secure_zero(out);
        PasslockError::crypto_failure(format!("key derivation failed: {}", e))
    })
}

#[cfg(test)]
thread_local! {
    static DERIVATIONS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Number of derivations attempted on the current thread.
#[cfg(test)]
pub(crate) fn derivations_on_this_thread() -> usize {
    DERIVATIONS.with(|n| n.get())
}
