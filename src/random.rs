//! Salt and nonce generation from the operating system CSPRNG
//!
//! There is deliberately no fallback: if the OS source fails, the caller
//! gets `SourceUnavailable` and no bytes it could mistake for random.

use crate::blob::SALT_LEN;
use crate::error::{ErrorCategory, ErrorKind, PasslockError, Result};
use rand::TryRngCore;
use rand::rngs::OsRng;

/// A per-vault salt.
pub type Salt = [u8; SALT_LEN];

/// Fill `buf` with bytes from the OS entropy source.
///
/// On error the contents of `buf` are unspecified and must not be used.
///
/// Requires [`crate::init`] to have run.
pub fn random_bytes(buf: &mut [u8]) -> Result<()> {
    debug_assert!(
        crate::init::is_initialized(),
        "passlock::init() must be called before random_bytes()"
    );
    fill_from_os(buf)
}

/// Generate a fresh salt for a new vault.
///
/// Requires [`crate::init`] to have run.
pub fn generate_salt() -> Result<Salt> {
    let mut salt = [0u8; SALT_LEN];
    random_bytes(&mut salt)?;
    Ok(salt)
}

/// Entropy read without the init precondition; `init` itself probes through this.
pub(crate) fn fill_from_os(buf: &mut [u8]) -> Result<()> {
    OsRng.try_fill_bytes(buf).map_err(|e| {
        PasslockError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::SourceUnavailable,
            format!("OS entropy source unavailable: {}", e),
            e,
        )
    })
}
