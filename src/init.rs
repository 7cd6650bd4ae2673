//! One-time engine initialization
//!
//! `init` must complete successfully before any other operation of the
//! crate is used. It checks that the fixed key derivation parameters are
//! accepted by the primitive and that the OS entropy source can be read.
//! Engine operations `debug_assert!` the precondition; release builds do
//! not initialize on the caller's behalf.

use crate::error::Result;
use crate::{kdf, random};
use once_cell::sync::OnceCell;
use tracing::debug;

static ENGINE: OnceCell<()> = OnceCell::new();

/// Initialize the vault engine. Safe to call repeatedly and from several
/// threads; only the first successful call does any work. A failed
/// initialization is not remembered, so it may be retried.
pub fn init() -> Result<()> {
    ENGINE.get_or_try_init(|| -> Result<()> {
        kdf::fixed_params()?;
        let mut probe = [0u8; 16];
        random::fill_from_os(&mut probe)?;
        debug!("vault engine initialized");
        Ok(())
    })?;
    Ok(())
}

/// Whether [`init`] has completed successfully in this process.
pub fn is_initialized() -> bool {
    ENGINE.get().is_some()
}
