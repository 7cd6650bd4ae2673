//! Ownership of buffers handed out by the engine
//!
//! Blobs returned by `encrypt` and plaintexts returned by `decrypt` are
//! `VaultBuffer`s. A buffer is released exactly once: by [`free_buffer`],
//! by [`VaultBuffer::into_vec`], or by going out of scope. Moves make a
//! second release impossible. The engine only ever returns a buffer after
//! it has been completely written; on error paths the buffer is dropped
//! before the error propagates.
//!
//! Released buffers are not wiped. Erasure is guaranteed for key material
//! only; callers holding sensitive plaintext wipe it themselves.

use crate::error::{ErrorCategory, ErrorKind, PasslockError, Result};
use std::ops::Deref;

#[derive(Clone, PartialEq, Eq)]
pub struct VaultBuffer {
    bytes: Vec<u8>,
}

impl VaultBuffer {
    /// Allocate exactly `len` zero bytes, reporting allocation failure
    /// instead of aborting.
    pub(crate) fn zeroed(len: usize) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(len).map_err(|e| {
            PasslockError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::OutOfMemory,
                format!("failed to allocate {} byte buffer", len),
                e,
            )
        })?;
        bytes.resize(len, 0);
        Ok(Self { bytes })
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Take ownership of the bytes. This releases the buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl Deref for VaultBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for VaultBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for VaultBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultBuffer")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Release a buffer returned by the engine. `None` is a no-op.
pub fn free_buffer(buffer: Option<VaultBuffer>) {
    drop(buffer);
}
