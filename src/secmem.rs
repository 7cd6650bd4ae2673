//! Erasure of secret memory
//!
//! Every buffer that holds a derived key or a nonce is wiped through this
//! module. The writes are performed by `zeroize`, which uses volatile stores
//! followed by a compiler fence so the optimizer cannot drop them even when
//! the buffer is about to go out of scope.

use std::ops::{Deref, DerefMut};
use zeroize::Zeroize;

/// Overwrite every byte of `region` with zero.
pub fn secure_zero(region: &mut [u8]) {
    region.zeroize();
}

/// Borrows a caller-owned buffer and wipes it when dropped.
///
/// The guard is created before anything is written into the buffer, so the
/// wipe runs on every exit from the enclosing scope, including `?` returns.
pub(crate) struct SecretSlot<'a> {
    bytes: &'a mut [u8],
}

impl<'a> SecretSlot<'a> {
    pub(crate) fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }
}

impl Deref for SecretSlot<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.bytes
    }
}

impl DerefMut for SecretSlot<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.bytes
    }
}

impl Drop for SecretSlot<'_> {
    fn drop(&mut self) {
        secure_zero(self.bytes);
    }
}
