//! Byte layout of a sealed vault blob
//!
//! ```text
//! [nonce: 12 bytes][ciphertext: plaintext length][tag: 16 bytes]
//! ```
//!
//! The salt is not part of the blob. Whoever stores the blob must store the
//! salt next to it (see [`crate::record::VaultRecord`]).

use crate::error::{ErrorCategory, ErrorKind, PasslockError, Result};

/// Length of a per-vault salt in bytes.
pub const SALT_LEN: usize = 16;

/// Length of a derived key in bytes.
pub const KEY_LEN: usize = 32;

/// Length of the AES-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Length of the AES-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Bytes a blob carries on top of its plaintext.
pub const BLOB_OVERHEAD: usize = NONCE_LEN + TAG_LEN;

/// Borrowed view of the components of a blob.
#[derive(Debug, Clone, Copy)]
pub struct BlobParts<'a> {
    pub nonce: &'a [u8; NONCE_LEN],
    pub ciphertext: &'a [u8],
    pub tag: &'a [u8; TAG_LEN],
}

/// Total blob length for a plaintext of `plaintext_len` bytes.
pub fn sealed_len(plaintext_len: usize) -> Result<usize> {
    plaintext_len.checked_add(BLOB_OVERHEAD).ok_or_else(|| {
        PasslockError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::OutOfMemory,
            "plaintext too large to seal",
        )
    })
}

/// Split a blob into nonce, ciphertext and tag.
///
/// Fails with `InvalidInput` if the blob cannot hold a nonce and a tag.
pub fn split(blob: &[u8]) -> Result<BlobParts<'_>> {
    if blob.len() < BLOB_OVERHEAD {
        return Err(PasslockError::invalid_input(format!(
            "blob too short: {} bytes, need at least {}",
            blob.len(),
            BLOB_OVERHEAD
        )));
    }

    let (nonce, body) = blob.split_at(NONCE_LEN);
    let (ciphertext, tag) = body.split_at(body.len() - TAG_LEN);
    let nonce: &[u8; NONCE_LEN] = nonce
        .try_into()
        .map_err(|_| PasslockError::invalid_input("failed to read nonce"))?;
    let tag: &[u8; TAG_LEN] = tag
        .try_into()
        .map_err(|_| PasslockError::invalid_input("failed to read tag"))?;

    Ok(BlobParts {
        nonce,
        ciphertext,
        tag,
    })
}
