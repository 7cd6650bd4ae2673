//! Password-based sealing using Argon2id + AES-256-GCM
//!
//! `encrypt` derives a key from the password and the caller's salt, draws a
//! fresh nonce, and produces `nonce ‖ ciphertext ‖ tag` in a single buffer
//! of exactly `12 + plaintext.len() + 16` bytes. `decrypt` reverses it and
//! releases plaintext only after the tag has been verified.
//!
//! The derived key and the nonce live in stack slots guarded by
//! [`SecretSlot`], so they are zeroed on every return path. The cipher's
//! expanded key is wiped when the cipher drops, which relies on the
//! `zeroize` feature of `aes`.
//!
//! All functions here require [`crate::init`] to have run.

use crate::blob::{self, KEY_LEN, NONCE_LEN};
use crate::buffer::VaultBuffer;
use crate::error::{PasslockError, Result};
use crate::secmem::SecretSlot;
use crate::{kdf, random};
use aes_gcm::Aes256Gcm;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use tracing::{debug, trace};

/// Encrypt `plaintext` under a key derived from `password` and `salt`.
///
/// Returns the sealed blob. The salt is not included in it; store it
/// alongside the blob, it is needed to decrypt.
pub fn encrypt(plaintext: &[u8], password: &[u8], salt: &[u8]) -> Result<VaultBuffer> {
    let mut key = [0u8; KEY_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    seal_with_slots(&mut key, &mut nonce, plaintext, password, salt)
}

/// Decrypt a blob produced by [`encrypt`] with the same password and salt.
///
/// A wrong password and a damaged blob both yield `AuthenticationFailed`.
pub fn decrypt(blob: &[u8], password: &[u8], salt: &[u8]) -> Result<VaultBuffer> {
    let mut key = [0u8; KEY_LEN];
    open_with_slot(&mut key, blob, password, salt)
}

pub(crate) fn seal_with_slots(
    key_slot: &mut [u8; KEY_LEN],
    nonce_slot: &mut [u8; NONCE_LEN],
    plaintext: &[u8],
    password: &[u8],
    salt: &[u8],
) -> Result<VaultBuffer> {
    let mut key = SecretSlot::new(key_slot);
    let mut nonce = SecretSlot::new(nonce_slot);
    trace!(plaintext_len = plaintext.len(), "sealing");

    kdf::derive_key_into(password, salt, &mut key[..])?;
    random::random_bytes(&mut nonce[..])?;

    let mut sealed = VaultBuffer::zeroed(blob::sealed_len(plaintext.len())?)?;
    let (nonce_out, body) = sealed.as_mut_slice().split_at_mut(NONCE_LEN);
    let (ciphertext, tag_out) = body.split_at_mut(plaintext.len());
    nonce_out.copy_from_slice(&nonce[..]);
    ciphertext.copy_from_slice(plaintext);

    let cipher = Aes256Gcm::new(GenericArray::from_slice(&key[..]));
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(&nonce[..]), &[], ciphertext)
        .map_err(|_| PasslockError::crypto_failure("encryption failed"))?;
    tag_out.copy_from_slice(tag.as_slice());

    debug!(blob_len = sealed.len(), "sealed vault blob");
    Ok(sealed)
}

pub(crate) fn open_with_slot(
    key_slot: &mut [u8; KEY_LEN],
    blob: &[u8],
    password: &[u8],
    salt: &[u8],
) -> Result<VaultBuffer> {
    let mut key = SecretSlot::new(key_slot);

    // Length is checked before the (slow) derivation.
    let parts = blob::split(blob)?;
    kdf::derive_key_into(password, salt, &mut key[..])?;

    let mut opened = VaultBuffer::zeroed(parts.ciphertext.len())?;
    opened.as_mut_slice().copy_from_slice(parts.ciphertext);

    let cipher = Aes256Gcm::new(GenericArray::from_slice(&key[..]));
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(&parts.nonce[..]),
            &[],
            opened.as_mut_slice(),
            GenericArray::from_slice(&parts.tag[..]),
        )
        .map_err(|_| {
            debug!(blob_len = blob.len(), "blob failed authentication");
            PasslockError::authentication_failed()
        })?;

    debug!(plaintext_len = opened.len(), "opened vault blob");
    Ok(opened)
}
