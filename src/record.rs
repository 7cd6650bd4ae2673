//! A sealed vault together with its salt
//!
//! The engine never embeds the salt in the blob, so anything that persists a
//! vault has to keep both. `VaultRecord` is that pairing. A record keeps its
//! salt for its whole life: resealing new contents reuses it and only the
//! nonce changes.

use crate::blob::SALT_LEN;
use crate::buffer::VaultBuffer;
use crate::error::Result;
use crate::random::{self, Salt};
use crate::secretcrypt;

#[derive(Clone, PartialEq, Eq)]
pub struct VaultRecord {
    salt: Salt,
    blob: Vec<u8>,
}

impl VaultRecord {
    /// Seal `plaintext` into a new vault with a freshly generated salt.
    pub fn seal(plaintext: &[u8], password: &[u8]) -> Result<Self> {
        let salt = random::generate_salt()?;
        let blob = secretcrypt::encrypt(plaintext, password, &salt)?;
        Ok(Self {
            salt,
            blob: blob.into_vec(),
        })
    }

    /// Reassemble a record from stored parts.
    pub fn from_parts(salt: Salt, blob: Vec<u8>) -> Self {
        Self { salt, blob }
    }

    /// Decrypt the vault contents.
    pub fn open(&self, password: &[u8]) -> Result<VaultBuffer> {
        secretcrypt::decrypt(&self.blob, password, &self.salt)
    }

    /// Seal new contents into the same vault, keeping its salt.
    ///
    /// This does not check `password` against the current contents; callers
    /// that must not change the password by accident call [`Self::open`] first.
    pub fn reseal(&self, plaintext: &[u8], password: &[u8]) -> Result<Self> {
        let blob = secretcrypt::encrypt(plaintext, password, &self.salt)?;
        Ok(Self {
            salt: self.salt,
            blob: blob.into_vec(),
        })
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn blob(&self) -> &[u8] {
        &self.blob
    }
}

impl std::fmt::Debug for VaultRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultRecord")
            .field("salt", &self.salt)
            .field("blob_len", &self.blob.len())
            .finish()
    }
}
