//! Passlock - password-based encryption vault using Argon2id and AES-256-GCM
//!
//! ```no_run
//! # fn main() -> passlock::Result<()> {
//! passlock::init()?;
//!
//! let salt = passlock::generate_salt()?;
//! let blob = passlock::encrypt(b"hello vault", b"correct horse", &salt)?;
//! let plaintext = passlock::decrypt(&blob, b"correct horse", &salt)?;
//! assert_eq!(plaintext.as_slice(), b"hello vault");
//!
//! passlock::free_buffer(Some(blob));
//! # Ok(())
//! # }
//! ```
//!
//! [`init`] must succeed before any other operation is used.
//!
//! On top of the engine, [`file_ops`] keeps whole files or an [`EntryStore`]
//! of password entries in armored vault files.

#![forbid(unsafe_code)]

pub mod blob;
pub mod buffer;
pub mod entries;
pub mod error;
pub mod file_ops;
pub mod generate;
pub mod init;
pub mod kdf;
pub mod password;
pub mod random;
pub mod record;
pub mod secmem;
pub mod secretcrypt;
pub mod varmor;

pub use buffer::{VaultBuffer, free_buffer};
pub use entries::{Entry, EntryStore};
pub use error::{ErrorCategory, ErrorKind, PasslockError, Result};
pub use generate::generate_password;
pub use init::{init, is_initialized};
pub use kdf::{DerivedKey, derive_key};
pub use random::{Salt, generate_salt, random_bytes};
pub use record::VaultRecord;
pub use secmem::secure_zero;
pub use secretcrypt::{decrypt, encrypt};
