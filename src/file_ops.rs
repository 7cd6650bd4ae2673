//! Vault file operations
//!
//! A vault file holds one armored [`VaultRecord`]. It either seals the
//! contents of an arbitrary file or, for an entry vault, an [`EntryStore`].
//! Every file written here goes through a tempfile in the target directory
//! that gets mode 0o600 (read/write for owner only) on Unix systems, is
//! fsync'ed, and is then renamed into place.

use crate::entries::EntryStore;
use crate::error::{ErrorCategory, ErrorKind, PasslockError, Result};
use crate::password::PasswordSource;
use crate::record::VaultRecord;
use crate::secmem::secure_zero;
use crate::varmor;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Create a new vault at `vault_path` holding the contents of `input_path`.
///
/// Refuses to overwrite an existing file: a new vault gets a new salt, so
/// silently replacing an old one would make its contents unrecoverable.
pub fn create_vault_file(
    input_path: &Path,
    vault_path: &Path,
    password_source: &mut dyn PasswordSource,
) -> Result<()> {
    let plaintext = Zeroizing::new(fs::read(input_path).map_err(|e| read_error(input_path, e))?);
    let password = password_source.read_password()?;
    let record = VaultRecord::seal(&plaintext, &password)
        .map_err(|e| e.with_context("encryption failed"))?;
    write_atomically(vault_path, varmor::wrap(&record).as_bytes(), false)?;

    info!(vault = %vault_path.display(), "vault created");
    Ok(())
}

/// Decrypt the vault at `vault_path` and write its contents to `output_path`.
///
/// An existing `output_path` is replaced as a whole, so it ends up owner-only
/// no matter what permissions it had before.
pub fn open_vault_file(
    vault_path: &Path,
    output_path: &Path,
    password_source: &mut dyn PasswordSource,
) -> Result<()> {
    let record = read_record(vault_path)?;
    let password = password_source.read_password()?;
    let mut plaintext = record
        .open(&password)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    let written = write_atomically(output_path, &plaintext, true);
    secure_zero(plaintext.as_mut_slice());
    written?;

    info!(vault = %vault_path.display(), "vault opened");
    Ok(())
}

/// Replace the contents of an existing vault with the contents of `input_path`.
///
/// 1. Decrypts the existing vault to validate the password
/// 2. Re-encrypts the new contents under the vault's existing salt
/// 3. Atomically replaces `vault_path` (tempfile + fsync + rename)
///
/// Either the old or the new vault exists afterwards, never a partial file,
/// and the password cannot be changed by accident.
pub fn update_vault_file(
    input_path: &Path,
    vault_path: &Path,
    password_source: &mut dyn PasswordSource,
) -> Result<()> {
    let record = read_record(vault_path)?;
    let password = password_source.read_password()?;

    // Validate the password; the old contents are discarded.
    let mut previous = record
        .open(&password)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    secure_zero(previous.as_mut_slice());

    let plaintext = Zeroizing::new(fs::read(input_path).map_err(|e| read_error(input_path, e))?);
    let updated = record
        .reseal(&plaintext, &password)
        .map_err(|e| e.with_context("failed to encrypt"))?;
    write_atomically(vault_path, varmor::wrap(&updated).as_bytes(), true)?;

    info!(vault = %vault_path.display(), "vault updated");
    Ok(())
}

/// Create a new, empty entry vault at `vault_path`. Refuses to overwrite an
/// existing file.
pub fn create_entry_vault(
    vault_path: &Path,
    password_source: &mut dyn PasswordSource,
) -> Result<()> {
    let password = password_source.read_password()?;
    let plaintext = EntryStore::new().to_json()?;
    let record = VaultRecord::seal(&plaintext, &password)
        .map_err(|e| e.with_context("encryption failed"))?;
    write_atomically(vault_path, varmor::wrap(&record).as_bytes(), false)?;

    info!(vault = %vault_path.display(), "entry vault created");
    Ok(())
}

/// Decrypt an entry vault and return its entries.
pub fn read_entries(
    vault_path: &Path,
    password_source: &mut dyn PasswordSource,
) -> Result<EntryStore> {
    let record = read_record(vault_path)?;
    let password = password_source.read_password()?;
    open_entries(&record, &password)
}

/// Decrypt an entry vault, apply `change` to its entries and write the vault
/// back under the same password and salt.
///
/// Nothing is written if `change` fails. The vault file is replaced
/// atomically, as in [`update_vault_file`].
pub fn modify_entries<T>(
    vault_path: &Path,
    password_source: &mut dyn PasswordSource,
    change: impl FnOnce(&mut EntryStore) -> Result<T>,
) -> Result<T> {
    let record = read_record(vault_path)?;
    let password = password_source.read_password()?;
    let mut store = open_entries(&record, &password)?;

    let outcome = change(&mut store)?;

    let plaintext = store.to_json()?;
    let updated = record
        .reseal(&plaintext, &password)
        .map_err(|e| e.with_context("failed to encrypt"))?;
    write_atomically(vault_path, varmor::wrap(&updated).as_bytes(), true)?;

    info!(vault = %vault_path.display(), entries = store.len(), "entry vault updated");
    Ok(outcome)
}

fn open_entries(record: &VaultRecord, password: &[u8]) -> Result<EntryStore> {
    let mut plaintext = record
        .open(password)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    let store = EntryStore::from_json(&plaintext);
    secure_zero(plaintext.as_mut_slice());
    let store = store?;

    debug!(entries = store.len(), "entries loaded");
    Ok(store)
}

fn read_record(vault_path: &Path) -> Result<VaultRecord> {
    let armored_bytes = fs::read(vault_path).map_err(|e| read_error(vault_path, e))?;
    let armored = String::from_utf8(armored_bytes).map_err(|e| {
        PasslockError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            "vault file is not valid UTF-8",
            e,
        )
    })?;
    varmor::unwrap(armored.trim_end()).map_err(|e| e.with_context("failed to unarmor"))
}

/// Write `contents` to `path` through a tempfile in the same directory.
///
/// The target is never visible half-written. With `overwrite` unset, an
/// existing target is left alone and the call fails.
fn write_atomically(path: &Path, contents: &[u8], overwrite: bool) -> Result<()> {
    let dir = path
        .parent()
        .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
        .ok_or_else(|| {
            PasslockError::with_kind(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("{} has no parent directory", path.display()),
            )
        })?;
    let mut temp_file = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| io_error("failed to create tempfile", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| io_error("failed to set tempfile permissions", e))?;
    }

    temp_file
        .write_all(contents)
        .map_err(|e| io_error("failed to write to tempfile", e))?;
    // Flush and fsync() such that the rename, if it succeeds, always points
    // to a complete file.
    temp_file
        .flush()
        .map_err(|e| io_error("failed to flush tempfile", e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| io_error("failed to sync file prior to rename", e))?;

    let persisted = if overwrite {
        temp_file.persist(path)
    } else {
        temp_file.persist_noclobber(path)
    };
    persisted.map_err(|e| {
        let category = if e.error.kind() == io::ErrorKind::AlreadyExists {
            ErrorCategory::User
        } else {
            ErrorCategory::Internal
        };
        PasslockError::with_kind_and_source(
            category,
            ErrorKind::Io,
            format!("failed to write to {}", path.display()),
            e.error,
        )
    })?;
    Ok(())
}

fn io_error(msg: impl Into<String>, err: io::Error) -> PasslockError {
    PasslockError::with_kind_and_source(ErrorCategory::Internal, ErrorKind::Io, msg, err)
}

fn read_error(path: &Path, err: io::Error) -> PasslockError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    PasslockError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
