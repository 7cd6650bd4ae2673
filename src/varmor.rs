//! Versioned text armoring for vault records
//!
//! The armored format is:
//!
//! ```text
//! passlock1:{base64url(salt)}.{base64url(blob)}
//! ```
//!
//! Both parts are base64url without padding, so the result is free of
//! whitespace and safe to embed in URLs or pass unescaped in a POSIX shell.

use crate::blob::SALT_LEN;
use crate::error::{ErrorCategory, ErrorKind, PasslockError, Result};
use crate::record::VaultRecord;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Magic prefix for all passlock versions
const MAGIC_PREFIX: &str = "passlock";

/// Version 1 magic marker
const V1_MAGIC: &str = "passlock1:";

const SEPARATOR: char = '.';

/// Armor a record.
pub fn wrap(record: &VaultRecord) -> String {
    format!(
        "{}{}{}{}",
        V1_MAGIC,
        URL_SAFE_NO_PAD.encode(record.salt()),
        SEPARATOR,
        URL_SAFE_NO_PAD.encode(record.blob())
    )
}

/// Parse an armored record.
///
/// Only the framing is validated here. A blob too short to be valid is
/// reported by `open`.
pub fn unwrap(armored: &str) -> Result<VaultRecord> {
    let Some(payload) = armored.strip_prefix(V1_MAGIC) else {
        return Err(if armored.starts_with(MAGIC_PREFIX) {
            PasslockError::with_kind(
                ErrorCategory::User,
                ErrorKind::ArmoringFromFuture,
                "input claims to be a passlock vault, but not a version we support",
            )
        } else {
            PasslockError::with_kind(
                ErrorCategory::User,
                ErrorKind::ArmoringInvalid,
                "input unrecognized as a passlock vault",
            )
        });
    };

    let (salt_part, blob_part) = payload.split_once(SEPARATOR).ok_or_else(|| {
        PasslockError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "missing separator between salt and blob; likely truncated",
        )
    })?;

    let salt = decode(salt_part, "salt")?;
    let salt: [u8; SALT_LEN] = salt.try_into().map_err(|s: Vec<u8>| {
        PasslockError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            format!("invalid salt length: expected {}, got {}", SALT_LEN, s.len()),
        )
    })?;
    let blob = decode(blob_part, "blob")?;

    Ok(VaultRecord::from_parts(salt, blob))
}

fn decode(encoded: &str, what: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(encoded).map_err(|e| {
        PasslockError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::ArmoringDecode,
            format!("base64 decoding of {} failed: {}", what, e),
            e,
        )
    })
}
