use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// Use of Internal is never a guarantee that the error was not caused
    /// by the caller, merely that the code cannot tell.
    Internal,

    /// The caller provided invalid input or credentials, or asked for
    /// something that cannot be done.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
///
/// Every error produced by the vault engine (`secretcrypt`, `kdf`, `random`,
/// `blob`, `buffer`) carries one of the first five kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Empty password, wrong salt length, or a blob too short to hold a
    /// nonce and a tag.
    InvalidInput,
    /// An output buffer could not be allocated.
    OutOfMemory,
    /// The key derivation function or the cipher failed internally. This is
    /// never used for a failed authentication check.
    CryptoFailure,
    /// Tag verification failed. Covers both a wrong password and a
    /// corrupted or tampered-with blob; the two are never distinguished.
    AuthenticationFailed,
    /// The operating system entropy source could not be read.
    SourceUnavailable,
    /// The armored record is malformed (prefix, separator, or salt length).
    ArmoringInvalid,
    /// Base64 decoding of an armored component failed.
    ArmoringDecode,
    /// Input claimed to be a passlock record but used an unsupported version.
    ArmoringFromFuture,
    /// A password could not be obtained from the configured source.
    PasswordUnavailable,
    /// Password and its confirmation did not match.
    PasswordMismatch,
    /// No entry matched the given id or name.
    EntryNotFound,
    /// The vault opened but does not hold a readable entry list.
    EntryFormat,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct PasslockError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag. Code consuming errors from the
    /// outer layers MUST handle the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl PasslockError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorCategory::User, ErrorKind::InvalidInput, msg)
    }

    pub(crate) fn crypto_failure(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorCategory::Internal, ErrorKind::CryptoFailure, msg)
    }

    /// The single error returned for a failed tag check.
    pub(crate) fn authentication_failed() -> Self {
        Self::with_kind(
            ErrorCategory::User,
            ErrorKind::AuthenticationFailed,
            "corrupt input, tampered-with data, or wrong password",
        )
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns true if the error is tagged with `kind`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == Some(kind)
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PasslockError>;
