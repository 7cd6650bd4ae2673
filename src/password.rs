//! Sources of vault passwords
//!
//! Every source hands out passwords wrapped in `Zeroizing` so that they are
//! wiped from memory when dropped. Empty passwords are rejected at the source,
//! since the engine cannot derive a key from one.

use crate::error::{ErrorCategory, ErrorKind, PasslockError, Result};
use std::io::{self, IsTerminal, Read, Write};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Anything that can produce a password.
pub trait PasswordSource {
    /// Read a password as arbitrary bytes (not necessarily UTF-8).
    fn read_password(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

fn non_empty(password: Zeroizing<Vec<u8>>) -> Result<Zeroizing<Vec<u8>>> {
    if password.is_empty() {
        return Err(PasslockError::invalid_input("password must not be empty"));
    }
    Ok(password)
}

/// Returns a fixed password (for testing and embedding).
pub struct FixedPassword {
    password: Zeroizing<Vec<u8>>,
}

impl FixedPassword {
    pub fn new(password: Vec<u8>) -> Self {
        Self {
            password: Zeroizing::new(password),
        }
    }
}

impl PasswordSource for FixedPassword {
    fn read_password(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        non_empty(Zeroizing::new((*self.password).clone()))
    }
}

/// Reads the whole of an `io::Read` source, typically stdin.
///
/// A single trailing `\n` or `\r\n` is removed, so `echo secret | passlock`
/// and `printf secret | passlock` agree on the password.
pub struct StdinPassword {
    reader: Box<dyn Read>,
}

impl StdinPassword {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PasswordSource for StdinPassword {
    fn read_password(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            PasslockError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading password: {}", e),
                e,
            )
        })?;
        if data.ends_with(b"\n") {
            data.pop();
            if data.ends_with(b"\r") {
                data.pop();
            }
        }
        non_empty(data)
    }
}

/// Reads a password from the terminal with no echo.
pub struct TerminalPassword {
    prompt: &'static str,
}

impl TerminalPassword {
    pub fn new() -> Self {
        Self::with_prompt("Password (passlock): ")
    }

    pub fn with_prompt(prompt: &'static str) -> Self {
        Self { prompt }
    }
}

impl Default for TerminalPassword {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordSource for TerminalPassword {
    /// Terminal input is limited to UTF-8 by rpassword. Use a stdin source
    /// for non-UTF-8 passwords.
    fn read_password(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(PasslockError::with_kind(
                ErrorCategory::User,
                ErrorKind::PasswordUnavailable,
                "cannot read password from terminal - stdin is not a terminal",
            ));
        }

        let mut stderr = io::stderr();
        stderr
            .write_all(self.prompt.as_bytes())
            .and_then(|()| stderr.flush())
            .map_err(|e| {
                PasslockError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;

        // rpassword returns a String, which is moved into Zeroizing right away.
        let password = rpassword::read_password().map_err(|e| {
            PasslockError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PasswordUnavailable,
                format!("failure reading password: {}", e),
                e,
            )
        })?;

        non_empty(Zeroizing::new(password.into_bytes()))
    }
}

/// Reads from two sources and insists they agree. Used when creating a
/// vault, where a typo would lock the owner out.
pub struct ConfirmingPassword {
    first: Box<dyn PasswordSource>,
    confirm: Box<dyn PasswordSource>,
}

impl ConfirmingPassword {
    pub fn new(first: Box<dyn PasswordSource>, confirm: Box<dyn PasswordSource>) -> Self {
        Self { first, confirm }
    }
}

impl PasswordSource for ConfirmingPassword {
    fn read_password(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let password = self.first.read_password()?;
        let confirmation = self.confirm.read_password()?;
        if !bool::from(password.as_slice().ct_eq(confirmation.as_slice())) {
            return Err(PasslockError::with_kind(
                ErrorCategory::User,
                ErrorKind::PasswordMismatch,
                "passwords do not match",
            ));
        }
        Ok(password)
    }
}
