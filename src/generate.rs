//! Random password generation
//!
//! Characters are drawn from the OS entropy source with rejection sampling,
//! so every character of the alphabet is equally likely.

use crate::error::Result;
use crate::random;
use zeroize::Zeroizing;

pub const DEFAULT_LENGTH: usize = 16;
pub const MIN_LENGTH: usize = 4;
pub const MAX_LENGTH: usize = 64;

/// Alphabet of generated passwords.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";

// Bytes at or above this bound are discarded; below it, `byte % len` is uniform.
const ACCEPT_BELOW: usize = 256 - 256 % ALPHABET.len();

/// Generate a password of `length` characters.
///
/// `length` is clamped to `MIN_LENGTH..=MAX_LENGTH`.
///
/// Requires [`crate::init`] to have run.
pub fn generate_password(length: usize) -> Result<Zeroizing<String>> {
    let length = length.clamp(MIN_LENGTH, MAX_LENGTH);
    let mut password = Zeroizing::new(String::with_capacity(length));
    let mut pool = Zeroizing::new([0u8; 2 * MAX_LENGTH]);

    while password.len() < length {
        random::random_bytes(&mut pool[..])?;
        for &byte in pool.iter() {
            if password.len() == length {
                break;
            }
            if usize::from(byte) < ACCEPT_BELOW {
                password.push(char::from(ALPHABET[usize::from(byte) % ALPHABET.len()]));
            }
        }
    }

    Ok(password)
}
