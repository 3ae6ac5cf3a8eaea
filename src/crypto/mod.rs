//! Codecs turning a plaintext buffer into a cookie-safe token and back.
//!
//! Every scheme follows the same contract:
//!
//! - sealing an empty buffer yields nothing;
//! - sealing always uses the first (primary) key;
//! - opening tries every key, in order, and reports whether a key other than
//!   the primary one was needed ([`Opened::rotated`]);
//! - malformed or forged tokens never produce an error, just `None`.
pub(crate) mod encryption;
mod master;
pub(crate) mod signing;

pub use master::{Key, KeyError, KEY_LENGTH};

use aes_gcm::Aes256Gcm;
use chacha20poly1305::XChaCha20Poly1305;

/// The separator between the two segments of a token.
pub(crate) const SEPARATOR: char = '.';

/// The cryptographic scheme used to protect a cookie value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
pub enum Scheme {
    /// The value is signed with HMAC-SHA256.
    /// Signing guarantees **integrity**, the value is readable by the client.
    #[serde(rename = "hmac")]
    Hmac,
    /// The value is encrypted with AES-256-GCM (96-bit random nonce).
    /// Encryption guarantees **confidentiality** as well as **integrity**.
    #[serde(rename = "aes-gcm")]
    AesGcm,
    /// The value is encrypted with XChaCha20-Poly1305 (192-bit random nonce).
    #[serde(rename = "xchacha20-poly1305")]
    XChaCha20Poly1305,
}

/// The outcome of successfully opening a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opened {
    /// The plaintext that was sealed.
    pub value: Vec<u8>,
    /// `true` if the token was opened with a key other than the primary one.
    /// The cookie should be sealed again with the primary key.
    pub rotated: bool,
}

impl Scheme {
    /// Seal `value` using the first key in `keys`.
    ///
    /// Returns `None` if `value` is empty or if the primary key can't be used
    /// with this scheme.
    ///
    /// # Panics
    ///
    /// Panics if `keys` is empty.
    pub fn seal(&self, value: &[u8], keys: &[Key]) -> Option<String> {
        let primary = keys.first().expect("at least one key is required");
        if value.is_empty() {
            return None;
        }
        match self {
            Scheme::Hmac => signing::seal(value, primary),
            Scheme::AesGcm => encryption::seal::<Aes256Gcm>(value, primary),
            Scheme::XChaCha20Poly1305 => encryption::seal::<XChaCha20Poly1305>(value, primary),
        }
    }

    /// Open a token produced by [`Scheme::seal`], trying each key in order.
    pub fn open(&self, token: &str, keys: &[Key]) -> Option<Opened> {
        match self {
            Scheme::Hmac => signing::open(token, keys),
            Scheme::AesGcm => encryption::open::<Aes256Gcm>(token, keys),
            Scheme::XChaCha20Poly1305 => encryption::open::<XChaCha20Poly1305>(token, keys),
        }
    }

    /// The exact key length required by the scheme, if any.
    pub fn required_key_length(&self) -> Option<usize> {
        match self {
            Scheme::Hmac => None,
            Scheme::AesGcm | Scheme::XChaCha20Poly1305 => Some(KEY_LENGTH),
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Hmac => write!(f, "hmac"),
            Scheme::AesGcm => write!(f, "aes-gcm"),
            Scheme::XChaCha20Poly1305 => write!(f, "xchacha20-poly1305"),
        }
    }
}

/// Split a token into its two segments.
/// Tokens with fewer or more than two segments are rejected.
pub(crate) fn split_token(token: &str) -> Option<(&str, &str)> {
    let (first, second) = token.split_once(SEPARATOR)?;
    if second.contains(SEPARATOR) {
        return None;
    }
    Some((first, second))
}
