use anyhow::Context;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::{split_token, Key, Opened, SEPARATOR};

/// Signs `value` with the given key.
///
/// The token is `base64(value).base64(HMAC-SHA256(key, value))`.
pub(crate) fn seal(value: &[u8], key: &Key) -> Option<String> {
    match sign(value, key.as_bytes()) {
        Ok(token) => Some(token),
        Err(e) => {
            tracing::trace!(error = ?e, "Failed to sign a cookie value");
            None
        }
    }
}

/// Verifies a signed token against each key, in order.
///
/// For every key the full token is computed again and compared, in constant
/// time, against the token presented by the client.
pub(crate) fn open(token: &str, keys: &[Key]) -> Option<Opened> {
    let (value, _) = split_token(token)?;
    let value = match BASE64_URL_SAFE_NO_PAD
        .decode(value)
        .context("Failed to decode cookie value using base64 (URL-safe, no padding)")
    {
        Ok(value) => value,
        Err(e) => {
            tracing::trace!(error = ?e, "Rejected a signed cookie value");
            return None;
        }
    };
    if value.is_empty() {
        return None;
    }

    for (index, key) in keys.iter().enumerate() {
        let Ok(expected) = sign(&value, key.as_bytes()) else {
            continue;
        };
        if bool::from(expected.as_bytes().ct_eq(token.as_bytes())) {
            return Some(Opened {
                value,
                rotated: index > 0,
            });
        }
        tracing::trace!(key_index = index, "Cookie signature did not match");
    }
    None
}

fn sign(value: &[u8], key: &[u8]) -> Result<String, anyhow::Error> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|_| anyhow::anyhow!("Invalid signing key"))?;
    mac.update(value);

    let mut token = BASE64_URL_SAFE_NO_PAD.encode(value);
    token.push(SEPARATOR);
    BASE64_URL_SAFE_NO_PAD.encode_string(mac.finalize().into_bytes(), &mut token);
    Ok(token)
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use crate::crypto::{Key, Opened, Scheme};

    fn key(material: &str) -> Key {
        Key::from(material.as_bytes().to_vec())
    }

    #[test]
    fn known_signature() {
        let token = Scheme::Hmac
            .seal(b"hello", &[key("chain-happy-record-blank")])
            .unwrap();
        assert_eq!(token, "aGVsbG8.O9MpLTsvrxg2Z5O2RV05_LJ6I5Skmx6tQ1g3rQXcaW8");

        let opened = Scheme::Hmac.open(&token, &[key("chain-happy-record-blank")]);
        assert_eq!(
            opened,
            Some(Opened {
                value: b"hello".to_vec(),
                rotated: false
            })
        );
    }

    #[test]
    fn wrong_key() {
        let token = Scheme::Hmac
            .seal(b"hello", &[key("chain-happy-record-blank")])
            .unwrap();

        assert_eq!(Scheme::Hmac.open(&token, &[key("record-blank")]), None);
    }

    #[test]
    fn second_key() {
        let token = Scheme::Hmac
            .seal(b"hello", &[key("chain-happy-record-blank")])
            .unwrap();

        let opened = Scheme::Hmac.open(
            &token,
            &[
                key("desk-species-eventually-vowel"),
                key("chain-happy-record-blank"),
            ],
        );
        assert_eq!(
            opened,
            Some(Opened {
                value: b"hello".to_vec(),
                rotated: true
            })
        );
    }

    #[test]
    fn empty() {
        assert_eq!(
            Scheme::Hmac.seal(b"", &[key("chain-happy-record-blank")]),
            None
        );
    }

    #[test]
    fn malformed() {
        let keys = [key("desk-species-eventually-vowel")];
        assert_that!(Scheme::Hmac.open("", &keys), none());
        assert_that!(Scheme::Hmac.open(".asd", &keys), none());
        assert_that!(Scheme::Hmac.open("aGVsbG8", &keys), none());

        let token = Scheme::Hmac.seal(b"hello", &keys).unwrap();
        assert_that!(Scheme::Hmac.open(&token[..token.len() - 1], &keys), none());
        assert_that!(Scheme::Hmac.open(&format!("{token}.x"), &keys), none());
    }

    #[test]
    fn tampered_value_is_rejected() {
        let keys = [key("chain-happy-record-blank")];
        let token = Scheme::Hmac.seal(b"hello", &keys).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        // base64("jello")
        let forged = format!("amVsbG8.{signature}");
        assert_eq!(Scheme::Hmac.open(&forged, &keys), None);
    }
}
