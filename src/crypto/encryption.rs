use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, Nonce};
use anyhow::Context;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

use super::{split_token, Key, Opened, SEPARATOR};

/// Encrypts a cookie value using the given key and a fresh random nonce.
///
/// The token is `base64(ciphertext | tag).base64(nonce)`.
pub(crate) fn seal<A>(value: &[u8], key: &Key) -> Option<String>
where
    A: Aead + KeyInit,
{
    match encrypt::<A>(value, key.as_bytes()) {
        Ok(token) => Some(token),
        Err(e) => {
            tracing::trace!(error = ?e, "Failed to encrypt a cookie value");
            None
        }
    }
}

/// Decrypts a token with each key, in order, until one of them succeeds.
pub(crate) fn open<A>(token: &str, keys: &[Key]) -> Option<Opened>
where
    A: Aead + KeyInit,
{
    let (cipher, nonce) = split_token(token)?;
    let (cipher, nonce) = match decode_segments::<A>(cipher, nonce) {
        Ok(segments) => segments,
        Err(e) => {
            tracing::trace!(error = ?e, "Rejected an encrypted cookie value");
            return None;
        }
    };

    for (index, key) in keys.iter().enumerate() {
        match decrypt::<A>(&cipher, &nonce, key.as_bytes()) {
            Ok(value) => {
                return Some(Opened {
                    value,
                    rotated: index > 0,
                })
            }
            Err(e) => {
                tracing::trace!(key_index = index, error = ?e, "Cookie key did not match");
            }
        }
    }
    None
}

fn encrypt<A>(value: &[u8], key: &[u8]) -> Result<String, anyhow::Error>
where
    A: Aead + KeyInit,
{
    let aead =
        A::new_from_slice(key).map_err(|_| anyhow::anyhow!("Invalid encryption key length"))?;

    let mut nonce = vec![0; <A as AeadCore>::NonceSize::USIZE];
    rand::thread_rng()
        .try_fill_bytes(&mut nonce)
        .context("Couldn't fill the nonce with random data")?;

    let cipher = aead
        .encrypt(Nonce::<A>::from_slice(&nonce), value)
        .map_err(|_| anyhow::anyhow!("Failed to encrypt cookie value"))?;

    let mut token = BASE64_URL_SAFE_NO_PAD.encode(cipher);
    token.push(SEPARATOR);
    BASE64_URL_SAFE_NO_PAD.encode_string(&nonce, &mut token);
    Ok(token)
}

fn decode_segments<A>(cipher: &str, nonce: &str) -> Result<(Vec<u8>, Vec<u8>), anyhow::Error>
where
    A: AeadCore,
{
    let cipher = BASE64_URL_SAFE_NO_PAD
        .decode(cipher)
        .context("Failed to decode the ciphertext using base64 (URL-safe, no padding)")?;
    let nonce = BASE64_URL_SAFE_NO_PAD
        .decode(nonce)
        .context("Failed to decode the nonce using base64 (URL-safe, no padding)")?;

    if cipher.len() < <A as AeadCore>::TagSize::USIZE {
        anyhow::bail!("The ciphertext was too short to contain an authentication tag");
    }
    if nonce.len() != <A as AeadCore>::NonceSize::USIZE {
        anyhow::bail!("The nonce does not have the required length");
    }
    Ok((cipher, nonce))
}

fn decrypt<A>(cipher: &[u8], nonce: &[u8], key: &[u8]) -> Result<Vec<u8>, anyhow::Error>
where
    A: Aead + KeyInit,
{
    let aead =
        A::new_from_slice(key).map_err(|_| anyhow::anyhow!("Invalid encryption key length"))?;
    aead.decrypt(Nonce::<A>::from_slice(nonce), cipher)
        .map_err(|_| anyhow::anyhow!("Failed to decrypt cookie value"))
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use crate::crypto::{Key, Opened, Scheme};

    const SCHEMES: [Scheme; 2] = [Scheme::AesGcm, Scheme::XChaCha20Poly1305];

    #[test]
    fn roundtrip() {
        let key_a = Key::generate();
        for scheme in SCHEMES {
            let token = scheme.seal(b"hello", &[key_a.clone()]).unwrap();
            assert_eq!(
                scheme.open(&token, &[key_a.clone()]),
                Some(Opened {
                    value: b"hello".to_vec(),
                    rotated: false
                })
            );
        }
    }

    #[test]
    fn nonce_is_fresh_for_every_seal() {
        let key_a = Key::generate();
        for scheme in SCHEMES {
            let first = scheme.seal(b"hello", &[key_a.clone()]).unwrap();
            let second = scheme.seal(b"hello", &[key_a.clone()]).unwrap();
            assert_ne!(first, second);
        }
    }

    #[test]
    fn wrong_key() {
        let (key_a, key_b) = (Key::generate(), Key::generate());
        for scheme in SCHEMES {
            let token = scheme.seal(b"hello", &[key_a.clone()]).unwrap();
            assert_eq!(scheme.open(&token, &[key_b.clone()]), None);
        }
    }

    #[test]
    fn second_key() {
        let (key_a, key_b, key_c) = (Key::generate(), Key::generate(), Key::generate());
        for scheme in SCHEMES {
            let token = scheme.seal(b"hello", &[key_b.clone(), key_c.clone()]).unwrap();
            assert_eq!(
                scheme.open(&token, &[key_a.clone(), key_b.clone()]),
                Some(Opened {
                    value: b"hello".to_vec(),
                    rotated: true
                })
            );
        }
    }

    #[test]
    fn empty() {
        let key_a = Key::generate();
        for scheme in SCHEMES {
            assert_eq!(scheme.seal(b"", &[key_a.clone()]), None);
            assert_eq!(scheme.seal(&[], &[key_a.clone()]), None);
        }
    }

    #[test]
    fn malformed() {
        let key_a = Key::generate();
        for scheme in SCHEMES {
            let keys = [key_a.clone()];
            assert_that!(scheme.open("", &keys), none());
            assert_that!(scheme.open(".asd", &keys), none());

            let token = scheme.seal(b"hello", &keys).unwrap();
            assert_that!(scheme.open(&token[..token.len() - 1], &keys), none());

            let (cipher, nonce) = token.split_once('.').unwrap();
            let flipped = if cipher.starts_with('A') { 'B' } else { 'A' };
            let tampered = format!("{flipped}{}.{nonce}", &cipher[1..]);
            assert_that!(scheme.open(&tampered, &keys), none());
        }
    }

    #[test]
    fn short_keys_cannot_seal() {
        let short = Key::from(b"chain-happy-record-blank".to_vec());
        for scheme in SCHEMES {
            assert_eq!(scheme.seal(b"hello", &[short.clone()]), None);
        }
    }
}
