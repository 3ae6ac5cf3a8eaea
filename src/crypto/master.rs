use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use rand::RngCore;

/// The length of the keys produced by [`Key::generate()`].
///
/// It is also the exact length required by the encryption schemes.
pub const KEY_LENGTH: usize = 32;

/// Key material used to sign or encrypt cookies.
///
/// A cookie definition carries an ordered list of keys: the first one is used
/// to seal new values, all of them are tried when opening a value coming from
/// the client.
#[allow(clippy::derived_hash_with_manual_eq)]
#[derive(Clone, Eq, Hash)]
pub struct Key(Vec<u8>);

mod deser {
    use super::{Key, BASE64_STANDARD};
    use base64::Engine;
    use serde::Deserializer;

    impl<'de> serde::Deserialize<'de> for Key {
        /// Keys are expected as standard base64 strings.
        fn deserialize<D>(deserializer: D) -> Result<Key, D::Error>
        where
            D: Deserializer<'de>,
        {
            let encoded = String::deserialize(deserializer)?;
            let bytes = BASE64_STANDARD
                .decode(encoded.trim())
                .map_err(serde::de::Error::custom)?;
            Key::try_from(bytes).map_err(serde::de::Error::custom)
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;

        self.0.ct_eq(&other.0).into()
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Key").field(&"***").finish()
    }
}

impl Key {
    /// Creates a new [`Key`] from raw bytes.
    ///
    /// # Panics
    ///
    /// Panics if `key` is empty.
    /// For a non-panicking version, use [`Key::try_from()`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use amaretti::Key;
    ///
    /// let key = Key::from(vec![7; 32]);
    /// assert_eq!(key.len(), 32);
    /// ```
    #[inline]
    pub fn from(key: Vec<u8>) -> Key {
        Key::try_from(key).expect("Invalid key material")
    }

    /// Generates a 256-bit key from a secure, random source.
    ///
    /// # Panics
    ///
    /// Panics if randomness cannot be retrieved from the operating system. See
    /// [`Key::try_generate()`] for a non-panicking version.
    pub fn generate() -> Key {
        Self::try_generate().expect("failed to generate `Key` from randomness")
    }

    /// Attempts to generate a 256-bit key from a secure, random source.
    /// Returns `None` if randomness cannot be retrieved from the operating system.
    pub fn try_generate() -> Option<Key> {
        let mut rng = rand::thread_rng();
        let mut key = vec![0; KEY_LENGTH];
        rng.try_fill_bytes(&mut key).ok()?;
        Some(Key(key))
    }

    /// Returns the raw bytes of the key.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The number of bytes in the key.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`: an empty key can't be constructed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encodes the key as a standard base64 string, the format expected
    /// when deserializing a [`Key`].
    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.0)
    }
}

/// The error returned by [`Key::try_from()`] when trying to create a [`Key`] from raw bytes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum KeyError {
    /// No bytes were provided.
    #[error("key material cannot be empty")]
    Empty,
}

impl TryFrom<&[u8]> for Key {
    type Error = KeyError;

    /// A fallible version of [`Key::from()`].
    fn try_from(key: &[u8]) -> Result<Self, Self::Error> {
        Key::try_from(key.to_vec())
    }
}

impl TryFrom<Vec<u8>> for Key {
    type Error = KeyError;

    /// A fallible version of [`Key::from()`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use amaretti::Key;
    ///
    /// assert!(Key::try_from(vec![1, 2, 3, 4]).is_ok());
    /// assert!(Key::try_from(Vec::new()).is_err());
    /// ```
    fn try_from(key: Vec<u8>) -> Result<Self, Self::Error> {
        if key.is_empty() {
            Err(KeyError::Empty)
        } else {
            Ok(Key(key))
        }
    }
}
