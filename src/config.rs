//! Definitions for the cookies managed by a [`Jar`].
//!
//! Check out the [`CookieConfig`] struct for more information.
//!
//! [`Jar`]: crate::Jar
use crate::crypto::{Key, Scheme};
use crate::{Reducer, SameSite};
use std::fmt;

/// The maximum number of keys a cookie definition can carry.
pub const MAX_KEYS: usize = 5;

/// `CookieConfig` describes a single cookie: how it is named, how its value is
/// protected and which attributes it is sent with.
///
/// A configuration must be converted into a [`Cookie`] before being used.
/// The conversion checks the constraints that user agents enforce on cookie
/// names and attributes.
///
/// ```rust
/// use amaretti::{Cookie, Key, SameSite, Scheme};
/// use amaretti::config::{CookieConfig, Prefix};
///
/// // You'll use keys loaded from *somewhere* in production, e.g.
/// // from a file, environment variable, or a secret management service.
/// let config = CookieConfig::new("session", Scheme::AesGcm, vec![Key::generate()])
///     .set_prefix(Prefix::Host)
///     .set_secure(true)
///     .set_path("/")
///     .set_same_site(SameSite::Lax);
/// let cookie = Cookie::try_from(config).unwrap();
/// assert_eq!(cookie.name(), "__Host-session");
/// ```
///
/// # Deserialization
///
/// Keys are expected as standard base64 strings:
///
/// ```rust
/// use amaretti::config::CookieConfig;
///
/// let config: CookieConfig = serde_json::from_str(r#"{
///     "key": "cart",
///     "scheme": "hmac",
///     "keys": ["Y2hhaW4taGFwcHktcmVjb3JkLWJsYW5r"],
///     "http_only": true,
///     "same_site": "lax"
/// }"#).unwrap();
/// assert!(config.http_only);
/// ```
#[derive(Debug, Clone, serde::Deserialize)]
#[non_exhaustive]
pub struct CookieConfig {
    /// The logical key used to refer to the cookie within a session.
    ///
    /// It is also used as the cookie name unless [`CookieConfig::name`] is set.
    pub key: String,
    /// The name of the cookie on the wire, without its prefix.
    #[serde(default)]
    pub name: Option<String>,
    /// How the value is protected.
    pub scheme: Scheme,
    /// The keys used to seal and open the cookie value.
    ///
    /// The first key seals new values. Every key is tried, in order, when
    /// opening a value coming from the client: keep retired keys at the end of
    /// the list until the cookies sealed with them have expired.
    pub keys: Vec<Key>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    /// The lifetime of the cookie, in seconds.
    #[serde(default)]
    pub max_age: Option<u64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub same_site: Option<SameSite>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub prefix: Option<Prefix>,
    /// How the value passed to [`Session::set`] is combined with the current one.
    ///
    /// Defaults to [`Reducer::last_write_wins`].
    ///
    /// [`Session::set`]: crate::Session::set
    #[serde(skip)]
    pub reducer: Option<Reducer>,
}

/// A cookie name prefix that user agents attach extra requirements to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
pub enum Prefix {
    /// `__Secure-`: the cookie must be `Secure`.
    #[serde(rename = "__Secure-")]
    Secure,
    /// `__Host-`: the cookie must be `Secure`, must not have a `Domain`, and
    /// its `Path` must be `/`.
    #[serde(rename = "__Host-")]
    Host,
}

impl Prefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prefix::Secure => "__Secure-",
            Prefix::Host => "__Host-",
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
/// The ways a [`CookieConfig`] can be invalid.
pub enum ConfigError {
    #[error("At least one key is required")]
    NoKeys,
    #[error("At most 5 keys are allowed, {0} were provided")]
    TooManyKeys(usize),
    #[error("The key at index {index} is {length} bytes long, but `{scheme}` requires {expected} bytes")]
    KeyLength {
        scheme: Scheme,
        index: usize,
        length: usize,
        expected: usize,
    },
    #[error("`{0}` is not a valid cookie key: it must be a non-empty token")]
    InvalidKey(String),
    #[error("`{0}` is not a valid cookie name: it must be a non-empty token")]
    InvalidName(String),
    #[error("The cookie name `{0}` starts with a reserved prefix, use the `prefix` field instead")]
    ReservedName(String),
    #[error("Cookies with the `{0}` prefix must be secure")]
    PrefixRequiresSecure(Prefix),
    #[error("Cookies with the `__Host-` prefix must not have a domain")]
    HostPrefixWithDomain,
    #[error("Cookies with the `__Host-` prefix must have `/` as their path")]
    HostPrefixWithPath,
    #[error("`{0}` is not a valid cookie domain")]
    InvalidDomain(String),
    #[error("`{0}` is not a valid cookie path")]
    InvalidPath(String),
}

impl CookieConfig {
    /// Creates a configuration with no attributes set.
    pub fn new<K: Into<String>>(key: K, scheme: Scheme, keys: Vec<Key>) -> Self {
        CookieConfig {
            key: key.into(),
            name: None,
            scheme,
            keys,
            domain: None,
            path: None,
            max_age: None,
            http_only: false,
            same_site: None,
            secure: false,
            prefix: None,
            reducer: None,
        }
    }

    /// Sets the wire name, if it must differ from the logical key.
    pub fn set_name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_domain<D: Into<String>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn set_path<P: Into<String>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the lifetime of the cookie, in seconds.
    pub fn set_max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn set_http_only(mut self, value: bool) -> Self {
        self.http_only = value;
        self
    }

    pub fn set_same_site(mut self, value: SameSite) -> Self {
        self.same_site = Some(value);
        self
    }

    pub fn set_secure(mut self, value: bool) -> Self {
        self.secure = value;
        self
    }

    pub fn set_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub fn set_reducer(mut self, reducer: Reducer) -> Self {
        self.reducer = Some(reducer);
        self
    }

    /// The name the cookie is sent with, prefix included.
    pub fn wire_name(&self) -> String {
        let name = self.name.as_deref().unwrap_or(&self.key);
        match self.prefix {
            Some(prefix) => format!("{prefix}{name}"),
            None => name.to_owned(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        match self.keys.len() {
            0 => return Err(ConfigError::NoKeys),
            n if n > MAX_KEYS => return Err(ConfigError::TooManyKeys(n)),
            _ => {}
        }
        if let Some(expected) = self.scheme.required_key_length() {
            if let Some((index, key)) = self
                .keys
                .iter()
                .enumerate()
                .find(|(_, key)| key.len() != expected)
            {
                return Err(ConfigError::KeyLength {
                    scheme: self.scheme,
                    index,
                    length: key.len(),
                    expected,
                });
            }
        }

        if !is_token(&self.key) {
            return Err(ConfigError::InvalidKey(self.key.clone()));
        }
        let name = self.name.as_deref().unwrap_or(&self.key);
        if !is_token(name) {
            return Err(ConfigError::InvalidName(name.to_owned()));
        }
        if [Prefix::Secure, Prefix::Host]
            .iter()
            .any(|p| name.starts_with(p.as_str()))
        {
            return Err(ConfigError::ReservedName(name.to_owned()));
        }

        if let Some(domain) = &self.domain {
            if domain.is_empty()
                || domain.starts_with('-')
                || domain.ends_with('.')
                || domain.ends_with('-')
                || !domain.bytes().all(|b| b.is_ascii_graphic() && b != b';')
            {
                return Err(ConfigError::InvalidDomain(domain.clone()));
            }
        }
        if let Some(path) = &self.path {
            if !path.bytes().all(|b| (b' '..=b'~').contains(&b) && b != b';') {
                return Err(ConfigError::InvalidPath(path.clone()));
            }
        }

        match self.prefix {
            Some(prefix) if !self.secure => Err(ConfigError::PrefixRequiresSecure(prefix)),
            Some(Prefix::Host) if self.domain.is_some() => Err(ConfigError::HostPrefixWithDomain),
            Some(Prefix::Host) if self.path.as_deref() != Some("/") => {
                Err(ConfigError::HostPrefixWithPath)
            }
            _ => Ok(()),
        }
    }
}

/// `true` if `s` is a non-empty RFC 6265 token.
fn is_token(s: &str) -> bool {
    const SEPARATORS: &[u8] = b"()<>@,;:\\\"/[]?={} \t";
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_graphic() && !SEPARATORS.contains(&b))
}
