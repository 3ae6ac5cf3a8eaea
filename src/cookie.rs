use crate::config::{ConfigError, CookieConfig};
use crate::crypto::{Key, Scheme};
use crate::{envelope, Reducer, SameSite, SetCookie};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// What a cookie looks like after being read from a request, or after a
/// session has modified it.
#[derive(Debug, Clone, PartialEq)]
pub enum CookieState {
    /// The cookie was not sent by the client, or was deleted before it was
    /// ever set.
    Unset,
    /// The cookie holds a value that was sealed with the primary key, or was
    /// set during the current session.
    Set(Value),
    /// The cookie holds a value that was sealed with a retired key.
    /// It must be sealed again with the primary key.
    SetButNeedsUpdate(Value),
    /// The client sent a value that could not be opened with any of the keys,
    /// or that doesn't belong to this cookie.
    Indecipherable,
    /// The cookie held a value, but it was deleted.
    Expired,
}

impl CookieState {
    /// The value held by the cookie, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            CookieState::Set(value) | CookieState::SetButNeedsUpdate(value) => Some(value),
            _ => None,
        }
    }

    /// `true` if `self` and `other` are the same variant, regardless of their values.
    pub fn same_kind(&self, other: &CookieState) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Used to choose among several header entries with the same name.
    /// Lower is better.
    pub(crate) fn priority(&self) -> u8 {
        match self {
            CookieState::Set(_) => 0,
            CookieState::SetButNeedsUpdate(_) => 1,
            CookieState::Unset => 2,
            CookieState::Expired => 3,
            CookieState::Indecipherable => 4,
        }
    }
}

/// A validated cookie definition.
///
/// A `Cookie` knows how to turn the raw value sent by the client into a
/// [`CookieState`] and how to turn a [`CookieState`] back into a
/// `Set-Cookie` header value.
///
/// Cloning is cheap: clones share the same definition.
///
/// ```rust
/// use amaretti::{Cookie, CookieState, Key, Scheme};
/// use amaretti::config::CookieConfig;
/// use serde_json::json;
///
/// let key = Key::generate();
/// let cookie = Cookie::try_from(
///     CookieConfig::new("cart", Scheme::Hmac, vec![key]).set_http_only(true),
/// ).unwrap();
///
/// let header = cookie.set_cookie(&CookieState::Set(json!(["apple"]))).unwrap();
/// let (name, token) = header.split_once("; ").unwrap().0.split_once('=').unwrap();
/// assert_eq!(name, "cart");
/// assert_eq!(cookie.state_from(Some(token)), CookieState::Set(json!(["apple"])));
/// ```
#[derive(Clone)]
pub struct Cookie {
    inner: Arc<CookieInner>,
}

struct CookieInner {
    key: String,
    name: String,
    scheme: Scheme,
    keys: Vec<Key>,
    domain: Option<String>,
    path: Option<String>,
    max_age: Option<u64>,
    http_only: bool,
    same_site: Option<SameSite>,
    secure: bool,
    reducer: Option<Reducer>,
}

impl TryFrom<CookieConfig> for Cookie {
    type Error = ConfigError;

    fn try_from(config: CookieConfig) -> Result<Self, Self::Error> {
        config.validate()?;
        let name = config.wire_name();
        Ok(Cookie {
            inner: Arc::new(CookieInner {
                key: config.key,
                name,
                scheme: config.scheme,
                keys: config.keys,
                domain: config.domain,
                path: config.path,
                max_age: config.max_age,
                http_only: config.http_only,
                same_site: config.same_site,
                secure: config.secure,
                reducer: config.reducer,
            }),
        })
    }
}

impl Cookie {
    /// The logical key of the cookie.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// The name of the cookie on the wire, prefix included.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn scheme(&self) -> Scheme {
        self.inner.scheme
    }

    pub fn domain(&self) -> Option<&str> {
        self.inner.domain.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.inner.path.as_deref()
    }

    pub fn max_age(&self) -> Option<u64> {
        self.inner.max_age
    }

    pub fn http_only(&self) -> bool {
        self.inner.http_only
    }

    pub fn same_site(&self) -> Option<SameSite> {
        self.inner.same_site
    }

    pub fn secure(&self) -> bool {
        self.inner.secure
    }

    /// The reducer attached to the definition, if any.
    pub fn reducer(&self) -> Option<&Reducer> {
        self.inner.reducer.as_ref()
    }

    /// Serializes `value` into the canonical envelope for this cookie.
    pub fn encode(&self, value: &Value) -> Option<Vec<u8>> {
        envelope::encode(self.key(), self.max_age(), value)
    }

    /// Extracts the value from an envelope produced by [`Cookie::encode`].
    ///
    /// Returns `None` if the envelope is malformed or was produced by a
    /// cookie with a different logical key.
    pub fn decode(&self, buffer: &[u8]) -> Option<Value> {
        envelope::decode(self.key(), buffer)
    }

    /// Determines the state of the cookie from the raw value sent by the
    /// client, if any.
    pub fn state_from(&self, raw: Option<&str>) -> CookieState {
        let Some(raw) = raw else {
            return CookieState::Unset;
        };
        let Some(opened) = self.inner.scheme.open(raw, &self.inner.keys) else {
            tracing::debug!(cookie_name = self.name(), "Failed to open cookie value");
            return CookieState::Indecipherable;
        };
        let Some(value) = self.decode(&opened.value) else {
            tracing::debug!(cookie_name = self.name(), "Failed to decode cookie value");
            return CookieState::Indecipherable;
        };
        if opened.rotated {
            tracing::debug!(
                cookie_name = self.name(),
                "Cookie value was sealed with a retired key"
            );
            CookieState::SetButNeedsUpdate(value)
        } else {
            CookieState::Set(value)
        }
    }

    /// Builds the `Set-Cookie` header value that moves the client to `state`.
    ///
    /// Returns `None` if there is nothing to send (`Unset`), or if the value
    /// could not be sealed.
    pub fn set_cookie(&self, state: &CookieState) -> Option<String> {
        match state {
            CookieState::Unset => None,
            CookieState::Expired | CookieState::Indecipherable => {
                Some(self.response_cookie("").into_removal().to_string())
            }
            CookieState::Set(value) | CookieState::SetButNeedsUpdate(value) => {
                let buffer = self.encode(value)?;
                let token = self.inner.scheme.seal(&buffer, &self.inner.keys)?;
                Some(self.response_cookie(token).to_string())
            }
        }
    }

    fn response_cookie<'c, V>(&'c self, value: V) -> SetCookie<'c>
    where
        V: Into<std::borrow::Cow<'c, str>>,
    {
        let mut cookie = SetCookie::new(self.name(), value)
            .set_http_only(self.http_only())
            .set_max_age(self.max_age())
            .set_same_site(self.same_site())
            .set_secure(self.secure());
        if let Some(domain) = self.domain() {
            cookie = cookie.set_domain(domain);
        }
        if let Some(path) = self.path() {
            cookie = cookie.set_path(path);
        }
        cookie
    }
}

impl PartialEq for Cookie {
    /// Two cookies are equal if they were built from the same definition.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Cookie {}

impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("key", &self.inner.key)
            .field("name", &self.inner.name)
            .field("scheme", &self.inner.scheme)
            .field("keys", &self.inner.keys.len())
            .finish_non_exhaustive()
    }
}

/// `true` if `value` is a [`Cookie`].
pub fn is_cookie(value: &dyn Any) -> bool {
    value.is::<Cookie>()
}
