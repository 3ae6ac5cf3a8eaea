use crate::Cookie;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// A registry of cookie definitions, keyed by their logical key.
///
/// A `Jar` is immutable: [`Jar::put`] returns a new jar and leaves the
/// original untouched. Build it once at startup and share it across requests,
/// clones are cheap.
///
/// ```rust
/// use amaretti::{jar, Cookie, Key, Scheme};
/// use amaretti::config::CookieConfig;
///
/// let cart = Cookie::try_from(CookieConfig::new("cart", Scheme::Hmac, vec![Key::generate()])).unwrap();
/// let theme = Cookie::try_from(CookieConfig::new("theme", Scheme::Hmac, vec![Key::generate()])).unwrap();
///
/// let empty = jar();
/// let cookies = empty.put(cart).put(theme);
/// assert!(empty.is_empty());
/// assert_eq!(cookies.len(), 2);
/// assert_eq!(cookies.log().next().unwrap().cookie().key(), "theme");
/// ```
#[derive(Clone, Default, Debug)]
pub struct Jar {
    inner: Arc<JarInner>,
}

#[derive(Default, Debug)]
struct JarInner {
    /// In registration order.
    cookies: Vec<Cookie>,
    /// Logical key -> index in `cookies`.
    index: HashMap<String, usize>,
    /// In registration order, [`Jar::log`] reverses it.
    log: Vec<Action>,
}

/// An entry in the history of a [`Jar`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Action {
    /// A cookie definition was registered.
    Cookie(Cookie),
}

impl Action {
    /// The cookie the action refers to.
    pub fn cookie(&self) -> &Cookie {
        match self {
            Action::Cookie(cookie) => cookie,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("A cookie with key `{0}` is already registered in the jar")]
/// Returned by [`Jar::try_put`] when the logical key is already taken.
pub struct DuplicateKeyError(pub String);

/// Creates an empty [`Jar`].
pub fn jar() -> Jar {
    Jar::new()
}

impl Jar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new jar with `cookie` registered.
    ///
    /// # Panics
    ///
    /// Panics if a cookie with the same logical key is already registered.
    /// For a non-panicking version, use [`Jar::try_put`].
    pub fn put(&self, cookie: Cookie) -> Jar {
        match self.try_put(cookie) {
            Ok(jar) => jar,
            Err(e) => panic!("{e}"),
        }
    }

    /// Returns a new jar with `cookie` registered, unless its logical key is
    /// already taken.
    pub fn try_put(&self, cookie: Cookie) -> Result<Jar, DuplicateKeyError> {
        if self.contains(cookie.key()) {
            return Err(DuplicateKeyError(cookie.key().to_owned()));
        }

        let mut cookies = self.inner.cookies.clone();
        let mut index = self.inner.index.clone();
        let mut log = self.inner.log.clone();

        index.insert(cookie.key().to_owned(), cookies.len());
        log.push(Action::Cookie(cookie.clone()));
        cookies.push(cookie);

        Ok(Jar {
            inner: Arc::new(JarInner {
                cookies,
                index,
                log,
            }),
        })
    }

    /// Get the cookie registered with logical key `key`.
    pub fn get(&self, key: &str) -> Option<&Cookie> {
        self.inner
            .index
            .get(key)
            .map(|&position| &self.inner.cookies[position])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.index.contains_key(key)
    }

    /// The registered cookies, in registration order.
    pub fn cookies(&self) -> &[Cookie] {
        &self.inner.cookies
    }

    /// The actions that built the jar, newest first.
    pub fn log(&self) -> impl Iterator<Item = &Action> + '_ {
        self.inner.log.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.inner.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.cookies.is_empty()
    }

    pub(crate) fn position(&self, key: &str) -> Option<usize> {
        self.inner.index.get(key).copied()
    }
}

/// `true` if `value` is a [`Jar`].
pub fn is_jar(value: &dyn Any) -> bool {
    value.is::<Jar>()
}
