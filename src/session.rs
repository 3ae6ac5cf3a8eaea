use crate::{CookieHeader, CookieState, Jar, Reducer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Per-request reducers, keyed by the logical key of the cookie they apply to.
///
/// They take precedence over the reducers attached to cookie definitions.
#[derive(Debug, Clone, Default)]
pub struct Reducers(HashMap<String, Reducer>);

impl Reducers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `reducer` for the cookie with logical key `key`.
    pub fn insert<K: Into<String>>(mut self, key: K, reducer: Reducer) -> Self {
        self.0.insert(key.into(), reducer);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Reducer> {
        self.0.get(key)
    }
}

/// A view over the cookies of a single request.
///
/// Every cookie registered in the [`Jar`] has a history of states: the first
/// one is what the client sent, every [`Session::set`] or [`Session::del`]
/// appends a new one. When the request is done, [`Session::values`] returns
/// the `Set-Cookie` header values for the cookies that must change on the
/// client.
///
/// All the methods taking a logical key panic if no cookie with that key is
/// registered in the jar: use [`Session::contains`] if the key is not known
/// in advance.
#[derive(Debug, Clone)]
pub struct Session {
    jar: Jar,
    /// Same order as [`Jar::cookies`]. Never empty.
    histories: Vec<Vec<CookieState>>,
    reducers: Reducers,
}

/// Reads the cookies registered in `jar` out of a `Cookie` header.
///
/// ```rust
/// use amaretti::{jar, take, Cookie, Key, Scheme};
/// use amaretti::config::CookieConfig;
/// use serde_json::json;
///
/// let cart = Cookie::try_from(CookieConfig::new("cart", Scheme::Hmac, vec![Key::generate()])).unwrap();
/// let cookies = jar().put(cart);
///
/// let mut session = take(None, &cookies);
/// assert_eq!(session.get("cart"), None);
///
/// session.set("cart", Some(json!(["apple"])));
/// let values = session.values();
/// assert_eq!(values.len(), 1);
/// assert!(values[0].starts_with("cart="));
/// ```
pub fn take(header: Option<&str>, jar: &Jar) -> Session {
    take_with_reducers(header, jar, Reducers::default())
}

/// Like [`take`], with reducers that override those of the cookie definitions.
pub fn take_with_reducers(header: Option<&str>, jar: &Jar, reducers: Reducers) -> Session {
    let parsed = header.map(CookieHeader::parse).unwrap_or_default();

    let histories = jar
        .cookies()
        .iter()
        .map(|cookie| {
            let raw_values = parsed.get_all(cookie.name());
            let state = if raw_values.is_empty() {
                cookie.state_from(None)
            } else {
                // `min_by_key` returns the first of the equally-ranked states,
                // i.e. the one that came first in the header.
                raw_values
                    .iter()
                    .map(|&raw| cookie.state_from(Some(raw)))
                    .min_by_key(CookieState::priority)
                    .unwrap_or(CookieState::Unset)
            };
            vec![state]
        })
        .collect();

    Session {
        jar: jar.clone(),
        histories,
        reducers,
    }
}

impl Session {
    /// The current value of the cookie, if it holds one.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not registered in the jar.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.last(key).value()
    }

    /// The current value of the cookie, deserialized into `T`.
    ///
    /// Returns `None` if the cookie holds no value or if the value does not
    /// have the shape of `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        T::deserialize(value).ok()
    }

    /// Sets the value of the cookie.
    ///
    /// The value actually stored is the output of the cookie reducer, which
    /// receives the current value and `value`. If the result is `None`, the
    /// cookie is deleted as with [`Session::del`].
    ///
    /// # Panics
    ///
    /// Panics if `key` is not registered in the jar.
    pub fn set(&mut self, key: &str, value: Option<Value>) {
        let position = self.position(key);
        let prev = self.last(key).value().cloned();

        let cookie = &self.jar.cookies()[position];
        let next = match self.reducers.get(key).or(cookie.reducer()) {
            Some(reducer) => reducer.reduce(prev, value),
            None => value,
        };

        match next {
            Some(next) => self.histories[position].push(CookieState::Set(next)),
            None => self.del(key),
        }
    }

    /// Serializes `value` and sets it as the value of the cookie.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not registered in the jar.
    pub fn set_as<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> serde_json::Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, Some(value));
        Ok(())
    }

    /// Deletes the cookie.
    ///
    /// A cookie that the client never sent stays unset, a cookie that the
    /// client sent with an indecipherable value is removed from the client.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not registered in the jar.
    pub fn del(&mut self, key: &str) {
        let position = self.position(key);
        let history = &mut self.histories[position];

        let target = match history.first() {
            Some(CookieState::Indecipherable) => CookieState::Indecipherable,
            Some(CookieState::Unset) => CookieState::Unset,
            _ => CookieState::Expired,
        };
        if !history.last().is_some_and(|last| last.same_kind(&target)) {
            history.push(target);
        }
    }

    /// `true` if a cookie with logical key `key` is registered in the jar.
    pub fn contains(&self, key: &str) -> bool {
        self.jar.contains(key)
    }

    /// The recorded states of the cookie, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not registered in the jar.
    pub fn states(&self, key: &str) -> &[CookieState] {
        &self.histories[self.position(key)]
    }

    /// The `Set-Cookie` header values to send, paired with the logical key
    /// of the cookie they belong to, in jar registration order.
    ///
    /// A cookie is left out if it held a value sealed with the primary key
    /// and still holds the same value.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.jar
            .cookies()
            .iter()
            .zip(&self.histories)
            .filter_map(|(cookie, history)| {
                let (first, last) = (history.first()?, history.last()?);
                if let (CookieState::Set(before), CookieState::Set(after)) = (first, last) {
                    if before == after {
                        tracing::trace!(cookie_key = cookie.key(), "Cookie is unchanged");
                        return None;
                    }
                }
                let header = cookie.set_cookie(last)?;
                Some((cookie.key().to_owned(), header))
            })
            .collect()
    }

    /// The `Set-Cookie` header values to send, in jar registration order.
    pub fn values(&self) -> Vec<String> {
        self.entries().into_iter().map(|(_, value)| value).collect()
    }

    fn position(&self, key: &str) -> usize {
        match self.jar.position(key) {
            Some(position) => position,
            None => panic!("No cookie with key `{key}` is registered in the jar"),
        }
    }

    fn last(&self, key: &str) -> &CookieState {
        let history = &self.histories[self.position(key)];
        // Histories always hold at least the initial state.
        &history[history.len() - 1]
    }
}
