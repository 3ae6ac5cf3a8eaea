//! Signed and encrypted HTTP cookies for Rust servers.
//!
//! # Overview
//!
//! `amaretti` reads cookies out of an incoming `Cookie` header, lets you
//! change them while handling the request, and tells you which `Set-Cookie`
//! headers you need to send back.
//!
//! In particular:
//!
//! - Every cookie value is either signed (HMAC-SHA256) or encrypted
//!   (AES-256-GCM, XChaCha20-Poly1305), so clients can't tamper with it
//! - Each cookie carries a list of keys: the first one seals new values, the
//!   others are only used to open values sealed before a key rotation.
//!   Values sealed with a retired key are sealed again automatically
//! - Values are JSON, and a cookie refuses values sealed for another cookie
//!   with the same name
//! - A `Set-Cookie` header is only emitted for cookies whose value actually
//!   changed
//!
//! # Non-goals
//!
//! `amaretti` doesn't store sessions on the server and doesn't handle cookies
//! on the client side.
//!
//! # Quickstart
//!
//! ```rust
//! use amaretti::{jar, take, Cookie, Key, SameSite, Scheme};
//! use amaretti::config::{CookieConfig, Prefix};
//! use serde_json::json;
//!
//! // Define your cookies once, at startup.
//! // You'll use keys loaded from *somewhere* in production, e.g.
//! // from a file, environment variable, or a secret management service.
//! let cart = Cookie::try_from(
//!     CookieConfig::new("cart", Scheme::AesGcm, vec![Key::generate()])
//!         .set_prefix(Prefix::Host)
//!         .set_secure(true)
//!         .set_path("/")
//!         .set_same_site(SameSite::Lax),
//! ).unwrap();
//! let cookies = jar().put(cart);
//!
//! // For every request, take the cookies out of the `Cookie` header...
//! let mut session = take(Some("__Host-cart=not-a-valid-token"), &cookies);
//! // ...tampered values are ignored...
//! assert_eq!(session.get("cart"), None);
//!
//! // ...change them...
//! session.set("cart", Some(json!(["apple", "pear"])));
//! assert_eq!(session.get("cart"), Some(&json!(["apple", "pear"])));
//!
//! // ...and get the `Set-Cookie` header values to send back.
//! let values = session.values();
//! assert_eq!(values.len(), 1);
//! assert!(values[0].starts_with("__Host-cart="));
//! assert!(values[0].ends_with("; Path=/; SameSite=Lax; Secure"));
//! ```
pub mod config;
mod cookie;
mod crypto;
mod envelope;
mod header;
mod jar;
mod reducer;
mod same_site;
mod session;
mod set_cookie;

pub use config::CookieConfig;
pub use cookie::{is_cookie, Cookie, CookieState};
pub use crypto::{Key, Opened, Scheme, KEY_LENGTH};
pub use header::CookieHeader;
pub use jar::{is_jar, jar, Action, Jar};
pub use reducer::Reducer;
pub use same_site::SameSite;
pub use session::{take, take_with_reducers, Reducers, Session};
pub use set_cookie::SetCookie;

/// Errors that can occur when building keys, cookies or jars.
pub mod errors {
    pub use crate::config::ConfigError;
    pub use crate::crypto::KeyError;
    pub use crate::jar::DuplicateKeyError;
}
