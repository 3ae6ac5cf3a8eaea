use crate::SameSite;
use std::borrow::Cow;
use std::fmt;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// A cookie set by a server in an HTTP response using the `Set-Cookie` header.
///
/// Attributes are always rendered in the same order (`Domain`, `Expires`,
/// `HttpOnly`, `Max-Age`, `Path`, `SameSite`, `Secure`), so that two cookies
/// with the same configuration produce byte-identical headers.
///
/// ```rust
/// use amaretti::{SameSite, SetCookie};
///
/// let cookie = SetCookie::new("name", "value")
///     .set_secure(true)
///     .set_path("/")
///     .set_same_site(SameSite::Lax)
///     .set_domain("example.com");
/// assert_eq!(
///     cookie.to_string(),
///     "name=value; Domain=example.com; Path=/; SameSite=Lax; Secure"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie<'c> {
    name: Cow<'c, str>,
    value: Cow<'c, str>,
    domain: Option<Cow<'c, str>>,
    expires: Option<OffsetDateTime>,
    http_only: bool,
    max_age: Option<u64>,
    path: Option<Cow<'c, str>>,
    same_site: Option<SameSite>,
    secure: bool,
}

impl<'c> SetCookie<'c> {
    /// Creates a new [`SetCookie`] with the given name and value, and no attributes.
    pub fn new<N, V>(name: N, value: V) -> Self
    where
        N: Into<Cow<'c, str>>,
        V: Into<Cow<'c, str>>,
    {
        SetCookie {
            name: name.into(),
            value: value.into(),
            domain: None,
            expires: None,
            http_only: false,
            max_age: None,
            path: None,
            same_site: None,
            secure: false,
        }
    }

    /// Returns the name of `self`.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Returns the value of `self`.
    #[inline]
    pub fn value(&self) -> &str {
        self.value.as_ref()
    }

    /// Returns the `Domain` of the cookie, if one was specified.
    ///
    /// A leading `.` is stripped.
    ///
    /// ```
    /// use amaretti::SetCookie;
    ///
    /// let c = SetCookie::new("name", "value").set_domain(".crates.io");
    /// assert_eq!(c.domain(), Some("crates.io"));
    /// ```
    #[inline]
    pub fn domain(&self) -> Option<&str> {
        self.domain
            .as_deref()
            .map(|domain| domain.strip_prefix('.').unwrap_or(domain))
    }

    /// Returns the `Path` of the cookie, if one was specified.
    #[inline]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns the `Expires` date-time of the cookie, if one was specified.
    #[inline]
    pub fn expires(&self) -> Option<OffsetDateTime> {
        self.expires
    }

    /// Returns the `Max-Age` of the cookie, in seconds, if one was specified.
    #[inline]
    pub fn max_age(&self) -> Option<u64> {
        self.max_age
    }

    /// Returns whether the `HttpOnly` flag is set.
    #[inline]
    pub fn http_only(&self) -> bool {
        self.http_only
    }

    /// Returns whether the `Secure` flag is set.
    #[inline]
    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Returns the `SameSite` attribute, if one was specified.
    #[inline]
    pub fn same_site(&self) -> Option<SameSite> {
        self.same_site
    }

    /// Sets the `Domain` attribute.
    pub fn set_domain<D: Into<Cow<'c, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the `Path` attribute.
    pub fn set_path<P: Into<Cow<'c, str>>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the `Expires` attribute.
    pub fn set_expires<T: Into<Option<OffsetDateTime>>>(mut self, time: T) -> Self {
        self.expires = time.into();
        self
    }

    /// Sets the `Max-Age` attribute, in seconds.
    pub fn set_max_age<T: Into<Option<u64>>>(mut self, seconds: T) -> Self {
        self.max_age = seconds.into();
        self
    }

    /// Sets the `HttpOnly` flag.
    pub fn set_http_only(mut self, value: bool) -> Self {
        self.http_only = value;
        self
    }

    /// Sets the `Secure` flag.
    pub fn set_secure(mut self, value: bool) -> Self {
        self.secure = value;
        self
    }

    /// Sets the `SameSite` attribute.
    pub fn set_same_site<T: Into<Option<SameSite>>>(mut self, value: T) -> Self {
        self.same_site = value.into();
        self
    }

    /// Turns `self` into a cookie that removes its counterpart from the client.
    ///
    /// The value is emptied and the expiry is moved to the Unix epoch.
    /// User agents match removals by name, domain and path, so those are
    /// kept, together with `Secure`: `__Secure-` and `__Host-` cookies are
    /// rejected without it, removals included.
    ///
    /// ```rust
    /// use amaretti::SetCookie;
    ///
    /// let removal = SetCookie::new("tycho", "value")
    ///     .set_domain("example.com")
    ///     .set_path("/tycho")
    ///     .set_max_age(60)
    ///     .set_http_only(true)
    ///     .into_removal();
    /// assert_eq!(
    ///     removal.to_string(),
    ///     "tycho=; Domain=example.com; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/tycho"
    /// );
    /// ```
    pub fn into_removal(self) -> Self {
        SetCookie {
            value: Cow::Borrowed(""),
            expires: Some(OffsetDateTime::UNIX_EPOCH),
            http_only: false,
            max_age: None,
            same_site: None,
            ..self
        }
    }

    fn fmt_parameters(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(domain) = self.domain() {
            write!(f, "; Domain={}", domain)?;
        }

        if let Some(time) = self.expires {
            let time = time.to_offset(UtcOffset::UTC);

            // IMF-fixdate, https://www.rfc-editor.org/rfc/rfc7231#section-7.1.1.1
            static IMF_FIXDATE: &[FormatItem<'_>] = format_description!("[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT");
            write!(
                f,
                "; Expires={}",
                time.format(&IMF_FIXDATE).map_err(|_| fmt::Error)?
            )?;
        }

        if self.http_only {
            write!(f, "; HttpOnly")?;
        }

        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }

        if let Some(path) = self.path() {
            write!(f, "; Path={}", path)?;
        }

        if let Some(same_site) = self.same_site {
            write!(f, "; SameSite={}", same_site)?;
        }

        if self.secure {
            write!(f, "; Secure")?;
        }

        Ok(())
    }
}

impl<'c> fmt::Display for SetCookie<'c> {
    /// Formats the cookie `self` as a `Set-Cookie` header value.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}={}", self.name(), self.value())?;
        self.fmt_parameters(f)
    }
}
