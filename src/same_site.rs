use std::fmt;

/// The `SameSite` cookie attribute.
///
/// A cookie with a `SameSite` attribute is imposed restrictions on when it is
/// sent to the origin server in a cross-site request. If the `SameSite`
/// attribute is "Strict", then the cookie is never sent in cross-site requests.
/// If the `SameSite` attribute is "Lax", the cookie is only sent in cross-site
/// requests with "safe" HTTP methods, i.e, `GET`, `HEAD`, `OPTIONS`, `TRACE`.
/// If the `SameSite` attribute is "None", the cookie is sent in all cross-site
/// requests if the "Secure" flag is also set, otherwise the cookie is ignored.
///
/// Unlike other cookie libraries, setting `SameSite::None` does not imply
/// `Secure`: the attribute is emitted only if the cookie definition asks for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
pub enum SameSite {
    /// The "Strict" `SameSite` attribute.
    #[serde(alias = "strict")]
    Strict,
    /// The "Lax" `SameSite` attribute.
    #[serde(alias = "lax")]
    Lax,
    /// The "None" `SameSite` attribute.
    #[serde(alias = "none")]
    None,
}

impl SameSite {
    /// Returns the `SameSite` attribute value as it appears in a `Set-Cookie` header.
    ///
    /// # Example
    ///
    /// ```rust
    /// use amaretti::SameSite;
    ///
    /// assert_eq!(SameSite::Lax.as_str(), "Lax");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match *self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::SameSite;

    #[test]
    fn deserializes_both_casings() {
        let parsed: Vec<SameSite> =
            serde_json::from_str(r#"["Strict", "lax", "None", "none"]"#).unwrap();
        assert_eq!(
            parsed,
            [SameSite::Strict, SameSite::Lax, SameSite::None, SameSite::None]
        );
        assert!(serde_json::from_str::<SameSite>(r#""sometimes""#).is_err());
    }
}
