use std::collections::HashMap;

#[derive(Default, Debug, Clone, PartialEq, Eq)]
/// The name-value pairs carried by one or more `Cookie` request headers.
///
/// Parsing is lenient: fragments that are not a `name=value` pair are skipped
/// rather than rejected, since the header is attacker-controlled and a broken
/// fragment must not prevent the other cookies from being read.
///
/// Multiple values for the same name are all kept, in the order they appear.
pub struct CookieHeader<'h> {
    /// Invariant: the `Vec` for a given `name` is never empty.
    cookies: HashMap<&'h str, Vec<&'h str>>,
}

impl<'h> CookieHeader<'h> {
    /// Creates a new, empty [`CookieHeader`].
    pub fn new() -> CookieHeader<'h> {
        Default::default()
    }

    /// Parse a `Cookie` header value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use amaretti::CookieHeader;
    ///
    /// let cookies = CookieHeader::parse("foo=%1; bar=\"bar\"; fizz; foo=boo");
    ///
    /// assert_eq!(cookies.get("foo"), Some("%1"));
    /// assert_eq!(cookies.get_all("foo"), ["%1", "boo"]);
    /// assert_eq!(cookies.get("bar"), Some("bar"));
    /// assert_eq!(cookies.get("fizz"), None);
    /// ```
    pub fn parse(header: &'h str) -> CookieHeader<'h> {
        Self::parse_headers(std::iter::once(header))
    }

    /// Parse multiple `Cookie` header values into a single [`CookieHeader`].
    pub fn parse_headers<I>(headers: I) -> CookieHeader<'h>
    where
        I: IntoIterator<Item = &'h str>,
    {
        let mut cookies = CookieHeader::new();
        for header in headers {
            cookies.extend_from_header(header);
        }
        cookies
    }

    /// Parse a `Cookie` header value and append its pairs to `self`.
    pub fn extend_from_header(&mut self, header: &'h str) {
        let mut index = 0;
        while index < header.len() {
            let Some(eq) = find(header, '=', index) else {
                // No more pairs.
                break;
            };
            let end = match find(header, ';', index) {
                None => header.len(),
                Some(semicolon) if semicolon < eq => {
                    // The fragment before `;` has no `=`: restart right after
                    // the last `;` preceding the `=` we found.
                    index = header[..eq].rfind(';').map_or(eq, |i| i + 1);
                    continue;
                }
                Some(semicolon) => semicolon,
            };

            let name = header[index..eq].trim();
            let value = trim_quotes(header[eq + 1..end].trim());
            self.cookies.entry(name).or_default().push(value);

            index = end + 1;
        }
    }

    /// Get the first value associated with `name`, if any.
    pub fn get(&self, name: &str) -> Option<&'h str> {
        self.cookies.get(name).and_then(|v| v.first().copied())
    }

    /// Get all the values associated with `name`, in header order.
    /// The slice is empty if there are no cookies named `name`.
    pub fn get_all(&self, name: &str) -> &[&'h str] {
        self.cookies.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Iterate over the distinct cookie names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &'h str> + '_ {
        self.cookies.keys().copied()
    }

    /// The number of distinct cookie names.
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// `true` if no pair was found.
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

fn find(haystack: &str, needle: char, from: usize) -> Option<usize> {
    haystack[from..].find(needle).map(|i| i + from)
}

/// Strip a pair of surrounding double-quotes, if present.
fn trim_quotes(s: &str) -> &str {
    if s.len() < 2 {
        return s;
    }

    let bytes = s.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(b'"'), Some(b'"')) => &s[1..(s.len() - 1)],
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use super::CookieHeader;

    /// A helper macro for our testing purposes.
    ///
    /// E.g. `cookies!("name" => ["value"], "other" => ["a", "b"])` lists the
    /// expected values for every name found in the header.
    macro_rules! cookies {
        ($($name:expr => [$($value:expr),*]),* $(,)?) => {
            {
                #[allow(unused_mut)]
                let mut expected: Vec<(&str, Vec<&str>)> = Vec::new();
                $(
                    expected.push(($name, vec![$($value),*]));
                )*
                expected
            }
        };
    }

    #[track_caller]
    fn check_case(string: &str, expected: Vec<(&str, Vec<&str>)>) {
        let actual = CookieHeader::parse(string);
        assert_eq!(
            actual.len(),
            expected.len(),
            "Unexpected names for string: {string}"
        );
        for (name, values) in expected {
            assert_eq!(
                actual.get_all(name),
                values.as_slice(),
                "Failed for name `{name}` in string: {string}"
            );
        }
    }

    #[test]
    fn parse() {
        let cases = [
            ("", cookies![]),
            (";;", cookies![]),
            ("foo=bar", cookies!["foo" => ["bar"]]),
            ("foo=123", cookies!["foo" => ["123"]]),
            ("foo=\"123\"", cookies!["foo" => ["123"]]),
            ("foo=\"", cookies!["foo" => ["\""]]),
            ("a=d#$%^&*()_", cookies!["a" => ["d#$%^&*()_"]]),
            ("  name=value  ", cookies!["name" => ["value"]]),
            (
                "name=value ;  ; other=key;; ",
                cookies!["name" => ["value"], "other" => ["key"]],
            ),
            (";a=1 ;  ; b= ", cookies!["a" => ["1"], "b" => [""]]),
            (" ;   a=1 ;  ; ;;c===  ", cookies!["a" => ["1"], "c" => ["=="]]),
        ];

        for (string, expected) in cases {
            check_case(string, expected)
        }
    }

    #[test]
    fn ignores_ows() {
        check_case(
            "FOO    = bar;   baz  =   raz",
            cookies!["FOO" => ["bar"], "baz" => ["raz"]],
        );
    }

    #[test]
    fn empty_values() {
        check_case("foo= ; bar=", cookies!["foo" => [""], "bar" => [""]]);
    }

    #[test]
    fn ignores_fragments_without_a_value() {
        check_case("foo=bar;fizz  ;  buzz", cookies!["foo" => ["bar"]]);
        check_case("  fizz; foo=  bar", cookies!["foo" => ["bar"]]);
        check_case("yo", cookies![]);
        check_case("a=1; yo; b=2", cookies!["a" => ["1"], "b" => ["2"]]);
    }

    #[test]
    fn keeps_duplicates_in_order() {
        check_case(
            "foo=%1;bar=bar;foo=boo",
            cookies!["foo" => ["%1", "boo"], "bar" => ["bar"]],
        );
        check_case(
            "foo=false;bar=bar;foo=true",
            cookies!["foo" => ["false", "true"], "bar" => ["bar"]],
        );
        check_case(
            "foo=;bar=bar;foo=boo",
            cookies!["foo" => ["", "boo"], "bar" => ["bar"]],
        );
    }

    #[test]
    fn multiple_headers() {
        let cookies = CookieHeader::parse_headers(["a=1; b=2", "a=3"]);
        assert_eq!(cookies.get_all("a"), ["1", "3"]);
        assert_eq!(cookies.get("b"), Some("2"));
        assert!(cookies.get_all("c").is_empty());
    }

    #[test]
    fn get_lifetime() {
        let header = "name=value".to_string();
        let cookies = CookieHeader::parse(&header);

        // Values outlive the key used to look them up.
        let value = {
            let key = "name".to_string();
            cookies.get(key.as_str())
        };
        assert_eq!(value, Some("value"));
    }
}
