use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type ReduceFn = dyn Fn(Option<Value>, Option<Value>) -> Option<Value> + Send + Sync;

/// Combines the current value of a cookie with the value passed to
/// [`Session::set`](crate::Session::set).
///
/// The first argument is the current value (`None` if the cookie holds no
/// value), the second one is the incoming value (`None` for a deletion).
/// Returning `None` deletes the cookie.
///
/// ```rust
/// use amaretti::Reducer;
/// use serde_json::json;
///
/// let concat = Reducer::typed(|prev: Option<String>, next: Option<String>| {
///     Some(prev.unwrap_or_default() + &next?)
/// });
/// assert_eq!(
///     concat.reduce(Some(json!("ab")), Some(json!("cd"))),
///     Some(json!("abcd"))
/// );
/// ```
#[derive(Clone)]
pub struct Reducer(Arc<ReduceFn>);

impl Reducer {
    /// Wraps a closure working on raw JSON values.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<Value>, Option<Value>) -> Option<Value> + Send + Sync + 'static,
    {
        Reducer(Arc::new(f))
    }

    /// The default reducer: the incoming value replaces the current one.
    pub fn last_write_wins() -> Self {
        Reducer::new(|_prev, next| next)
    }

    /// Wraps a closure working on typed values.
    ///
    /// A current value that can't be deserialized into `T` is passed as `None`.
    /// If the incoming value can't be deserialized, or the result can't be
    /// serialized, the cookie is deleted.
    pub fn typed<T, F>(f: F) -> Self
    where
        T: Serialize + DeserializeOwned,
        F: Fn(Option<T>, Option<T>) -> Option<T> + Send + Sync + 'static,
    {
        Reducer::new(move |prev, next| {
            let prev = prev.and_then(|v| serde_json::from_value(v).ok());
            let next = match next {
                Some(v) => Some(serde_json::from_value(v).ok()?),
                None => None,
            };
            serde_json::to_value(f(prev, next)?).ok()
        })
    }

    /// Computes the next value of a cookie.
    pub fn reduce(&self, prev: Option<Value>, next: Option<Value>) -> Option<Value> {
        (self.0)(prev, next)
    }
}

impl Default for Reducer {
    fn default() -> Self {
        Reducer::last_write_wins()
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reducer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::Reducer;
    use googletest::prelude::*;
    use serde_json::json;

    #[test]
    fn last_write_wins() {
        let reducer = Reducer::default();
        assert_eq!(reducer.reduce(Some(json!(1)), Some(json!(2))), Some(json!(2)));
        assert_eq!(reducer.reduce(Some(json!(1)), None), None);
    }

    #[test]
    fn typed_accumulates() {
        let sum = Reducer::typed(|prev: Option<u64>, next: Option<u64>| {
            Some(prev.unwrap_or(0) + next?)
        });
        assert_eq!(sum.reduce(None, Some(json!(3))), Some(json!(3)));
        assert_eq!(sum.reduce(Some(json!(3)), Some(json!(4))), Some(json!(7)));
        // A deletion stays a deletion.
        assert_that!(sum.reduce(Some(json!(3)), None), none());
    }

    #[test]
    fn typed_ignores_a_current_value_of_the_wrong_shape() {
        let sum = Reducer::typed(|prev: Option<u64>, next: Option<u64>| {
            Some(prev.unwrap_or(0) + next?)
        });
        assert_eq!(sum.reduce(Some(json!("three")), Some(json!(4))), Some(json!(4)));
        assert_that!(sum.reduce(Some(json!(3)), Some(json!("four"))), none());
    }
}
