//! Dot-path lookup into a decoded claim set.
//!
//! Identity providers nest claims (`realm_access.roles`,
//! `resource_access.app.roles`). A path names one value by walking nested
//! objects one segment at a time.

use serde_json::{Map, Value};

/// A decoded token payload.
pub type Claims = Map<String, Value>;

/// The value at `path`, or `None` when the path is empty, any segment is
/// missing, an intermediate value is not an object, or the value is `null`.
///
/// ```
/// use enroll_auth::claims::{claim_at_path, Claims};
///
/// let claims: Claims = serde_json::from_str(r#"{"a": {"b": {"c": 7}}}"#).unwrap();
/// assert_eq!(claim_at_path(&claims, "a.b.c"), Some(&serde_json::json!(7)));
/// assert_eq!(claim_at_path(&claims, "a.x"), None);
/// ```
pub fn claim_at_path<'a>(claims: &'a Claims, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut segments = path.split('.');
    let mut current = claims.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    (!current.is_null()).then_some(current)
}

/// Typed, lenient conversion out of a claim value.
///
/// Numeric types also accept numeric strings, since some providers emit
/// ids as `"42"`. Anything that does not convert is `None`.
pub trait FromClaim: Sized {
    fn from_claim(value: &Value) -> Option<Self>;
}

impl FromClaim for Value {
    fn from_claim(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromClaim for String {
    fn from_claim(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromClaim for bool {
    fn from_claim(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromClaim for i64 {
    fn from_claim(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromClaim for i32 {
    fn from_claim(value: &Value) -> Option<Self> {
        i64::from_claim(value).and_then(|n| i32::try_from(n).ok())
    }
}

/// String elements of an array claim; other elements are skipped.
impl FromClaim for Vec<String> {
    fn from_claim(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        Some(
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        )
    }
}

/// Typed claim lookup: [`claim_at_path`] followed by [`FromClaim`].
pub fn get_claim<T: FromClaim>(claims: &Claims, path: &str) -> Option<T> {
    claim_at_path(claims, path).and_then(T::from_claim)
}
