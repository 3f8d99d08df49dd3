//! Lenient structural comparison of JSON values
//!
//! [`compare`] checks that everything in `expected` is present in `actual`.
//! Objects are compared one-directionally (extra keys in `actual` are
//! ignored) and arrays by order-independent containment. An expected value
//! that is the zero value for its kind always passes, because registry
//! records omit empty fields when serialized: a zero-valued field in an
//! example may legitimately be missing from the stored record.

use serde_json::{Map, Number, Value};
use std::fmt;

use crate::RoundtripError;

/// Why a comparison failed, and where
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// Object keys leading from the compared root to the failing value
    pub path: Vec<String>,
    pub reason: MismatchReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MismatchReason {
    /// A non-zero value was expected but `actual` was absent or null
    Missing { expected: Value },
    /// `actual` holds a different kind of value
    KindMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    /// Scalars of the same kind with different values
    ValueMismatch { expected: Value, actual: Value },
    /// No element of the actual array matched this expected element
    MissingElement { element: Value },
}

impl Mismatch {
    fn new(reason: MismatchReason) -> Self {
        Self {
            path: Vec::new(),
            reason,
        }
    }

    fn under_key(mut self, key: &str) -> Self {
        self.path.insert(0, key.to_string());
        self
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.path {
            write!(f, "key {key:?}: ")?;
        }
        match &self.reason {
            MismatchReason::Missing { expected } => {
                write!(f, "expected {expected}, got nothing")
            }
            MismatchReason::KindMismatch { expected, actual } => {
                write!(f, "expected {expected}, got {actual}")
            }
            MismatchReason::ValueMismatch { expected, actual } => {
                write!(f, "expected {expected}, got {actual}")
            }
            MismatchReason::MissingElement { element } => {
                write!(f, "{element} missing in actual array")
            }
        }
    }
}

/// Whether `value` is the zero value for its kind
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Name of a value's kind, as used in mismatch messages
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Compare `expected` against `actual` (`None` when the value is absent)
pub fn compare(expected: &Value, actual: Option<&Value>) -> Result<(), Mismatch> {
    if is_zero(expected) {
        return Ok(());
    }
    let actual = match actual {
        None | Some(Value::Null) => {
            return Err(Mismatch::new(MismatchReason::Missing {
                expected: expected.clone(),
            }));
        }
        Some(actual) => actual,
    };

    match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => {
            for (key, expected_value) in expected {
                compare(expected_value, actual.get(key)).map_err(|m| m.under_key(key))?;
            }
            Ok(())
        }
        (Value::Array(expected), Value::Array(actual)) => {
            for element in expected {
                let found = actual
                    .iter()
                    .any(|candidate| compare(element, Some(candidate)).is_ok());
                if !found {
                    return Err(Mismatch::new(MismatchReason::MissingElement {
                        element: element.clone(),
                    }));
                }
            }
            Ok(())
        }
        (Value::Object(_), _) | (Value::Array(_), _) => {
            Err(Mismatch::new(MismatchReason::KindMismatch {
                expected: kind_name(expected),
                actual: kind_name(actual),
            }))
        }
        _ => compare_scalars(expected, actual),
    }
}

fn compare_scalars(expected: &Value, actual: &Value) -> Result<(), Mismatch> {
    let equal = match (expected, actual) {
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        _ => {
            return Err(Mismatch::new(MismatchReason::KindMismatch {
                expected: kind_name(expected),
                actual: kind_name(actual),
            }));
        }
    };

    if equal {
        Ok(())
    } else {
        Err(Mismatch::new(MismatchReason::ValueMismatch {
            expected: expected.clone(),
            actual: actual.clone(),
        }))
    }
}

/// Numbers compare by value: `1` and `1.0` are equal.
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Compare every top-level field of an example against a fetched record
///
/// Fields are checked in the example's key order; the first failing field is
/// reported as [`RoundtripError::FieldMismatch`].
pub fn compare_fields(expected: &Map<String, Value>, actual: &Value) -> crate::Result<()> {
    for (field, expected_value) in expected {
        compare(expected_value, actual.get(field)).map_err(|mismatch| {
            RoundtripError::FieldMismatch {
                field: field.clone(),
                mismatch,
            }
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_zero_values_always_pass() {
        let zeros = [
            json!(""),
            json!(0),
            json!(0.0),
            json!(false),
            json!(null),
            json!({}),
            json!([]),
        ];
        let actuals = [
            None,
            Some(json!(null)),
            Some(json!("text")),
            Some(json!(42)),
            Some(json!({"a": 1})),
            Some(json!([1, 2])),
        ];

        for zero in &zeros {
            for actual in &actuals {
                assert!(
                    compare(zero, actual.as_ref()).is_ok(),
                    "{zero} against {actual:?} should pass"
                );
            }
        }
    }

    #[test]
    fn test_non_zero_against_nothing_fails() {
        let err = compare(&json!("x"), None).unwrap_err();
        assert!(matches!(err.reason, MismatchReason::Missing { .. }));
        assert_eq!(err.to_string(), "expected \"x\", got nothing");

        let err = compare(&json!(1), Some(&json!(null))).unwrap_err();
        assert!(matches!(err.reason, MismatchReason::Missing { .. }));
    }

    #[test]
    fn test_extra_actual_keys_are_ignored() {
        assert!(compare(&json!({"a": 1}), Some(&json!({"a": 1, "b": 2}))).is_ok());
    }

    #[test]
    fn test_missing_expected_key_is_named() {
        let err = compare(&json!({"a": 1, "b": 2}), Some(&json!({"a": 1}))).unwrap_err();
        assert_eq!(err.path, vec!["b".to_string()]);
        assert_eq!(err.to_string(), "key \"b\": expected 2, got nothing");
    }

    #[test]
    fn test_missing_zero_key_passes() {
        let expected = json!({"name": "x", "description": "", "tags": []});
        assert!(compare(&expected, Some(&json!({"name": "x"}))).is_ok());
    }

    #[test]
    fn test_nested_path_is_reported() {
        let expected = json!({"repository": {"source": {"url": "https://a"}}});
        let actual = json!({"repository": {"source": {"url": "https://b"}}});
        let err = compare(&expected, Some(&actual)).unwrap_err();
        assert_eq!(err.path, vec!["repository", "source", "url"]);
        assert_eq!(
            err.to_string(),
            "key \"repository\": key \"source\": key \"url\": expected \"https://a\", got \"https://b\""
        );
    }

    #[test]
    fn test_arrays_compare_by_containment() {
        assert!(compare(&json!([1, 2]), Some(&json!([2, 1, 3]))).is_ok());

        let err = compare(&json!([1, 2]), Some(&json!([1]))).unwrap_err();
        assert_eq!(
            err.reason,
            MismatchReason::MissingElement { element: json!(2) }
        );
        assert_eq!(err.to_string(), "2 missing in actual array");
    }

    #[test]
    fn test_one_actual_element_may_satisfy_several() {
        assert!(compare(&json!([1, 1, 1]), Some(&json!([1]))).is_ok());
    }

    #[test]
    fn test_array_of_objects_uses_lenient_matching() {
        let expected = json!([
            {"registry_type": "npm", "identifier": "pkg"},
            {"registry_type": "pypi", "identifier": "other", "runtime_hint": ""}
        ]);
        let actual = json!([
            {"registry_type": "pypi", "identifier": "other", "version": "1.0"},
            {"registry_type": "npm", "identifier": "pkg", "version": "2.0"}
        ]);
        assert!(compare(&expected, Some(&actual)).is_ok());
    }

    #[test]
    fn test_kind_mismatch_names_actual_kind() {
        let err = compare(&json!({"a": 1}), Some(&json!("a"))).unwrap_err();
        assert_eq!(err.to_string(), "expected object, got string");

        let err = compare(&json!([1]), Some(&json!({"a": 1}))).unwrap_err();
        assert_eq!(err.to_string(), "expected array, got object");

        let err = compare(&json!("1"), Some(&json!(1))).unwrap_err();
        assert_eq!(err.to_string(), "expected string, got number");
    }

    #[test]
    fn test_scalars_must_be_equal() {
        assert!(compare(&json!("1.0"), Some(&json!("1.0"))).is_ok());
        assert!(compare(&json!(true), Some(&json!(true))).is_ok());
        assert!(compare(&json!(true), Some(&json!(false))).is_err());
        assert!(compare(&json!(1), Some(&json!(1.0))).is_ok());
        assert!(compare(&json!(1.5), Some(&json!(2))).is_err());
    }

    #[test]
    fn test_compare_fields_names_field() {
        let expected = json!({"name": "x", "version": "1.0"});
        let actual = json!({"name": "x", "version": "2.0", "extra": "ignored"});
        let err = compare_fields(expected.as_object().unwrap(), &actual).unwrap_err();
        assert_eq!(
            err.to_string(),
            "field \"version\": expected \"1.0\", got \"2.0\""
        );
    }

    #[test]
    fn test_compare_fields_against_non_object() {
        let expected = json!({"name": "x", "remotes": []});
        let err = compare_fields(expected.as_object().unwrap(), &json!([1])).unwrap_err();
        assert!(matches!(
            err,
            RoundtripError::FieldMismatch { ref field, .. } if field == "name"
        ));
    }
}
