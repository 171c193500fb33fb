//! Raw input values for statement parameters and cursor positions.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Unwrap depth limit for nested [`BackedValue`]s.
const MAX_BACKED_DEPTH: usize = 8;

/// A domain value backed by a scalar (an enum-like wrapper, a newtype id, ...).
///
/// The normalizer calls [`BackedValue::scalar`] before typing the parameter.
///
/// # Example
/// ```ignore
/// #[derive(Debug)]
/// enum Gender { Male, Female }
///
/// impl BackedValue for Gender {
///     fn scalar(&self) -> Value {
///         Value::Int(match self { Gender::Male => 1, Gender::Female => 2 })
///     }
/// }
///
/// let v = Value::backed(Gender::Female);
/// ```
pub trait BackedValue: fmt::Debug + Send + Sync {
    /// The underlying scalar.
    fn scalar(&self) -> Value;
}

/// A raw, dialect-independent value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Binary data, bound as a LOB.
    Bytes(Vec<u8>),
    /// A timestamp in UTC.
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    /// A list; expands to one bind parameter per element.
    Array(Vec<Value>),
    /// An associative map; expands by value position, keys are dropped.
    Map(IndexMap<String, Value>),
    /// A domain wrapper resolved to its scalar at normalization time.
    #[serde(skip)]
    Backed(Arc<dyn BackedValue>),
}

impl Value {
    /// Wrap a domain value.
    pub fn backed(value: impl BackedValue + 'static) -> Self {
        Value::Backed(Arc::new(value))
    }

    /// Binary value.
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(value.into())
    }

    /// Returns `true` for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for arrays and maps.
    pub fn is_collection(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Map(_))
    }

    /// Unwrap domain wrappers until a non-wrapper value is reached.
    ///
    /// Fails when wrappers nest deeper than a fixed bound.
    pub fn resolve(&self) -> Result<Value, String> {
        let mut current = self.clone();
        for _ in 0..MAX_BACKED_DEPTH {
            match current {
                Value::Backed(inner) => current = inner.scalar(),
                other => return Ok(other),
            }
        }
        Err(format!(
            "domain value wrappers nested deeper than {MAX_BACKED_DEPTH} levels"
        ))
    }

    /// Resolve to a scalar: wrappers are unwrapped, collections rejected.
    pub fn resolve_scalar(&self) -> Result<Value, String> {
        let resolved = self.resolve()?;
        if resolved.is_collection() {
            return Err(format!(
                "expected a scalar value, got {}",
                resolved.kind()
            ));
        }
        Ok(resolved)
    }

    /// Short name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Backed(_) => "backed",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Backed(a), Value::Backed(b)) => {
                Arc::ptr_eq(a, b) || a.scalar() == b.scalar()
            }
            _ => false,
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Value::DateTime(v.naive_utc())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Value {
    fn from(v: &[T]) -> Self {
        Value::Array(v.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<IndexMap<String, T>> for Value {
    fn from(v: IndexMap<String, T>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(v: BTreeMap<String, T>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n
                    .as_f64()
                    .map_or_else(|| Value::String(n.to_string()), Value::Float),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    enum Status {
        Active,
        Banned,
    }

    impl BackedValue for Status {
        fn scalar(&self) -> Value {
            match self {
                Status::Active => Value::from("active"),
                Status::Banned => Value::from("banned"),
            }
        }
    }

    #[derive(Debug)]
    struct Nested(Status);

    impl BackedValue for Nested {
        fn scalar(&self) -> Value {
            Value::backed(match self.0 {
                Status::Active => Status::Active,
                Status::Banned => Status::Banned,
            })
        }
    }

    #[derive(Debug)]
    struct Loop;

    impl BackedValue for Loop {
        fn scalar(&self) -> Value {
            Value::backed(Loop)
        }
    }

    #[test]
    fn resolve_unwraps_backed_values() {
        assert_eq!(
            Value::backed(Status::Banned).resolve().unwrap(),
            Value::from("banned")
        );
        assert_eq!(
            Value::backed(Nested(Status::Active)).resolve().unwrap(),
            Value::from("active")
        );
    }

    #[test]
    fn resolve_bounds_wrapper_depth() {
        assert!(Value::backed(Loop).resolve().is_err());
    }

    #[test]
    fn resolve_scalar_rejects_collections() {
        assert!(Value::from(vec![1, 2]).resolve_scalar().is_err());
        assert_eq!(Value::from(7).resolve_scalar().unwrap(), Value::Int(7));
    }

    #[test]
    fn datetime_with_offset_converts_to_utc() {
        let dt = DateTime::parse_from_rfc3339("2024-01-15T12:00:00+02:00").unwrap();
        let Value::DateTime(naive) = Value::from(dt) else {
            panic!("expected a datetime");
        };
        assert_eq!(naive.to_string(), "2024-01-15 10:00:00");
    }

    #[test]
    fn json_values_convert() {
        let v = Value::from(json!({"a": 1, "b": [true, null], "c": 1.5}));
        let Value::Map(map) = v else {
            panic!("expected a map");
        };
        assert_eq!(map["a"], Value::Int(1));
        assert_eq!(map["b"], Value::Array(vec![Value::Bool(true), Value::Null]));
        assert_eq!(map["c"], Value::Float(1.5));
    }

    #[test]
    fn option_maps_to_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }
}
