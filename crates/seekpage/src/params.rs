//! Bind parameters and the normalizer.
//!
//! Raw statement parameters ([`ParamList`]) are normalized into typed,
//! dialect-formatted [`BindParam`]s:
//!
//! - scalars keep their type (`Str`, `Int`, `Bool`, `Null`, `Lob`)
//! - domain wrappers ([`BackedValue`](crate::BackedValue)) are unwrapped first
//! - temporal values go through the dialect's formatter
//! - arrays and maps expand to `name__0, name__1, ...` in element order
//!
//! The normalizer also reports which names were expanded, so the compiler can
//! rewrite the matching `:name` placeholder into exactly as many slots.

use crate::dialect::{Dialect, Temporal};
use crate::error::{PageError, PageResult};
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Separator between a parameter name and its expansion index.
pub const EXPANSION_SEPARATOR: &str = "__";

/// Driver-level parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Str,
    Int,
    Bool,
    Null,
    Lob,
}

/// A normalized, driver-ready value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Lob(Vec<u8>),
}

impl BindValue {
    /// Parameter type implied by the value.
    pub fn param_type(&self) -> ParamType {
        match self {
            BindValue::Null => ParamType::Null,
            BindValue::Bool(_) => ParamType::Bool,
            BindValue::Int(_) => ParamType::Int,
            BindValue::Str(_) => ParamType::Str,
            BindValue::Lob(_) => ParamType::Lob,
        }
    }
}

/// A named bind parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindParam {
    name: String,
    value: BindValue,
    ty: ParamType,
}

impl BindParam {
    /// Create a parameter; the type follows the value.
    pub fn new(name: impl Into<String>, value: BindValue) -> Self {
        let ty = value.param_type();
        Self {
            name: name.into(),
            value,
            ty,
        }
    }

    /// Bind name without the leading `:`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bound value.
    pub fn value(&self) -> &BindValue {
        &self.value
    }

    /// Driver type.
    pub fn param_type(&self) -> ParamType {
        self.ty
    }
}

/// Normalized parameters, in bind order.
pub type Params = IndexMap<String, BindParam>;

/// Raw statement parameters, keyed by placeholder name.
///
/// # Example
/// ```ignore
/// use seekpage::ParamList;
///
/// let params = ParamList::new()
///     .bind("gender", vec![1, 2])
///     .bind(":status", "active");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamList {
    values: IndexMap<String, Value>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` to `name`. A leading `:` on the name is ignored; binding the
    /// same name twice keeps the last value.
    ///
    /// An empty collection renders as `NULL`, so `IN (:ids)` matches nothing.
    /// Compiling `NOT IN (:ids)` with an empty collection is an error.
    pub fn bind(mut self, name: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// In-place form of [`ParamList::bind`].
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<Value>) {
        let name = name.as_ref();
        let name = name.strip_prefix(':').unwrap_or(name);
        self.values.insert(name.to_string(), value.into());
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterate `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for ParamList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = Self::new();
        for (k, v) in iter {
            list.insert(k, v);
        }
        list
    }
}

/// Result of normalization.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Flat bind parameters.
    pub params: Params,
    /// Expanded names per collection-valued parameter (possibly empty).
    pub expansions: HashMap<String, Vec<String>>,
}

/// Name of the `index`-th expansion of `name`.
pub fn expanded_name(name: &str, index: usize) -> String {
    format!("{name}{EXPANSION_SEPARATOR}{index}")
}

fn is_valid_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Convert one resolved scalar into a bind value.
fn scalar_to_bind(dialect: Dialect, name: &str, value: &Value) -> PageResult<BindValue> {
    match value {
        Value::Null => Ok(BindValue::Null),
        Value::Bool(b) => Ok(BindValue::Bool(*b)),
        Value::Int(i) => Ok(BindValue::Int(*i)),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(PageError::normalize(name, format!("non-finite float {f}")));
            }
            Ok(BindValue::Str(f.to_string()))
        }
        Value::String(s) => Ok(BindValue::Str(s.clone())),
        Value::Bytes(b) => Ok(BindValue::Lob(b.clone())),
        Value::DateTime(dt) => Ok(BindValue::Str(
            dialect.format_temporal(Temporal::DateTime(*dt)),
        )),
        Value::Date(d) => Ok(BindValue::Str(dialect.format_temporal(Temporal::Date(*d)))),
        Value::Array(_) | Value::Map(_) | Value::Backed(_) => Err(PageError::normalize(
            name,
            format!("unsupported value kind '{}'", value.kind()),
        )),
    }
}

/// Normalize a single value to a bind value (wrappers resolved, scalars only).
pub fn normalize_scalar(dialect: Dialect, name: &str, value: &Value) -> PageResult<BindValue> {
    let resolved = value
        .resolve_scalar()
        .map_err(|e| PageError::normalize(name, e))?;
    scalar_to_bind(dialect, name, &resolved)
}

/// Normalize raw parameters for `dialect`.
///
/// Collections expand to `{name}__{i}` preserving element order (map keys are
/// dropped). Nested collections are rejected.
pub fn normalize(dialect: Dialect, raw: &ParamList) -> PageResult<Normalized> {
    let mut out = Normalized::default();

    let mut push = |out: &mut Normalized, name: String, value: BindValue| -> PageResult<()> {
        if out.params.contains_key(&name) {
            return Err(PageError::normalize(
                name,
                "parameter name produced twice after array expansion",
            ));
        }
        out.params.insert(name.clone(), BindParam::new(name, value));
        Ok(())
    };

    for (name, value) in raw.iter() {
        if !is_valid_param_name(name) {
            return Err(PageError::normalize(name, "invalid parameter name"));
        }

        let resolved = value
            .resolve()
            .map_err(|e| PageError::normalize(name, e))?;

        let elements: Vec<&Value> = match &resolved {
            Value::Array(items) => items.iter().collect(),
            Value::Map(map) => map.values().collect(),
            scalar => {
                let bound = scalar_to_bind(dialect, name, scalar)?;
                push(&mut out, name.to_string(), bound)?;
                continue;
            }
        };

        let mut names = Vec::with_capacity(elements.len());
        for (i, element) in elements.into_iter().enumerate() {
            let element_name = expanded_name(name, i);
            let element = element.resolve().map_err(|e| PageError::normalize(&element_name, e))?;
            if element.is_collection() {
                return Err(PageError::normalize(
                    &element_name,
                    format!("nested {} values are not supported", element.kind()),
                ));
            }
            let bound = scalar_to_bind(dialect, &element_name, &element)?;
            push(&mut out, element_name.clone(), bound)?;
            names.push(element_name);
        }
        out.expansions.insert(name.to_string(), names);
    }

    Ok(out)
}
