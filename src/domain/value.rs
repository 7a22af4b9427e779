//! Loosely-typed values carried by command parameters and result payloads
//!
//! Parameters arrive as an open string-keyed bag. Instead of casting arbitrary objects, every
//! entry is a [`Value`] and readers decode it through [`FromValue`], choosing between three
//! policies:
//! - [`Parameters::get_or`] swallows a missing key or a type mismatch and returns the default
//! - [`Parameters::require`] turns either condition into a validation error naming the field
//! - [`Parameters::decode`] reports a mismatch but treats a missing key as `None`

use std::{
    collections::{BTreeMap, HashMap},
    fmt::{self, Display}
};

use serde::{Deserialize, Serialize};

use crate::domain::error::CommandError;

/// A single parameter, result payload or metadata entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>)
}

impl Value {
    /// Name of the variant, used in type-mismatch messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::List(_) => "list"
        }
    }

    /// Parse a command-line literal: `true`/`false`, integers, floats, comma lists, else text
    pub fn parse_literal(raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.contains(',') {
            return Value::List(trimmed.split(',').map(Value::parse_literal).collect());
        }
        if let Ok(flag) = trimmed.parse::<bool>() {
            return Value::Bool(flag);
        }
        if let Ok(number) = trimmed.parse::<i64>() {
            return Value::Int(number);
        }
        if let Ok(number) = trimmed.parse::<f64>() {
            return Value::Float(number);
        }
        Value::Text(trimmed.to_string())
    }

    /// Decode into a concrete type, failing on mismatch
    pub fn decode<T: FromValue>(&self) -> Option<T> {
        T::from_value(self)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::List(items) => {
                let rendered: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

/// Conversion from a [`Value`] without coercion between unrelated variants
///
/// The only widening allowed is `Int -> f64`, since integer literals are valid floats.
pub trait FromValue: Sized {
    const TYPE_NAME: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None
        }
    }
}

impl FromValue for i64 {
    const TYPE_NAME: &'static str = "int";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            _ => None
        }
    }
}

impl FromValue for usize {
    const TYPE_NAME: &'static str = "unsigned int";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => usize::try_from(*v).ok(),
            _ => None
        }
    }
}

impl FromValue for f64 {
    const TYPE_NAME: &'static str = "float";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None
        }
    }
}

impl FromValue for String {
    const TYPE_NAME: &'static str = "text";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v.clone()),
            _ => None
        }
    }
}

impl FromValue for Vec<String> {
    const TYPE_NAME: &'static str = "list of text";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(String::from_value).collect(),
            _ => None
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// Open key-value bag handed to a command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters(BTreeMap<String, Value>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Overlay every entry of `other` on top of this bag
    pub fn extend(&mut self, other: Parameters) {
        self.0.extend(other.0);
    }

    /// Value for `key`, or `default` when missing or of another type
    pub fn get_or<T: FromValue>(&self, key: &str, default: T) -> T {
        self.0.get(key).and_then(T::from_value).unwrap_or(default)
    }

    /// Value for `key`; missing keys and type mismatches become validation errors
    pub fn require<T: FromValue>(&self, command: &str, key: &str) -> Result<T, CommandError> {
        let value = self
            .0
            .get(key)
            .ok_or_else(|| CommandError::validation(command, key, "required parameter not provided"))?;

        T::from_value(value).ok_or_else(|| {
            CommandError::validation(
                command,
                key,
                format!("parameter has invalid type: expected {}, found {}", T::TYPE_NAME, value.type_name())
            )
        })
    }

    /// `Ok(None)` for a missing key, validation error for a present value of the wrong type
    pub fn decode<T: FromValue>(&self, command: &str, key: &str) -> Result<Option<T>, CommandError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(_) => self.require(command, key).map(Some)
        }
    }
}

impl FromIterator<(String, Value)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<HashMap<String, Value>> for Parameters {
    fn from(map: HashMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_swallows_missing_and_mismatched_values() {
        let params = Parameters::new().with("count", 25).with("label", "fixtures");

        assert_eq!(params.get_or("count", 300usize), 25);
        assert_eq!(params.get_or("missing", 300usize), 300);
        assert_eq!(params.get_or("label", 7i64), 7);
    }

    #[test]
    fn test_require_names_the_offending_field() {
        let params = Parameters::new().with("count", "many");

        let missing = params.require::<i64>("Generate", "daysBack").unwrap_err();
        assert_eq!(missing.field(), Some("daysBack"));
        assert!(missing.is_validation());

        let mistyped = params.require::<i64>("Generate", "count").unwrap_err();
        assert_eq!(mistyped.field(), Some("count"));
        assert!(mistyped.to_string().contains("expected int, found text"));
    }

    #[test]
    fn test_decode_distinguishes_absent_from_invalid() {
        let params = Parameters::new().with("confirm", true).with("prefix", 12);

        assert_eq!(params.decode::<bool>("Delete", "confirm").unwrap(), Some(true));
        assert_eq!(params.decode::<bool>("Delete", "absent").unwrap(), None);
        assert!(params.decode::<String>("Delete", "prefix").is_err());
    }

    #[test]
    fn test_int_widens_to_float_but_not_the_reverse() {
        assert_eq!(Value::Int(3).decode::<f64>(), Some(3.0));
        assert_eq!(Value::Float(3.0).decode::<i64>(), None);
        assert_eq!(Value::Int(-1).decode::<usize>(), None);
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(Value::parse_literal("true"), Value::Bool(true));
        assert_eq!(Value::parse_literal("300"), Value::Int(300));
        assert_eq!(Value::parse_literal("0.25"), Value::Float(0.25));
        assert_eq!(Value::parse_literal("ISS,IPI"), Value::from(vec!["ISS", "IPI"]));
        assert_eq!(Value::parse_literal(" TEST "), Value::Text("TEST".to_string()));
    }

    #[test]
    fn test_list_of_text_rejects_mixed_lists() {
        let mixed = Value::List(vec![Value::from("ISS"), Value::Int(1)]);
        assert_eq!(mixed.decode::<Vec<String>>(), None);
    }
}
