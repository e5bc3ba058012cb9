//! Scalar attribute values.
//!
//! `AttributeValue` is the cell stored under every key of a `Record`. It is a
//! closed tagged union over four scalar kinds and is immutable once built.
//!
//! Wire decoding infers the kind from the JSON scalar. The inference order is
//! strict: literal `true`/`false` → Bool, then a numeric parse → Number, then
//! the fixed `TIME_LAYOUT` → Time, otherwise String. This is lossy by design
//! of the wire format: a string that looks like a number, a boolean, or a
//! timestamp does not come back as a String.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::errors::CoreError;

/// The one layout used to format and parse `Time` values (UTC, second precision).
pub const TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// Discriminant of an `AttributeValue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    String,
    Number,
    Time,
}

impl ValueKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::Number => "number",
            Self::Time => "time",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scalar value of a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    String(String),
    Number(Number),
    Time(DateTime<Utc>),
}

impl AttributeValue {
    /// Build a value from a native scalar.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Value` for nil (`None`, `()`, non-finite floats)
    /// and for unsupported kinds (sequences and maps).
    pub fn new(input: impl Into<Value>) -> Result<Self, CoreError> {
        match input.into() {
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::Number(n) => Ok(Self::Number(n)),
            Value::String(s) => Ok(Self::String(s)),
            Value::Null => Err(CoreError::Value(
                "cannot build an attribute value from nil".into(),
            )),
            Value::Array(_) => Err(CoreError::Value("unsupported kind: sequence".into())),
            Value::Object(_) => Err(CoreError::Value("unsupported kind: map".into())),
        }
    }

    /// Build a value that is known to be valid at startup, e.g. a default in a
    /// static table. Runtime request paths must use [`AttributeValue::new`].
    ///
    /// # Panics
    ///
    /// Panics if [`AttributeValue::new`] would return an error.
    #[must_use]
    #[track_caller]
    pub fn must_new(input: impl Into<Value>) -> Self {
        match Self::new(input) {
            Ok(value) => value,
            Err(e) => panic!("static attribute value construction failed: {e}"),
        }
    }

    /// Build a `Time` value from epoch seconds or a `TIME_LAYOUT` string.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Parse` for a malformed time string and
    /// `CoreError::Value` for nil, out-of-range epochs, or other kinds.
    pub fn time(input: impl Into<Value>) -> Result<Self, CoreError> {
        match input.into() {
            Value::Number(n) => epoch_to_time(&n).map(Self::Time),
            Value::String(s) => parse_time(&s).map(Self::Time),
            Value::Null => Err(CoreError::Value(
                "cannot build a time value from nil".into(),
            )),
            other => Err(CoreError::Value(format!("unsupported time input: {other}"))),
        }
    }

    /// Emit the native JSON scalar for this value. `Time` becomes a
    /// `TIME_LAYOUT` string.
    #[must_use]
    pub fn encode(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::String(s) => Value::String(s.clone()),
            Self::Number(n) => Value::Number(n.clone()),
            Self::Time(t) => Value::String(format_time(t)),
        }
    }

    /// Decode a wire scalar using the inference order described at module level.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Value` for `null`, arrays, and objects.
    pub fn decode(wire: &Value) -> Result<Self, CoreError> {
        match wire {
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => Ok(Self::Number(n.clone())),
            Value::String(s) => Ok(Self::infer(s)),
            Value::Null => Err(CoreError::Value("cannot decode nil".into())),
            Value::Array(_) | Value::Object(_) => Err(CoreError::Value(format!(
                "cannot decode non-scalar {wire}"
            ))),
        }
    }

    /// Infer the kind of a bare wire string.
    #[must_use]
    pub fn infer(text: &str) -> Self {
        match text {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        if let Some(n) = parse_number(text) {
            return Self::Number(n);
        }
        if let Ok(t) = parse_time(text) {
            return Self::Time(t);
        }
        Self::String(text.to_string())
    }

    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::String(_) => ValueKind::String,
            Self::Number(_) => ValueKind::Number,
            Self::Time(_) => ValueKind::Time,
        }
    }

    // Typed getters return the zero value of the requested type when the
    // kind does not match. Use `kind()` or the `try_*` accessors to tell a
    // real zero from a mismatch.

    #[must_use]
    pub const fn as_bool(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.try_str().unwrap_or_default()
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Number(n) => n
                .as_i64()
                .unwrap_or_else(|| n.as_f64().map_or(0, |f| f as i64)),
            _ => 0,
        }
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn as_u64(&self) -> u64 {
        match self {
            Self::Number(n) => n
                .as_u64()
                .unwrap_or_else(|| n.as_f64().map_or(0, |f| f as u64)),
            _ => 0,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.try_f64().unwrap_or_default()
    }

    #[must_use]
    pub fn as_time(&self) -> DateTime<Utc> {
        self.try_time().unwrap_or_default()
    }

    #[must_use]
    pub const fn try_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn try_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn try_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn try_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Time(t) => Some(*t),
            _ => None,
        }
    }
}

fn parse_number(text: &str) -> Option<Number> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(Number::from(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Some(Number::from(u));
    }
    // Non-finite floats ("NaN", "inf") have no JSON representation.
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

pub(crate) fn parse_time(text: &str) -> Result<DateTime<Utc>, CoreError> {
    NaiveDateTime::parse_from_str(text, TIME_LAYOUT)
        .map(|naive| naive.and_utc())
        .map_err(|e| CoreError::Parse(format!("malformed time '{text}': {e}")))
}

fn format_time(t: &DateTime<Utc>) -> String {
    t.format(TIME_LAYOUT).to_string()
}

#[allow(clippy::cast_possible_truncation)]
fn epoch_to_time(n: &Number) -> Result<DateTime<Utc>, CoreError> {
    let secs = n
        .as_i64()
        .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
        .ok_or_else(|| CoreError::Value(format!("epoch seconds out of range: {n}")))?;
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| CoreError::Value(format!("epoch seconds out of range: {n}")))
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Time(t) => f.write_str(&format_time(t)),
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.encode().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = Value::deserialize(deserializer)?;
        Self::decode(&wire).map_err(serde::de::Error::custom)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i32> for AttributeValue {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for AttributeValue {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u32> for AttributeValue {
    fn from(n: u32) -> Self {
        Self::Number(n.into())
    }
}

/// Sub-second precision is dropped; `Time` values carry whole seconds.
impl From<DateTime<Utc>> for AttributeValue {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Time(t.trunc_subsecs(0))
    }
}

impl TryFrom<f64> for AttributeValue {
    type Error = CoreError;

    fn try_from(f: f64) -> Result<Self, Self::Error> {
        Number::from_f64(f)
            .map(Self::Number)
            .ok_or_else(|| CoreError::Value(format!("non-finite number: {f}")))
    }
}
