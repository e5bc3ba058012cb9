//! Entity kinds and attribute property types for the CMDB metamodel.
//!
//! `EntityKind` uses `snake_case` serialization. `PropertyType` keeps the
//! wire names stored in attribute documents (`singlechar`, `int`, ...) and
//! passes unknown names through as `Other` so new property types can be
//! introduced without a schema migration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// The kinds of entity a `MetaStore` persists.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Classification,
    Model,
    Group,
    Attribute,
    Instance,
}

impl EntityKind {
    pub const ALL: [Self; 5] = [
        Self::Classification,
        Self::Model,
        Self::Group,
        Self::Attribute,
        Self::Instance,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classification => "classification",
            Self::Model => "model",
            Self::Group => "group",
            Self::Attribute => "attribute",
            Self::Instance => "instance",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PropertyType
// ---------------------------------------------------------------------------

/// Maximum length of a `singlechar` attribute value.
pub const SINGLE_CHAR_MAX_LEN: usize = 256;

/// Maximum length of a `longchar` attribute value.
pub const LONG_CHAR_MAX_LEN: usize = 2000;

/// Type of a model attribute.
///
/// ```text
/// singlechar, longchar → text field (length cap + optional regex option)
/// int, float           → numeric field ({"min", "max"} option)
/// bool                 → bool field
/// time                 → time field
/// anything else        → Other(name), no built-in field mapping
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyType {
    #[default]
    SingleChar,
    LongChar,
    Int,
    Float,
    Bool,
    Time,
    Other(String),
}

impl PropertyType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::SingleChar => "singlechar",
            Self::LongChar => "longchar",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Time => "time",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for PropertyType {
    fn from(name: &str) -> Self {
        match name {
            "singlechar" => Self::SingleChar,
            "longchar" => Self::LongChar,
            "int" => Self::Int,
            "float" => Self::Float,
            "bool" => Self::Bool,
            "time" => Self::Time,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for PropertyType {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<PropertyType> for String {
    fn from(ty: PropertyType) -> Self {
        ty.as_str().to_string()
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
