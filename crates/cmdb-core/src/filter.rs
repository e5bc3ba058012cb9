//! Equality filters for `MetaStore::query`.

use crate::record::Record;
use crate::value::AttributeValue;

/// Conjunction of `key == value` conditions with an optional result limit.
///
/// An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, AttributeValue)>,
    limit: Option<usize>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn eq(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.conditions.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn max_results(&self) -> Option<usize> {
        self.limit
    }

    #[must_use]
    pub fn conditions(&self) -> &[(String, AttributeValue)] {
        &self.conditions
    }

    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(key, expected)| record.value(key).is_some_and(|v| same_value(v, expected)))
    }
}

/// Numbers compare by value, so `10` matches `10.0`.
fn same_value(actual: &AttributeValue, expected: &AttributeValue) -> bool {
    match (actual, expected) {
        (AttributeValue::Number(a), AttributeValue::Number(b)) => {
            match (a.as_i64(), b.as_i64(), a.as_u64(), b.as_u64()) {
                (Some(x), Some(y), _, _) => x == y,
                (_, _, Some(x), Some(y)) => x == y,
                _ => a.as_f64() == b.as_f64(),
            }
        }
        _ => actual == expected,
    }
}
