//! Borrowed view over a decoded JSON tree.
//!
//! Asset parsers navigate `serde_json::Value` trees through [`JsonView`], whose
//! lookups never panic: a missing map key produces a *null* view and an
//! out-of-range array index (or indexing into a non-array) produces an *error*
//! view. Both sentinels answer every further lookup with themselves, so a long
//! access chain only has to be checked once at the end.

use serde_json::Value;

use crate::errors::{CubismError, Result};

/// Decodes raw asset bytes into a JSON value tree.
pub fn parse(bytes: &[u8]) -> Result<Value> {
    Ok(serde_json::from_slice(bytes)?)
}

#[derive(Debug, Clone, Copy)]
pub enum JsonView<'a> {
    Value(&'a Value),
    Null,
    Error,
}

impl<'a> From<&'a Value> for JsonView<'a> {
    fn from(value: &'a Value) -> Self {
        JsonView::Value(value)
    }
}

impl<'a> JsonView<'a> {
    #[inline]
    #[must_use]
    pub fn new(value: &'a Value) -> Self {
        JsonView::Value(value)
    }

    /// Member lookup; missing keys yield [`JsonView::Null`].
    #[must_use]
    pub fn get(self, key: &str) -> JsonView<'a> {
        match self {
            JsonView::Value(Value::Object(map)) => map.get(key).map_or(JsonView::Null, JsonView::Value),
            JsonView::Error => JsonView::Error,
            _ => JsonView::Null,
        }
    }

    /// Array element lookup; out-of-range yields [`JsonView::Error`].
    #[must_use]
    pub fn at(self, index: usize) -> JsonView<'a> {
        match self {
            JsonView::Value(Value::Array(items)) => items.get(index).map_or(JsonView::Error, JsonView::Value),
            _ => JsonView::Error,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_null(self) -> bool {
        matches!(self, JsonView::Null | JsonView::Value(Value::Null))
    }

    #[inline]
    #[must_use]
    pub fn is_error(self) -> bool {
        matches!(self, JsonView::Error)
    }

    /// True when the view points at a real, non-null value.
    #[inline]
    #[must_use]
    pub fn exists(self) -> bool {
        !self.is_null() && !self.is_error()
    }

    #[must_use]
    pub fn as_f32(self) -> Option<f32> {
        match self {
            JsonView::Value(v) => v.as_f64().map(|f| f as f32),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f32_or(self, default: f32) -> f32 {
        self.as_f32().unwrap_or(default)
    }

    #[must_use]
    pub fn as_i64(self) -> Option<i64> {
        match self {
            JsonView::Value(v) => v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool_or(self, default: bool) -> bool {
        match self {
            JsonView::Value(v) => v.as_bool().unwrap_or(default),
            _ => default,
        }
    }

    #[must_use]
    pub fn as_str(self) -> Option<&'a str> {
        match self {
            JsonView::Value(v) => v.as_str(),
            _ => None,
        }
    }

    /// Number of elements (array) or members (map); zero for anything else.
    #[must_use]
    pub fn len(self) -> usize {
        match self {
            JsonView::Value(Value::Array(items)) => items.len(),
            JsonView::Value(Value::Object(map)) => map.len(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Iterates array elements; empty for non-arrays.
    pub fn items(self) -> impl Iterator<Item = JsonView<'a>> {
        let slice: &'a [Value] = match self {
            JsonView::Value(Value::Array(items)) => items.as_slice(),
            _ => &[],
        };
        slice.iter().map(JsonView::Value)
    }

    /// Iterates map members in document order; empty for non-maps.
    pub fn members(self) -> impl Iterator<Item = (&'a str, JsonView<'a>)> {
        let map = match self {
            JsonView::Value(Value::Object(map)) => Some(map),
            _ => None,
        };
        map.into_iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k.as_str(), JsonView::Value(v))))
    }

    /// Required string member.
    pub fn require_str(self, key: &str, asset: &'static str) -> Result<&'a str> {
        self.get(key)
            .as_str()
            .ok_or_else(|| CubismError::malformed(asset, format!("missing string '{key}'")))
    }

    /// Required array member.
    pub fn require_array(self, key: &str, asset: &'static str) -> Result<JsonView<'a>> {
        match self.get(key) {
            view @ JsonView::Value(Value::Array(_)) => Ok(view),
            _ => Err(CubismError::malformed(asset, format!("missing array '{key}'"))),
        }
    }

    /// Required numeric member.
    pub fn require_f32(self, key: &str, asset: &'static str) -> Result<f32> {
        self.get(key)
            .as_f32()
            .ok_or_else(|| CubismError::malformed(asset, format!("missing number '{key}'")))
    }
}
