use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, Result};

/// A collection response from `GET /api/<collection>`
///
/// The backend answers either `{ "total": n, "<collection>": [...] }` or a
/// bare array. `total` is optional and we fall back to the array length.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub reported_total: Option<u64>,
}

impl<T: DeserializeOwned> Listing<T> {
    pub fn from_value(value: Value, collection: &str) -> Result<Self> {
        match value {
            Value::Array(_) => Ok(Self {
                items: serde_json::from_value(value)?,
                reported_total: None,
            }),
            Value::Object(mut map) => {
                let reported_total = map.get("total").and_then(Value::as_u64);
                let items = map.remove(collection).ok_or_else(|| {
                    ApiError::Shape(format!("missing `{}` array in response", collection))
                })?;
                Ok(Self {
                    items: serde_json::from_value(items)?,
                    reported_total,
                })
            }
            other => Err(ApiError::Shape(format!(
                "expected an object or array for `{}`, got {}",
                collection,
                kind_of(&other)
            ))),
        }
    }
}

impl<T> Listing<T> {
    /// Server-provided total, or the number of items actually received
    pub fn total(&self) -> u64 {
        self.reported_total.unwrap_or(self.items.len() as u64)
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
