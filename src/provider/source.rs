use std::str::FromStr;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::Error, helpers::normalize_address};

/// Untyped value returned by a contract read.
///
/// Integers arrive as decimal strings (or JSON numbers), addresses as hex
/// strings, structs as objects keyed by field name and tuples as arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawValue(pub Value);

impl RawValue {
    pub fn decimal(&self, field: &str) -> Result<BigDecimal, Error> {
        let parsed = match &self.0 {
            Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
            Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
            _ => None,
        };
        parsed.ok_or_else(|| self.unexpected(field))
    }

    pub fn integer(&self, field: &str) -> Result<i64, Error> {
        match &self.0 {
            Value::String(s) => {
                s.trim().parse().map_err(|_| self.unexpected(field))
            },
            Value::Number(n) => n.as_i64().ok_or_else(|| self.unexpected(field)),
            _ => Err(self.unexpected(field)),
        }
    }

    pub fn address(&self, field: &str) -> Result<String, Error> {
        match &self.0 {
            Value::String(s) => {
                normalize_address(s).map_err(|_| self.unexpected(field))
            },
            _ => Err(self.unexpected(field)),
        }
    }

    pub fn list(&self, field: &str) -> Result<Vec<RawValue>, Error> {
        match &self.0 {
            Value::Array(items) => {
                Ok(items.iter().cloned().map(RawValue).collect())
            },
            _ => Err(self.unexpected(field)),
        }
    }

    /// Struct member by name, falling back to its position for tuple-shaped
    /// results.
    pub fn member(&self, name: &str, index: usize) -> Result<RawValue, Error> {
        let value = match &self.0 {
            Value::Object(map) => map
                .get(name)
                .or_else(|| map.get(&index.to_string())),
            Value::Array(items) => items.get(index),
            _ => None,
        };
        value
            .cloned()
            .map(RawValue)
            .ok_or_else(|| Error::FieldNotExist(name.to_owned()))
    }

    fn unexpected(&self, field: &str) -> Error {
        Error::UnexpectedValue {
            field: field.to_owned(),
            value: self.0.to_string(),
        }
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        RawValue(value)
    }
}

/// Chain-facing collaborator. Every call may fail or time out; callers never
/// substitute a default for a failed read.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn call_contract(
        &self,
        address: &str,
        method: &str,
        args: &[Value],
    ) -> Result<RawValue, Error>;

    /// USD price of `token` as an 18-decimal scaled integer.
    async fn get_price(
        &self,
        token: &str,
        inverse: bool,
    ) -> Result<RawValue, Error>;

    /// USD swap volume of `pair` in `[from_ms, to_ms)`, 18-decimal scaled.
    async fn get_swap_volume(
        &self,
        pair: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<RawValue, Error>;

    /// Sum of `field` over the `topic` events emitted by `address` in
    /// `[from_ms, to_ms)`.
    async fn get_event_total(
        &self,
        address: &str,
        topic: &str,
        field: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<RawValue, Error>;
}
