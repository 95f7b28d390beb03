use crate::{Error, Result};
use indexmap::IndexMap;
use std::fmt::Write;

/// A value bound to an ECSQL statement or read from the engine.
///
/// The engine only stores the scalar variants. The others are decomposed
/// into scalars when they are bound: points into one value per coordinate,
/// navigation values into an id and a relationship class id, structs into
/// their members. Arrays are encoded as JSON text.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,

    Bool(bool),

    I64(i64),

    F64(f64),

    String(String),

    Bytes(Vec<u8>),

    /// A julian day number
    DateTime(f64),

    Point2d { x: f64, y: f64 },

    Point3d { x: f64, y: f64, z: f64 },

    /// The instance a navigation property points at, and optionally the
    /// class of the relationship used
    Navigation { id: i64, rel_class_id: Option<i64> },

    /// Struct members keyed by member name
    Struct(IndexMap<String, Value>),

    Array(Vec<Value>),
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for the variants the engine stores as-is
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool(_) | Self::I64(_) | Self::F64(_) | Self::String(_) | Self::Bytes(_)
        )
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            Self::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(v) | Self::DateTime(v) => Some(*v),
            Self::I64(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Navigation values with an unknown relationship class
    pub fn navigation(id: i64) -> Value {
        Value::Navigation {
            id,
            rel_class_id: None,
        }
    }

    pub fn structure<K: Into<String>>(members: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Struct(
            members
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// Encodes the value the way it is stored in an array column.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        use serde_json::Value as Json;

        Ok(match self {
            Value::Null => Json::Null,
            Value::Bool(v) => Json::Bool(*v),
            Value::I64(v) => Json::from(*v),
            Value::F64(v) | Value::DateTime(v) => json_number(*v)?,
            Value::String(v) => Json::String(v.clone()),
            Value::Bytes(v) => Json::String(hex(v)),
            Value::Point2d { x, y } => serde_json::json!({ "X": json_number(*x)?, "Y": json_number(*y)? }),
            Value::Point3d { x, y, z } => serde_json::json!({
                "X": json_number(*x)?,
                "Y": json_number(*y)?,
                "Z": json_number(*z)?,
            }),
            Value::Navigation { id, rel_class_id } => {
                serde_json::json!({ "Id": id, "RelECClassId": rel_class_id })
            }
            Value::Struct(members) => Json::Object(
                members
                    .iter()
                    .map(|(name, value)| Ok((name.clone(), value.to_json()?)))
                    .collect::<Result<_>>()?,
            ),
            Value::Array(items) => {
                Json::Array(items.iter().map(Value::to_json).collect::<Result<_>>()?)
            }
        })
    }

    /// Decodes JSON read from an array column. Numbers become `I64` when they
    /// are integral and `F64` otherwise; objects become structs.
    pub fn from_json(json: &serde_json::Value) -> Value {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(v) => Value::Bool(*v),
            Json::Number(n) => match n.as_i64() {
                Some(v) => Value::I64(v),
                None => Value::F64(n.as_f64().unwrap_or_default()),
            },
            Json::String(v) => Value::String(v.clone()),
            Json::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            Json::Object(members) => Value::Struct(
                members
                    .iter()
                    .map(|(name, value)| (name.clone(), Value::from_json(value)))
                    .collect(),
            ),
        }
    }
}

fn json_number(v: f64) -> Result<serde_json::Value> {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .ok_or_else(|| Error::invalid_binding(format!("{v} cannot be stored in an array")))
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02X}");
    }
    out
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I64(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
