//! Pluggable JSON engine.
//!
//! # Design
//! The client holds one `Arc<dyn Serializer>` injected at construction. To
//! keep the trait object-safe, implementations only convert between text
//! and a `serde_json::Value` tree; typed conversion on either side goes
//! through serde. A host that prefers another JSON engine implements the
//! two text methods and keeps every typed request/response unchanged.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SerializerError(pub String);

impl From<serde_json::Error> for SerializerError {
    fn from(err: serde_json::Error) -> Self {
        SerializerError(err.to_string())
    }
}

pub trait Serializer: Send + Sync {
    fn to_text(&self, value: &Value) -> Result<String, SerializerError>;

    fn from_text(&self, text: &str) -> Result<Value, SerializerError>;
}

impl dyn Serializer {
    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, SerializerError> {
        let tree = serde_json::to_value(value)?;
        self.to_text(&tree)
    }

    pub fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T, SerializerError> {
        let tree = self.from_text(text)?;
        Ok(serde_json::from_value(tree)?)
    }
}

/// Default engine backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn to_text(&self, value: &Value) -> Result<String, SerializerError> {
        Ok(serde_json::to_string(value)?)
    }

    fn from_text(&self, text: &str) -> Result<Value, SerializerError> {
        Ok(serde_json::from_str(text)?)
    }
}
