//! Data addresses describe where a transfer reads from or writes to

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::{Result, SpiError};

/// A typed bag of properties locating data at a source or destination.
///
/// The `type` selects which source or sink factory handles the address; all
/// other keys are free-form properties interpreted by that factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataAddress {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(flatten)]
    pub properties: HashMap<String, Value>,
}

impl DataAddress {
    /// Create an address of the given type with no properties
    pub fn new(type_: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            properties: HashMap::new(),
        }
    }

    pub fn builder() -> DataAddressBuilder {
        DataAddressBuilder::default()
    }

    pub fn get_type(&self) -> &str {
        &self.type_
    }

    /// Read a property as a string. Scalars are rendered, null and missing
    /// properties yield `None`.
    pub fn get_string_property(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn get_string_property_or(&self, key: &str, default: &str) -> String {
        self.get_string_property(key)
            .unwrap_or_else(|| default.to_string())
    }
}

/// Builder for [`DataAddress`]
#[derive(Debug, Default)]
pub struct DataAddressBuilder {
    type_: Option<String>,
    properties: HashMap<String, Value>,
}

impl DataAddressBuilder {
    pub fn type_(mut self, type_: impl Into<String>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<DataAddress> {
        let type_ = self
            .type_
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SpiError::build("DataAddress type is required"))?;
        Ok(DataAddress {
            type_,
            properties: self.properties,
        })
    }
}
