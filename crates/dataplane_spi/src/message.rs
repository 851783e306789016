//! Flow start messages sent by the control plane

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::DataAddress;

/// Instructs the data plane to move data from a source address to a
/// destination address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlowStartMessage {
    /// Unique request ID, used for correlation in logs
    #[serde(default = "new_request_id")]
    pub id: String,

    /// ID of the transfer process on the control plane
    #[serde(default)]
    pub process_id: String,

    #[serde(default)]
    pub source_data_address: Option<DataAddress>,

    #[serde(default)]
    pub destination_data_address: Option<DataAddress>,

    /// Transfer type, e.g. `DicomWebData-PUSH`
    #[serde(default)]
    pub transfer_type: Option<String>,

    #[serde(default)]
    pub properties: HashMap<String, String>,
}

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

impl DataFlowStartMessage {
    pub fn builder() -> DataFlowStartMessageBuilder {
        DataFlowStartMessageBuilder::default()
    }

    pub fn source_type(&self) -> Option<&str> {
        self.source_data_address.as_ref().map(DataAddress::get_type)
    }

    pub fn destination_type(&self) -> Option<&str> {
        self.destination_data_address
            .as_ref()
            .map(DataAddress::get_type)
    }
}

#[derive(Debug, Default)]
pub struct DataFlowStartMessageBuilder {
    id: Option<String>,
    process_id: Option<String>,
    source_data_address: Option<DataAddress>,
    destination_data_address: Option<DataAddress>,
    transfer_type: Option<String>,
    properties: HashMap<String, String>,
}

impl DataFlowStartMessageBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn process_id(mut self, process_id: impl Into<String>) -> Self {
        self.process_id = Some(process_id.into());
        self
    }

    pub fn source_data_address(mut self, address: DataAddress) -> Self {
        self.source_data_address = Some(address);
        self
    }

    pub fn destination_data_address(mut self, address: DataAddress) -> Self {
        self.destination_data_address = Some(address);
        self
    }

    pub fn transfer_type(mut self, transfer_type: impl Into<String>) -> Self {
        self.transfer_type = Some(transfer_type.into());
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> DataFlowStartMessage {
        DataFlowStartMessage {
            id: self.id.unwrap_or_else(new_request_id),
            process_id: self.process_id.unwrap_or_default(),
            source_data_address: self.source_data_address,
            destination_data_address: self.destination_data_address,
            transfer_type: self.transfer_type,
            properties: self.properties,
        }
    }
}
