// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Device identity handling.

use crate::client::model::DeviceRecord;
use serde::Serialize;

/// Raw key/value state of a single device as delivered by the vendor API.
///
/// The schema is owned by the vendor; fields are only checked for presence
/// when a capability projection requires them.
pub type RawStatePayload = serde_json::Map<String, serde_json::Value>;

/// Stable identity of one vendor device.
///
/// Created once from the discovery result and never recomputed. Entity
/// unique ids are derived from [`DeviceIdentity::id`].
#[derive(Debug, Clone, Serialize)]
pub struct DeviceIdentity {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
    /// Network address, MAC or host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl From<&DeviceRecord> for DeviceIdentity {
    fn from(record: &DeviceRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            manufacturer: record.manufacturer.clone(),
            model: record.model.clone(),
            sw_version: record.firmware.clone(),
            address: record.mac.clone(),
        }
    }
}
