// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Vendor API data model.

use crate::catalog::DeviceType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use strum::Display;

/// One device as returned by the vendor discovery call.
///
/// Identity fields are typed; everything else is kept as the raw state
/// payload the projections run against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub firmware: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(flatten)]
    pub state: Map<String, Value>,
}

impl DeviceRecord {
    /// Device type if it is one we model capabilities for.
    ///
    /// Unknown vendor types simply yield no entities.
    pub fn known_type(&self) -> Option<DeviceType> {
        DeviceType::from_str(&self.device_type).ok()
    }
}

/// Vendor account information, used for setup validation and the resolved
/// config entry title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Shutter movement direction of the vendor API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
    Stop,
}
