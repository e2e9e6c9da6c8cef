// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Generic entity adapter binding a capability descriptor to the host entity model.

mod binary_sensor;
mod cover;
mod sensor;
mod update;

pub use cover::{CoverCall, CoverCommand, handle_cover};

use crate::catalog::CapabilityDescriptor;
use crate::device::{DeviceIdentity, RawStatePayload};
use crate::errors::ServiceError;
use crate::projector::project;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Sensor,
    BinarySensor,
    Cover,
    Update,
}

/// Visible state change of one entity, ready for host platform rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityChange {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub attributes: Map<String, Value>,
}

/// Entity description exposed to the host platform at discovery time.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableEntity {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub name: String,
    pub device: DeviceIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    pub enabled_by_default: bool,
}

/// Host platform service call targeting one entity.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityCommand {
    pub entity_id: String,
    pub cmd_id: String,
    pub params: Option<Map<String, Value>>,
}

/// Binds one capability of one device to the host entity model.
///
/// Bound once at creation to the device identity and descriptor; device
/// metadata is never recomputed. The adapter re-renders on every projected
/// payload and keeps the last-known state when a projection fails.
pub struct EntityAdapter {
    identity: DeviceIdentity,
    descriptor: &'static CapabilityDescriptor,
    entity_id: String,
    attributes: Option<Map<String, Value>>,
}

impl EntityAdapter {
    pub fn new(identity: &DeviceIdentity, descriptor: &'static CapabilityDescriptor) -> Self {
        Self {
            identity: identity.clone(),
            descriptor,
            // deterministic unique id
            entity_id: format!("{}_{}", identity.id, descriptor.key),
            attributes: None,
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn entity_type(&self) -> EntityType {
        self.descriptor.entity_type
    }

    /// Re-run the state projection against a fresh payload.
    ///
    /// Returns the new visible state if it differs from the previous one.
    /// Repeated delivery of an identical payload yields no duplicate
    /// transition. A failed projection retains the prior visible state.
    pub fn apply(&mut self, payload: &RawStatePayload) -> Option<EntityChange> {
        let projected = match project(self.descriptor, payload) {
            Ok(projected) => projected,
            Err(ServiceError::MissingField(field)) => {
                warn!(
                    "[{}] missing field '{field}' in payload, keeping last known state",
                    self.entity_id
                );
                return None;
            }
            Err(e) => {
                warn!("[{}] projection failed, keeping last known state: {e}", self.entity_id);
                return None;
            }
        };

        let attributes = match self.descriptor.entity_type {
            EntityType::Sensor => sensor::map_sensor_attributes(&projected),
            EntityType::BinarySensor => binary_sensor::map_binary_sensor_attributes(&projected),
            EntityType::Cover => cover::map_cover_attributes(&projected),
            EntityType::Update => update::map_update_attributes(&projected),
        };

        if self.attributes.as_ref() == Some(&attributes) {
            return None;
        }
        self.attributes = Some(attributes);
        self.state()
    }

    /// Current visible state, `None` until the first successful projection.
    pub fn state(&self) -> Option<EntityChange> {
        self.attributes.as_ref().map(|attributes| EntityChange {
            entity_id: self.entity_id.clone(),
            entity_type: self.descriptor.entity_type,
            attributes: attributes.clone(),
        })
    }

    pub fn available_entity(&self) -> AvailableEntity {
        let features = match self.descriptor.entity_type {
            EntityType::Cover => Some(
                ["open", "close", "stop", "position"]
                    .iter()
                    .map(|f| f.to_string())
                    .collect(),
            ),
            _ => None,
        };
        AvailableEntity {
            entity_id: self.entity_id.clone(),
            entity_type: self.descriptor.entity_type,
            name: self.identity.name.clone(),
            device: self.identity.clone(),
            features,
            enabled_by_default: self.descriptor.default_enabled,
        }
    }
}

pub(crate) fn cmd_from_str<T: std::str::FromStr + strum::VariantNames>(
    cmd: &str,
) -> Result<T, ServiceError> {
    T::from_str(cmd).map_err(|_| {
        ServiceError::BadRequest(format!(
            "Invalid cmd_id: {cmd}. Valid commands: {}",
            T::VARIANTS.to_vec().join(",")
        ))
    })
}
