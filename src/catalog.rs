// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Capability descriptor table.
//!
//! Static mapping from a device type and a named capability to the descriptor
//! driving entity creation and state projection. The tables are pure data,
//! resolved once at load time; an unmapped device type yields an empty
//! capability set and must not be treated as an error.

use crate::entity::EntityType;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};

/// Vendor device types with a capability mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Cooktop,
    DishWasher,
    Dryer,
    Hood,
    Oven,
    Refrigerator,
    Styler,
    Washer,
    WineCellar,
    SwitchPlug,
    Shutter,
    WaterHeater,
    VideoManager,
}

/// Named device capabilities. The string token doubles as the entity unique
/// id suffix and, with few exceptions, as the raw payload field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKey {
    RinseRefill,
    EcoFriendlyMode,
    PowerSaveEnabled,
    RemoteControlEnabled,
    SabbathMode,
    HoodOperationMode,
    Consumption,
    Temperature,
    Connectivity,
    CoverPosition,
    SoftwareUpdate,
}

impl CapabilityKey {
    /// Raw payload field holding the capability value.
    pub fn payload_field(&self) -> &'static str {
        match self {
            CapabilityKey::Connectivity => "connected",
            CapabilityKey::CoverPosition => "openlevel",
            CapabilityKey::SoftwareUpdate => "latest_version",
            CapabilityKey::RinseRefill => "rinse_refill",
            CapabilityKey::EcoFriendlyMode => "eco_friendly_mode",
            CapabilityKey::PowerSaveEnabled => "power_save_enabled",
            CapabilityKey::RemoteControlEnabled => "remote_control_enabled",
            CapabilityKey::SabbathMode => "sabbath_mode",
            CapabilityKey::HoodOperationMode => "hood_operation_mode",
            CapabilityKey::Consumption => "consumption",
            CapabilityKey::Temperature => "temperature",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Boolean,
    Numeric,
    Enumerated,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum UnitOfMeasurement {
    #[strum(to_string = "W")]
    #[serde(rename = "W")]
    Watt,
    #[strum(to_string = "°C")]
    #[serde(rename = "°C")]
    Celsius,
    #[strum(to_string = "%")]
    #[serde(rename = "%")]
    Percent,
}

/// Descriptor of one capability of a device type.
///
/// One instance is shared across all device instances of a given type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapabilityDescriptor {
    pub key: CapabilityKey,
    pub entity_type: EntityType,
    pub value_kind: ValueKind,
    pub unit: Option<UnitOfMeasurement>,
    /// Boolean-from-string derivation: entity is on iff the raw value equals
    /// this token exactly (case-sensitive).
    pub on_key: Option<&'static str>,
    pub default_enabled: bool,
}

impl CapabilityDescriptor {
    const fn binary_sensor(key: CapabilityKey) -> Self {
        Self {
            key,
            entity_type: EntityType::BinarySensor,
            value_kind: ValueKind::Boolean,
            unit: None,
            on_key: None,
            default_enabled: true,
        }
    }

    const fn measurement(key: CapabilityKey, unit: UnitOfMeasurement) -> Self {
        Self {
            key,
            entity_type: EntityType::Sensor,
            value_kind: ValueKind::Numeric,
            unit: Some(unit),
            on_key: None,
            default_enabled: true,
        }
    }
}

lazy_static! {
    static ref CAPABILITY_DESC: HashMap<CapabilityKey, CapabilityDescriptor> = HashMap::from([
        (
            CapabilityKey::RinseRefill,
            CapabilityDescriptor::binary_sensor(CapabilityKey::RinseRefill),
        ),
        (
            CapabilityKey::EcoFriendlyMode,
            CapabilityDescriptor::binary_sensor(CapabilityKey::EcoFriendlyMode),
        ),
        (
            CapabilityKey::PowerSaveEnabled,
            CapabilityDescriptor::binary_sensor(CapabilityKey::PowerSaveEnabled),
        ),
        (
            CapabilityKey::RemoteControlEnabled,
            CapabilityDescriptor::binary_sensor(CapabilityKey::RemoteControlEnabled),
        ),
        (
            CapabilityKey::SabbathMode,
            CapabilityDescriptor::binary_sensor(CapabilityKey::SabbathMode),
        ),
        (
            CapabilityKey::HoodOperationMode,
            CapabilityDescriptor {
                on_key: Some("ON"),
                ..CapabilityDescriptor::binary_sensor(CapabilityKey::HoodOperationMode)
            },
        ),
        (
            CapabilityKey::Connectivity,
            CapabilityDescriptor {
                default_enabled: false,
                ..CapabilityDescriptor::binary_sensor(CapabilityKey::Connectivity)
            },
        ),
        (
            CapabilityKey::Consumption,
            CapabilityDescriptor::measurement(CapabilityKey::Consumption, UnitOfMeasurement::Watt),
        ),
        (
            CapabilityKey::Temperature,
            CapabilityDescriptor::measurement(
                CapabilityKey::Temperature,
                UnitOfMeasurement::Celsius
            ),
        ),
        (
            CapabilityKey::CoverPosition,
            CapabilityDescriptor {
                key: CapabilityKey::CoverPosition,
                entity_type: EntityType::Cover,
                value_kind: ValueKind::Enumerated,
                unit: Some(UnitOfMeasurement::Percent),
                on_key: None,
                default_enabled: true,
            },
        ),
        (
            CapabilityKey::SoftwareUpdate,
            CapabilityDescriptor {
                key: CapabilityKey::SoftwareUpdate,
                entity_type: EntityType::Update,
                value_kind: ValueKind::Text,
                unit: None,
                on_key: None,
                default_enabled: true,
            },
        ),
    ]);

    /// Ordered capability sets per device type. Pure function of the device
    /// type, no runtime mutation.
    static ref DEVICE_TYPE_CAPABILITIES: HashMap<DeviceType, Vec<CapabilityKey>> = HashMap::from([
        (DeviceType::Cooktop, vec![CapabilityKey::RemoteControlEnabled]),
        (
            DeviceType::DishWasher,
            vec![CapabilityKey::RinseRefill, CapabilityKey::RemoteControlEnabled],
        ),
        (DeviceType::Dryer, vec![CapabilityKey::RemoteControlEnabled]),
        (DeviceType::Hood, vec![CapabilityKey::HoodOperationMode]),
        (DeviceType::Oven, vec![CapabilityKey::RemoteControlEnabled]),
        (
            DeviceType::Refrigerator,
            vec![
                CapabilityKey::EcoFriendlyMode,
                CapabilityKey::PowerSaveEnabled,
                CapabilityKey::SabbathMode,
            ],
        ),
        (DeviceType::Styler, vec![CapabilityKey::RemoteControlEnabled]),
        (DeviceType::Washer, vec![CapabilityKey::RemoteControlEnabled]),
        (DeviceType::WineCellar, vec![CapabilityKey::SabbathMode]),
        (
            DeviceType::SwitchPlug,
            vec![CapabilityKey::Consumption, CapabilityKey::Temperature],
        ),
        (
            DeviceType::Shutter,
            vec![CapabilityKey::CoverPosition, CapabilityKey::Connectivity],
        ),
        (
            DeviceType::WaterHeater,
            vec![CapabilityKey::Temperature, CapabilityKey::PowerSaveEnabled],
        ),
        (DeviceType::VideoManager, vec![CapabilityKey::SoftwareUpdate]),
    ]);
}

/// Capability keys applying to a device type, in entity creation order.
pub fn capabilities_of(device_type: DeviceType) -> &'static [CapabilityKey] {
    DEVICE_TYPE_CAPABILITIES
        .get(&device_type)
        .map(|keys| keys.as_slice())
        .unwrap_or_default()
}

/// Pure descriptor lookup. `None` means the capability is not modeled for
/// this device type: don't create an entity, it's not an error.
pub fn describe(device_type: DeviceType, key: CapabilityKey) -> Option<&'static CapabilityDescriptor> {
    if !capabilities_of(device_type).contains(&key) {
        return None;
    }
    CAPABILITY_DESC.get(&key)
}
