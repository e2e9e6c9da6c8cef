// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! State projection from raw vendor payloads to displayable entity state.

use crate::catalog::{CapabilityDescriptor, ValueKind};
use crate::device::RawStatePayload;
use crate::entity::EntityType;
use crate::errors::ServiceError;
use serde_json::{Map, Value};
use strum::Display;

/// Derived entity value plus optional attributes, computed fresh on every
/// payload arrival and never cached beyond the current display cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedState {
    pub value: Value,
    pub attributes: Map<String, Value>,
}

/// Cover state derived from the `movement` and `openlevel` payload fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CoverState {
    Open,
    Closed,
    Opening,
    Closing,
}

/// Project a raw device payload through a capability descriptor.
///
/// Fails with [`ServiceError::MissingField`] if a required field is absent;
/// the caller must keep the entity's last-known state in that case.
pub fn project(
    descriptor: &CapabilityDescriptor,
    payload: &RawStatePayload,
) -> Result<ProjectedState, ServiceError> {
    match descriptor.entity_type {
        EntityType::Cover => project_cover(payload),
        EntityType::Update => project_update(payload),
        _ => match descriptor.value_kind {
            ValueKind::Boolean => project_boolean(descriptor, payload),
            ValueKind::Numeric => project_numeric(descriptor, payload),
            ValueKind::Enumerated | ValueKind::Text => project_text(descriptor, payload),
        },
    }
}

fn required<'a>(payload: &'a RawStatePayload, field: &str) -> Result<&'a Value, ServiceError> {
    payload
        .get(field)
        .ok_or_else(|| ServiceError::MissingField(field.into()))
}

fn project_boolean(
    descriptor: &CapabilityDescriptor,
    payload: &RawStatePayload,
) -> Result<ProjectedState, ServiceError> {
    let field = descriptor.key.payload_field();
    let raw = required(payload, field)?;

    let is_on = match descriptor.on_key {
        // exact string match, case-sensitive
        Some(on_key) => raw.as_str() == Some(on_key),
        // pass the vendor-supplied boolean flag through unchanged
        None => raw.as_bool().ok_or_else(|| {
            ServiceError::BadRequest(format!("Expected boolean value in field '{field}': {raw}"))
        })?,
    };

    Ok(ProjectedState {
        value: is_on.into(),
        attributes: Map::new(),
    })
}

fn project_numeric(
    descriptor: &CapabilityDescriptor,
    payload: &RawStatePayload,
) -> Result<ProjectedState, ServiceError> {
    let field = descriptor.key.payload_field();
    let raw = required(payload, field)?;
    if !raw.is_number() {
        return Err(ServiceError::BadRequest(format!(
            "Expected numeric value in field '{field}': {raw}"
        )));
    }

    // no unit conversion, the value is passed through unit-tagged
    let mut attributes = Map::with_capacity(1);
    if let Some(unit) = descriptor.unit {
        attributes.insert("unit".into(), unit.to_string().into());
    }

    Ok(ProjectedState {
        value: raw.clone(),
        attributes,
    })
}

fn project_text(
    descriptor: &CapabilityDescriptor,
    payload: &RawStatePayload,
) -> Result<ProjectedState, ServiceError> {
    let field = descriptor.key.payload_field();
    let raw = required(payload, field)?;
    let value = raw
        .as_str()
        .ok_or_else(|| {
            ServiceError::BadRequest(format!("Expected string value in field '{field}': {raw}"))
        })?
        .into();

    Ok(ProjectedState {
        value,
        attributes: Map::new(),
    })
}

/// Derive the cover state from `movement` and `openlevel`.
///
/// `movement` wins while the cover is driving; `openlevel` only decides
/// between open and closed once movement stopped. The position attribute is
/// always the verbatim `openlevel`, independent of movement.
fn project_cover(payload: &RawStatePayload) -> Result<ProjectedState, ServiceError> {
    let movement = required(payload, "movement")?;
    let openlevel = required(payload, "openlevel")?
        .as_u64()
        .ok_or_else(|| ServiceError::BadRequest("Invalid openlevel value".into()))?;

    let state = match movement.as_str() {
        Some("up") => CoverState::Opening,
        Some("down") => CoverState::Closing,
        Some("stop") => {
            if openlevel > 0 {
                CoverState::Open
            } else {
                CoverState::Closed
            }
        }
        _ => {
            return Err(ServiceError::BadRequest(format!(
                "Unknown movement: {movement}"
            )));
        }
    };

    let mut attributes = Map::with_capacity(1);
    attributes.insert("position".into(), openlevel.into());

    Ok(ProjectedState {
        value: state.to_string().into(),
        attributes,
    })
}

fn project_update(payload: &RawStatePayload) -> Result<ProjectedState, ServiceError> {
    let latest = required(payload, "latest_version")?
        .as_str()
        .ok_or_else(|| ServiceError::BadRequest("Invalid latest_version value".into()))?;
    let installed = payload.get("installed_version").and_then(|v| v.as_str());

    let mut attributes = Map::with_capacity(3);
    if let Some(installed) = installed {
        attributes.insert("installed_version".into(), installed.into());
    }
    attributes.insert(
        "update_available".into(),
        (installed.is_some() && installed != Some(latest)).into(),
    );
    if let Some(summary) = payload.get("release_summary").and_then(|v| v.as_str()) {
        attributes.insert("release_summary".into(), summary.into());
    }

    Ok(ProjectedState {
        value: latest.into(),
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CapabilityKey, DeviceType, describe};
    use rstest::rstest;
    use serde_json::json;

    fn payload(value: Value) -> RawStatePayload {
        value.as_object().expect("object payload").clone()
    }

    fn cover_payload(movement: &str, openlevel: u64) -> RawStatePayload {
        payload(json!({ "movement": movement, "openlevel": openlevel }))
    }

    #[rstest]
    #[case("ON", true)]
    #[case("on", false)] // case variants never match
    #[case("On", false)]
    #[case("OFF", false)]
    fn on_key_derivation_is_exact_match(#[case] raw: &str, #[case] expected: bool) {
        let desc = describe(DeviceType::Hood, CapabilityKey::HoodOperationMode).unwrap();
        let projected = project(desc, &payload(json!({ "hood_operation_mode": raw }))).unwrap();
        assert_eq!(Value::Bool(expected), projected.value);
    }

    #[test]
    fn boolean_without_on_key_passes_vendor_flag_through() {
        let desc = describe(DeviceType::Washer, CapabilityKey::RemoteControlEnabled).unwrap();
        let projected = project(desc, &payload(json!({ "remote_control_enabled": true }))).unwrap();
        assert_eq!(Value::Bool(true), projected.value);
        let projected =
            project(desc, &payload(json!({ "remote_control_enabled": false }))).unwrap();
        assert_eq!(Value::Bool(false), projected.value);
    }

    #[test]
    fn numeric_value_is_unit_tagged_without_conversion() {
        let desc = describe(DeviceType::SwitchPlug, CapabilityKey::Consumption).unwrap();
        let projected = project(desc, &payload(json!({ "consumption": 51.63 }))).unwrap();
        assert_eq!(json!(51.63), projected.value);
        assert_eq!(Some(&json!("W")), projected.attributes.get("unit"));
    }

    #[rstest]
    #[case("stop", 0, CoverState::Closed)]
    #[case("stop", 1, CoverState::Open)]
    #[case("stop", 75, CoverState::Open)]
    #[case("up", 0, CoverState::Opening)]
    #[case("up", 90, CoverState::Opening)]
    #[case("down", 100, CoverState::Closing)]
    #[case("down", 0, CoverState::Closing)]
    fn cover_state_derivation(
        #[case] movement: &str,
        #[case] openlevel: u64,
        #[case] expected: CoverState,
    ) {
        let desc = describe(DeviceType::Shutter, CapabilityKey::CoverPosition).unwrap();
        let projected = project(desc, &cover_payload(movement, openlevel)).unwrap();
        assert_eq!(json!(expected.to_string()), projected.value);
        assert_eq!(Some(&json!(openlevel)), projected.attributes.get("position"));
    }

    #[test]
    fn cover_projection_is_idempotent() {
        let desc = describe(DeviceType::Shutter, CapabilityKey::CoverPosition).unwrap();
        let payload = cover_payload("stop", 75);
        let first = project(desc, &payload).unwrap();
        let second = project(desc, &payload).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_movement_is_rejected() {
        let desc = describe(DeviceType::Shutter, CapabilityKey::CoverPosition).unwrap();
        let result = project(desc, &cover_payload("sideways", 50));
        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
    }

    #[rstest]
    #[case(json!({ "openlevel": 75 }), "movement")]
    #[case(json!({ "movement": "stop" }), "openlevel")]
    fn missing_cover_field_fails_with_missing_field(
        #[case] raw: Value,
        #[case] expected_field: &str,
    ) {
        let desc = describe(DeviceType::Shutter, CapabilityKey::CoverPosition).unwrap();
        let result = project(desc, &payload(raw));
        assert_eq!(
            Err(ServiceError::MissingField(expected_field.into())),
            result
        );
    }

    #[test]
    fn missing_sensor_field_fails_with_missing_field() {
        let desc = describe(DeviceType::SwitchPlug, CapabilityKey::Temperature).unwrap();
        let result = project(desc, &payload(json!({ "consumption": 3.5 })));
        assert_eq!(Err(ServiceError::MissingField("temperature".into())), result);
    }

    #[test]
    fn update_projection_reports_available_update() {
        let desc = describe(DeviceType::VideoManager, CapabilityKey::SoftwareUpdate).unwrap();
        let projected = project(
            desc,
            &payload(json!({ "installed_version": "5.14.0", "latest_version": "5.15.1" })),
        )
        .unwrap();
        assert_eq!(json!("5.15.1"), projected.value);
        assert_eq!(
            Some(&json!(true)),
            projected.attributes.get("update_available")
        );

        let projected = project(
            desc,
            &payload(json!({ "installed_version": "5.15.1", "latest_version": "5.15.1" })),
        )
        .unwrap();
        assert_eq!(
            Some(&json!(false)),
            projected.attributes.get("update_available")
        );
    }
}
