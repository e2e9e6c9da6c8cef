// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Sensor entity specific logic.

use crate::projector::ProjectedState;
use serde_json::{Map, Value};

pub(crate) fn map_sensor_attributes(projected: &ProjectedState) -> Map<String, Value> {
    let mut attributes = Map::with_capacity(2);
    attributes.insert("value".into(), projected.value.clone());

    if let Some(unit) = projected.attributes.get("unit") {
        attributes.insert("unit".into(), unit.clone());
    }

    attributes
}
