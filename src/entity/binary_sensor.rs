// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Binary sensor entity specific logic.

use crate::projector::ProjectedState;
use serde_json::{Map, Value};

pub(crate) fn map_binary_sensor_attributes(projected: &ProjectedState) -> Map<String, Value> {
    let is_on = projected.value.as_bool().unwrap_or_default();

    let mut attributes = Map::with_capacity(3);
    attributes.insert("value".into(), is_on.into());
    attributes.insert("state".into(), if is_on { "ON" } else { "OFF" }.into());
    attributes.insert("unit".into(), "boolean".into());

    attributes
}
