// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Update entity specific logic.

use crate::projector::ProjectedState;
use serde_json::{Map, Value};

pub(crate) fn map_update_attributes(projected: &ProjectedState) -> Map<String, Value> {
    let mut attributes = Map::with_capacity(4);
    attributes.insert("latest_version".into(), projected.value.clone());

    for key in ["installed_version", "update_available", "release_summary"] {
        if let Some(value) = projected.attributes.get(key) {
            attributes.insert(key.into(), value.clone());
        }
    }

    attributes
}
