// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Diagnostics snapshot collection with redaction of sensitive fields.

use crate::client::VendorApi;
use crate::errors::ServiceError;
use serde_json::{Map, Value, json};

/// Fixed marker replacing sensitive values. Redaction is irreversible.
pub const REDACTED: &str = "**REDACTED**";

/// Field keys stripped from every diagnostics export.
pub const TO_REDACT: &[&str] = &[
    "access_token",
    "refresh_token",
    "serial_number",
    "username",
    "password",
    "token",
    "mac",
];

/// Replace the value of every sensitive key with [`REDACTED`], recursively
/// over nested objects and arrays. Idempotent.
pub fn redact(value: &Value, sensitive_keys: &[&str]) -> Value {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| {
                if sensitive_keys.contains(&key.as_str()) {
                    (key.clone(), Value::String(REDACTED.into()))
                } else {
                    (key.clone(), redact(value, sensitive_keys))
                }
            })
            .collect::<Map<String, Value>>()
            .into(),
        Value::Array(items) => items
            .iter()
            .map(|item| redact(item, sensitive_keys))
            .collect::<Vec<Value>>()
            .into(),
        other => other.clone(),
    }
}

/// Query the vendor API for the full account and device state.
///
/// Calls are issued sequentially without retry: diagnostics is a manual,
/// best-effort operation and the first failure aborts the whole collection,
/// surfacing the underlying transport error to the caller.
pub async fn collect_snapshot(
    api: &dyn VendorApi,
    device_ids: &[String],
) -> Result<Value, ServiceError> {
    let account = api.account_snapshot().await?;

    let mut devices = Map::with_capacity(device_ids.len());
    for device_id in device_ids {
        let points = api.device_points(device_id).await?;
        devices.insert(device_id.clone(), points);
    }

    Ok(json!({
        "account": account,
        "devices": devices,
    }))
}
