// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Diagnostics snapshot collection.

use crate::controller::{Controller, GetDiagnosticsMsg};
use crate::diagnostics::{TO_REDACT, collect_snapshot, redact};
use crate::errors::ServiceError;
use actix::{ActorFutureExt, Handler, ResponseActFuture, WrapFuture, fut};
use serde_json::{Value, json};

impl Handler<GetDiagnosticsMsg> for Controller {
    type Result = ResponseActFuture<Self, Result<Value, ServiceError>>;

    fn handle(&mut self, _msg: GetDiagnosticsMsg, _ctx: &mut Self::Context) -> Self::Result {
        let Some(api) = self.api.clone() else {
            return Box::pin(fut::ready(Err(ServiceError::NotConnected)));
        };
        let mut device_ids: Vec<String> = self.sessions.keys().cloned().collect();
        device_ids.sort();

        Box::pin(
            async move { collect_snapshot(api.as_ref(), &device_ids).await }
                .into_actor(self)
                .map(|result, act, _| {
                    let snapshot = result?;
                    let config_entry = json!({
                        "title": act.settings.title,
                        "account": serde_json::to_value(&act.settings.account)?,
                    });
                    Ok(json!({
                        "config_entry_data": redact(&config_entry, TO_REDACT),
                        "vendor_data": redact(&snapshot, TO_REDACT),
                    }))
                }),
        )
    }
}
