// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Push callback ingress.

use crate::controller::{Controller, PushStateMsg};
use crate::util::json::merge_entries;
use actix::Handler;
use log::{debug, warn};

impl Handler<PushStateMsg> for Controller {
    type Result = ();

    fn handle(&mut self, msg: PushStateMsg, _ctx: &mut Self::Context) {
        let Some(device_id) = msg
            .payload
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
        else {
            warn!("Discarding push callback without device id");
            return;
        };

        let changes = {
            let Some(session) = self.sessions.get_mut(&device_id) else {
                debug!("Discarding push callback for unknown device {device_id}");
                return;
            };
            debug!("[{}] push callback received", session.identity.name);

            // fold the partial payload into the cached state, then re-project
            merge_entries(msg.payload, &mut session.payload);
            let payload = session.payload.clone();
            session
                .adapters
                .iter_mut()
                .filter_map(|adapter| adapter.apply(&payload))
                .collect::<Vec<_>>()
        };

        self.broadcast_entity_changes(&changes);
    }
}
