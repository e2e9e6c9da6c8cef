// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Vendor session lifecycle: connect, poll refresh, disconnect.

use crate::controller::{ConnectMsg, Controller, DeviceState, DisconnectMsg, RefreshMsg};
use crate::errors::ServiceError;
use actix::{ActorFutureExt, Handler, ResponseActFuture, WrapFuture, fut};
use log::{info, warn};

impl Handler<ConnectMsg> for Controller {
    type Result = ResponseActFuture<Self, Result<(), ServiceError>>;

    fn handle(&mut self, _msg: ConnectMsg, _ctx: &mut Self::Context) -> Self::Result {
        let api = match self.vendor_api() {
            Ok(api) => api,
            Err(e) => return Box::pin(fut::ready(Err(e))),
        };
        self.set_device_state(DeviceState::Connecting);

        Box::pin(
            api.search_all_devices()
                .into_actor(self)
                .map(|result, act, ctx| match result {
                    Ok(records) => {
                        info!("Connected, discovered {} devices", records.len());
                        let changes = act.apply_discovery(records);
                        act.set_device_state(DeviceState::Connected);
                        act.broadcast_entity_changes(&changes);
                        act.start_polling(ctx);
                        Ok(())
                    }
                    Err(e) => {
                        warn!("Connecting to the vendor account failed: {e}");
                        act.set_device_state(DeviceState::Error);
                        Err(e)
                    }
                }),
        )
    }
}

impl Handler<RefreshMsg> for Controller {
    type Result = ResponseActFuture<Self, ()>;

    fn handle(&mut self, _msg: RefreshMsg, _ctx: &mut Self::Context) -> Self::Result {
        let Some(api) = self.api.clone() else {
            return Box::pin(fut::ready(()));
        };

        Box::pin(
            api.search_all_devices()
                .into_actor(self)
                .map(|result, act, _| match result {
                    Ok(records) => {
                        let changes = act.apply_discovery(records);
                        act.set_device_state(DeviceState::Connected);
                        act.broadcast_entity_changes(&changes);
                    }
                    Err(e) => {
                        // entities keep their last known state until a poll succeeds again
                        warn!("Poll refresh failed: {e}");
                        act.set_device_state(DeviceState::Error);
                    }
                }),
        )
    }
}

impl Handler<DisconnectMsg> for Controller {
    type Result = ResponseActFuture<Self, ()>;

    fn handle(&mut self, _msg: DisconnectMsg, ctx: &mut Self::Context) -> Self::Result {
        self.stop_polling(ctx);
        self.sessions.clear();
        self.set_device_state(DeviceState::Disconnected);
        let api = self.api.take();

        Box::pin(
            async move {
                if let Some(api) = api {
                    if let Err(e) = api.disconnect().await {
                        warn!("Error closing the vendor session: {e}");
                    }
                }
            }
            .into_actor(self),
        )
    }
}
