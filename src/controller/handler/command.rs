// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Entity command dispatch to the vendor API.

use crate::controller::{Controller, EntityCommandMsg};
use crate::entity::{CoverCall, EntityType, handle_cover};
use crate::errors::ServiceError;
use actix::{ActorFutureExt, Handler, ResponseActFuture, WrapFuture, fut};
use log::info;

impl Handler<EntityCommandMsg> for Controller {
    type Result = ResponseActFuture<Self, Result<(), ServiceError>>;

    fn handle(&mut self, msg: EntityCommandMsg, _ctx: &mut Self::Context) -> Self::Result {
        let command = msg.command;

        let target = self.sessions.iter().find_map(|(device_id, session)| {
            session
                .adapters
                .iter()
                .find(|adapter| adapter.entity_id() == command.entity_id)
                .map(|adapter| (device_id.clone(), adapter.entity_type()))
        });
        let Some((device_id, entity_type)) = target else {
            return Box::pin(fut::ready(Err(ServiceError::BadRequest(format!(
                "Unknown entity: {}",
                command.entity_id
            )))));
        };

        let call = match entity_type {
            EntityType::Cover => match handle_cover(&command) {
                Ok(call) => call,
                Err(e) => return Box::pin(fut::ready(Err(e))),
            },
            _ => {
                return Box::pin(fut::ready(Err(ServiceError::BadRequest(format!(
                    "Entity {} does not support commands",
                    command.entity_id
                )))));
            }
        };

        let Some(api) = self.api.clone() else {
            return Box::pin(fut::ready(Err(ServiceError::NotConnected)));
        };

        info!("[{}] {} -> {call:?}", command.entity_id, command.cmd_id);
        // no local state mutation: the visible state follows the next poll or push
        let request = match call {
            CoverCall::Direction(direction) => api.move_shutter_direction(&device_id, direction),
            CoverCall::Percentage(position) => api.move_shutter_percentage(&device_id, position),
        };

        Box::pin(request.into_actor(self).map(|result, _, _| result))
    }
}
