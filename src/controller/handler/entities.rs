// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Read-only entity queries.

use crate::controller::{
    Controller, GetAvailableEntitiesMsg, GetDeviceStateMsg, GetEntityStatesMsg,
};
use crate::entity::{AvailableEntity, EntityAdapter, EntityChange};
use actix::{Handler, MessageResult};

impl Handler<GetAvailableEntitiesMsg> for Controller {
    type Result = MessageResult<GetAvailableEntitiesMsg>;

    fn handle(&mut self, _msg: GetAvailableEntitiesMsg, _ctx: &mut Self::Context) -> Self::Result {
        let mut entities: Vec<AvailableEntity> = self
            .sessions
            .values()
            .flat_map(|session| session.adapters.iter().map(EntityAdapter::available_entity))
            .collect();
        entities.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        MessageResult(entities)
    }
}

impl Handler<GetEntityStatesMsg> for Controller {
    type Result = MessageResult<GetEntityStatesMsg>;

    fn handle(&mut self, _msg: GetEntityStatesMsg, _ctx: &mut Self::Context) -> Self::Result {
        let mut states: Vec<EntityChange> = self
            .sessions
            .values()
            .flat_map(|session| session.adapters.iter().filter_map(EntityAdapter::state))
            .collect();
        states.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        MessageResult(states)
    }
}

impl Handler<GetDeviceStateMsg> for Controller {
    type Result = MessageResult<GetDeviceStateMsg>;

    fn handle(&mut self, _msg: GetDeviceStateMsg, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.device_state)
    }
}
