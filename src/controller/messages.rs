// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix messages of the controller actor.

use crate::controller::DeviceState;
use crate::device::RawStatePayload;
use crate::entity::{AvailableEntity, EntityChange, EntityCommand};
use crate::errors::ServiceError;
use actix::prelude::Message;
use serde::Serialize;
use strum::Display;

/// Connect to the vendor account: run device discovery and start the
/// polling coordinator.
#[derive(Default, Message)]
#[rtype(result = "Result<(), ServiceError>")]
pub struct ConnectMsg {}

/// Tear down the vendor session: stop polling and close the connection.
#[derive(Default, Message)]
#[rtype(result = "()")]
pub struct DisconnectMsg {}

/// Internal poll tick of the coordinator.
#[derive(Message)]
#[rtype(result = "()")]
pub(crate) struct RefreshMsg {}

/// Push callback ingress: device-scoped payload delivered by the vendor
/// outside the poll cycle.
#[derive(Debug, Message)]
#[rtype(result = "()")]
pub struct PushStateMsg {
    pub payload: RawStatePayload,
}

/// Host platform service call for one entity.
#[derive(Debug, Message)]
#[rtype(result = "Result<(), ServiceError>")]
pub struct EntityCommandMsg {
    pub command: EntityCommand,
}

#[derive(Default, Message)]
#[rtype(result = "Vec<AvailableEntity>")]
pub struct GetAvailableEntitiesMsg {}

#[derive(Default, Message)]
#[rtype(result = "Vec<EntityChange>")]
pub struct GetEntityStatesMsg {}

#[derive(Default, Message)]
#[rtype(result = "DeviceState")]
pub struct GetDeviceStateMsg {}

/// Collect the redacted diagnostics snapshot.
#[derive(Default, Message)]
#[rtype(result = "Result<serde_json::Value, ServiceError>")]
pub struct GetDiagnosticsMsg {}

/// User submission of the setup flow form.
#[derive(Debug, Message)]
#[rtype(result = "Result<SetupFlowResult, ServiceError>")]
pub struct SetupRequestMsg {
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

/// Error reason taxonomy surfaced to the setup form as `errors.base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SetupError {
    CannotConnect,
    InvalidHost,
    Unauthorized,
    UnauthorizedToken,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SetupErrors {
    pub base: SetupError,
}

/// Outcome of one setup flow submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SetupFlowResult {
    /// Validation succeeded, the config record was persisted.
    CreateEntry { title: String },
    /// Validation failed, redisplay the form with one error reason.
    Form { errors: SetupErrors },
}
