// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Web API of the integration driver.
//!
//! Thin HTTP layer: every endpoint translates into one controller message.

pub mod web_model;

use crate::APP_VERSION;
use crate::configuration::DriverMetadata;
use crate::controller::{
    Controller, EntityCommandMsg, GetAvailableEntitiesMsg, GetDeviceStateMsg, GetDiagnosticsMsg,
    GetEntityStatesMsg, PushStateMsg, SetupRequestMsg,
};
use crate::device::RawStatePayload;
use crate::entity::EntityCommand;
use crate::errors::ServiceError;
use actix::Addr;
use actix_web::{HttpResponse, get, post, put, web};
use serde_json::json;
use web_model::{ApiResponse, CommandRequest, SetupRequest};

pub struct ServerState {
    pub controller: Addr<Controller>,
    pub metadata: DriverMetadata,
}

#[get("/api/version")]
async fn version(state: web::Data<ServerState>) -> Result<HttpResponse, ServiceError> {
    let device_state = state.controller.send(GetDeviceStateMsg {}).await?;
    Ok(HttpResponse::Ok().json(json!({
        "driver": state.metadata,
        "version": APP_VERSION,
        "device_state": device_state,
    })))
}

#[post("/api/setup")]
async fn setup_flow(
    state: web::Data<ServerState>,
    request: web::Json<SetupRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = request.into_inner();
    let result = state
        .controller
        .send(SetupRequestMsg {
            host: request.host,
            username: request.username,
            password: request.password,
            token: request.token,
        })
        .await??;
    Ok(HttpResponse::Ok().json(result))
}

#[get("/api/entities")]
async fn available_entities(state: web::Data<ServerState>) -> Result<HttpResponse, ServiceError> {
    let entities = state.controller.send(GetAvailableEntitiesMsg {}).await?;
    Ok(HttpResponse::Ok().json(entities))
}

#[get("/api/entities/states")]
async fn entity_states(state: web::Data<ServerState>) -> Result<HttpResponse, ServiceError> {
    let states = state.controller.send(GetEntityStatesMsg {}).await?;
    Ok(HttpResponse::Ok().json(states))
}

#[put("/api/entities/{entity_id}/command")]
async fn entity_command(
    state: web::Data<ServerState>,
    path: web::Path<String>,
    request: web::Json<CommandRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = request.into_inner();
    state
        .controller
        .send(EntityCommandMsg {
            command: EntityCommand {
                entity_id: path.into_inner(),
                cmd_id: request.cmd_id,
                params: request.params,
            },
        })
        .await??;
    Ok(HttpResponse::Ok().json(ApiResponse::ok()))
}

#[post("/api/callback")]
async fn push_callback(
    state: web::Data<ServerState>,
    payload: web::Json<RawStatePayload>,
) -> Result<HttpResponse, ServiceError> {
    state
        .controller
        .send(PushStateMsg {
            payload: payload.into_inner(),
        })
        .await?;
    Ok(HttpResponse::Accepted().json(ApiResponse::accepted()))
}

#[get("/api/diagnostics")]
async fn diagnostics(state: web::Data<ServerState>) -> Result<HttpResponse, ServiceError> {
    let snapshot = state.controller.send(GetDiagnosticsMsg {}).await??;
    Ok(HttpResponse::Ok().json(snapshot))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(version)
        .service(setup_flow)
        .service(available_entities)
        .service(entity_states)
        .service(entity_command)
        .service(push_callback)
        .service(diagnostics);
}
