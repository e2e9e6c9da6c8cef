// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Request and response models of the web API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request body of the setup flow endpoint.
#[derive(Debug, Deserialize)]
pub struct SetupRequest {
    pub host: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Request body of the entity command endpoint.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub cmd_id: String,
    #[serde(default)]
    pub params: Option<Map<String, Value>>,
}

/// Plain acknowledgement response.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub code: u16,
    pub message: String,
}

impl ApiResponse {
    pub fn ok() -> Self {
        Self {
            code: 200,
            message: "OK".into(),
        }
    }

    pub fn accepted() -> Self {
        Self {
            code: 202,
            message: "Accepted".into(),
        }
    }
}
