// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Custom application error with conversions from common Rust and 3rd-party errors.

use actix::MailboxError;
use actix::dev::SendError;
use actix_web::ResponseError;
use actix_web::http::StatusCode;
use awc::error::{ConnectError, SendRequestError};
use derive_more::Display;
use log::error;
use serde_json::json;

#[derive(Debug, Display, PartialEq)]
pub enum ServiceError {
    #[display("Internal server error")]
    InternalServerError(String),

    #[display("Internal serialization error")]
    SerializationError(String),

    #[display("BadRequest: {_0}")]
    BadRequest(String),

    /// A required field is absent from a raw state payload.
    #[display("Missing field: {_0}")]
    MissingField(String),

    /// Transport-level failure reaching the vendor API (refused, reset, timeout).
    #[display("Connection failed: {_0}")]
    ConnectionFailed(String),

    /// DNS / address resolution failure.
    #[display("Host resolution failed: {_0}")]
    HostResolution(String),

    /// Credentials rejected by the vendor API.
    #[display("Unauthorized: {_0}")]
    Unauthorized(String),

    #[display("The connection is closed or closing")]
    NotConnected,

    ServiceUnavailable(String),
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::ConnectionFailed(format!("{e:?}"))
    }
}

impl From<MailboxError> for ServiceError {
    fn from(e: MailboxError) -> Self {
        ServiceError::InternalServerError(format!("Internal message error: {e:?}"))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        error!("{e:?}");
        ServiceError::SerializationError(e.to_string())
    }
}

impl From<strum::ParseError> for ServiceError {
    fn from(e: strum::ParseError) -> Self {
        ServiceError::SerializationError(e.to_string())
    }
}

impl<T> From<SendError<T>> for ServiceError {
    fn from(e: SendError<T>) -> Self {
        ServiceError::InternalServerError(format!("Error sending internal message: {e:?}"))
    }
}

impl From<SendRequestError> for ServiceError {
    fn from(e: SendRequestError) -> Self {
        let msg = e.to_string();
        match e {
            SendRequestError::Connect(
                ConnectError::Resolver(_) | ConnectError::NoRecords | ConnectError::Unresolved,
            ) => ServiceError::HostResolution(msg),
            SendRequestError::Connect(_) | SendRequestError::Timeout => {
                ServiceError::ConnectionFailed(msg)
            }
            _ => ServiceError::InternalServerError(msg),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::ConnectionFailed(_)
            | ServiceError::HostResolution(_)
            | ServiceError::NotConnected => StatusCode::BAD_GATEWAY,
            ServiceError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        actix_web::HttpResponse::build(self.status_code()).json(json!({
            "code": self.status_code().as_u16(),
            "message": self.to_string(),
        }))
    }
}
