// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Vendor cloud API client.
//!
//! The integration consumes the vendor cloud only through the [`VendorApi`]
//! trait; [`CloudApiClient`] implements it for the REST API with `awc`.

pub mod model;

use crate::configuration::{AccountCredentials, AccountSettings};
use crate::errors::ServiceError;
use crate::util::new_http_client;
use actix_web::http::StatusCode;
use awc::ClientRequest;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use log::debug;
use model::{AccountInfo, DeviceRecord, MoveDirection};
use serde_json::{Value, json};
use std::rc::Rc;
use url::Url;

/// Asynchronous vendor API boundary.
///
/// All calls suspend the calling task only; a single client is shared by the
/// controller, the setup flow and the diagnostics collection.
pub trait VendorApi {
    /// Account lookup, also used to validate credentials during setup.
    fn account_info(&self) -> LocalBoxFuture<'static, Result<AccountInfo, ServiceError>>;
    /// Raw account document for diagnostics.
    fn account_snapshot(&self) -> LocalBoxFuture<'static, Result<Value, ServiceError>>;
    /// Full device discovery including current raw state.
    fn search_all_devices(&self) -> LocalBoxFuture<'static, Result<Vec<DeviceRecord>, ServiceError>>;
    /// Live data points of one device for diagnostics.
    fn device_points(&self, device_id: &str) -> LocalBoxFuture<'static, Result<Value, ServiceError>>;
    fn move_shutter_direction(
        &self,
        device_id: &str,
        direction: MoveDirection,
    ) -> LocalBoxFuture<'static, Result<(), ServiceError>>;
    fn move_shutter_percentage(
        &self,
        device_id: &str,
        position: u8,
    ) -> LocalBoxFuture<'static, Result<(), ServiceError>>;
    /// Close the vendor session on config entry unload.
    fn disconnect(&self) -> LocalBoxFuture<'static, Result<(), ServiceError>>;
}

pub type SharedVendorApi = Rc<dyn VendorApi>;

/// REST implementation of [`VendorApi`].
pub struct CloudApiClient {
    http: awc::Client,
    base: Url,
    credentials: AccountCredentials,
}

impl CloudApiClient {
    pub fn new(settings: &AccountSettings) -> Result<Self, ServiceError> {
        let base = settings
            .host
            .clone()
            .ok_or_else(|| ServiceError::BadRequest("Missing host in account settings".into()))?;
        let credentials = settings
            .credentials()
            .ok_or_else(|| ServiceError::BadRequest("Missing credentials in account settings".into()))?;

        Ok(Self {
            http: new_http_client(settings.request_timeout()),
            base,
            credentials,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ServiceError> {
        self.base
            .join(path)
            .map_err(|e| ServiceError::BadRequest(format!("Invalid API path '{path}': {e}")))
    }

    fn get(&self, path: &str) -> Result<ClientRequest, ServiceError> {
        Ok(self.authorize(self.http.get(self.url(path)?.as_str())))
    }

    fn post(&self, path: &str) -> Result<ClientRequest, ServiceError> {
        Ok(self.authorize(self.http.post(self.url(path)?.as_str())))
    }

    fn authorize(&self, request: ClientRequest) -> ClientRequest {
        match &self.credentials {
            AccountCredentials::Basic { username, password } => {
                request.basic_auth(username, password)
            }
            AccountCredentials::Token(token) => request.bearer_auth(token),
        }
    }
}

fn check_status(status: StatusCode) -> Result<(), ServiceError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ServiceError::Unauthorized(format!(
            "Vendor API rejected credentials: {status}"
        )));
    }
    if !status.is_success() {
        return Err(ServiceError::ServiceUnavailable(format!(
            "Vendor API error: {status}"
        )));
    }
    Ok(())
}

impl VendorApi for CloudApiClient {
    fn account_info(&self) -> LocalBoxFuture<'static, Result<AccountInfo, ServiceError>> {
        let request = self.get("api/account");
        async move {
            let mut response = request?.send().await?;
            check_status(response.status())?;
            response
                .json::<AccountInfo>()
                .await
                .map_err(|e| ServiceError::SerializationError(e.to_string()))
        }
        .boxed_local()
    }

    fn account_snapshot(&self) -> LocalBoxFuture<'static, Result<Value, ServiceError>> {
        let request = self.get("api/account");
        async move {
            let mut response = request?.send().await?;
            check_status(response.status())?;
            response
                .json::<Value>()
                .await
                .map_err(|e| ServiceError::SerializationError(e.to_string()))
        }
        .boxed_local()
    }

    fn search_all_devices(&self) -> LocalBoxFuture<'static, Result<Vec<DeviceRecord>, ServiceError>> {
        let request = self.get("api/devices");
        async move {
            let mut response = request?.send().await?;
            check_status(response.status())?;
            response
                .json::<Vec<DeviceRecord>>()
                .await
                .map_err(|e| ServiceError::SerializationError(e.to_string()))
        }
        .boxed_local()
    }

    fn device_points(&self, device_id: &str) -> LocalBoxFuture<'static, Result<Value, ServiceError>> {
        let request = self.get(&format!("api/devices/{device_id}/points"));
        async move {
            let mut response = request?.send().await?;
            check_status(response.status())?;
            response
                .json::<Value>()
                .await
                .map_err(|e| ServiceError::SerializationError(e.to_string()))
        }
        .boxed_local()
    }

    fn move_shutter_direction(
        &self,
        device_id: &str,
        direction: MoveDirection,
    ) -> LocalBoxFuture<'static, Result<(), ServiceError>> {
        let request = self.post(&format!("api/devices/{device_id}/action"));
        let body = json!({ "action": "move", "direction": direction.to_string() });
        async move {
            let response = request?.send_json(&body).await?;
            check_status(response.status())
        }
        .boxed_local()
    }

    fn move_shutter_percentage(
        &self,
        device_id: &str,
        position: u8,
    ) -> LocalBoxFuture<'static, Result<(), ServiceError>> {
        let request = self.post(&format!("api/devices/{device_id}/action"));
        let body = json!({ "action": "position", "position": position });
        async move {
            let response = request?.send_json(&body).await?;
            check_status(response.status())
        }
        .boxed_local()
    }

    fn disconnect(&self) -> LocalBoxFuture<'static, Result<(), ServiceError>> {
        let request = self.authorize(self.http.delete(match self.url("api/session") {
            Ok(url) => url.to_string(),
            Err(e) => return futures::future::ready(Err(e)).boxed_local(),
        }));
        async move {
            debug!("Closing vendor session");
            let response = request.send().await?;
            // a missing session is fine on teardown
            if response.status() != StatusCode::NOT_FOUND {
                check_status(response.status())?;
            }
            Ok(())
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_status_maps_to_unauthorized() {
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED),
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn server_error_maps_to_service_unavailable() {
        assert!(matches!(
            check_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(ServiceError::ServiceUnavailable(_))
        ));
        assert_eq!(Ok(()), check_status(StatusCode::OK));
    }
}
