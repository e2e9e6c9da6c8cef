// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Setup flow: validate user provided account settings and persist the
//! config record on success.

use crate::client::model::AccountInfo;
use crate::configuration::{AccountSettings, ConfigRecord, save_config_record};
use crate::controller::{
    ConnectMsg, Controller, SetupError, SetupErrors, SetupFlowInput, SetupFlowResult,
    SetupFlowState, SetupRequestMsg,
};
use crate::errors::ServiceError;
use actix::{ActorFutureExt, AsyncContext, Handler, ResponseActFuture, WrapFuture, fut};
use log::{info, warn};
use rust_fsm::StateMachine;
use url::Url;

/// Validate and normalize the user provided host address.
///
/// A missing scheme defaults to https. Only http and https are accepted.
pub(crate) fn validate_host(address: &str) -> Result<Url, ServiceError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ServiceError::HostResolution("Empty host".into()));
    }
    let address = if address.contains("://") {
        address.to_string()
    } else {
        format!("https://{address}")
    };

    let url = Url::parse(&address)
        .map_err(|e| ServiceError::HostResolution(format!("Invalid host '{address}': {e}")))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ServiceError::HostResolution(format!(
                "Unsupported scheme: {scheme}. Valid: [http, https]"
            )));
        }
    }
    if url.host_str().is_none() {
        return Err(ServiceError::HostResolution(format!(
            "Missing host in '{address}'"
        )));
    }

    Ok(url)
}

/// Map a validation failure onto the setup form error taxonomy.
///
/// The mapping is deterministic: the same failure always yields the same
/// error reason. A rejected authorization is labeled by credentials variant.
pub(crate) fn classify_setup_error(error: &ServiceError, token_flow: bool) -> SetupError {
    match error {
        ServiceError::HostResolution(_) => SetupError::InvalidHost,
        ServiceError::ConnectionFailed(_) | ServiceError::NotConnected => SetupError::CannotConnect,
        ServiceError::Unauthorized(_) if token_flow => SetupError::UnauthorizedToken,
        ServiceError::Unauthorized(_) => SetupError::Unauthorized,
        _ => SetupError::Unknown,
    }
}

fn form_error(base: SetupError) -> SetupFlowResult {
    SetupFlowResult::Form {
        errors: SetupErrors { base },
    }
}

impl Handler<SetupRequestMsg> for Controller {
    type Result = ResponseActFuture<Self, Result<SetupFlowResult, ServiceError>>;

    fn handle(&mut self, msg: SetupRequestMsg, _ctx: &mut Self::Context) -> Self::Result {
        // reconfiguring a finished setup starts a fresh flow
        if matches!(self.setup_flow.state(), &SetupFlowState::Created) {
            self.setup_flow = StateMachine::new();
        }
        if self.setup_flow.consume(&SetupFlowInput::Submit).is_err() {
            return Box::pin(fut::ready(Err(ServiceError::BadRequest(
                "Setup validation already in progress".into(),
            ))));
        }

        let mut account = AccountSettings {
            username: msg.username.filter(|v| !v.is_empty()),
            password: msg.password.filter(|v| !v.is_empty()),
            token: msg.token.filter(|v| !v.is_empty()),
            ..self.settings.account.clone()
        };

        let host = match validate_host(&msg.host) {
            Ok(host) => host,
            Err(e) => {
                warn!("Setup rejected: {e}");
                let _ = self.setup_flow.consume(&SetupFlowInput::Failed);
                return Box::pin(fut::ready(Ok(form_error(classify_setup_error(&e, false)))));
            }
        };
        account.host = Some(host);

        let Some(credentials) = account.credentials() else {
            let _ = self.setup_flow.consume(&SetupFlowInput::Failed);
            return Box::pin(fut::ready(Err(ServiceError::BadRequest(
                "Either a token or username and password are required".into(),
            ))));
        };
        let token_flow = credentials.is_token();

        let api = match (self.api_factory)(&account) {
            Ok(api) => api,
            Err(e) => {
                warn!("Setup rejected: {e}");
                let _ = self.setup_flow.consume(&SetupFlowInput::Failed);
                return Box::pin(fut::ready(Ok(form_error(classify_setup_error(
                    &e, token_flow,
                )))));
            }
        };

        let timeout = account.connection_timeout();
        Box::pin(
            async move {
                match tokio::time::timeout(timeout, api.account_info()).await {
                    Ok(result) => result,
                    Err(_) => Err(ServiceError::ConnectionFailed(format!(
                        "No response from vendor API within {}s",
                        timeout.as_secs()
                    ))),
                }
            }
            .into_actor(self)
            .map(move |result, act, ctx| match result {
                Ok(account_info) => act.complete_setup(account_info, account, ctx),
                Err(e) => {
                    warn!("Setup validation failed: {e}");
                    let _ = act.setup_flow.consume(&SetupFlowInput::Failed);
                    Ok(form_error(classify_setup_error(&e, token_flow)))
                }
            }),
        )
    }
}

impl Controller {
    /// Persist the validated account and reconnect with the new configuration.
    fn complete_setup(
        &mut self,
        account_info: AccountInfo,
        account: AccountSettings,
        ctx: &mut actix::Context<Self>,
    ) -> Result<SetupFlowResult, ServiceError> {
        // resolved title: account name, falling back to the host
        let title = account_info
            .name
            .filter(|name| !name.is_empty())
            .or_else(|| {
                account
                    .host
                    .as_ref()
                    .and_then(|host| host.host_str().map(str::to_string))
            })
            .unwrap_or(account_info.id);
        let record = ConfigRecord {
            title: title.clone(),
            account: account.clone(),
        };
        if let Err(e) = save_config_record(&record) {
            let _ = self.setup_flow.consume(&SetupFlowInput::Failed);
            return Err(e);
        }
        let _ = self.setup_flow.consume(&SetupFlowInput::Successful);

        self.settings.account = account;
        self.settings.title = Some(title.clone());
        // drop the old client, the reconnect uses the new account
        self.api = None;
        self.sessions.clear();
        info!("Setup complete: {title}");
        ctx.notify(ConnectMsg::default());

        Ok(SetupFlowResult::CreateEntry { title })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("cloud.example.com", "https://cloud.example.com/")]
    #[case("  cloud.example.com  ", "https://cloud.example.com/")]
    #[case("http://192.168.1.20:8080", "http://192.168.1.20:8080/")]
    #[case("https://cloud.example.com/api", "https://cloud.example.com/api")]
    fn valid_host_is_normalized(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(expected, validate_host(input).unwrap().as_str());
    }

    #[rstest]
    #[case("")]
    #[case("ftp://cloud.example.com")]
    #[case("https://")]
    fn invalid_host_is_rejected(#[case] input: &str) {
        assert!(matches!(
            validate_host(input),
            Err(ServiceError::HostResolution(_))
        ));
    }

    #[rstest]
    #[case(ServiceError::ConnectionFailed("timeout".into()), false, SetupError::CannotConnect)]
    #[case(ServiceError::HostResolution("no such host".into()), false, SetupError::InvalidHost)]
    #[case(ServiceError::Unauthorized("401".into()), false, SetupError::Unauthorized)]
    #[case(ServiceError::Unauthorized("401".into()), true, SetupError::UnauthorizedToken)]
    #[case(ServiceError::InternalServerError("".into()), false, SetupError::Unknown)]
    #[case(ServiceError::SerializationError("bad json".into()), true, SetupError::Unknown)]
    fn error_classification_is_deterministic(
        #[case] error: ServiceError,
        #[case] token_flow: bool,
        #[case] expected: SetupError,
    ) {
        assert_eq!(expected, classify_setup_error(&error, token_flow));
        assert_eq!(expected, classify_setup_error(&error, token_flow));
    }

    #[test]
    fn error_reasons_use_snake_case_labels() {
        assert_eq!("cannot_connect", SetupError::CannotConnect.to_string());
        assert_eq!("invalid_host", SetupError::InvalidHost.to_string());
        assert_eq!("unauthorized", SetupError::Unauthorized.to_string());
        assert_eq!(
            "unauthorized_token",
            SetupError::UnauthorizedToken.to_string()
        );
        assert_eq!("unknown", SetupError::Unknown.to_string());
    }
}
