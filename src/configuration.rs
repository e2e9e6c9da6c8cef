// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Configuration file handling.

use crate::APP_VERSION;
use crate::errors::ServiceError;
use config::Config;
use log::{error, info, warn};
use serde_with::{DurationSeconds, serde_as};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};
use url::Url;

/// Default configuration file.
pub const DEF_CONFIG_FILE: &str = "configuration.yaml";

const ENV_USER_CFG_FILENAME: &str = "UC_USER_CFG_FILENAME";
const DEF_USER_CFG_FILENAME: &str = "device-cloud.json";

/// Environment variable for the user configuration directory.
///
/// This ENV variable is set on the Remote device to the integration specific data directory.
const ENV_CONFIG_HOME: &str = "UC_CONFIG_HOME";

/// Compiled-in driver metadata in json format.
const DRIVER_METADATA: &str = include_str!("../resources/driver.json");

#[derive(Default, serde::Deserialize, serde::Serialize)]
pub struct Settings {
    pub integration: IntegrationSettings,
    pub account: AccountSettings,
    /// Resolved title of the persisted config record, set by the setup flow.
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(serde::Deserialize, serde::Serialize)]
pub struct IntegrationSettings {
    pub interface: String,
    pub http: WebServerSettings,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            interface: "0.0.0.0".to_string(),
            http: WebServerSettings {
                enabled: true,
                port: 8000,
            },
        }
    }
}

#[derive(serde::Deserialize, serde::Serialize)]
pub struct WebServerSettings {
    pub enabled: bool,
    pub port: u16,
}

/// Connection parameters of one vendor account.
#[serde_as]
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct AccountSettings {
    #[serde(default)]
    pub host: Option<Url>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// Fixed refresh interval of the polling coordinator.
    #[serde_as(as = "DurationSeconds")]
    #[serde(rename = "poll_interval_sec")]
    pub poll_interval: Duration,
    /// TCP connection timeout in seconds, including DNS name resolution.
    /// Make sure that `request_timeout` >= `connection_timeout`.
    pub connection_timeout: u8,
    /// Total time in seconds before a vendor API response must be received.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u8,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            host: None,
            username: None,
            password: None,
            token: None,
            poll_interval: Duration::from_secs(30),
            connection_timeout: 6,
            request_timeout: default_request_timeout(),
        }
    }
}

/// Credentials variant of an account; determines the setup flow's
/// unauthorized error label.
#[derive(Clone, Debug)]
pub enum AccountCredentials {
    Basic { username: String, password: String },
    Token(String),
}

impl AccountCredentials {
    pub fn is_token(&self) -> bool {
        matches!(self, AccountCredentials::Token(_))
    }
}

impl AccountSettings {
    /// A token takes precedence over username / password.
    pub fn credentials(&self) -> Option<AccountCredentials> {
        if let Some(token) = self.token.as_deref()
            && !token.is_empty()
        {
            return Some(AccountCredentials::Token(token.into()));
        }
        if let (Some(username), Some(password)) = (self.username.as_ref(), self.password.as_ref())
            && !username.is_empty()
        {
            return Some(AccountCredentials::Basic {
                username: username.clone(),
                password: password.clone(),
            });
        }
        None
    }

    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.credentials().is_some()
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout as u64)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout as u64)
    }
}

fn default_request_timeout() -> u8 {
    6
}

/// Load the configuration settings.
///
/// The application provides default values which can be overriden in the following order:
/// 1. Configuration settings in the read-only yaml configuration file specified in `filename`
/// 2. User provided configuration record from the setup flow
/// 3. Environment variables with prefix `UC_` (works only for cfg keys not containing a `_`!)
///
/// If there's a configuration load error, the configuration will be reloaded without the user
/// provided configuration record for auto-recovery with default values.
pub fn get_configuration(filename: Option<&str>) -> Result<Settings, config::ConfigError> {
    let user_config = config_record_path();
    if !user_config.is_file() {
        info!("No config record found, setup required");
        return load_configuration(filename, None);
    }

    match load_configuration(filename, Some(user_config)) {
        Ok(cfg) => Ok(cfg),
        Err(e) => {
            error!("Error loading configuration, retrying without config record. Error: {e}");
            load_configuration(filename, None)
        }
    }
}

fn load_configuration(
    filename: Option<&str>,
    user_config: Option<PathBuf>,
) -> Result<Settings, config::ConfigError> {
    // default configuration
    let mut config = Config::builder().add_source(Config::try_from(&Settings::default())?);
    // read optional configuration file to override defaults
    if let Some(filename) = filename {
        config = config.add_source(config::File::with_name(filename));
    }

    // Overlay the persisted config record from the setup flow.
    if let Some(user_config) = user_config {
        config = config.add_source(config::File::from(user_config));
    }

    // Add in settings from the environment (with a prefix of UC)
    // E.g. `UC_ACCOUNT_HOST=https://cloud.example.com` would set the `account.host` key
    // This does NOT WORK for nested configurations! https://github.com/mehcode/config-rs/issues/312
    let config = config
        .add_source(config::Environment::with_prefix("UC").separator("_"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;

    check_cfg_values(settings)
}

fn check_cfg_values(mut settings: Settings) -> Result<Settings, config::ConfigError> {
    if settings.account.poll_interval.as_secs() < 5 {
        warn!("Invalid poll interval, using default.");
        settings.account.poll_interval = AccountSettings::default().poll_interval;
    }

    if settings.account.connection_timeout < 3 || settings.account.request_timeout < 3 {
        warn!("Invalid timeout settings, using defaults.");
        settings.account.connection_timeout = AccountSettings::default().connection_timeout;
        settings.account.request_timeout = AccountSettings::default().request_timeout;
    }

    if let Some(host) = settings.account.host.as_ref() {
        match host.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(config::ConfigError::Message(format!(
                    "invalid scheme in account.host: {scheme}. Valid: [http, https]"
                )));
            }
        }
    }

    Ok(settings)
}

/// Persisted result of a successful setup flow.
///
/// Immutable once stored except through the reconfigure flow.
#[derive(serde::Deserialize, serde::Serialize)]
pub struct ConfigRecord {
    pub title: String,
    pub account: AccountSettings,
}

/// Store the config record created by the setup flow.
pub fn save_config_record(record: &ConfigRecord) -> Result<(), ServiceError> {
    fs::write(
        config_record_path(),
        serde_json::to_string_pretty(record)?,
    )
    .map_err(|e| {
        let msg = format!("Error saving config record: {e}");
        error!("{msg}");
        ServiceError::InternalServerError(msg)
    })?;
    Ok(())
}

/// Get the config record file path.
///
/// The record is located in the configuration directory specified in the env
/// variable `UC_CONFIG_HOME`. If not set, the current directory is used.
fn config_record_path() -> PathBuf {
    let file = env::var(ENV_USER_CFG_FILENAME).unwrap_or(DEF_USER_CFG_FILENAME.into());
    Path::new(&env::var(ENV_CONFIG_HOME).unwrap_or_default()).join(file)
}

/// Driver metadata compiled in from `resources/driver.json`.
#[derive(Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct DriverMetadata {
    pub driver_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub developer: Option<String>,
    pub version: Option<String>,
}

/// Deserialize and enhance driver information from compiled-in json data.
pub fn get_driver_metadata() -> Result<DriverMetadata, io::Error> {
    let mut driver: DriverMetadata = serde_json::from_str(DRIVER_METADATA).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid driver.json format: {e}"),
        )
    })?;

    if driver.driver_id.is_none() {
        driver.driver_id = Some("device-cloud".into())
    }
    if !driver
        .name
        .as_ref()
        .map(|v| !v.is_empty())
        .unwrap_or_default()
    {
        driver.name = Some("Device Cloud Bridge".into())
    }
    driver.version = Some(APP_VERSION.to_string());

    Ok(driver)
}
