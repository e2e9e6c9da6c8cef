// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Central controller of the integration driver.
//!
//! The controller owns the vendor API session, the per-device projection
//! state and the polling coordinator. All interaction runs through actix
//! messages defined in [`messages`].

mod handler;
mod messages;

pub use messages::*;

use crate::catalog::{capabilities_of, describe};
use crate::client::SharedVendorApi;
use crate::client::model::DeviceRecord;
use crate::configuration::{AccountSettings, DriverMetadata, Settings};
use crate::device::{DeviceIdentity, RawStatePayload};
use crate::entity::{EntityAdapter, EntityChange};
use crate::errors::ServiceError;
use actix::{Actor, AsyncContext, Context, SpawnHandle};
use log::{debug, info, warn};
use rust_fsm::{StateMachine, state_machine};
use serde::Serialize;
use std::collections::HashMap;
use strum::Display;

state_machine! {
    derive(Debug)
    SetupFlow(Initial)

    Initial(Submit) => Validating,
    Validating => {
        Successful => Created,
        Failed => FormWithError,
    },
    FormWithError(Submit) => Validating,
}

/// Connection state of the vendor account session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Creates a vendor API client for the given account settings.
///
/// Injected into the controller so tests can substitute the REST client.
pub type VendorApiFactory = Box<dyn Fn(&AccountSettings) -> Result<SharedVendorApi, ServiceError>>;

/// Projection state of one discovered device: cached raw payload and the
/// entity adapters bound to its capabilities.
struct DeviceSession {
    identity: DeviceIdentity,
    payload: RawStatePayload,
    adapters: Vec<EntityAdapter>,
}

impl DeviceSession {
    fn new(record: &DeviceRecord) -> Self {
        let identity = DeviceIdentity::from(record);
        let mut adapters = Vec::new();
        match record.known_type() {
            Some(device_type) => {
                for key in capabilities_of(device_type) {
                    if let Some(descriptor) = describe(device_type, *key) {
                        adapters.push(EntityAdapter::new(&identity, descriptor));
                    }
                }
            }
            None => debug!(
                "Unsupported device type '{}' of {}: no entities created",
                record.device_type, record.id
            ),
        }

        Self {
            identity,
            payload: RawStatePayload::new(),
            adapters,
        }
    }
}

pub struct Controller {
    settings: Settings,
    drv_metadata: DriverMetadata,
    api_factory: VendorApiFactory,
    /// Active vendor API session, created lazily from the account settings.
    api: Option<SharedVendorApi>,
    /// Device sessions keyed by vendor device identifier.
    sessions: HashMap<String, DeviceSession>,
    device_state: DeviceState,
    setup_flow: StateMachine<SetupFlow>,
    poll_handle: Option<SpawnHandle>,
}

impl Controller {
    pub fn new(
        settings: Settings,
        drv_metadata: DriverMetadata,
        api_factory: VendorApiFactory,
    ) -> Self {
        Self {
            settings,
            drv_metadata,
            api_factory,
            api: None,
            sessions: HashMap::new(),
            device_state: DeviceState::Disconnected,
            setup_flow: StateMachine::new(),
            poll_handle: None,
        }
    }

    fn set_device_state(&mut self, state: DeviceState) {
        if self.device_state != state {
            info!("Device state: {state}");
            self.device_state = state;
        }
    }

    /// Get or lazily create the vendor API client from the account settings.
    fn vendor_api(&mut self) -> Result<SharedVendorApi, ServiceError> {
        if let Some(api) = &self.api {
            return Ok(api.clone());
        }
        if !self.settings.account.is_configured() {
            return Err(ServiceError::BadRequest(
                "Integration is not configured, setup required".into(),
            ));
        }
        let api = (self.api_factory)(&self.settings.account)?;
        self.api = Some(api.clone());
        Ok(api)
    }

    /// Fold a discovery result into the device sessions and re-run all
    /// projections against the fresh payloads.
    ///
    /// Devices appearing for the first time get a new session. Returns only
    /// actual state transitions: adapters suppress identical re-renders.
    fn apply_discovery(&mut self, records: Vec<DeviceRecord>) -> Vec<EntityChange> {
        let mut changes = Vec::new();
        for record in records {
            let session = self
                .sessions
                .entry(record.id.clone())
                .or_insert_with(|| DeviceSession::new(&record));
            session.payload = record.state;
            let payload = session.payload.clone();
            for adapter in &mut session.adapters {
                if let Some(change) = adapter.apply(&payload) {
                    changes.push(change);
                }
            }
        }
        changes
    }

    /// Render entity state changes for the host platform.
    fn broadcast_entity_changes(&self, changes: &[EntityChange]) {
        for change in changes {
            match serde_json::to_string(&change.attributes) {
                Ok(attributes) => info!("[{}] {attributes}", change.entity_id),
                Err(e) => warn!(
                    "[{}] attribute serialization failed: {e}",
                    change.entity_id
                ),
            }
        }
    }

    /// (Re)start the polling coordinator with the configured fixed interval.
    fn start_polling(&mut self, ctx: &mut Context<Self>) {
        self.stop_polling(ctx);
        let interval = self.settings.account.poll_interval;
        debug!("Starting polling coordinator, interval: {interval:?}");
        self.poll_handle = Some(ctx.run_interval(interval, |_, ctx| ctx.notify(RefreshMsg {})));
    }

    fn stop_polling(&mut self, ctx: &mut Context<Self>) {
        if let Some(handle) = self.poll_handle.take() {
            ctx.cancel_future(handle);
        }
    }
}

impl Actor for Controller {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!(
            "Controller started: {} {}",
            self.drv_metadata.name.as_deref().unwrap_or_default(),
            self.drv_metadata.version.as_deref().unwrap_or_default()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::VendorApi;
    use crate::client::model::{AccountInfo, MoveDirection};
    use crate::entity::EntityCommand;
    use futures::FutureExt;
    use futures::future::LocalBoxFuture;
    use serde_json::{Map, Value, json};
    use std::cell::RefCell;
    use std::rc::Rc;
    use url::Url;

    /// Scripted in-memory vendor API recording all mutating calls.
    #[derive(Default)]
    struct MockApi {
        devices: RefCell<Vec<DeviceRecord>>,
        calls: RefCell<Vec<String>>,
        account_error: RefCell<Option<ServiceError>>,
    }

    impl VendorApi for MockApi {
        fn account_info(&self) -> LocalBoxFuture<'static, Result<AccountInfo, ServiceError>> {
            let result = match self.account_error.borrow_mut().take() {
                Some(e) => Err(e),
                None => Ok(AccountInfo {
                    id: "acc-1".into(),
                    name: Some("Dummy Account".into()),
                    extra: Map::new(),
                }),
            };
            futures::future::ready(result).boxed_local()
        }

        fn account_snapshot(&self) -> LocalBoxFuture<'static, Result<Value, ServiceError>> {
            futures::future::ready(Ok(json!({
                "id": "acc-1",
                "name": "Dummy Account",
                "access_token": "secret-access-token"
            })))
            .boxed_local()
        }

        fn search_all_devices(
            &self,
        ) -> LocalBoxFuture<'static, Result<Vec<DeviceRecord>, ServiceError>> {
            futures::future::ready(Ok(self.devices.borrow().clone())).boxed_local()
        }

        fn device_points(
            &self,
            device_id: &str,
        ) -> LocalBoxFuture<'static, Result<Value, ServiceError>> {
            futures::future::ready(Ok(json!({
                "serial_number": format!("SN-{device_id}"),
                "consumption": 12.5
            })))
            .boxed_local()
        }

        fn move_shutter_direction(
            &self,
            device_id: &str,
            direction: MoveDirection,
        ) -> LocalBoxFuture<'static, Result<(), ServiceError>> {
            self.calls.borrow_mut().push(format!("move {device_id} {direction}"));
            futures::future::ready(Ok(())).boxed_local()
        }

        fn move_shutter_percentage(
            &self,
            device_id: &str,
            position: u8,
        ) -> LocalBoxFuture<'static, Result<(), ServiceError>> {
            self.calls
                .borrow_mut()
                .push(format!("position {device_id} {position}"));
            futures::future::ready(Ok(())).boxed_local()
        }

        fn disconnect(&self) -> LocalBoxFuture<'static, Result<(), ServiceError>> {
            self.calls.borrow_mut().push("disconnect".into());
            futures::future::ready(Ok(())).boxed_local()
        }
    }

    fn shutter_record(id: &str) -> DeviceRecord {
        serde_json::from_value(json!({
            "id": id,
            "name": "Shutter mock",
            "type": "shutter",
            "manufacturer": "Chacon",
            "model": "CERSwd-3B",
            "connected": true,
            "openlevel": 75,
            "movement": "stop"
        }))
        .unwrap()
    }

    fn push_payload(value: Value) -> RawStatePayload {
        value.as_object().unwrap().clone()
    }

    fn start_controller(api: Rc<MockApi>) -> actix::Addr<Controller> {
        let mut settings = Settings::default();
        settings.account.host = Some(Url::parse("https://cloud.example.com").unwrap());
        settings.account.token = Some("test-token".into());
        let factory: VendorApiFactory =
            Box::new(move |_| Ok(Rc::clone(&api) as SharedVendorApi));
        Controller::new(settings, DriverMetadata::default(), factory).start()
    }

    async fn entity_state(
        controller: &actix::Addr<Controller>,
        entity_id: &str,
    ) -> Option<EntityChange> {
        controller
            .send(GetEntityStatesMsg {})
            .await
            .unwrap()
            .into_iter()
            .find(|change| change.entity_id == entity_id)
    }

    #[actix_web::test]
    async fn discovery_command_and_push_update_cycle() {
        let api = Rc::new(MockApi::default());
        api.devices.borrow_mut().push(shutter_record("L4HActuator_idmock1"));
        let controller = start_controller(api.clone());

        controller.send(ConnectMsg::default()).await.unwrap().unwrap();
        assert_eq!(
            DeviceState::Connected,
            controller.send(GetDeviceStateMsg {}).await.unwrap()
        );

        let entities = controller.send(GetAvailableEntitiesMsg {}).await.unwrap();
        assert!(
            entities
                .iter()
                .any(|e| e.entity_id == "L4HActuator_idmock1_cover_position")
        );
        assert!(
            entities
                .iter()
                .any(|e| e.entity_id == "L4HActuator_idmock1_connectivity")
        );

        let cover = entity_state(&controller, "L4HActuator_idmock1_cover_position")
            .await
            .expect("cover state after discovery");
        assert_eq!(Some(&json!("OPEN")), cover.attributes.get("state"));
        assert_eq!(Some(&json!(75)), cover.attributes.get("position"));

        // a close command goes straight to the vendor API
        controller
            .send(EntityCommandMsg {
                command: EntityCommand {
                    entity_id: "L4HActuator_idmock1_cover_position".into(),
                    cmd_id: "close".into(),
                    params: None,
                },
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            vec!["move L4HActuator_idmock1 down".to_string()],
            api.calls.borrow().clone()
        );

        // no optimistic mutation: the visible state is unchanged until an update arrives
        let cover = entity_state(&controller, "L4HActuator_idmock1_cover_position")
            .await
            .unwrap();
        assert_eq!(Some(&json!("OPEN")), cover.attributes.get("state"));
        assert_eq!(Some(&json!(75)), cover.attributes.get("position"));

        controller
            .send(PushStateMsg {
                payload: push_payload(json!({
                    "id": "L4HActuator_idmock1",
                    "connected": true,
                    "openlevel": 79,
                    "movement": "stop"
                })),
            })
            .await
            .unwrap();
        let cover = entity_state(&controller, "L4HActuator_idmock1_cover_position")
            .await
            .unwrap();
        assert_eq!(Some(&json!("OPEN")), cover.attributes.get("state"));
        assert_eq!(Some(&json!(79)), cover.attributes.get("position"));
    }

    #[actix_web::test]
    async fn push_update_renders_movement_while_running() {
        let api = Rc::new(MockApi::default());
        api.devices.borrow_mut().push(shutter_record("L4HActuator_idmock1"));
        let controller = start_controller(api);

        controller.send(ConnectMsg::default()).await.unwrap().unwrap();
        controller
            .send(PushStateMsg {
                payload: push_payload(json!({
                    "id": "L4HActuator_idmock1",
                    "movement": "up",
                    "openlevel": 90
                })),
            })
            .await
            .unwrap();

        let cover = entity_state(&controller, "L4HActuator_idmock1_cover_position")
            .await
            .unwrap();
        assert_eq!(Some(&json!("OPENING")), cover.attributes.get("state"));
        assert_eq!(Some(&json!(90)), cover.attributes.get("position"));
    }

    #[actix_web::test]
    async fn push_update_for_unknown_device_is_discarded() {
        let api = Rc::new(MockApi::default());
        api.devices.borrow_mut().push(shutter_record("L4HActuator_idmock1"));
        let controller = start_controller(api);

        controller.send(ConnectMsg::default()).await.unwrap().unwrap();
        controller
            .send(PushStateMsg {
                payload: push_payload(json!({
                    "id": "no-such-device",
                    "movement": "up",
                    "openlevel": 10
                })),
            })
            .await
            .unwrap();

        // known device unaffected
        let cover = entity_state(&controller, "L4HActuator_idmock1_cover_position")
            .await
            .unwrap();
        assert_eq!(Some(&json!("OPEN")), cover.attributes.get("state"));
        assert_eq!(Some(&json!(75)), cover.attributes.get("position"));
    }

    #[actix_web::test]
    async fn commands_to_sensor_entities_are_rejected() {
        let api = Rc::new(MockApi::default());
        api.devices.borrow_mut().push(shutter_record("L4HActuator_idmock1"));
        let controller = start_controller(api.clone());
        controller.send(ConnectMsg::default()).await.unwrap().unwrap();

        let result = controller
            .send(EntityCommandMsg {
                command: EntityCommand {
                    entity_id: "L4HActuator_idmock1_connectivity".into(),
                    cmd_id: "open".into(),
                    params: None,
                },
            })
            .await
            .unwrap();
        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
        assert!(api.calls.borrow().is_empty());
    }

    #[actix_web::test]
    async fn diagnostics_snapshot_contains_no_secrets() {
        let api = Rc::new(MockApi::default());
        api.devices.borrow_mut().push(shutter_record("L4HActuator_idmock1"));
        api.devices.borrow_mut().push(shutter_record("L4HActuator_idmock2"));
        let controller = start_controller(api);
        controller.send(ConnectMsg::default()).await.unwrap().unwrap();

        let diagnostics = controller
            .send(GetDiagnosticsMsg {})
            .await
            .unwrap()
            .unwrap();

        let serialized = serde_json::to_string(&diagnostics).unwrap();
        assert!(serialized.contains("L4HActuator_idmock1"));
        assert!(serialized.contains("L4HActuator_idmock2"));
        assert!(serialized.contains(crate::diagnostics::REDACTED));
        assert!(!serialized.contains("secret-access-token"));
        assert!(!serialized.contains("SN-L4HActuator_idmock1"));
        assert!(!serialized.contains("test-token"));
    }

    #[actix_web::test]
    async fn connect_without_configuration_is_rejected() {
        let factory: VendorApiFactory =
            Box::new(|_| Ok(Rc::new(MockApi::default()) as SharedVendorApi));
        let controller =
            Controller::new(Settings::default(), DriverMetadata::default(), factory).start();

        let result = controller.send(ConnectMsg::default()).await.unwrap();
        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
        assert_eq!(
            DeviceState::Disconnected,
            controller.send(GetDeviceStateMsg {}).await.unwrap()
        );
    }

    #[actix_web::test]
    async fn setup_failure_then_resubmission_creates_entry() {
        let api = Rc::new(MockApi::default());
        api.account_error
            .borrow_mut()
            .replace(ServiceError::Unauthorized("bad token".into()));
        let controller = start_controller(api.clone());

        let result = controller
            .send(SetupRequestMsg {
                host: "cloud.example.com".into(),
                username: None,
                password: None,
                token: Some("test-token".into()),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            SetupFlowResult::Form {
                errors: SetupErrors {
                    base: SetupError::UnauthorizedToken
                }
            },
            result
        );

        // the flow allows a corrected resubmission
        let result = controller
            .send(SetupRequestMsg {
                host: "cloud.example.com".into(),
                username: None,
                password: None,
                token: Some("test-token".into()),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            SetupFlowResult::CreateEntry {
                title: "Dummy Account".into()
            },
            result
        );
    }

    #[actix_web::test]
    async fn setup_with_invalid_host_redisplays_form() {
        let api = Rc::new(MockApi::default());
        let controller = start_controller(api);

        let result = controller
            .send(SetupRequestMsg {
                host: "ftp://cloud.example.com".into(),
                username: Some("user".into()),
                password: Some("pass".into()),
                token: None,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            SetupFlowResult::Form {
                errors: SetupErrors {
                    base: SetupError::InvalidHost
                }
            },
            result
        );
    }
}
