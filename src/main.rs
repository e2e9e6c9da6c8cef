// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

#![forbid(non_ascii_idents)]
#![deny(unsafe_code)]

use std::io;
use std::net::TcpListener;
use std::path::Path;
use std::rc::Rc;

use actix::Actor;
use actix_web::{App, HttpServer, middleware, web};
use clap::{Command, arg};
use log::info;

use uc_intg_devices::APP_VERSION;
use uc_intg_devices::client::{CloudApiClient, SharedVendorApi};
use uc_intg_devices::configuration::{DEF_CONFIG_FILE, get_configuration, get_driver_metadata};
use uc_intg_devices::controller::{ConnectMsg, Controller, VendorApiFactory};
use uc_intg_devices::server::{ServerState, routes};
use uc_intg_devices::startup::built_info;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let args = Command::new(built_info::PKG_NAME)
        .author("Unfolded Circle Aps")
        .version(APP_VERSION)
        .about("Device cloud integration driver")
        .arg(arg!(-c --config <FILE> "Configuration file").required(false))
        .get_matches();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg_file = match args.get_one::<String>("config").map(String::as_str) {
        None => {
            if Path::new(DEF_CONFIG_FILE).exists() {
                info!("Loading default configuration file: {DEF_CONFIG_FILE}");
                Some(DEF_CONFIG_FILE)
            } else {
                None
            }
        }
        Some(c) => Some(c),
    };
    let cfg = get_configuration(cfg_file).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to read configuration: {e}"),
        )
    })?;

    let driver_metadata = get_driver_metadata()?;

    if !cfg.integration.http.enabled {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "The http listener must be enabled",
        ));
    }
    let address = format!("{}:{}", cfg.integration.interface, cfg.integration.http.port);
    println!("{} listening on: {address}", built_info::PKG_NAME);
    let listener = TcpListener::bind(address)?;

    let configured = cfg.account.is_configured();
    let factory: VendorApiFactory =
        Box::new(|settings| Ok(Rc::new(CloudApiClient::new(settings)?) as SharedVendorApi));
    let controller = Controller::new(cfg, driver_metadata.clone(), factory).start();

    if configured {
        // connect in the background, entities appear after the first discovery
        controller.do_send(ConnectMsg::default());
    } else {
        info!("No account configured, waiting for setup");
    }

    let state = web::Data::new(ServerState {
        controller,
        metadata: driver_metadata,
    });

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            // limit size of the payload (global configuration)
            .app_data(web::JsonConfig::default().limit(16 * 1024))
            .app_data(state.clone())
            .configure(routes)
    })
    .workers(1)
    .listen(listener)?
    .run()
    .await?;

    Ok(())
}
