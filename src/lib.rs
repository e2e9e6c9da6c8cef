// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

pub mod catalog;
pub mod client;
pub mod controller;
pub mod device;
pub mod diagnostics;
pub mod entity;
pub mod projector;
pub mod server;
pub mod util;

pub mod configuration;
pub mod errors;
pub mod startup;

pub use controller::*;
pub use startup::*;
