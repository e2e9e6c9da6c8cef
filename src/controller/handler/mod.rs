// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Message handler implementations of the controller actor.

mod command;
mod connection;
mod diagnostics;
mod entities;
mod event;
mod setup;
