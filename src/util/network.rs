// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use std::time::Duration;

/// Create the HTTP client for vendor API requests.
///
/// Creating a client is expensive; one instance per vendor session is
/// sufficient and can be used for multiple concurrent requests.
pub fn new_http_client(request_timeout: Duration) -> awc::Client {
    awc::ClientBuilder::new().timeout(request_timeout).finish()
}
