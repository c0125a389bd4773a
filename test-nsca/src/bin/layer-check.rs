// Copyright (C) 2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of nsca-output.
//
// nsca-output is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// nsca-output is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with nsca-output.  If
// not, see <http://www.gnu.org/licenses/>.

//! Test submitting checks for `tracing` events to an NSCA daemon on port 5667 on the local host.

use nsca_output::{
    config::CheckConfig, dispatcher::Dispatcher, layer::Layer, transport::SendNsca,
};
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{
    layer::SubscriberExt, // Needed to get `with()`
    registry::Registry,
};

pub fn main() {
    let config = CheckConfig::builder()
        .service_description_field("service")
        .return_code_field("status")
        .plugin_output_field("message")
        .build()
        .unwrap();
    // Setup the real subsriber...
    let subscriber = Registry::default().with(
        Layer::new(Dispatcher::new(config, SendNsca::default()))
            .with_min_level(tracing::Level::TRACE),
    );
    // and install it.
    let _guard = tracing::subscriber::set_default(subscriber);

    trace!(service = "layer-check", status = "OK", "Hello, 世界!");
    debug!(service = "layer-check", status = 0, "Hello, 世界!");
    info!(service = "layer-check", status = "UNKNOWN", "Hello, 世界!");
    warn!(service = "layer-check", status = "WARNING", "Hello, 世界!");
    error!(service = "layer-check", status = "CRITICAL", "Hello, 世界!");
}
