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

//! Forward structured log records to an [NSCA] daemon as passive service checks.
//!
//! [NSCA]: https://github.com/NagiosEnterprises/nsca
//!
//! # Introduction
//!
//! [Nagios] (and its descendants, [Icinga], [Naemon] & co.) mostly *poll*: they run a plugin,
//! look at its exit code & its first line of output, and update a service's state accordingly.
//! But they can also accept *passive* check results, submitted by whoever happens to know how a
//! service is doing. [NSCA] is the venerable daemon that accepts such results over the network;
//! its client, `send_nsca`, reads them on stdin, one per line.
//!
//! [Nagios]: https://www.nagios.org
//! [Icinga]: https://icinga.com
//! [Naemon]: https://www.naemon.io
//!
//! Log pipelines are full of records that say something about how a service is doing. This crate
//! turns each such record into one check result by resolving four things:
//!
//! - a host name, at most 64 bytes
//! - a service description, at most 128 bytes
//! - a [return code](return_code::ReturnCode): OK, WARNING, CRITICAL or UNKNOWN
//! - a status text (the "plugin output"), at most 512 bytes
//!
//! Each may be configured statically, taken from a named field of the record, or both (in which
//! case the record wins); see [`resolver`] for the details.
//!
//! # Usage
//!
//! A [`Dispatcher`](dispatcher::Dispatcher) pairs a validated [`CheckConfig`](config::CheckConfig)
//! with a [`Transport`](transport::Transport):
//!
//! ```no_run
//! use nsca_output::{
//!     config::CheckConfig, dispatcher::Dispatcher, record::Entry, transport::SendNsca,
//! };
//! use serde_json::json;
//!
//! let config = CheckConfig::builder()
//!     .server("monitor.example.com")
//!     .host_name_field("host")
//!     .service_description("ddos_monitor")
//!     .return_code("CRITICAL")
//!     .plugin_output("possible attacks")
//!     .build()
//!     .unwrap();
//! let dispatcher = Dispatcher::new(config, SendNsca::default());
//!
//! let record = json!({"host": "app.example.org"}).as_object().unwrap().clone();
//! let results = dispatcher.process(vec![Entry::new("ddos", 1420288496, record)]);
//! ```
//!
//! Will submit a CRITICAL result for service "ddos_monitor" on host "app.example.org".
//!
//! A buffering log shipper would instead [`format`](dispatcher::Dispatcher::format) records as
//! they arrive & [`write`](dispatcher::Dispatcher::write) whole chunks of them when flushing. An
//! application that logs through [`tracing`] can skip the shipper altogether & install
//! [`layer::Layer`].
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html

pub mod check;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod layer;
pub mod limits;
pub mod record;
pub mod resolver;
pub mod return_code;
pub mod transport;
