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

//! A [`tracing-subscriber`] [`Layer`] that submits [`Event`]s as passive checks.
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html
//!
//! The [`tracing`] crate is a perfectly good source of structured log records in its own right, so
//! rather than requiring a separate log shipper, an application can install [`Layer`] & have its
//! own events turned into checks in-process. Each event becomes a [`Record`] holding the event's
//! level under `level` followed by each of its fields (including `message`); its target serves as
//! the tag. From there, it is resolved & sent exactly as a buffered record would be.
//!
//! ```no_run
//! use nsca_output::{
//!     config::CheckConfig, dispatcher::Dispatcher, layer::Layer, transport::SendNsca,
//! };
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//!
//! let config = CheckConfig::builder()
//!     .server("monitor.example.com")
//!     .service_description_field("service")
//!     .return_code_field("status")
//!     .plugin_output_field("message")
//!     .build()
//!     .unwrap();
//! let subscriber = tracing_subscriber::registry()
//!     .with(Layer::new(Dispatcher::new(config, SendNsca::default())));
//! tracing::subscriber::set_global_default(subscriber).unwrap();
//!
//! tracing::warn!(service = "disk", status = "WARNING", "/var is 91% full");
//! ```
//!
//! Events originating in this crate (advisories, transport failures) are never forwarded.
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html

use crate::{
    dispatcher::Dispatcher,
    record::Record,
    transport::Transport,
};

use chrono::prelude::*;
use serde_json::Value;
use tracing::Event;
use tracing_subscriber::layer::Context;

// When the tracing-log feature is enabled, use NormalizeEvent to extract the metadata of events
// that originated from the `log` crate; otherwise their target would always be "log".
#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;

/// Builds a [`Record`] from an [`Event`]'s fields.
struct RecordVisitor {
    record: Record,
}

impl tracing::field::Visit for RecordVisitor {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.record.insert(field.name().to_string(), Value::from(value));
    }
    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.record.insert(field.name().to_string(), Value::from(value));
    }
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.record.insert(field.name().to_string(), Value::from(value));
    }
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.record.insert(field.name().to_string(), Value::from(value));
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.record.insert(field.name().to_string(), Value::from(value));
    }
    fn record_error(
        &mut self,
        field: &tracing::field::Field,
        value: &(dyn std::error::Error + 'static),
    ) {
        self.record
            .insert(field.name().to_string(), Value::from(value.to_string()));
    }
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        // The `message` field arrives as a pre-formatted `std::fmt::Arguments`, whose debug
        // format carries no enclosing double-quotes.
        self.record
            .insert(field.name().to_string(), Value::from(format!("{:?}", value)));
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          struct Layer                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A [`tracing-subscriber`]-compliant [`Layer`] implementation that submits each [`Event`] at
/// or above a given level as a passive check.
///
/// [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
/// [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html
pub struct Layer<T: Transport> {
    dispatcher: Dispatcher<T>,
    min_level: tracing::Level,
}

impl<T: Transport> Layer<T> {
    /// Construct a [`Layer`] that forwards events at `INFO` & above.
    pub fn new(dispatcher: Dispatcher<T>) -> Self {
        Layer {
            dispatcher,
            min_level: tracing::Level::INFO,
        }
    }
    /// Forward only events at `level` or above.
    pub fn with_min_level(mut self, level: tracing::Level) -> Self {
        self.min_level = level;
        self
    }
    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }
}

impl<S, T> tracing_subscriber::layer::Layer<S> for Layer<T>
where
    S: tracing::Subscriber,
    T: Transport + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        #[cfg(feature = "tracing-log")]
        let normalized_meta = event.normalized_metadata();
        #[cfg(feature = "tracing-log")]
        let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
        #[cfg(not(feature = "tracing-log"))]
        let meta = event.metadata();

        // `tracing::Level` orders more verbose levels as greater
        if *meta.level() > self.min_level || is_own_target(meta.target()) {
            return;
        }

        let mut visitor = RecordVisitor {
            record: Record::new(),
        };
        visitor
            .record
            .insert("level".to_string(), Value::from(meta.level().to_string()));
        event.record(&mut visitor);

        // Failures were already reported by the dispatcher; all that's left to do is drop them.
        let _ = self
            .dispatcher
            .dispatch(meta.target(), Utc::now().timestamp(), &visitor.record);
    }
}

/// True for events logged by this crate (from which checks must not be made, lest they beget more
/// events).
fn is_own_target(target: &str) -> bool {
    const CRATE: &str = env!("CARGO_CRATE_NAME");
    target
        .strip_prefix(CRATE)
        .map_or(false, |rest| rest.is_empty() || rest.starts_with("::"))
}
