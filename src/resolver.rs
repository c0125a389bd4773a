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

//! Resolving the fields of a check from a record.
//!
//! Each of the four variable fields of a check (host name, service description, return code &
//! plugin output) is resolved the same way, highest precedence first:
//!
//! 1. if a `*_field` option is configured & the record carries a value under that key, use it
//! 2. otherwise, if a static value is configured, use that
//! 3. otherwise, fall back to a field-specific default: the local host name, the record's tag,
//!    UNKNOWN, or the JSON notation of the entire record, respectively
//!
//! Resolution never fails. Anything worth complaining about (a value too long for the wire, a
//! return code we don't recognize) is reported as an [`Advisory`] alongside the resolved value;
//! it's up to the caller to log it. Oversized values are returned untruncated: `send_nsca` will
//! do the truncating.

use crate::{
    config::CheckConfig,
    limits::{exceeds_limit, FieldKind},
    record::{lookup, to_json, to_text, Record},
    return_code::ReturnCode,
};

use serde_json::Value;

/// A non-fatal complaint about a record.
#[derive(Clone, Debug, PartialEq)]
pub enum Advisory {
    /// A resolved value exceeds its byte limit & will be truncated downstream
    TooLong { kind: FieldKind, value: String },
    /// The record's return code field held something unrecognizable
    InvalidReturnCode {
        field: String,
        value: Value,
        fall_back_to: ReturnCode,
    },
}

impl Advisory {
    /// Emit this advisory as a `WARN` event.
    pub fn log(&self) {
        match self {
            Advisory::TooLong { kind, value } => {
                tracing::warn!(
                    field = kind.option_name(),
                    max_bytes = kind.max_bytes(),
                    value = %value,
                    "{} exceeds the max bytes; it will be truncated.",
                    kind
                );
            }
            Advisory::InvalidReturnCode {
                field,
                value,
                fall_back_to,
            } => {
                tracing::warn!(
                    return_code_field = %field,
                    value = %value,
                    fall_back_to = %fall_back_to,
                    "Invalid return code."
                );
            }
        }
    }
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advisory::TooLong { kind, value } => write!(
                f,
                "{} exceeds the max bytes ({}); it will be truncated: {}",
                kind,
                kind.max_bytes(),
                value
            ),
            Advisory::InvalidReturnCode {
                field,
                value,
                fall_back_to,
            } => write!(
                f,
                "Invalid return code {} in field '{}'; falling back to {}",
                value, field, fall_back_to
            ),
        }
    }
}

/// A resolved value, along with any advisories produced while resolving it.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub advisories: Vec<Advisory>,
}

impl<T> Resolved<T> {
    fn clean(value: T) -> Resolved<T> {
        Resolved {
            value,
            advisories: Vec::new(),
        }
    }
    pub fn into_parts(self) -> (T, Vec<Advisory>) {
        (self.value, self.advisories)
    }
}

impl Resolved<String> {
    /// Resolve to `value`, complaining if it's too long to be a `kind`.
    fn checked(kind: FieldKind, value: String) -> Resolved<String> {
        let advisories = if exceeds_limit(kind, Some(value.as_str())) {
            vec![Advisory::TooLong {
                kind,
                value: value.clone(),
            }]
        } else {
            Vec::new()
        };
        Resolved { value, advisories }
    }
}

fn field_value<'a>(field: Option<&str>, record: &'a Record) -> Option<&'a Value> {
    field.and_then(|key| lookup(record, key))
}

impl CheckConfig {
    /// Resolve the host name for `record`.
    ///
    /// The static fallback is always present: when no host name is configured, it's the name of
    /// the local host as discovered at configuration time.
    pub fn resolve_host_name(&self, record: &Record) -> Resolved<String> {
        match field_value(self.host_name_field(), record) {
            Some(value) => Resolved::checked(FieldKind::HostName, to_text(value)),
            None => Resolved::clean(self.host_name().to_string()),
        }
    }
    /// Resolve the service description for a record emitted under `tag`.
    pub fn resolve_service_description(&self, tag: &str, record: &Record) -> Resolved<String> {
        match field_value(self.service_description_field(), record) {
            Some(value) => Resolved::checked(FieldKind::ServiceDescription, to_text(value)),
            None => match self.service_description() {
                Some(service_description) => Resolved::clean(service_description.to_string()),
                None => Resolved::checked(FieldKind::ServiceDescription, tag.to_string()),
            },
        }
    }
    /// Resolve the return code for `record`.
    ///
    /// An unrecognized value in the record doesn't override the configured return code; it's
    /// reported & ignored.
    pub fn resolve_return_code(&self, record: &Record) -> Resolved<ReturnCode> {
        let fall_back_to = self.return_code();
        match (self.return_code_field(), field_value(self.return_code_field(), record)) {
            (Some(field), Some(value)) => match ReturnCode::normalize(value) {
                Some(return_code) => Resolved::clean(return_code),
                None => Resolved {
                    value: fall_back_to,
                    advisories: vec![Advisory::InvalidReturnCode {
                        field: field.to_string(),
                        value: value.clone(),
                        fall_back_to,
                    }],
                },
            },
            _ => Resolved::clean(fall_back_to),
        }
    }
    /// Resolve the plugin output (the check's status text) for `record`.
    pub fn resolve_plugin_output(&self, record: &Record) -> Resolved<String> {
        match field_value(self.plugin_output_field(), record) {
            Some(value) => Resolved::checked(FieldKind::PluginOutput, to_text(value)),
            None => match self.plugin_output() {
                Some(plugin_output) => Resolved::clean(plugin_output.to_string()),
                None => Resolved::checked(FieldKind::PluginOutput, to_json(record)),
            },
        }
    }
}
