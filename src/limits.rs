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

//! Byte limits on the textual fields of a check.
//!
//! The NSCA packet reserves fixed-size slots for the host name, the service description and the
//! plugin output; `send_nsca` silently truncates anything longer. These limits are enforced here
//! twice: statically configured values that exceed them are rejected outright when the
//! configuration is built, while values resolved per record merely produce an
//! [`Advisory`](crate::resolver::Advisory).
//!
//! Lengths are always measured in bytes of the UTF-8 encoding, not in characters.

/// The maximum number of bytes in a host name.
pub const MAX_HOST_NAME_BYTES: usize = 64;

/// The maximum number of bytes in a service description.
pub const MAX_SERVICE_DESCRIPTION_BYTES: usize = 128;

/// The maximum number of bytes in a plugin output (the check's status text).
pub const MAX_PLUGIN_OUTPUT_BYTES: usize = 512;

/// The length-limited fields of a check.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    HostName,
    ServiceDescription,
    PluginOutput,
}

impl FieldKind {
    /// The maximum number of bytes a value of this kind may occupy.
    pub fn max_bytes(&self) -> usize {
        match self {
            FieldKind::HostName => MAX_HOST_NAME_BYTES,
            FieldKind::ServiceDescription => MAX_SERVICE_DESCRIPTION_BYTES,
            FieldKind::PluginOutput => MAX_PLUGIN_OUTPUT_BYTES,
        }
    }
    /// The name of the configuration option that sets a static value of this kind.
    pub fn option_name(&self) -> &'static str {
        match self {
            FieldKind::HostName => "host_name",
            FieldKind::ServiceDescription => "service_description",
            FieldKind::PluginOutput => "plugin_output",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                FieldKind::HostName => "Host name",
                FieldKind::ServiceDescription => "Service description",
                FieldKind::PluginOutput => "Plugin output",
            }
        )
    }
}

/// Return true if `value` is longer than `kind` permits; an absent value never is.
pub fn exceeds_limit(kind: FieldKind, value: Option<&str>) -> bool {
    value.map_or(false, |s| s.len() > kind.max_bytes())
}
