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

//! Check configuration.
//!
//! Configuration comes in two stages. [`Options`] is the raw configuration surface, exactly as an
//! operator writes it (typically as TOML); it is infallibly constructible & carries no
//! guarantees. [`CheckConfig`] is the validated form: building one resolves the local host name
//! (if need be), normalizes the return code & rejects static values the check protocol can't
//! carry. A [`CheckConfig`] is immutable once built, so it may be shared freely between threads.
//!
//! # Examples
//!
//! ```rust
//! use nsca_output::config::{CheckConfig, Options};
//! use nsca_output::return_code::ReturnCode;
//!
//! let opts = Options::from_toml(
//!     r#"
//!     server = "monitor.example.com"
//!     port = 4242
//!     host_name = "web.example.org"
//!     return_code = "CRITICAL"
//!     "#,
//! )
//! .unwrap();
//! let config = CheckConfig::new(opts).unwrap();
//! assert_eq!(config.return_code(), ReturnCode::Critical);
//! ```
//!
//! or, equivalently:
//!
//! ```rust
//! use nsca_output::config::CheckConfig;
//!
//! let config = CheckConfig::builder()
//!     .server("monitor.example.com")
//!     .port(4242)
//!     .host_name("web.example.org")
//!     .return_code("CRITICAL")
//!     .build()
//!     .unwrap();
//! ```

use crate::{
    error::{Error, Result},
    limits::{exceeds_limit, FieldKind},
    return_code::ReturnCode,
};

use backtrace::Backtrace;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use std::time::Duration;

/// The port on which NSCA daemons conventionally listen.
pub const DEFAULT_PORT: u16 = 5667;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         struct Options                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The raw configuration surface.
///
/// Each `*_field` option names a record key whose value, when present, overrides the
/// corresponding static option for that record.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Options {
    /// The IP address or host name of the host running the NSCA daemon
    pub server: String,
    /// The port on which the NSCA daemon is listening
    pub port: u16,
    /// The password for authentication & encryption
    pub password: String,
    /// The host name to report; defaults to the name of the local machine
    pub host_name: Option<String>,
    pub host_name_field: Option<String>,
    /// The service description to report; defaults to the record's tag
    pub service_description: Option<String>,
    pub service_description_field: Option<String>,
    /// The return code to report: 0, 1, 2, 3, "0" through "3", "OK", "WARNING", "CRITICAL" or
    /// "UNKNOWN"; defaults to UNKNOWN
    pub return_code: Value,
    pub return_code_field: Option<String>,
    /// The status text to report; defaults to the JSON notation of the record
    pub plugin_output: Option<String>,
    pub plugin_output_field: Option<String>,
    /// How often the buffering layer should flush; either a number of seconds or a string like
    /// "30s", "5m", "1h"
    #[serde(deserialize_with = "deserialize_interval")]
    pub flush_interval: Duration,
}

impl std::default::Default for Options {
    fn default() -> Self {
        Options {
            server: String::from("localhost"),
            port: DEFAULT_PORT,
            password: String::new(),
            host_name: None,
            host_name_field: None,
            service_description: None,
            service_description_field: None,
            return_code: Value::from(ReturnCode::Unknown),
            return_code_field: None,
            plugin_output: None,
            plugin_output_field: None,
            flush_interval: Duration::from_secs(1),
        }
    }
}

impl Options {
    /// Read [`Options`] from TOML text; any option not mentioned takes its default.
    pub fn from_toml(text: &str) -> Result<Options> {
        toml::from_str(text).map_err(|err| Error::Config {
            source: Box::new(err),
            back: Backtrace::new(),
        })
    }
}

/// Parse a time interval: a non-negative number, optionally suffixed by one of `s`, `m`, `h` or
/// `d`. A bare number is taken to be seconds.
pub fn parse_interval(text: &str) -> Result<Duration> {
    let bad = || Error::BadFlushInterval {
        text: text.to_string(),
        back: Backtrace::new(),
    };
    let text = text.trim();
    let (number, scale) = match text.char_indices().last() {
        Some((i, 's')) => (&text[..i], 1.0),
        Some((i, 'm')) => (&text[..i], 60.0),
        Some((i, 'h')) => (&text[..i], 3600.0),
        Some((i, 'd')) => (&text[..i], 86400.0),
        Some(_) => (text, 1.0),
        None => return Err(bad()),
    };
    let secs = number.parse::<f64>().map_err(|_| bad())? * scale;
    // rejects negative, non-finite & overflowing values alike
    Duration::try_from_secs_f64(secs).map_err(|_| bad())
}

fn deserialize_interval<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Interval {
        Seconds(u64),
        Text(String),
    }

    match Interval::deserialize(deserializer)? {
        Interval::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Interval::Text(text) => parse_interval(&text).map_err(serde::de::Error::custom),
    }
}

/// Figure out the name of the local host.
///
/// This prefers [gethostname()]; should that fail (or return something that isn't UTF-8), it
/// falls back to the local IP address.
///
/// [gethostname()]: https://man7.org/linux/man-pages/man2/gethostname.2.html
pub fn local_host_name() -> Result<String> {
    hostname::get()
        .map_err(|err| Error::NoHostname {
            source: Box::new(err),
            back: Backtrace::new(),
        })
        // :=> Result<String>
        .and_then(|hn| {
            hn.into_string().map_err(|hn| Error::NoHostname {
                source: format!("host name {:?} is not valid UTF-8", hn).into(),
                back: Backtrace::new(),
            })
        })
        .or_else(|_err| {
            local_ip_address::local_ip()
                .map(|ip| ip.to_string())
                .map_err(|err| Error::NoHostname {
                    source: Box::new(err),
                    back: Backtrace::new(),
                })
        })
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       struct CheckConfig                                       //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Validated, immutable check configuration.
#[derive(Clone, Debug)]
pub struct CheckConfig {
    server: String,
    port: u16,
    password: String,
    host_name: String,
    host_name_field: Option<String>,
    service_description: Option<String>,
    service_description_field: Option<String>,
    return_code: ReturnCode,
    return_code_field: Option<String>,
    plugin_output: Option<String>,
    plugin_output_field: Option<String>,
    flush_interval: Duration,
}

fn reject_exceeding_max_bytes(kind: FieldKind, value: Option<&str>) -> Result<()> {
    if exceeds_limit(kind, value) {
        Err(Error::FieldTooLong {
            kind,
            len: value.map_or(0, str::len),
            back: Backtrace::new(),
        })
    } else {
        Ok(())
    }
}

impl CheckConfig {
    /// Validate `opts`.
    ///
    /// Fails if the return code isn't recognized, or if the host name (whether configured or
    /// discovered), the service description or the plugin output exceeds its byte limit.
    pub fn new(opts: Options) -> Result<CheckConfig> {
        let return_code = ReturnCode::try_from(&opts.return_code)?;
        let host_name = match opts.host_name {
            Some(host_name) => host_name,
            None => local_host_name()?,
        };
        reject_exceeding_max_bytes(FieldKind::HostName, Some(host_name.as_str()))?;
        reject_exceeding_max_bytes(
            FieldKind::ServiceDescription,
            opts.service_description.as_deref(),
        )?;
        reject_exceeding_max_bytes(FieldKind::PluginOutput, opts.plugin_output.as_deref())?;

        Ok(CheckConfig {
            server: opts.server,
            port: opts.port,
            password: opts.password,
            host_name,
            host_name_field: opts.host_name_field,
            service_description: opts.service_description,
            service_description_field: opts.service_description_field,
            return_code,
            return_code_field: opts.return_code_field,
            plugin_output: opts.plugin_output,
            plugin_output_field: opts.plugin_output_field,
            flush_interval: opts.flush_interval,
        })
    }
    pub fn builder() -> CheckConfigBuilder {
        CheckConfigBuilder {
            opts: Options::default(),
        }
    }
    pub fn server(&self) -> &str {
        &self.server
    }
    pub fn port(&self) -> u16 {
        self.port
    }
    pub fn password(&self) -> &str {
        &self.password
    }
    /// The static host name; this is the local host's name unless one was configured.
    pub fn host_name(&self) -> &str {
        &self.host_name
    }
    pub fn host_name_field(&self) -> Option<&str> {
        self.host_name_field.as_deref()
    }
    pub fn service_description(&self) -> Option<&str> {
        self.service_description.as_deref()
    }
    pub fn service_description_field(&self) -> Option<&str> {
        self.service_description_field.as_deref()
    }
    pub fn return_code(&self) -> ReturnCode {
        self.return_code
    }
    pub fn return_code_field(&self) -> Option<&str> {
        self.return_code_field.as_deref()
    }
    pub fn plugin_output(&self) -> Option<&str> {
        self.plugin_output.as_deref()
    }
    pub fn plugin_output_field(&self) -> Option<&str> {
        self.plugin_output_field.as_deref()
    }
    /// How often the buffering layer should flush; this crate never acts on it.
    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }
}

impl std::convert::TryFrom<Options> for CheckConfig {
    type Error = Error;
    fn try_from(opts: Options) -> Result<Self> {
        CheckConfig::new(opts)
    }
}

/// Assemble a [`CheckConfig`] option-by-option; validation happens in [`build`].
///
/// [`build`]: CheckConfigBuilder::build
pub struct CheckConfigBuilder {
    opts: Options,
}

impl CheckConfigBuilder {
    pub fn server<S: Into<String>>(mut self, server: S) -> Self {
        self.opts.server = server.into();
        self
    }
    pub fn port(mut self, port: u16) -> Self {
        self.opts.port = port;
        self
    }
    pub fn password<S: Into<String>>(mut self, password: S) -> Self {
        self.opts.password = password.into();
        self
    }
    pub fn host_name<S: Into<String>>(mut self, host_name: S) -> Self {
        self.opts.host_name = Some(host_name.into());
        self
    }
    pub fn host_name_field<S: Into<String>>(mut self, field: S) -> Self {
        self.opts.host_name_field = Some(field.into());
        self
    }
    pub fn service_description<S: Into<String>>(mut self, service_description: S) -> Self {
        self.opts.service_description = Some(service_description.into());
        self
    }
    pub fn service_description_field<S: Into<String>>(mut self, field: S) -> Self {
        self.opts.service_description_field = Some(field.into());
        self
    }
    /// Accepts any representation [`ReturnCode::normalize`] does: `2`, `"2"`, `"CRITICAL"`...
    pub fn return_code<V: Into<Value>>(mut self, return_code: V) -> Self {
        self.opts.return_code = return_code.into();
        self
    }
    pub fn return_code_field<S: Into<String>>(mut self, field: S) -> Self {
        self.opts.return_code_field = Some(field.into());
        self
    }
    pub fn plugin_output<S: Into<String>>(mut self, plugin_output: S) -> Self {
        self.opts.plugin_output = Some(plugin_output.into());
        self
    }
    pub fn plugin_output_field<S: Into<String>>(mut self, field: S) -> Self {
        self.opts.plugin_output_field = Some(field.into());
        self
    }
    pub fn flush_interval(mut self, flush_interval: Duration) -> Self {
        self.opts.flush_interval = flush_interval;
        self
    }
    pub fn build(self) -> Result<CheckConfig> {
        CheckConfig::new(self.opts)
    }
}
