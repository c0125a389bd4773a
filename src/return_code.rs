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

//! Service check return codes.
//!
//! A passive check carries one of four return codes, the same four a Nagios plugin exits with.
//! Configuration files & log records name them in a few different ways: as the integer itself,
//! as its decimal string, or by its symbolic name. [`ReturnCode::normalize`] maps each accepted
//! representation onto the canonical code, and nothing else.

use crate::error::{Error, Result};

use backtrace::Backtrace;
use serde_json::Value;

type StdResult<T, E> = std::result::Result<T, E>;

/// The four service states understood by Nagios & friends. The enumeration values are the
/// plugin exit codes, which is also what goes on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    /// the service is fine
    Ok = 0,
    /// the service is degraded
    Warning = 1,
    /// the service is down, or badly degraded
    Critical = 2,
    /// the check couldn't tell
    Unknown = 3,
}

impl std::default::Default for ReturnCode {
    /// Absent any other information, a check is `UNKNOWN`.
    fn default() -> Self {
        ReturnCode::Unknown
    }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                ReturnCode::Ok => "OK",
                ReturnCode::Warning => "WARNING",
                ReturnCode::Critical => "CRITICAL",
                ReturnCode::Unknown => "UNKNOWN",
            }
        )
    }
}

impl ReturnCode {
    /// Map an integer onto a return code; only 0 through 3 are accepted.
    pub fn from_int(n: i64) -> Option<ReturnCode> {
        match n {
            0 => Some(ReturnCode::Ok),
            1 => Some(ReturnCode::Warning),
            2 => Some(ReturnCode::Critical),
            3 => Some(ReturnCode::Unknown),
            _ => None,
        }
    }
    /// Map a textual representation onto a return code. Matching is exact & case-sensitive:
    /// "2" and "CRITICAL" are accepted, "critical", " 2" and "02" are not.
    pub fn from_text(s: &str) -> Option<ReturnCode> {
        match s {
            "0" | "OK" => Some(ReturnCode::Ok),
            "1" | "WARNING" => Some(ReturnCode::Warning),
            "2" | "CRITICAL" => Some(ReturnCode::Critical),
            "3" | "UNKNOWN" => Some(ReturnCode::Unknown),
            _ => None,
        }
    }
    /// Normalize any accepted representation of a return code; `None` means "unrecognized".
    ///
    /// Only integral numbers & strings are candidates: `2.0`, `true`, arrays & maps are all
    /// unrecognized.
    pub fn normalize(value: &Value) -> Option<ReturnCode> {
        match value {
            Value::Number(n) => n.as_i64().and_then(ReturnCode::from_int),
            Value::String(s) => ReturnCode::from_text(s),
            _ => None,
        }
    }
    /// The numeric code, as sent to the daemon.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl std::str::FromStr for ReturnCode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        ReturnCode::from_text(s).ok_or_else(|| Error::BadReturnCode {
            value: s.to_string(),
            back: Backtrace::new(),
        })
    }
}

impl std::convert::TryFrom<&Value> for ReturnCode {
    type Error = Error;
    fn try_from(value: &Value) -> Result<Self> {
        ReturnCode::normalize(value).ok_or_else(|| Error::BadReturnCode {
            value: match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            back: Backtrace::new(),
        })
    }
}

impl std::convert::From<ReturnCode> for Value {
    fn from(code: ReturnCode) -> Value {
        Value::from(code.code())
    }
}
