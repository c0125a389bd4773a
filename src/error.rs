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

//! [nsca-output](crate) errors

use crate::limits::FieldKind;

use backtrace::Backtrace;

/// [nsca-output](crate) error type
///
/// Like its sibling crates, [nsca-output](crate) eschews libraries like [thiserror] & [anyhow] in
/// favor of a straightforward enumeration with a few match arms chosen on the basis of what the
/// caller will need to respond.
///
/// Note that errors raised by a [`Transport`](crate::transport::Transport) implementation while
/// sending a check never show up here: they are handed back to the caller untouched, one per
/// record.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
#[non_exhaustive]
pub enum Error {
    /// A statically configured field exceeds the number of bytes the check protocol can carry
    FieldTooLong {
        kind: FieldKind,
        len: usize,
        back: Backtrace,
    },
    /// The configured return code is not one of the accepted representations
    BadReturnCode { value: String, back: Backtrace },
    /// The configured flush interval couldn't be parsed
    BadFlushInterval { text: String, back: Backtrace },
    /// Failed to fetch hostname (via libc) and couldn't find a local IP address either
    NoHostname {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// The configuration text couldn't be parsed
    Config {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// Failed to pack a (tag, time, record) triple
    Encode {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// Failed to unpack a (tag, time, record) triple from a buffered chunk
    Decode {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// General transport layer error
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::FieldTooLong { kind, .. } => write!(
                f,
                "{} must not exceed {} bytes",
                kind.option_name(),
                kind.max_bytes()
            ),
            Error::BadReturnCode { value, .. } => write!(
                f,
                "invalid 'return_code': {}; 'return_code' must be 0, 1, 2, 3, OK, WARNING, \
                 CRITICAL, or UNKNOWN",
                value
            ),
            Error::BadFlushInterval { text, .. } => {
                write!(f, "invalid 'flush_interval': {}", text)
            }
            Error::NoHostname { source, .. } => {
                write!(f, "Couldn't determine the local host name: {}", source)
            }
            Error::Config { source, .. } => write!(f, "Bad configuration: {}", source),
            Error::Encode { source, .. } => write!(f, "While packing a record, got {}", source),
            Error::Decode { source, .. } => write!(f, "While unpacking a chunk, got {}", source),
            Error::Transport { source, .. } => write!(f, "Transport error: {}", source),
            _ => write!(f, "Other nsca-output error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::FieldTooLong { len, back, .. } => {
                write!(f, "{} (got {} bytes)\n{:?}", self, len, back)
            }
            Error::BadReturnCode { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::BadFlushInterval { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::NoHostname { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Config { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Encode { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Decode { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Transport { back, .. } => write!(f, "{}\n{:?}", self, back),
            err => write!(f, "nsca-output error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
