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

//! Log records & their buffered representation.
//!
//! A [`Record`] is whatever structured data the upstream log pipeline hands us: a map from string
//! keys to arbitrary JSON-like values. It always travels with a tag (the pipeline's routing key)
//! and a timestamp; the triple is an [`Entry`].
//!
//! While waiting to be flushed, entries are kept in the buffering layer's wire format: a
//! [MessagePack] array `[tag, time, record]`, packed back-to-back into chunks. [`format`] produces
//! one such array and [`Entries`] walks a chunk of them.
//!
//! [MessagePack]: https://msgpack.org

use crate::error::{Error, Result};

use backtrace::Backtrace;
use chrono::prelude::*;
use serde_json::{Map, Value};

/// A structured log record. Key order is preserved, which matters when the whole record ends up
/// as a check's status text.
pub type Record = Map<String, Value>;

/// A record together with the tag & timestamp it was emitted with.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub tag: String,
    /// seconds since the Unix epoch
    pub time: i64,
    pub record: Record,
}

impl Entry {
    pub fn new<S: Into<String>>(tag: S, time: i64, record: Record) -> Entry {
        Entry {
            tag: tag.into(),
            time,
            record,
        }
    }
    /// The entry's timestamp, if it is representable.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.time, 0).single()
    }
}

/// Look up `key` in `record`.
///
/// A key that's missing, `null` or `false` is considered absent: none of those can meaningfully
/// override a configured default.
pub fn lookup<'a>(record: &'a Record, key: &str) -> Option<&'a Value> {
    record
        .get(key)
        .filter(|value| !matches!(value, Value::Null | Value::Bool(false)))
}

/// Render a record value as text: strings verbatim, anything else in compact JSON.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render an entire record as a compact JSON object, keys in their original order.
pub fn to_json(record: &Record) -> String {
    // Serializing a map of JSON values with string keys cannot fail.
    serde_json::to_string(record).unwrap_or_default()
}

/// Pack a (tag, time, record) triple into the buffering wire format.
pub fn format(tag: &str, time: i64, record: &Record) -> Result<Vec<u8>> {
    rmp_serde::to_vec(&(tag, time, record)).map_err(|err| Error::Encode {
        source: Box::new(err),
        back: Backtrace::new(),
    })
}

/// Iterate over the entries packed into a buffered chunk.
///
/// Iteration stops after the first malformed entry; there's no way to re-synchronize with a
/// MessagePack stream.
pub struct Entries<'a> {
    rest: &'a [u8],
}

impl<'a> Entries<'a> {
    pub fn new(chunk: &'a [u8]) -> Entries<'a> {
        Entries { rest: chunk }
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<Entry>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        // Reading through `&mut &[u8]` advances `rest` past the bytes consumed.
        match rmp_serde::from_read::<_, (String, i64, Record)>(&mut self.rest) {
            Ok((tag, time, record)) => Some(Ok(Entry { tag, time, record })),
            Err(err) => {
                self.rest = &[];
                Some(Err(Error::Decode {
                    source: Box::new(err),
                    back: Backtrace::new(),
                }))
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn record_from(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}
