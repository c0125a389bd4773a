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

//! The passive service check.

use crate::{
    config::CheckConfig,
    record::Record,
    resolver::Resolved,
    return_code::ReturnCode,
};

use bytes::BufMut;

/// Everything needed to submit one passive check: where to send it & what it says.
///
/// A [`CheckPayload`] is built in one go from a [`CheckConfig`] and a record, handed to a
/// [`Transport`](crate::transport::Transport) & dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckPayload {
    pub server: String,
    pub port: u16,
    pub password: String,
    pub host_name: String,
    pub service_description: String,
    pub return_code: ReturnCode,
    pub plugin_output: String,
}

impl CheckPayload {
    /// Resolve the check for `record`, emitted under `tag`.
    pub fn resolve(config: &CheckConfig, tag: &str, record: &Record) -> Resolved<CheckPayload> {
        let (host_name, mut advisories) = config.resolve_host_name(record).into_parts();
        let (service_description, more) = config
            .resolve_service_description(tag, record)
            .into_parts();
        advisories.extend(more);
        let (return_code, more) = config.resolve_return_code(record).into_parts();
        advisories.extend(more);
        let (plugin_output, more) = config.resolve_plugin_output(record).into_parts();
        advisories.extend(more);

        Resolved {
            value: CheckPayload {
                server: config.server().to_string(),
                port: config.port(),
                password: config.password().to_string(),
                host_name,
                service_description,
                return_code,
                plugin_output,
            },
            advisories,
        }
    }
    /// Render this check the way `send_nsca` reads them on stdin: host name, service
    /// description, return code & plugin output, tab-delimited & newline-terminated.
    ///
    /// The result is always exactly one line. Tabs & `send_nsca`'s block delimiter (ETB) become
    /// spaces in every field, as do line breaks in the host name & service description. Newlines
    /// in the plugin output become a literal `\n` (which Nagios understands as a line break in
    /// long output) and carriage returns are dropped.
    pub fn to_send_nsca_line(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            self.host_name.len() + self.service_description.len() + self.plugin_output.len() + 8,
        );
        buf.put_slice(single_line(&self.host_name).as_bytes());
        buf.put_u8(b'\t');
        buf.put_slice(single_line(&self.service_description).as_bytes());
        buf.put_u8(b'\t');
        buf.put_slice(self.return_code.code().to_string().as_bytes());
        buf.put_u8(b'\t');
        buf.put_slice(escape_long_output(&self.plugin_output).as_bytes());
        buf.put_u8(b'\n');
        buf
    }
}

/// ETB: `send_nsca` separates checks with it as well as with newlines.
const BLOCK_DELIMITER: char = '\x17';

fn single_line(s: &str) -> String {
    s.replace(['\t', '\r', '\n', BLOCK_DELIMITER], " ")
}

fn escape_long_output(s: &str) -> String {
    s.replace(['\t', BLOCK_DELIMITER], " ")
        .replace('\r', "")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{limits::FieldKind, record::record_from, resolver::Advisory};

    use serde_json::json;

    #[test]
    fn constant_values() {
        let config = CheckConfig::builder()
            .server("monitor.example.com")
            .port(4242)
            .password("aoxomoxoa")
            .host_name("web.example.org")
            .service_description("ddos_monitor")
            .return_code(2)
            .plugin_output("possible attacks")
            .build()
            .unwrap();
        let check = CheckPayload::resolve(&config, "ddos", &record_from(json!({"name": "Stephen"})));
        assert!(check.advisories.is_empty());
        assert_eq!(
            check.value,
            CheckPayload {
                server: "monitor.example.com".to_string(),
                port: 4242,
                password: "aoxomoxoa".to_string(),
                host_name: "web.example.org".to_string(),
                service_description: "ddos_monitor".to_string(),
                return_code: ReturnCode::Critical,
                plugin_output: "possible attacks".to_string(),
            }
        );
        assert_eq!(
            check.value.to_send_nsca_line(),
            b"web.example.org\tddos_monitor\t2\tpossible attacks\n".to_vec()
        );
    }

    #[test]
    fn advisories_accumulate() {
        let config = CheckConfig::builder()
            .host_name_field("host")
            .return_code_field("retcode")
            .build()
            .unwrap();
        let record = record_from(json!({"host": "h".repeat(70), "retcode": "bogus"}));
        let check = CheckPayload::resolve(&config, "ddos", &record);
        assert_eq!(check.advisories.len(), 2);
        assert!(matches!(
            check.advisories[0],
            Advisory::TooLong {
                kind: FieldKind::HostName,
                ..
            }
        ));
        assert!(matches!(
            check.advisories[1],
            Advisory::InvalidReturnCode { .. }
        ));
        assert_eq!(check.value.return_code, ReturnCode::Unknown);
        assert_eq!(check.value.service_description, "ddos");
    }

    #[test]
    fn send_nsca_line_escaping() {
        let check = CheckPayload {
            server: "localhost".to_string(),
            port: 5667,
            password: String::new(),
            host_name: "web\t1".to_string(),
            service_description: "disk".to_string(),
            return_code: ReturnCode::Warning,
            plugin_output: "DISK WARNING\r\n/var at 91%".to_string(),
        };
        assert_eq!(
            check.to_send_nsca_line(),
            b"web 1\tdisk\t1\tDISK WARNING\\n/var at 91%\n".to_vec()
        );
    }

    #[test]
    fn record_data_cannot_split_the_line() {
        let config = CheckConfig::builder()
            .host_name_field("host")
            .service_description_field("service")
            .plugin_output_field("status")
            .return_code(2)
            .build()
            .unwrap();
        for record in [
            json!({"host": "a\nvictim.example.org", "service": "svc", "status": "down"}),
            json!({"host": "web", "service": "svc\r\nvictim\tother", "status": "down"}),
            json!({"host": "web", "service": "svc", "status": "down\nvictim\tsvc\t0\tok"}),
            json!({"host": "web\u{17}victim", "service": "svc", "status": "x\u{17}y"}),
        ] {
            let line = CheckPayload::resolve(&config, "ddos", &record_from(record))
                .value
                .to_send_nsca_line();
            let text = String::from_utf8(line).unwrap();
            assert_eq!(text.lines().count(), 1, "{:?}", text);
            assert!(text.ends_with('\n'));
            assert!(!text.contains('\u{17}'));
            // exactly four fields
            assert_eq!(text.trim_end_matches('\n').split('\t').count(), 4, "{:?}", text);
        }

        let check = CheckPayload::resolve(
            &config,
            "ddos",
            &record_from(json!({"host": "a\nvictim.example.org", "service": "svc", "status": "down"})),
        )
        .value;
        assert_eq!(
            check.to_send_nsca_line(),
            b"a victim.example.org\tsvc\t2\tdown\n".to_vec()
        );
    }
}
