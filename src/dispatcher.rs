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

//! Turning buffered records into checks.
//!
//! [`Dispatcher`] is the piece the upstream buffering layer talks to. It offers the two entry
//! points such a layer needs: [`format`](Dispatcher::format), to pack an incoming record for
//! buffering, and [`write`](Dispatcher::write), to flush a buffered chunk as one check per
//! record. [`process`](Dispatcher::process) & [`dispatch`](Dispatcher::dispatch) do the same for
//! callers that already hold decoded [`Entry`]s.
//!
//! Records are handled strictly one after another, in the order given; the results come back in
//! that same order. A failure to send one check has no effect on the others.

use crate::{
    check::CheckPayload,
    config::CheckConfig,
    error::Result,
    record::{self, Entries, Entry, Record},
    transport::Transport,
};

use std::borrow::Borrow;

type StdResult<T, E> = std::result::Result<T, E>;

/// The result of sending one check: exactly what the [`Transport`] returned.
pub type CheckResult<T> = StdResult<<T as Transport>::Output, <T as Transport>::Error>;

/// Map records to checks under a fixed [`CheckConfig`] & send them over `T`.
pub struct Dispatcher<T: Transport> {
    config: CheckConfig,
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(config: CheckConfig, transport: T) -> Dispatcher<T> {
        Dispatcher { config, transport }
    }
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }
    pub fn transport(&self) -> &T {
        &self.transport
    }
    /// Pack a (tag, time, record) triple for buffering.
    pub fn format(&self, tag: &str, time: i64, record: &Record) -> Result<Vec<u8>> {
        record::format(tag, time, record)
    }
    /// Resolve & send the check for one record.
    ///
    /// Advisories raised while resolving are logged at `WARN`; they never stop the check from
    /// going out.
    pub fn dispatch(&self, tag: &str, time: i64, record: &Record) -> CheckResult<T> {
        let (check, advisories) = CheckPayload::resolve(&self.config, tag, record).into_parts();
        advisories.iter().for_each(|advisory| advisory.log());
        tracing::trace!(
            tag,
            time,
            host_name = %check.host_name,
            service_description = %check.service_description,
            return_code = check.return_code.code(),
            "sending check"
        );
        self.transport.send(&check).map_err(|err| {
            tracing::debug!(
                tag,
                time,
                error = %err,
                "failed to send check"
            );
            err
        })
    }
    /// Send one check per entry, in order.
    pub fn process<I>(&self, entries: I) -> Vec<CheckResult<T>>
    where
        I: IntoIterator,
        I::Item: Borrow<Entry>,
    {
        entries
            .into_iter()
            .map(|entry| {
                let entry = entry.borrow();
                self.dispatch(&entry.tag, entry.time, &entry.record)
            })
            .collect()
    }
    /// Send one check per entry in a buffered chunk (as produced by concatenating the output of
    /// [`format`](Dispatcher::format)).
    ///
    /// The chunk is decoded in full before anything is sent: a malformed chunk fails as a whole,
    /// without sending a single check.
    pub fn write(&self, chunk: &[u8]) -> Result<Vec<CheckResult<T>>> {
        let entries = Entries::new(chunk).collect::<Result<Vec<Entry>>>()?;
        Ok(self.process(entries))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{error::Error, record::record_from, return_code::ReturnCode};

    use backtrace::Backtrace;
    use serde_json::json;

    use std::sync::{Arc, Mutex};

    // 2015-01-03 12:34:56 UTC
    const TIME: i64 = 1_420_288_496;

    type Sent = (String, u16, String, String, String, u8, String);

    /// Instead of sending the check, return it as a tuple; refuse any check for
    /// "down.example.org"
    struct Recorder;

    impl Transport for Recorder {
        type Output = Sent;
        type Error = Error;
        fn send(&self, check: &CheckPayload) -> Result<Sent> {
            if check.host_name == "down.example.org" {
                return Err(Error::Transport {
                    source: "connection refused".into(),
                    back: Backtrace::new(),
                });
            }
            Ok((
                check.server.clone(),
                check.port,
                check.password.clone(),
                check.host_name.clone(),
                check.service_description.clone(),
                check.return_code.code(),
                check.plugin_output.clone(),
            ))
        }
    }

    fn sent(host_name: &str, service: &str, code: u8, output: &str) -> Sent {
        (
            "monitor.example.com".to_string(),
            4242,
            "aoxomoxoa".to_string(),
            host_name.to_string(),
            service.to_string(),
            code,
            output.to_string(),
        )
    }

    fn base() -> crate::config::CheckConfigBuilder {
        CheckConfig::builder()
            .server("monitor.example.com")
            .port(4242)
            .password("aoxomoxoa")
    }

    fn run(dispatcher: &Dispatcher<Recorder>, records: Vec<serde_json::Value>) -> Vec<Sent> {
        let mut chunk = Vec::new();
        for record in records {
            chunk.extend(dispatcher.format("ddos", TIME, &record_from(record)).unwrap());
        }
        dispatcher
            .write(&chunk)
            .unwrap()
            .into_iter()
            .map(|x| x.unwrap())
            .collect()
    }

    #[test]
    fn constant_values() {
        let dispatcher = Dispatcher::new(
            base()
                .host_name("web.example.org")
                .service_description("ddos_monitor")
                .return_code(2)
                .plugin_output("possible attacks")
                .build()
                .unwrap(),
            Recorder,
        );
        assert_eq!(
            run(&dispatcher, vec![json!({"name": "Stephen"})]),
            vec![sent("web.example.org", "ddos_monitor", 2, "possible attacks")]
        );
    }

    #[test]
    fn host_name_and_host_name_field() {
        let dispatcher = Dispatcher::new(
            base()
                .host_name_field("host")
                .host_name("fallback.example.org")
                .service_description("ddos_monitor")
                .return_code(2)
                .plugin_output("possible attacks")
                .build()
                .unwrap(),
            Recorder,
        );
        assert_eq!(
            run(
                &dispatcher,
                vec![
                    json!({"name": "Stephen", "host": "app.example.org"}),
                    json!({"name": "Aggi"})
                ]
            ),
            vec![
                sent("app.example.org", "ddos_monitor", 2, "possible attacks"),
                sent("fallback.example.org", "ddos_monitor", 2, "possible attacks"),
            ]
        );
    }

    #[test]
    fn return_code_field() {
        let dispatcher = Dispatcher::new(
            base()
                .return_code("OK")
                .return_code_field("retcode")
                .host_name("web.example.org")
                .service_description("ddos_monitor")
                .plugin_output("possible attacks")
                .build()
                .unwrap(),
            Recorder,
        );
        let codes: Vec<u8> = run(
            &dispatcher,
            vec![
                json!({"name": "Stephen", "retcode": "UNKNOWN"}),
                json!({"name": "Aggi", "retcode": "2"}),
                json!({"name": "Katrina", "retcode": 1}),
                json!({"name": "Brian", "retcode": "invalid-value"}),
                json!({"name": "Martin"}),
            ],
        )
        .into_iter()
        .map(|x| x.5)
        .collect();
        assert_eq!(codes, vec![3, 2, 1, 0, 0]);
    }

    #[test]
    fn plugin_output_defaults_to_json() {
        let dispatcher = Dispatcher::new(
            base()
                .plugin_output_field("status")
                .host_name("web.example.org")
                .service_description("ddos_monitor")
                .return_code(2)
                .build()
                .unwrap(),
            Recorder,
        );
        assert_eq!(
            run(
                &dispatcher,
                vec![
                    json!({"name": "Stephen", "status": "Possible DDOS detected"}),
                    json!({"name": "Aggi"})
                ]
            ),
            vec![
                sent("web.example.org", "ddos_monitor", 2, "Possible DDOS detected"),
                sent("web.example.org", "ddos_monitor", 2, r#"{"name":"Aggi"}"#),
            ]
        );
    }

    #[test]
    fn failures_are_per_record() {
        let dispatcher = Dispatcher::new(
            base()
                .host_name_field("host")
                .host_name("web.example.org")
                .service_description("ddos_monitor")
                .build()
                .unwrap(),
            Recorder,
        );
        let entries = vec![
            Entry::new("ddos", TIME, record_from(json!({"name": "Stephen"}))),
            Entry::new("ddos", TIME, record_from(json!({"host": "down.example.org"}))),
            Entry::new("ddos", TIME, record_from(json!({"name": "Aggi"}))),
        ];
        let results = dispatcher.process(&entries);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().6, r#"{"name":"Stephen"}"#);
        assert!(matches!(results[1], Err(Error::Transport { .. })));
        assert_eq!(results[2].as_ref().unwrap().6, r#"{"name":"Aggi"}"#);
        assert_eq!(
            results[2].as_ref().unwrap().5,
            ReturnCode::Unknown.code()
        );
    }

    #[test]
    fn malformed_chunks_send_nothing() {
        let dispatcher = Dispatcher::new(base().build().unwrap(), Recorder);
        let mut chunk = dispatcher
            .format("ddos", TIME, &record_from(json!({"name": "Stephen"})))
            .unwrap();
        chunk.push(0xc1); // never used
        assert!(dispatcher.write(&chunk).is_err());
        assert!(dispatcher.write(&[]).unwrap().is_empty());
    }

    /// Collects the fields of every `WARN` event.
    struct Warnings(Arc<Mutex<Vec<String>>>);

    struct FieldVisitor(Vec<String>);

    impl tracing::field::Visit for FieldVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.0.push(format!("{}={:?}", field.name(), value));
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::layer::Layer<S> for Warnings {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            if *event.metadata().level() == tracing::Level::WARN {
                let mut visitor = FieldVisitor(Vec::new());
                event.record(&mut visitor);
                self.0.lock().unwrap().push(visitor.0.join(" "));
            }
        }
    }

    #[test]
    fn advisories_are_logged() {
        use tracing_subscriber::layer::SubscriberExt;

        let warnings = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(Warnings(warnings.clone()));

        let dispatcher = Dispatcher::new(
            base()
                .return_code("OK")
                .return_code_field("retcode")
                .host_name("web.example.org")
                .build()
                .unwrap(),
            Recorder,
        );
        let result = tracing::subscriber::with_default(subscriber, || {
            dispatcher.dispatch(
                "ddos",
                TIME,
                &record_from(json!({"name": "Brian", "retcode": "invalid-value"})),
            )
        });
        assert_eq!(result.unwrap().5, 0);

        let warnings = warnings.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("return_code_field=retcode"));
        assert!(warnings[0].contains("value=\"invalid-value\""));
        assert!(warnings[0].contains("fall_back_to=OK"));
    }
}
