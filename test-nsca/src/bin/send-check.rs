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

//! Submit one check for a record given on the command line, via `send_nsca`.
//!
//! ```text
//! send-check CONFIG.toml TAG 'JSON-RECORD'
//! ```

use nsca_output::{
    config::{CheckConfig, Options},
    dispatcher::Dispatcher,
    record::Entry,
    transport::SendNsca,
};

fn fail(msg: &str) -> ! {
    eprintln!("{}", msg);
    std::process::exit(1);
}

pub fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        eprintln!("Usage: {} CONFIG.toml TAG JSON-RECORD", args[0]);
        std::process::exit(2);
    }

    let config = match std::fs::read_to_string(&args[1])
        .map_err(|err| format!("Couldn't read {}: {}", args[1], err))
        .and_then(|text| Options::from_toml(&text).map_err(|err| format!("{}", err)))
        .and_then(|opts| CheckConfig::new(opts).map_err(|err| format!("{}", err)))
    {
        Ok(config) => config,
        Err(err) => fail(&err),
    };
    let record = match serde_json::from_str(&args[3]) {
        Ok(serde_json::Value::Object(record)) => record,
        Ok(other) => fail(&format!("{} is not a JSON object", other)),
        Err(err) => fail(&format!("Bad record: {}", err)),
    };

    let dispatcher = Dispatcher::new(config, SendNsca::default());
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() as i64);
    for result in dispatcher.process(vec![Entry::new(args[2].clone(), now, record)]) {
        match result {
            Ok(text) => println!("{}", text),
            Err(err) => fail(&format!("{}", err)),
        }
    }
}
