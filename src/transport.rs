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

//! The check transport layer.
//!
//! This module defines the [`Transport`] trait that all implementations must support, as well as
//! [`SendNsca`], which hands checks to the stock `send_nsca` program. The NSCA wire protocol
//! itself (the XOR/mcrypt "encryption", the CRC, the fixed-size packet) is entirely the
//! transport's business; nothing else in this crate knows or cares about it.
//!
//! # Examples
//!
//! To submit checks via `send_nsca` found on the `PATH`, using its stock configuration file:
//!
//! ```rust
//! use nsca_output::transport::SendNsca;
//! let transpo = SendNsca::default().config_file("/etc/send_nsca.cfg");
//! ```
//!
//! To have checks carrying a password encrypted with mcrypt's 3DES:
//!
//! ```rust
//! use nsca_output::transport::SendNsca;
//! let transpo = SendNsca::default().encryption_method(3);
//! ```

use crate::{
    check::CheckPayload,
    error::{Error, Result},
};

use backtrace::Backtrace;

use tempfile::NamedTempFile;

use std::{
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

type StdResult<T, E> = std::result::Result<T, E>;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
///
/// Both the success & the failure type are up to the implementation: whatever [`send`] returns
/// is handed back to the caller as that record's result, untouched.
///
/// [`send`]: Transport::send
pub trait Transport {
    type Output;
    type Error: std::error::Error;
    /// Submit one check. Each call stands alone; a failure must not leave anything half-sent
    /// that a later call could trip over.
    fn send(&self, check: &CheckPayload) -> StdResult<Self::Output, Self::Error>;
}

/// Submitting checks by running the `send_nsca` program, once per check.
///
/// `send_nsca` only reads its password & encryption method from a configuration file. Putting
/// the password on the command line would publish it to every user on the host, so a check that
/// carries a non-empty `password` is sent with a private (mode 0600) configuration file written
/// for the occasion, holding that password & the encryption method. The encryption method is,
/// in order of preference, the one set by [`encryption_method`], the one named in
/// [`config_file`], or XOR (1), `send_nsca`'s own default.
///
/// A check with an empty password is sent with [`config_file`] (if any), untouched.
///
/// [`encryption_method`]: SendNsca::encryption_method
/// [`config_file`]: SendNsca::config_file
pub struct SendNsca {
    program: PathBuf,
    config_file: Option<PathBuf>,
    encryption_method: Option<u8>,
    timeout: Option<u32>,
}

/// `send_nsca`'s default: simple XOR
const DEFAULT_ENCRYPTION_METHOD: u8 = 1;

impl std::default::Default for SendNsca {
    /// Run `send_nsca` from the `PATH`, with its compiled-in configuration & timeout.
    fn default() -> Self {
        SendNsca {
            program: PathBuf::from("send_nsca"),
            config_file: None,
            encryption_method: None,
            timeout: None,
        }
    }
}

fn transport_error<E>(err: E) -> Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    Error::Transport {
        source: err.into(),
        back: Backtrace::new(),
    }
}

/// Pull the `encryption_method` setting out of the text of a `send_nsca` configuration file.
fn encryption_method_in(text: &str) -> Option<u8> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .filter(|(key, _)| key.trim() == "encryption_method")
        .filter_map(|(_, value)| value.trim().parse().ok())
        .last()
}

impl SendNsca {
    /// Run the program at `program` instead of `send_nsca` from the `PATH`.
    pub fn new<P: Into<PathBuf>>(program: P) -> SendNsca {
        SendNsca {
            program: program.into(),
            ..SendNsca::default()
        }
    }
    /// Pass `-c path` to `send_nsca`.
    pub fn config_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_file = Some(path.into());
        self
    }
    /// Encrypt password-carrying checks with `method` (as numbered in `send_nsca.cfg`).
    pub fn encryption_method(mut self, method: u8) -> Self {
        self.encryption_method = Some(method);
        self
    }
    /// Pass `-to secs` to `send_nsca`.
    pub fn timeout(mut self, secs: u32) -> Self {
        self.timeout = Some(secs);
        self
    }
    /// Write a private `send_nsca` configuration file holding `password`; `None` if there's no
    /// password to convey.
    fn secrets_file(&self, password: &str) -> Result<Option<NamedTempFile>> {
        if password.is_empty() {
            return Ok(None);
        }
        if password.contains(['\n', '\r']) {
            return Err(transport_error("the password must not contain line breaks"));
        }
        let method = match (self.encryption_method, &self.config_file) {
            (Some(method), _) => method,
            (None, Some(path)) => encryption_method_in(
                &std::fs::read_to_string(path).map_err(transport_error)?,
            )
            .unwrap_or(DEFAULT_ENCRYPTION_METHOD),
            (None, None) => DEFAULT_ENCRYPTION_METHOD,
        };
        // `NamedTempFile` is created readable & writable by its owner only.
        let mut file = NamedTempFile::new().map_err(transport_error)?;
        write!(file, "password={}\nencryption_method={}\n", password, method)
            .and_then(|_| file.flush())
            .map_err(transport_error)?;
        Ok(Some(file))
    }
    fn command(&self, check: &CheckPayload, config_file: Option<&Path>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-H")
            .arg(&check.server)
            .arg("-p")
            .arg(check.port.to_string());
        if let Some(secs) = self.timeout {
            cmd.arg("-to").arg(secs.to_string());
        }
        if let Some(path) = config_file {
            cmd.arg("-c").arg(path);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Transport for SendNsca {
    /// Whatever `send_nsca` had to say on stdout, e.g. "1 data packet(s) sent to host
    /// successfully."
    type Output = String;
    type Error = Error;
    fn send(&self, check: &CheckPayload) -> Result<String> {
        // Must outlive the child: the file is removed when this is dropped.
        let secrets = self.secrets_file(&check.password)?;
        let config_file = match &secrets {
            Some(file) => Some(file.path()),
            None => self.config_file.as_deref(),
        };

        let mut child = self
            .command(check, config_file)
            .spawn()
            .map_err(transport_error)?;
        // `stdin` is dropped at the end of this match arm, closing the pipe; `send_nsca` won't
        // exit until it sees EOF.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&check.to_send_nsca_line()),
            None => Ok(()),
        };
        // Reap the child whether or not the write went through; if `send_nsca` quit early, its
        // stderr says why.
        let output = child.wait_with_output().map_err(transport_error)?;
        if !output.status.success() {
            return Err(transport_error(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        written.map_err(transport_error)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::return_code::ReturnCode;

    fn check() -> CheckPayload {
        CheckPayload {
            server: "monitor.example.com".to_string(),
            port: 4242,
            password: "aoxomoxoa".to_string(),
            host_name: "web.example.org".to_string(),
            service_description: "ddos_monitor".to_string(),
            return_code: ReturnCode::Critical,
            plugin_output: "possible attacks".to_string(),
        }
    }

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn command_line() {
        let transpo = SendNsca::new("/usr/sbin/send_nsca")
            .config_file("/etc/send_nsca.cfg")
            .timeout(5);
        let cmd = transpo.command(&check(), Some(Path::new("/etc/send_nsca.cfg")));
        assert_eq!(cmd.get_program(), "/usr/sbin/send_nsca");
        let args = args(&cmd);
        assert_eq!(
            args,
            [
                "-H",
                "monitor.example.com",
                "-p",
                "4242",
                "-to",
                "5",
                "-c",
                "/etc/send_nsca.cfg"
            ]
        );
        // the password stays off the command line
        assert!(!args.iter().any(|a| a.contains("aoxomoxoa")));

        let cmd = SendNsca::default().command(&check(), None);
        assert_eq!(self::args(&cmd), ["-H", "monitor.example.com", "-p", "4242"]);
    }

    #[test]
    fn no_password_no_secrets() {
        assert!(SendNsca::default().secrets_file("").unwrap().is_none());
    }

    #[test]
    fn passwords_go_to_a_private_file() {
        let file = SendNsca::default()
            .secrets_file("aoxomoxoa")
            .unwrap()
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(file.path()).unwrap(),
            "password=aoxomoxoa\nencryption_method=1\n"
        );
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o077, 0);
        }

        let file = SendNsca::default()
            .encryption_method(3)
            .secrets_file("aoxomoxoa")
            .unwrap()
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(file.path()).unwrap(),
            "password=aoxomoxoa\nencryption_method=3\n"
        );

        assert!(SendNsca::default().secrets_file("aox\nomoxoa").is_err());
    }

    #[test]
    fn encryption_method_from_config_file() {
        let mut cfg = NamedTempFile::new().unwrap();
        write!(
            cfg,
            "# send_nsca.cfg\npassword=ignored\n#encryption_method=2\nencryption_method = 8\n"
        )
        .unwrap();
        let file = SendNsca::default()
            .config_file(cfg.path())
            .secrets_file("aoxomoxoa")
            .unwrap()
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(file.path()).unwrap(),
            "password=aoxomoxoa\nencryption_method=8\n"
        );

        assert_eq!(encryption_method_in("password=x\n"), None);
        assert!(SendNsca::default()
            .config_file("/i/am/not/there.cfg")
            .secrets_file("aoxomoxoa")
            .is_err());
    }

    #[test]
    fn missing_program() {
        let transpo = SendNsca::new("/i/am/not/send_nsca");
        match transpo.send(&check()) {
            Err(Error::Transport { .. }) => (),
            other => panic!("expected a transport error, got {:?}", other),
        }
    }

    /// `false` exits without reading stdin, so the write may or may not fail; either way the
    /// exit status is what gets reported.
    #[cfg(unix)]
    #[test]
    fn early_exit_is_reported() {
        let mut check = check();
        check.password = String::new();
        let err = SendNsca::new("false").send(&check).unwrap_err();
        assert!(format!("{}", err).contains("exited with"), "{}", err);
    }
}
