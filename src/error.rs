use std::io;

use thiserror::Error;

/// Top-level error type for the ntptime library.
#[derive(Error, Debug)]
pub enum NtpTimeError {
    /// Address could not be resolved or the UDP socket could not be set up.
    #[error("dial: {0}")]
    Dial(String),
    /// No answer before the response deadline.
    #[error("timeout: no response within {0:?}")]
    Timeout(std::time::Duration),
    /// Sending the request failed.
    #[error("writing the request failed: {0}")]
    Write(#[source] io::Error),
    /// Receiving the response failed.
    #[error("reading the response failed: {0}")]
    Read(#[source] io::Error),
    /// Reply did not look like an NTP header.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Invalid combination of options, bad address or unknown format.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Every attempted server failed.
    #[error("failed to get the current time: {attempts} server(s) tried, none answered")]
    Exhausted { attempts: usize },
}

impl NtpTimeError {
    /// Process exit status matching this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            NtpTimeError::Config(_) => 2,
            _ => 1,
        }
    }
}
