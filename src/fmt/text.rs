use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, TimeZone};
use console::{Term, style};

use crate::adapters::ntp_client::NTP_UNIX_OFFSET;
use crate::domain::ntp::ServerAddress;
use crate::error::NtpTimeError;
use crate::services::query::Progress;

/// Named output formats.
///
/// Calendar formats follow the classic layouts (`UnixDate`, `RFC3339`, ...);
/// `Seconds1970` and `Seconds1900` print a signed second count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    Layout,
    Ansic,
    #[default]
    UnixDate,
    RubyDate,
    Rfc822,
    Rfc822Z,
    Rfc850,
    Rfc1123,
    Rfc1123Z,
    Rfc3339,
    Rfc3339Nano,
    Kitchen,
    Stamp,
    StampMilli,
    StampMicro,
    StampNano,
    DateTime,
    DateOnly,
    TimeOnly,
    Seconds1900,
    Seconds1970,
}

const NAMES: &[(&str, TimeFormat)] = &[
    ("Layout", TimeFormat::Layout),
    ("ANSIC", TimeFormat::Ansic),
    ("UnixDate", TimeFormat::UnixDate),
    ("RubyDate", TimeFormat::RubyDate),
    ("RFC822", TimeFormat::Rfc822),
    ("RFC822Z", TimeFormat::Rfc822Z),
    ("RFC850", TimeFormat::Rfc850),
    ("RFC1123", TimeFormat::Rfc1123),
    ("RFC1123Z", TimeFormat::Rfc1123Z),
    ("RFC3339", TimeFormat::Rfc3339),
    ("RFC3339Nano", TimeFormat::Rfc3339Nano),
    ("Kitchen", TimeFormat::Kitchen),
    ("Stamp", TimeFormat::Stamp),
    ("StampMilli", TimeFormat::StampMilli),
    ("StampMicro", TimeFormat::StampMicro),
    ("StampNano", TimeFormat::StampNano),
    ("DateTime", TimeFormat::DateTime),
    ("DateOnly", TimeFormat::DateOnly),
    ("TimeOnly", TimeFormat::TimeOnly),
    ("Seconds1900", TimeFormat::Seconds1900),
    ("Seconds1970", TimeFormat::Seconds1970),
];

impl TimeFormat {
    /// All accepted names, in display order.
    pub fn names() -> impl Iterator<Item = &'static str> {
        NAMES.iter().map(|(name, _)| *name)
    }

    pub fn name(&self) -> &'static str {
        NAMES
            .iter()
            .find(|(_, f)| f == self)
            .map(|(name, _)| *name)
            .unwrap_or("UnixDate")
    }

    /// strftime pattern for calendar formats, `None` for the numeric ones.
    fn pattern(&self) -> Option<&'static str> {
        let p = match self {
            TimeFormat::Layout => "%m/%d %I:%M:%S%p '%y %z",
            TimeFormat::Ansic => "%a %b %e %H:%M:%S %Y",
            TimeFormat::UnixDate => "%a %b %e %H:%M:%S %Z %Y",
            TimeFormat::RubyDate => "%a %b %d %H:%M:%S %z %Y",
            TimeFormat::Rfc822 => "%d %b %y %H:%M %Z",
            TimeFormat::Rfc822Z => "%d %b %y %H:%M %z",
            TimeFormat::Rfc850 => "%A, %d-%b-%y %H:%M:%S %Z",
            TimeFormat::Rfc1123 => "%a, %d %b %Y %H:%M:%S %Z",
            TimeFormat::Rfc1123Z => "%a, %d %b %Y %H:%M:%S %z",
            TimeFormat::Kitchen => "%-I:%M%p",
            TimeFormat::Stamp => "%b %e %H:%M:%S",
            TimeFormat::StampMilli => "%b %e %H:%M:%S%.3f",
            TimeFormat::StampMicro => "%b %e %H:%M:%S%.6f",
            TimeFormat::StampNano => "%b %e %H:%M:%S%.9f",
            TimeFormat::DateTime => "%Y-%m-%d %H:%M:%S",
            TimeFormat::DateOnly => "%Y-%m-%d",
            TimeFormat::TimeOnly => "%H:%M:%S",
            TimeFormat::Rfc3339
            | TimeFormat::Rfc3339Nano
            | TimeFormat::Seconds1900
            | TimeFormat::Seconds1970 => return None,
        };
        Some(p)
    }

    /// Render `t` in this format.
    pub fn render<Tz>(&self, t: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        match self {
            TimeFormat::Seconds1970 => t.timestamp().to_string(),
            TimeFormat::Seconds1900 => (t.timestamp() + NTP_UNIX_OFFSET).to_string(),
            TimeFormat::Rfc3339 => t.to_rfc3339_opts(SecondsFormat::Secs, true),
            TimeFormat::Rfc3339Nano => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            other => match other.pattern() {
                Some(pattern) => t.format(pattern).to_string(),
                None => t.to_rfc3339(),
            },
        }
    }
}

impl FromStr for TimeFormat {
    type Err = NtpTimeError;

    /// Names are matched without regard to ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s.trim()))
            .map(|(_, f)| *f)
            .ok_or_else(|| {
                NtpTimeError::Config(format!(
                    "unknown output format '{s}', expected one of: {}",
                    TimeFormat::names().collect::<Vec<_>>().join(", ")
                ))
            })
    }
}

impl std::fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Final line for a successful query.
pub fn render_time(rendered: &str, quiet: bool) -> String {
    if quiet {
        rendered.to_string()
    } else {
        format!("{} {}", style("Current time:").cyan().bold(), style(rendered).green())
    }
}

/// Final line for a failed invocation.
pub fn render_error(err: &NtpTimeError) -> String {
    style(format!("Error: {}", err)).red().bold().to_string()
}

/// Prints query notices and per-server failures to a terminal.
pub struct TermProgress {
    term: Term,
}

impl TermProgress {
    pub fn new(term: Term) -> Self {
        Self { term }
    }
}

impl Progress for TermProgress {
    fn querying(&self, server: &ServerAddress) {
        self.term
            .write_line(&format!(
                "Calling NTP server at {}...",
                style(server).green()
            ))
            .ok();
    }

    fn failed(&self, server: &ServerAddress, err: &NtpTimeError) {
        self.term
            .write_line(
                &style(format!("{}: {}", server, err))
                    .yellow()
                    .to_string(),
            )
            .ok();
    }
}
