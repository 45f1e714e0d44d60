#[cfg(feature = "json")]
use serde::Serialize;

#[cfg(feature = "json")]
use crate::adapters::ntp_client::NTP_UNIX_OFFSET;
use crate::domain::ntp::Outcome;
use crate::error::NtpTimeError;
use crate::fmt::text::TimeFormat;

#[cfg(feature = "json")]
#[derive(Serialize)]
pub struct JsonOutcome {
    pub schema_version: u8,
    pub server: String,
    pub utc: String,
    pub format: &'static str,
    pub time: String,
    pub seconds_1970: i64,
    pub seconds_1900: i64,
}

/// Serialize an outcome into a JSON string.
#[allow(unused_variables)]
pub fn to_json(
    outcome: &Outcome,
    format: TimeFormat,
    pretty: bool,
) -> Result<String, NtpTimeError> {
    #[cfg(feature = "json")]
    {
        let unix = outcome.utc.timestamp();
        let doc = JsonOutcome {
            schema_version: 1,
            server: outcome.server.to_string(),
            utc: TimeFormat::Rfc3339.render(&outcome.utc),
            format: format.name(),
            time: format.render(&outcome.local()),
            seconds_1970: unix,
            seconds_1900: unix + NTP_UNIX_OFFSET,
        };
        let text = if pretty {
            serde_json::to_string_pretty(&doc)
        } else {
            serde_json::to_string(&doc)
        }
        .map_err(|e| NtpTimeError::Config(format!("cannot serialize output: {e}")))?;
        Ok(text)
    }
    #[cfg(not(feature = "json"))]
    {
        Err(NtpTimeError::Config("json feature disabled".into()))
    }
}
