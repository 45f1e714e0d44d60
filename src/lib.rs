//! ntptime library: ask NTP servers for the current time, one at a time or
//! racing several of them.

pub mod adapters;
pub mod domain;
mod error;
pub mod fmt;
pub mod services;

pub use domain::ntp::{Outcome, ServerAddress, Strategy};
pub use error::NtpTimeError;
pub use fmt::text::TimeFormat;
pub use services::query::{NtpClient, Progress, Silent, TimeSource, query_one};
pub use services::strategy::run;

/// Run `strategy` against real servers with the default 3 second deadline.
pub async fn query_time(
    strategy: &Strategy,
    progress: &dyn Progress,
) -> Result<Outcome, NtpTimeError> {
    run(strategy, &NtpClient::default(), progress).await
}
