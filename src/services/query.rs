use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use tracing::{info, instrument};

use crate::adapters::ntp_client::{self, RESPONSE_DEADLINE};
use crate::domain::ntp::{Outcome, ServerAddress};
use crate::error::NtpTimeError;

/// Something that can ask one server for the time.
///
/// The returned future owns everything it needs so it can be spawned.
pub trait TimeSource: Send + Sync {
    fn fetch(
        &self,
        server: &ServerAddress,
    ) -> BoxFuture<'static, Result<DateTime<Utc>, NtpTimeError>>;
}

/// SNTP over UDP with a fixed response deadline.
#[derive(Debug, Clone, Copy)]
pub struct NtpClient {
    deadline: Duration,
}

impl NtpClient {
    pub fn with_deadline(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl Default for NtpClient {
    fn default() -> Self {
        Self::with_deadline(RESPONSE_DEADLINE)
    }
}

impl TimeSource for NtpClient {
    fn fetch(
        &self,
        server: &ServerAddress,
    ) -> BoxFuture<'static, Result<DateTime<Utc>, NtpTimeError>> {
        let server = server.clone();
        let deadline = self.deadline;
        async move { ntp_client::query(&server, deadline).await }.boxed()
    }
}

/// Receives status notices while servers are queried.
pub trait Progress: Send + Sync {
    /// A request is about to be sent to `server`.
    fn querying(&self, server: &ServerAddress);
    /// The attempt against `server` failed and was dropped.
    fn failed(&self, server: &ServerAddress, err: &NtpTimeError);
}

/// Announces nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Progress for Silent {
    fn querying(&self, _: &ServerAddress) {}
    fn failed(&self, _: &ServerAddress, _: &NtpTimeError) {}
}

/// Query a single server and return its [`Outcome`].
#[instrument(skip_all, fields(server = %server))]
pub async fn query_one<S>(
    source: &S,
    server: &ServerAddress,
    progress: &dyn Progress,
) -> Result<Outcome, NtpTimeError>
where
    S: TimeSource + ?Sized,
{
    progress.querying(server);
    let utc = source.fetch(server).await?;
    info!(%utc, "server answered");
    Ok(Outcome {
        server: server.clone(),
        utc,
    })
}
