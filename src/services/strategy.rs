use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use crate::domain::ntp::{Outcome, ServerAddress, Strategy};
use crate::error::NtpTimeError;

use super::query::{Progress, TimeSource, query_one};

/// Run `strategy` and return the time of the first server that answers.
///
/// Individual failures are passed to `progress` and otherwise swallowed;
/// only when no server answered is [`NtpTimeError::Exhausted`] returned.
#[instrument(skip_all, fields(primary = %strategy.primary()))]
pub async fn run<S>(
    strategy: &Strategy,
    source: &S,
    progress: &dyn Progress,
) -> Result<Outcome, NtpTimeError>
where
    S: TimeSource + ?Sized,
{
    match strategy {
        Strategy::Single(primary) => {
            fallback(source, std::slice::from_ref(primary), progress).await
        }
        Strategy::Parallel(..) => race(source, &strategy.servers(), progress).await,
        Strategy::Fallback(..) => fallback(source, &strategy.servers(), progress).await,
    }
}

/// Query `servers` one after the other, stopping at the first answer.
pub async fn fallback<S>(
    source: &S,
    servers: &[ServerAddress],
    progress: &dyn Progress,
) -> Result<Outcome, NtpTimeError>
where
    S: TimeSource + ?Sized,
{
    for server in servers {
        match query_one(source, server, progress).await {
            Ok(outcome) => return Ok(outcome),
            Err(err) => attempt_failed(server, &err, progress),
        }
    }
    Err(NtpTimeError::Exhausted {
        attempts: servers.len(),
    })
}

/// Query all `servers` at once and keep the first answer.
///
/// Each attempt runs in its own task and is never cancelled. Once an answer
/// is accepted the receiving side is dropped, so attempts still in flight
/// finish on their own deadline and their results go nowhere.
pub async fn race<S>(
    source: &S,
    servers: &[ServerAddress],
    progress: &dyn Progress,
) -> Result<Outcome, NtpTimeError>
where
    S: TimeSource + ?Sized,
{
    // One slot per attempt: a send can never find the channel full.
    let (tx, mut rx) = mpsc::channel(servers.len().max(1));

    for server in servers {
        progress.querying(server);
        let attempt = source.fetch(server);
        let tx = tx.clone();
        let server = server.clone();
        let span = info_span!("attempt", server = %server);
        tokio::spawn(
            async move {
                let result = attempt.await;
                if tx.try_send((server, result)).is_err() {
                    debug!("result discarded, another server already answered");
                }
            }
            .instrument(span),
        );
    }
    drop(tx);

    // `recv` yields `None` only after every worker dropped its sender.
    while let Some((server, result)) = rx.recv().await {
        match result {
            Ok(utc) => {
                info!(server = %server, %utc, "first answer accepted");
                return Ok(Outcome { server, utc });
            }
            Err(err) => attempt_failed(&server, &err, progress),
        }
    }
    Err(NtpTimeError::Exhausted {
        attempts: servers.len(),
    })
}

fn attempt_failed(server: &ServerAddress, err: &NtpTimeError, progress: &dyn Progress) {
    warn!(server = %server, error = %err, "attempt failed");
    progress.failed(server, err);
}
