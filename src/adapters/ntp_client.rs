use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::net::UdpSocket;
use tracing::debug;

use crate::adapters::resolver;
use crate::domain::ntp::ServerAddress;
use crate::error::NtpTimeError;

/// Size of an NTP header, for both request and reply.
pub const PACKET_SIZE: usize = 48;

/// Seconds between 1900-01-01 (NTP era 0) and 1970-01-01 (Unix epoch).
pub const NTP_UNIX_OFFSET: i64 = 2_208_988_800;

/// Fixed deadline for one transaction, from dial to decoded reply.
pub const RESPONSE_DEADLINE: Duration = Duration::from_secs(3);

const LEAP_NO_WARNING: u8 = 0;
const VERSION: u8 = 4;
const MODE_CLIENT: u8 = 3;

/// Offset of the transmit timestamp seconds field in the reply.
const TRANSMIT_SECONDS: usize = 40;

/// Build the client request: only the first byte is set.
pub fn build_request() -> [u8; PACKET_SIZE] {
    let mut packet = [0u8; PACKET_SIZE];
    packet[0] = (LEAP_NO_WARNING << 6) | (VERSION << 3) | MODE_CLIENT;
    packet
}

/// Extract the transmit timestamp of a reply as an absolute time.
///
/// Only the seconds field is read; the fraction is ignored.
pub fn decode_transmit_time(reply: &[u8]) -> Result<DateTime<Utc>, NtpTimeError> {
    if reply.len() < PACKET_SIZE {
        return Err(NtpTimeError::Malformed(format!(
            "expected {PACKET_SIZE} bytes, got {}",
            reply.len()
        )));
    }
    let mut field = [0u8; 4];
    field.copy_from_slice(&reply[TRANSMIT_SECONDS..TRANSMIT_SECONDS + 4]);
    let ntp_seconds = u32::from_be_bytes(field);
    let unix_seconds = i64::from(ntp_seconds) - NTP_UNIX_OFFSET;
    DateTime::from_timestamp(unix_seconds, 0).ok_or_else(|| {
        NtpTimeError::Malformed(format!("timestamp out of range: {ntp_seconds}"))
    })
}

fn bind_addr_for(target: &SocketAddr) -> SocketAddr {
    match target {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    }
}

/// Resolve `server` and return a UDP socket connected to it.
async fn dial(server: &ServerAddress) -> Result<UdpSocket, NtpTimeError> {
    let target = resolver::resolve(server).await?;
    let socket = UdpSocket::bind(bind_addr_for(&target))
        .await
        .map_err(|e| NtpTimeError::Dial(format!("cannot bind local socket: {e}")))?;
    socket
        .connect(target)
        .await
        .map_err(|e| NtpTimeError::Dial(format!("cannot connect to {target}: {e}")))?;
    Ok(socket)
}

async fn exchange(socket: &UdpSocket) -> Result<DateTime<Utc>, NtpTimeError> {
    let request = build_request();
    let sent = socket.send(&request).await.map_err(NtpTimeError::Write)?;
    debug!(sent, "request sent");

    let mut reply = [0u8; PACKET_SIZE];
    let received = socket.recv(&mut reply).await.map_err(NtpTimeError::Read)?;
    debug!(received, "reply received");

    decode_transmit_time(&reply[..received])
}

/// Run `session` under `deadline`, reporting expiry as [`NtpTimeError::Timeout`].
async fn within_deadline<F>(
    deadline: Duration,
    session: F,
) -> Result<DateTime<Utc>, NtpTimeError>
where
    F: Future<Output = Result<DateTime<Utc>, NtpTimeError>>,
{
    tokio::time::timeout(deadline, session)
        .await
        .map_err(|_| NtpTimeError::Timeout(deadline))?
}

/// Perform one request/response exchange with `server`.
///
/// `deadline` bounds the whole transaction, from name resolution to the
/// decoded reply. The socket is dropped on every path out of this function.
pub async fn query(
    server: &ServerAddress,
    deadline: Duration,
) -> Result<DateTime<Utc>, NtpTimeError> {
    within_deadline(deadline, async {
        let socket = dial(server).await?;
        exchange(&socket).await
    })
    .await
}
