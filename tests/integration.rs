use std::time::Duration;

use ntptime::{NtpClient, NtpTimeError, ServerAddress, Silent, Strategy, run};

mod common;

use common::{answering_server, silent_server};

fn addr(s: &str) -> ServerAddress {
    s.parse().unwrap()
}

fn client() -> NtpClient {
    NtpClient::with_deadline(Duration::from_millis(300))
}

#[tokio::test]
async fn fallback_moves_on_after_timeout() {
    let (_silent, a) = silent_server();
    let b = answering_server(3_754_000_000);
    let strategy = Strategy::new(addr(&a), vec![], vec![addr(&b)]).unwrap();

    let outcome = run(&strategy, &client(), &Silent).await.unwrap();

    assert_eq!(outcome.server, addr(&b));
    assert_eq!(outcome.utc.timestamp(), 1_545_011_200);
}

#[tokio::test]
async fn parallel_race_over_udp() {
    let (_silent_a, a) = silent_server();
    let (_silent_b, b) = silent_server();
    let c = answering_server(2_208_988_800);
    let strategy = Strategy::new(addr(&a), vec![addr(&b), addr(&c)], vec![]).unwrap();

    let outcome = run(&strategy, &client(), &Silent).await.unwrap();

    assert_eq!(outcome.server, addr(&c));
    assert_eq!(outcome.utc.timestamp(), 0);
}

#[tokio::test]
async fn single_silent_server_is_exhausted() {
    let (_silent, a) = silent_server();
    let err = run(&Strategy::Single(addr(&a)), &client(), &Silent)
        .await
        .unwrap_err();
    assert!(matches!(err, NtpTimeError::Exhausted { attempts: 1 }));
}

#[cfg(feature = "network-tests")]
#[tokio::test]
async fn unresolvable_host_is_a_dial_error() {
    let err = ntptime::adapters::ntp_client::query(
        &addr("host.invalid"),
        Duration::from_millis(300),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, NtpTimeError::Dial(_)), "got {err:?}");
}

#[test]
fn default_client_uses_three_second_deadline() {
    assert_eq!(NtpClient::default().deadline(), Duration::from_secs(3));
}
