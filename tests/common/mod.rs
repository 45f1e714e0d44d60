#![allow(dead_code)]

use std::net::UdpSocket;
use std::thread;
use std::time::Duration;

/// Loopback server answering one request with `seconds` in the transmit field.
pub fn answering_server(seconds: u32) -> String {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();
    let addr = socket.local_addr().unwrap().to_string();
    thread::spawn(move || {
        let mut buf = [0u8; 48];
        if let Ok((_, peer)) = socket.recv_from(&mut buf) {
            let mut reply = [0u8; 48];
            reply[0] = 0x24;
            reply[40..44].copy_from_slice(&seconds.to_be_bytes());
            socket.send_to(&reply, peer).ok();
        }
    });
    addr
}

/// Loopback socket that accepts requests and never answers.
///
/// Keep the returned socket alive for as long as the server should exist.
pub fn silent_server() -> (UdpSocket, String) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap().to_string();
    (socket, addr)
}
