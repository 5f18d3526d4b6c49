//! Shared helpers for the proxy integration tests

#![allow(dead_code)]

use socksd::{ServerConfig, Socks5Server};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Start a proxy on an ephemeral loopback port and return its address
pub async fn start_proxy(account: Option<&str>) -> SocketAddr {
    let config = ServerConfig::new("127.0.0.1", 0).with_credentials(account.map(String::from));
    let mut server = Socks5Server::new(config);
    let addr = server.bind().await.unwrap();
    tokio::spawn(async move { server.run().await });
    addr
}

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Build a CONNECT request for an IPv4 target
pub fn connect_request(target: SocketAddr) -> Vec<u8> {
    let SocketAddr::V4(v4) = target else {
        panic!("expected an IPv4 target");
    };
    let mut request = vec![0x05, 0x01, 0x00, 0x01];
    request.extend_from_slice(&v4.ip().octets());
    request.extend_from_slice(&v4.port().to_be_bytes());
    request
}

/// Build a CONNECT request for a domain target
pub fn connect_request_domain(domain: &str, port: u16) -> Vec<u8> {
    let mut request = vec![0x05, 0x01, 0x00, 0x03, domain.len() as u8];
    request.extend_from_slice(domain.as_bytes());
    request.extend_from_slice(&port.to_be_bytes());
    request
}

/// Run the no-auth negotiation and send `request`, returning the stream and
/// the 10-byte command response
pub async fn open_session(proxy: SocketAddr, request: &[u8]) -> (TcpStream, [u8; 10]) {
    let mut client = TcpStream::connect(proxy).await.unwrap();

    client.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
    let mut choice = [0u8; 2];
    client.read_exact(&mut choice).await.unwrap();
    assert_eq!(choice, [0x05, 0x00]);

    client.write_all(request).await.unwrap();
    let mut reply = [0u8; 10];
    client.read_exact(&mut reply).await.unwrap();
    (client, reply)
}
