//! Integration tests for the TCP transport.

use parlor_transport::{TcpConnection, TcpTransport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[tokio::test]
async fn test_bind_accept_and_exchange_bytes() {
    let transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
    let addr = transport.local_addr().unwrap().to_string();

    let client = tokio::spawn(async move {
        let conn = TcpConnection::connect(&addr).await.unwrap();
        let (mut read, mut write) = conn.into_split();
        write.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        read.read_exact(&mut buf).await.unwrap();
        buf
    });

    let conn = transport.accept().await.unwrap();
    let (mut read, mut write) = conn.into_split();
    let mut buf = [0u8; 4];
    read.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"ping");
    write.write_all(b"pong").await.unwrap();

    assert_eq!(&client.await.unwrap(), b"pong");
}

#[tokio::test]
async fn test_accepted_connections_get_distinct_ids() {
    let transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
    let addr = transport.local_addr().unwrap().to_string();

    let addr2 = addr.clone();
    tokio::spawn(async move {
        let _a = TcpConnection::connect(&addr2).await.unwrap();
        let _b = TcpConnection::connect(&addr).await.unwrap();
        // Hold both open until the server has accepted them.
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    });

    let first = transport.accept().await.unwrap();
    let second = transport.accept().await.unwrap();
    assert_ne!(first.id(), second.id());
}
