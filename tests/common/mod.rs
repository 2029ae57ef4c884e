//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use subfwd::config::{DnsMode, SubfwdConfig};
use subfwd::http::HttpServer;
use subfwd::lifecycle::Shutdown;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const ADMIN_HOST: &str = "subfwd.com";

/// Start a backend that answers every request with a description of what it
/// received: `host=<Host> path=<request target> xff=<X-Forwarded-For>`.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;
                        let body = describe(&head);
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Default config with a static DNS zone built from `txt` and `cname` pairs.
pub fn static_config(txt: &[(&str, &str)], cname: &[(&str, &str)]) -> SubfwdConfig {
    let mut config = SubfwdConfig::default();
    config.dns.mode = DnsMode::Static;
    for (name, value) in txt {
        config
            .dns
            .txt
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }
    for (name, target) in cname {
        config.dns.cname.insert(name.to_string(), target.to_string());
    }
    config
}

/// Start the service on a loopback port; keep the `Shutdown` alive for the test.
pub async fn start_service(config: SubfwdConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// GET `path` on the service at `addr` with the given Host header.
pub async fn get(addr: SocketAddr, host: &str, path: &str) -> reqwest::Response {
    client()
        .get(format!("http://{}{}", addr, path))
        .header(reqwest::header::HOST, host)
        .send()
        .await
        .unwrap()
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn describe(head: &str) -> String {
    let mut lines = head.lines();
    let target = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or_default()
        .to_string();

    let mut host = String::new();
    let mut xff = String::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "host" => host = value.trim().to_string(),
                "x-forwarded-for" => xff = value.trim().to_string(),
                _ => {}
            }
        }
    }

    format!("host={} path={} xff={}", host, target, xff)
}
