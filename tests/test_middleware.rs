//! Tests for the middleware invocation contract and the full server path

mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use common::MockSink;
use polish::http::connection::Connection;
use polish::http::request::{Method, Request, RequestBuilder};
use polish::http::sink::ResponseSink;
use polish::http::status::StatusCode;
use polish::rewrite::{Handler, TransformRegistry, intercept};
use polish::{handlers::StaticPage, transforms};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn get_request() -> Request {
    RequestBuilder::new()
        .method(Method::GET)
        .path("/")
        .build()
        .unwrap()
}

struct HtmlPage(&'static str);

impl Handler for HtmlPage {
    async fn handle(
        &self,
        _req: &Request,
        sink: &mut (impl ResponseSink + Send),
    ) -> anyhow::Result<()> {
        sink.headers().insert("Content-Type", "text/html");
        sink.write(self.0.as_bytes()).await?;
        Ok(())
    }
}

struct Hijacker;

impl Handler for Hijacker {
    async fn handle(
        &self,
        _req: &Request,
        sink: &mut (impl ResponseSink + Send),
    ) -> anyhow::Result<()> {
        let _transport = sink.hijack()?;
        Ok(())
    }
}

struct Failing;

impl Handler for Failing {
    async fn handle(
        &self,
        _req: &Request,
        _sink: &mut (impl ResponseSink + Send),
    ) -> anyhow::Result<()> {
        anyhow::bail!("handler blew up")
    }
}

#[tokio::test]
async fn intercept_runs_handler_and_finalizes() {
    let mut registry = TransformRegistry::new();
    registry.register("text/html", transforms::collapse_html);
    let mut sink = MockSink::new();

    intercept(&registry, &mut sink, &get_request(), &HtmlPage("<p>  hi  </p>"))
        .await
        .unwrap();

    assert_eq!(sink.body, b"<p>hi</p>");
    assert_eq!(sink.headers.get("Content-Length"), Some("9"));
    assert_eq!(sink.status, Some(StatusCode::OK));
}

#[tokio::test]
async fn intercept_skips_finalize_after_hijack() {
    let mut registry = TransformRegistry::new();
    registry.register("text/html", transforms::collapse_html);
    let mut sink = MockSink::hijackable();

    intercept(&registry, &mut sink, &get_request(), &Hijacker)
        .await
        .unwrap();

    assert!(sink.hijacked);
    assert!(sink.body.is_empty());
    assert_eq!(sink.headers.get("Content-Length"), None);
    assert_eq!(sink.status, None);
}

#[tokio::test]
async fn intercept_propagates_handler_errors() {
    let registry = TransformRegistry::new();
    let mut sink = MockSink::new();

    let err = intercept(&registry, &mut sink, &get_request(), &Failing)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("handler blew up"));
    assert!(sink.body.is_empty());
}

/// Starts a server for a single connection and returns its address.
async fn serve_one<H>(registry: TransformRegistry, handler: H) -> SocketAddr
where
    H: Handler + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let registry = Arc::new(registry);
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut conn = Connection::new(socket, registry, handler);
        conn.run().await.unwrap();
    });

    addr
}

/// Reads one HTTP/1.1 response, framing the body by Content-Length.
async fn read_response(stream: &mut TcpStream) -> (String, Vec<u8>) {
    let mut raw = Vec::new();
    let headers_end = loop {
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let mut chunk = [0u8; 1024];
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before response head");
        raw.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8(raw[..headers_end].to_vec()).unwrap();
    let content_length: usize = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().unwrap())
        })
        .expect("response has no Content-Length");

    let mut body = raw[headers_end + 4..].to_vec();
    while body.len() < content_length {
        let mut chunk = [0u8; 1024];
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed mid-body");
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);
    (head, body)
}

#[tokio::test]
async fn end_to_end_minified_response_on_the_wire() {
    let mut registry = TransformRegistry::new();
    registry.register("text/html", transforms::collapse_html);
    let handler = StaticPage::new("text/html", b"<p>  hi  </p>".to_vec());
    let addr = serve_one(registry, handler).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let (head, body) = read_response(&mut stream).await;
    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert!(head.contains("Content-Length: 9"));
    assert_eq!(body, b"<p>hi</p>");
}

#[tokio::test]
async fn end_to_end_untouched_without_transform() {
    let registry = TransformRegistry::new();
    let handler = StaticPage::new("text/html", b"<p>  hi  </p>".to_vec());
    let addr = serve_one(registry, handler).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let (head, body) = read_response(&mut stream).await;
    assert!(head.contains("Content-Length: 13"));
    assert_eq!(body, b"<p>  hi  </p>");
}

#[tokio::test]
async fn keep_alive_serves_sequential_requests() {
    let mut registry = TransformRegistry::new();
    registry.register("text/html", transforms::collapse_html);
    let handler = StaticPage::new("text/html", b"<p>  hi  </p>".to_vec());
    let addr = serve_one(registry, handler).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();

    for _ in 0..2 {
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: test\r\n\r\n")
            .await
            .unwrap();
        let (head, body) = read_response(&mut stream).await;
        assert!(head.starts_with("HTTP/1.1 200 OK"));
        assert_eq!(body, b"<p>hi</p>");
    }
}
