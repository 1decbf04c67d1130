//! Response sinks: the destinations handlers write status, headers and body
//! bytes into.
//!
//! [`ResponseSink`] is the seam the rewrite layer decorates. The real
//! implementation is [`ConnectionSink`], which serializes to a `TcpStream`;
//! tests substitute in-memory sinks. Optional capabilities (hijacking the
//! transport, close notification) have default implementations that report
//! the capability as absent, so a sink only opts into what it can actually
//! honor.

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::http::headers::Headers;
use crate::http::status::StatusCode;

const HTTP_VERSION: &str = "HTTP/1.1";

/// A destination for one HTTP response.
///
/// Call order expected from handlers: mutate [`headers`](ResponseSink::headers),
/// optionally [`write_header`](ResponseSink::write_header) once, then
/// [`write`](ResponseSink::write) body bytes. Writing body bytes without an
/// explicit status commits `200 OK`.
pub trait ResponseSink {
    /// What a successful [`hijack`](ResponseSink::hijack) hands over.
    type Transport;

    /// The live header map for this response.
    fn headers(&mut self) -> &mut Headers;

    /// Commits the response status. The first call wins; later calls are
    /// ignored, matching the usual response-writer contract.
    fn write_header(&mut self, status: StatusCode);

    /// Writes body bytes, committing `200 OK` first if no status was set.
    fn write(
        &mut self,
        data: &[u8],
    ) -> impl std::future::Future<Output = anyhow::Result<usize>> + Send;

    /// Pushes anything held back out towards the client.
    fn flush(&mut self) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;

    /// Takes raw ownership of the underlying transport, bypassing all further
    /// structured response writing. Sinks without a transport keep this
    /// default, which reports the capability as unsupported.
    fn hijack(&mut self) -> anyhow::Result<Self::Transport> {
        anyhow::bail!("hijacking is not supported by this sink")
    }

    /// A handle that resolves when the client connection closes. Sinks that
    /// cannot observe closure return the default, which never fires.
    fn close_notify(&mut self) -> CloseNotify {
        CloseNotify::never()
    }
}

/// A subscription to "the client went away".
///
/// Absence of the capability is modeled as a notification that never fires
/// rather than an error, so callers can subscribe defensively.
#[derive(Debug, Clone)]
pub struct CloseNotify {
    rx: Option<watch::Receiver<bool>>,
}

impl CloseNotify {
    /// A notification that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// A notification backed by a watch channel; the sender flips the value
    /// to `true` when the peer disconnects.
    pub fn from_watch(rx: watch::Receiver<bool>) -> Self {
        Self { rx: Some(rx) }
    }

    /// Non-blocking probe: has the close already been observed?
    pub fn is_closed(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once the connection closes; pends forever if the capability
    /// is absent or the watcher goes away without firing.
    pub async fn closed(mut self) {
        let Some(rx) = self.rx.as_mut() else {
            return std::future::pending().await;
        };

        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}

/// The real response sink: serializes status line, headers and body to a
/// `TcpStream`.
///
/// The head is written lazily on the first body write (or flush), so headers
/// stay mutable until bytes actually move. The stream is held as an `Option`
/// so [`hijack`](ResponseSink::hijack) can move it out; after the response,
/// the connection loop takes the stream back via [`ConnectionSink::into_stream`]
/// for keep-alive reuse.
#[derive(Debug)]
pub struct ConnectionSink {
    stream: Option<TcpStream>,
    headers: Headers,
    status: Option<StatusCode>,
    head_sent: bool,
    close_rx: Option<watch::Receiver<bool>>,
}

impl ConnectionSink {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream: Some(stream),
            headers: Headers::new(),
            status: None,
            head_sent: false,
            close_rx: None,
        }
    }

    /// Wires up close notification from a watch channel owned by whoever
    /// monitors the socket.
    pub fn with_close_notify(mut self, rx: watch::Receiver<bool>) -> Self {
        self.close_rx = Some(rx);
        self
    }

    /// Hands the stream back for keep-alive reuse. `None` if the connection
    /// was hijacked.
    pub fn into_stream(self) -> Option<TcpStream> {
        self.stream
    }

    /// The committed status, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Whether the status line and headers have left for the wire.
    pub fn head_sent(&self) -> bool {
        self.head_sent
    }

    async fn ensure_head_sent(&mut self) -> anyhow::Result<()> {
        if self.head_sent {
            return Ok(());
        }

        let status = self.status.unwrap_or(StatusCode::OK);
        let mut head = Vec::new();

        let status_line = format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            status.as_u16(),
            status.reason_phrase()
        );
        head.extend_from_slice(status_line.as_bytes());

        for (name, value) in self.headers.iter() {
            head.extend_from_slice(name.as_bytes());
            head.extend_from_slice(b": ");
            head.extend_from_slice(value.as_bytes());
            head.extend_from_slice(b"\r\n");
        }

        head.extend_from_slice(b"\r\n");

        let stream = self
            .stream
            .as_mut()
            .context("connection was hijacked, cannot write response head")?;
        stream.write_all(&head).await?;
        self.head_sent = true;
        Ok(())
    }
}

impl ResponseSink for ConnectionSink {
    type Transport = TcpStream;

    fn headers(&mut self) -> &mut Headers {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    async fn write(&mut self, data: &[u8]) -> anyhow::Result<usize> {
        if self.status.is_none() {
            self.write_header(StatusCode::OK);
        }
        self.ensure_head_sent().await?;

        let stream = self
            .stream
            .as_mut()
            .context("connection was hijacked, cannot write response body")?;
        stream.write_all(data).await?;
        Ok(data.len())
    }

    async fn flush(&mut self) -> anyhow::Result<()> {
        self.ensure_head_sent().await?;
        let stream = self
            .stream
            .as_mut()
            .context("connection was hijacked, cannot flush")?;
        stream.flush().await?;
        Ok(())
    }

    fn hijack(&mut self) -> anyhow::Result<TcpStream> {
        self.stream
            .take()
            .context("connection already hijacked")
    }

    fn close_notify(&mut self) -> CloseNotify {
        match &self.close_rx {
            Some(rx) => CloseNotify::from_watch(rx.clone()),
            None => CloseNotify::never(),
        }
    }
}
