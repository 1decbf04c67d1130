//! Shared test double: an in-memory response sink.

#![allow(dead_code)]

use polish::http::headers::Headers;
use polish::http::sink::{CloseNotify, ResponseSink};
use polish::http::status::StatusCode;
use tokio::sync::watch;

/// Records everything written into it. Hijack support is opt-in so tests can
/// exercise both the supported and unsupported paths.
pub struct MockSink {
    pub headers: Headers,
    pub status: Option<StatusCode>,
    pub body: Vec<u8>,
    pub flushes: usize,
    pub hijack_supported: bool,
    pub hijacked: bool,
    pub close_rx: Option<watch::Receiver<bool>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            headers: Headers::new(),
            status: None,
            body: Vec::new(),
            flushes: 0,
            hijack_supported: false,
            hijacked: false,
            close_rx: None,
        }
    }

    pub fn hijackable() -> Self {
        Self {
            hijack_supported: true,
            ..Self::new()
        }
    }

    pub fn with_close_notify(rx: watch::Receiver<bool>) -> Self {
        Self {
            close_rx: Some(rx),
            ..Self::new()
        }
    }
}

impl ResponseSink for MockSink {
    type Transport = ();

    fn headers(&mut self) -> &mut Headers {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    async fn write(&mut self, data: &[u8]) -> anyhow::Result<usize> {
        anyhow::ensure!(!self.hijacked, "write after hijack");
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
        Ok(data.len())
    }

    async fn flush(&mut self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.hijacked, "flush after hijack");
        self.flushes += 1;
        Ok(())
    }

    fn hijack(&mut self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.hijack_supported,
            "hijacking is not supported by this sink"
        );
        self.hijacked = true;
        Ok(())
    }

    fn close_notify(&mut self) -> CloseNotify {
        match &self.close_rx {
            Some(rx) => CloseNotify::from_watch(rx.clone()),
            None => CloseNotify::never(),
        }
    }
}
