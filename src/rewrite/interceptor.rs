//! The buffering response interceptor.
//!
//! An [`Interceptor`] stands in for the real [`ResponseSink`] for the length
//! of one request. Header mutations go straight through to the real sink;
//! body bytes are held in an owned buffer so that, once the handler is done,
//! the whole body can be rewritten by a registered transform and re-emitted
//! with a corrected `Content-Length`. Nothing reaches the wire before
//! [`Interceptor::finalize`], with two deliberate exceptions:
//!
//! - a hijack hands the raw transport to the caller and ends the
//!   interceptor's involvement entirely;
//! - an explicit flush degrades the interceptor to a transparent passthrough
//!   for the rest of the request, since a caller that flushes mid-stream has
//!   opted out of whole-body semantics.

use bytes::BytesMut;
use tracing::warn;

use crate::http::headers::Headers;
use crate::http::sink::{CloseNotify, ResponseSink};
use crate::http::sniff::detect_content_type;
use crate::http::status::StatusCode;
use crate::rewrite::registry::TransformRegistry;

/// A hook run once at status-commit time, before anything is buffered.
/// Typical use: a stacked decorator that must adjust headers when it learns
/// the response has started.
pub type BeforeHook = Box<dyn FnOnce(StatusCode, &mut Headers) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Body bytes accumulate in the buffer; the transform runs at finalize.
    Buffering,
    /// A flush was observed: writes go straight to the real sink, no
    /// transform, no length correction.
    Passthrough,
    /// The transport was handed over; the interceptor is inert.
    Hijacked,
}

/// Per-request decorator around a [`ResponseSink`].
///
/// Borrows the sink for one request; the sink must outlive it. Finalize
/// consumes the interceptor, so calling it twice does not compile.
pub struct Interceptor<'a, S: ResponseSink> {
    sink: &'a mut S,
    buffer: BytesMut,
    status: Option<StatusCode>,
    mode: Mode,
    before_hooks: Vec<BeforeHook>,
    wrote: bool,
}

impl<'a, S: ResponseSink> Interceptor<'a, S> {
    pub fn new(sink: &'a mut S) -> Self {
        Self {
            sink,
            buffer: BytesMut::new(),
            status: None,
            mode: Mode::Buffering,
            before_hooks: Vec::new(),
            wrote: false,
        }
    }

    /// Registers a hook to run when the status is committed. Hooks run in
    /// reverse registration order: the most recently registered (innermost
    /// wrapper in a decorator chain) fires first.
    pub fn before(&mut self, hook: impl FnOnce(StatusCode, &mut Headers) + Send + 'static) {
        self.before_hooks.push(Box::new(hook));
    }

    /// The committed status, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Whether the status has been committed (explicitly or by a body write).
    pub fn written(&self) -> bool {
        self.status.is_some()
    }

    /// Number of body bytes currently held back.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// True once the transport was hijacked; finalize must not run.
    pub fn is_hijacked(&self) -> bool {
        self.mode == Mode::Hijacked
    }

    /// Resolves the transform for the response's content type, applies it to
    /// the buffered body and pushes the final bytes through the real sink
    /// with a corrected `Content-Length`. The only point at which body bytes
    /// reach the network.
    ///
    /// Transform failures are logged and swallowed (fail-open: the original
    /// body is sent instead). Write failures on the real sink propagate.
    pub async fn finalize(mut self, registry: &TransformRegistry) -> anyhow::Result<()> {
        match self.mode {
            Mode::Hijacked => {
                debug_assert!(false, "finalize called after hijack");
                Ok(())
            }
            Mode::Passthrough => {
                // Bytes already left; just make sure the head did too.
                self.sink.flush().await
            }
            Mode::Buffering => {
                let status = self.status.unwrap_or(StatusCode::OK);

                if self.sink.close_notify().is_closed() {
                    anyhow::bail!("client closed the connection before the response was written");
                }

                let content_type = self.sink.headers().get("Content-Type").map(str::to_owned);
                let original = std::mem::take(&mut self.buffer).freeze();

                let body = match content_type.as_deref().and_then(|ct| registry.lookup(ct)) {
                    Some(transform) => match transform(&original) {
                        Ok(rewritten) => rewritten.into(),
                        Err(err) => {
                            warn!(
                                content_type = content_type.as_deref().unwrap_or(""),
                                error = %err,
                                "transform failed, sending original body"
                            );
                            original
                        }
                    },
                    None => original,
                };

                // Replaces any stale value the handler may have set; the
                // header map cannot hold duplicates.
                self.sink
                    .headers()
                    .insert("Content-Length", body.len().to_string());

                self.sink.write_header(status);
                self.sink.write(&body).await?;
                self.sink.flush().await
            }
        }
    }

    fn commit_status(&mut self, status: StatusCode) {
        if self.status.is_some() {
            return;
        }
        self.status = Some(status);

        let hooks = std::mem::take(&mut self.before_hooks);
        for hook in hooks.into_iter().rev() {
            hook(status, self.sink.headers());
        }
    }
}

impl<S: ResponseSink + Send> ResponseSink for Interceptor<'_, S> {
    type Transport = S::Transport;

    /// The real sink's header map, unbuffered. Handlers must see their own
    /// header mutations immediately; only the body needs holding back.
    fn headers(&mut self) -> &mut Headers {
        self.sink.headers()
    }

    fn write_header(&mut self, status: StatusCode) {
        self.commit_status(status);
    }

    async fn write(&mut self, data: &[u8]) -> anyhow::Result<usize> {
        if self.status.is_none() {
            self.commit_status(StatusCode::OK);
        }

        // First-write-only sniffing: a declared type always wins, and a type
        // cannot usefully change once part of the body is out.
        if !self.wrote {
            self.wrote = true;
            if !self.sink.headers().contains("Content-Type") {
                let sniffed = detect_content_type(data);
                self.sink.headers().insert("Content-Type", sniffed);
            }
        }

        match self.mode {
            Mode::Buffering => {
                self.buffer.extend_from_slice(data);
                Ok(data.len())
            }
            Mode::Passthrough => self.sink.write(data).await,
            Mode::Hijacked => anyhow::bail!("write after hijack"),
        }
    }

    /// Flushing opts out of whole-body buffering: the head and anything
    /// buffered so far are pushed through immediately and the interceptor
    /// becomes a transparent passthrough, skipping the transform.
    async fn flush(&mut self) -> anyhow::Result<()> {
        match self.mode {
            Mode::Buffering => {
                self.mode = Mode::Passthrough;
                if self.status.is_none() {
                    self.commit_status(StatusCode::OK);
                }
                self.sink.write_header(self.status.unwrap_or(StatusCode::OK));
                if !self.buffer.is_empty() {
                    let held = std::mem::take(&mut self.buffer);
                    self.sink.write(&held).await?;
                }
                self.sink.flush().await
            }
            Mode::Passthrough => self.sink.flush().await,
            Mode::Hijacked => anyhow::bail!("flush after hijack"),
        }
    }

    fn hijack(&mut self) -> anyhow::Result<Self::Transport> {
        let transport = self.sink.hijack()?;
        self.mode = Mode::Hijacked;
        Ok(transport)
    }

    fn close_notify(&mut self) -> CloseNotify {
        self.sink.close_notify()
    }
}
