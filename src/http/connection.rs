use std::sync::Arc;

use anyhow::Context;
use bytes::{Buf, BytesMut};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::Request;
use crate::http::sink::ConnectionSink;
use crate::rewrite::{Handler, TransformRegistry, intercept};

/// One client connection: parses requests off the socket and answers each
/// through the rewrite middleware over a [`ConnectionSink`].
pub struct Connection<H> {
    stream: Option<TcpStream>,
    buffer: BytesMut,
    state: ConnectionState,
    registry: Arc<TransformRegistry>,
    handler: Arc<H>,
}

enum ConnectionState {
    Reading,
    Responding(Request),
    Closed,
}

impl<H: Handler> Connection<H> {
    pub fn new(stream: TcpStream, registry: Arc<TransformRegistry>, handler: Arc<H>) -> Self {
        Self {
            stream: Some(stream),
            buffer: BytesMut::with_capacity(4096),
            state: ConnectionState::Reading,
            registry,
            handler,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => match self.read_request().await? {
                    Some(req) => {
                        self.state = ConnectionState::Responding(req);
                    }
                    None => {
                        self.state = ConnectionState::Closed;
                    }
                },

                ConnectionState::Responding(req) => {
                    let keep_alive = req.keep_alive();

                    // The sink owns the stream for the duration of the
                    // response so a hijacking handler can take it over.
                    let stream = self
                        .stream
                        .take()
                        .context("connection stream already taken")?;
                    let mut sink = ConnectionSink::new(stream);

                    intercept(&self.registry, &mut sink, &req, self.handler.as_ref()).await?;

                    match sink.into_stream() {
                        Some(stream) if keep_alive => {
                            self.stream = Some(stream);
                            self.state = ConnectionState::Reading;
                        }
                        // Hijacked, or the client asked to close.
                        _ => {
                            self.state = ConnectionState::Closed;
                        }
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.advance(consumed);
                    return Ok(Some(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data, fall through to read
                }

                Err(e) => {
                    return Err(anyhow::anyhow!("HTTP parse error: {:?}", e));
                }
            }

            let stream = self
                .stream
                .as_mut()
                .context("connection stream already taken")?;
            let n = stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                // Client closed connection
                return Ok(None);
            }
        }
    }
}
