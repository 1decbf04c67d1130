//! Response rewriting middleware.
//!
//! The layer between a request handler and the real response sink. It hands
//! the handler an [`Interceptor`] in place of the sink, lets it write status,
//! headers and body as usual, and afterwards rewrites the buffered body
//! through whatever transform the [`TransformRegistry`] holds for the
//! response's content type, re-emitting the result with a corrected
//! `Content-Length`.

pub mod interceptor;
pub mod registry;

pub use interceptor::Interceptor;
pub use registry::{Transform, TransformRegistry};

use crate::http::request::Request;
use crate::http::sink::ResponseSink;

/// A request handler that writes its response into a sink.
///
/// Handlers see `&mut impl ResponseSink`, so the same handler runs against
/// the real connection sink, the rewriting interceptor or a test double.
pub trait Handler {
    fn handle(
        &self,
        req: &Request,
        sink: &mut (impl ResponseSink + Send),
    ) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}

/// Runs `handler` behind a rewriting interceptor over `sink`.
///
/// Constructs the per-request interceptor, invokes the handler with it in
/// place of the real sink, then finalizes - resolving and applying the
/// transform and committing the real output - unless the handler hijacked
/// the connection, in which case the transport belongs to the handler and
/// nothing more may be written.
pub async fn intercept<S, H>(
    registry: &TransformRegistry,
    sink: &mut S,
    req: &Request,
    handler: &H,
) -> anyhow::Result<()>
where
    S: ResponseSink + Send,
    H: Handler,
{
    let mut writer = Interceptor::new(sink);
    handler.handle(req, &mut writer).await?;

    if writer.is_hijacked() {
        return Ok(());
    }
    writer.finalize(registry).await
}
