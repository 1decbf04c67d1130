use crate::http::request::Request;
use crate::http::sink::ResponseSink;
use crate::rewrite::Handler;

/// Serves one fixed document for every request.
///
/// The demo handler the binary wires up; also convenient in tests, where the
/// interesting behavior lives in the middleware wrapped around it.
#[derive(Debug, Clone)]
pub struct StaticPage {
    content_type: String,
    body: Vec<u8>,
}

impl StaticPage {
    pub fn new(content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            body,
        }
    }
}

impl Handler for StaticPage {
    async fn handle(
        &self,
        _req: &Request,
        sink: &mut (impl ResponseSink + Send),
    ) -> anyhow::Result<()> {
        sink.headers().insert("Content-Type", self.content_type.clone());
        sink.write(&self.body).await?;
        Ok(())
    }
}
