use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::http::connection::Connection;
use crate::rewrite::{Handler, TransformRegistry};

/// Accept loop: one spawned task per connection, all sharing the same
/// read-only transform registry and handler.
pub async fn run<H>(
    cfg: &ServerConfig,
    registry: Arc<TransformRegistry>,
    handler: Arc<H>,
) -> anyhow::Result<()>
where
    H: Handler + Send + Sync + 'static,
{
    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("Listening on {}", cfg.listen_addr);

    loop {
        let (socket, peer) = listener.accept().await?;
        tracing::debug!("Accepted connection from {}", peer);

        let registry = Arc::clone(&registry);
        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, registry, handler);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
