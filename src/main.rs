use std::sync::Arc;

use polish::config::Config;
use polish::handlers::StaticPage;
use polish::rewrite::TransformRegistry;
use polish::{server, transforms};

const DEMO_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <title>  Polish  </title>
  </head>
  <body>
    <p>  Served through the rewrite middleware.  </p>
  </body>
</html>
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let mut registry = TransformRegistry::new();
    if cfg.rewrite.html {
        registry.register("text/html", transforms::collapse_html);
    }
    if cfg.rewrite.css {
        registry.register("text/css", transforms::collapse_css);
    }
    if cfg.rewrite.js {
        registry.register("text/javascript", transforms::collapse_js);
    }
    tracing::info!("Registered {} body transforms", registry.len());

    let registry = Arc::new(registry);
    let handler = Arc::new(StaticPage::new(
        "text/html; charset=utf-8",
        DEMO_PAGE.as_bytes().to_vec(),
    ));

    tokio::select! {
        res = server::listener::run(&cfg.server, registry, handler) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
