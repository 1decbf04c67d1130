//! Polish - Response-Rewriting HTTP Server
//!
//! An HTTP/1.1 server whose responses pass through a buffering interceptor:
//! the handler's body is captured in full, rewritten by a content-type-keyed
//! transform when one is registered, and re-emitted with a corrected
//! `Content-Length`. A failed transform falls back to the original bytes.

pub mod config;
pub mod handlers;
pub mod http;
pub mod rewrite;
pub mod server;
pub mod transforms;
