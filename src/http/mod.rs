//! HTTP protocol implementation.
//!
//! A small HTTP/1.1 server layer with keep-alive support, organized into:
//!
//! - **`connection`**: the per-connection state machine driving parse,
//!   handle and respond
//! - **`parser`**: parses incoming HTTP requests from byte buffers
//! - **`request`**: HTTP request representation and utilities
//! - **`headers`**: case-insensitive header map shared by requests and sinks
//! - **`status`**: HTTP status codes
//! - **`sink`**: the [`sink::ResponseSink`] trait and the real
//!   connection-backed sink responses are written into
//! - **`sniff`**: content-type detection for bodies with no declared type
//!
//! Each connection loops `Reading -> Responding -> Reading` while the client
//! keeps the connection alive; a response is produced by running the
//! configured handler behind the rewrite middleware, which buffers the body
//! and re-emits it (possibly transformed) with a corrected length.

pub mod connection;
pub mod headers;
pub mod parser;
pub mod request;
pub mod sink;
pub mod sniff;
pub mod status;
