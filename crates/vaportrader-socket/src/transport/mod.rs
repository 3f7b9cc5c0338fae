//! Transport layer (WebSocket client).
//!
//! Dials the market socket, decodes frames once, and supervises the
//! connection: read loop, writer, and reconnect with backoff.

pub mod backoff;
pub mod codec;
pub mod connection;

pub use backoff::BackoffPolicy;
pub use connection::{ConnectionManager, ConnectionState};
