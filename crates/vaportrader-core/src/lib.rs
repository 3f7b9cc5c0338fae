//! vaportrader core: wire protocol types and the shared error surface.
//!
//! This crate defines the envelope format spoken with the market socket, the
//! concrete payload shapes behind each message type, and the error type shared
//! with the socket client. It carries no transport or runtime dependencies so
//! the protocol can be exercised (and fuzzed) without a network.
//!
//! # Guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Every malformed
//! frame surfaces as `VaporError::Decode` instead of taking the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, VaporError};
