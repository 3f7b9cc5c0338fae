//! Outbound queue: many producers, one socket writer.
//!
//! The websocket sink does not tolerate concurrent writers, so every write
//! (status, subscriptions, chat messages, read receipts) is encoded up front
//! and funnelled through one bounded channel. Each live connection runs a
//! single writer task that owns the receiving end until the connection dies;
//! frames queued while disconnected go out on the next connection.

mod queue;
mod writer;

pub use queue::{OutboundFrame, OutboundQueue, OutboundReceiver};
pub use writer::run_writer;
