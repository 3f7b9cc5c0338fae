//! Warframe.market websocket client.
//!
//! Keeps one authenticated socket alive, subscribes to the order feeds,
//! layers confirmed sends over the fire-and-forget chat protocol and hands
//! unsolicited events to user hooks. Consumed by the binary (`main.rs`) and
//! by integration tests.

pub mod client;
pub mod collab;
pub mod config;
pub mod dispatch;
pub mod outbound;
pub mod pending;
pub mod transport;

pub use client::MarketClient;
