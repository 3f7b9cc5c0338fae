//! Top-level facade crate for vaportrader.
//!
//! Re-exports the protocol types and the socket client so users can depend on a single crate.

pub mod core {
    pub use vaportrader_core::*;
}

pub mod socket {
    pub use vaportrader_socket::*;
}

pub use vaportrader_socket::MarketClient;
