//! Confirmed sends: pending table, correlator, and expiry sweeper.
//!
//! The market socket is fire-and-forget; `Correlator` layers request/reply
//! on top by tagging each chat message with a temp id and parking the caller
//! on a oneshot until the matching `MESSAGE_SENT` arrives or the sweeper
//! gives up on it. Removal from `PendingTable` is the single resolution point,
//! so the dispatcher and the sweeper can race freely and only one of them
//! gets the entry.

mod correlator;
mod sweeper;
mod table;

pub use correlator::{new_temp_id, Correlator};
pub use sweeper::spawn_sweeper;
pub use table::PendingTable;
