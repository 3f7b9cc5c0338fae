//! Inbound dispatch: classify every frame and route it.
//!
//! Acknowledgments go to the pending table; unsolicited events go to the
//! registered hooks, each invocation on its own task so a slow hook never
//! stalls the read loop.

pub mod dispatcher;
pub mod hooks;
pub mod private;

pub use dispatcher::Dispatcher;
pub use hooks::{HookFuture, Hooks, NewMessageHook, OrderHook, PrivateMessageHook};
pub use private::PrivateMessage;
