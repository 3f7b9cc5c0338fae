use futures_util::{Sink, SinkExt};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::outbound::OutboundReceiver;

/// Drain the outbound queue into one connection's sink.
///
/// Best-effort: a failed write is logged and never fails a pending send (the
/// ack timeout fails those). Returns when the socket is gone or every
/// producer has been dropped.
pub async fn run_writer<S>(rx: OutboundReceiver, mut sink: S)
where
    S: Sink<Message, Error = WsError> + Unpin,
{
    let mut rx = rx.lock().await;

    while let Some(frame) = rx.recv().await {
        match sink.send(Message::text(frame.text)).await {
            Ok(()) => tracing::trace!(msg_type = %frame.msg_type, "frame written"),
            Err(e) if connection_lost(&e) => {
                tracing::warn!(msg_type = %frame.msg_type, error = %e, "write failed, socket gone");
                return;
            }
            Err(e) => {
                tracing::warn!(msg_type = %frame.msg_type, error = %e, "write failed, frame dropped");
            }
        }
    }
    tracing::debug!("outbound queue closed, writer stopping");
}

fn connection_lost(e: &WsError) -> bool {
    matches!(
        e,
        WsError::ConnectionClosed | WsError::AlreadyClosed | WsError::Io(_)
    )
}
