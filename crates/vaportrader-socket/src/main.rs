//! vaportrader socket daemon.
//!
//! Connects to the market with the `JWT` token from the environment, logs
//! order feed events and direct messages until Ctrl+C / SIGTERM.

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use vaportrader_core::error::{Result, VaporError};
use vaportrader_socket::collab::{InMemoryUserDirectory, UserDirectory};
use vaportrader_socket::{config, MarketClient};

const DEFAULT_CONFIG: &str = "vaportrader.yaml";

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        tracing::error!(code = e.code().as_str(), error = %e, "vaportrader-socket failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = config::load_from_file(&path)?;
    let token = std::env::var("JWT")
        .map_err(|_| VaporError::BadRequest("JWT environment variable is not set".into()))?;

    let client = MarketClient::new(cfg, token)?;
    let users: Arc<dyn UserDirectory> = Arc::new(InMemoryUserDirectory::new());

    client.set_order_hook(|order| async move {
        tracing::info!(
            order_id = %order.id,
            item = %order.item.url_name,
            order_type = %order.order_type,
            platinum = order.platinum,
            quantity = order.quantity,
            user = %order.user.ingame_name,
            "new order"
        );
    });

    client.set_private_message_hook(move |pm| {
        let users = users.clone();
        async move {
            match pm.sender(users.as_ref()).await {
                Ok(Some(user)) => tracing::info!(user_id = %user.id, chat_id = %pm.chat_id(), "message from linked user"),
                Ok(None) => tracing::info!(author = %pm.author(), chat_id = %pm.chat_id(), "message from unknown user"),
                Err(e) => tracing::warn!(error = %e, "user lookup failed"),
            }
        }
    });

    tracing::info!(endpoint = %client.config().socket.endpoint, config = %path, "vaportrader-socket starting");
    client.connect().await?;

    shutdown_signal().await;
    client.shutdown().await;
    tracing::info!("vaportrader-socket stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, shutting down");
}
