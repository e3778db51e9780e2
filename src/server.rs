//! Accepts connections and runs each one on its own task.

use crate::{backend::BackendController, config::ProxyConfig, session};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Runs the proxy on `listener` until accepting fails.
pub async fn run<B>(
    listener: TcpListener,
    config: Arc<ProxyConfig>,
    backend: Arc<B>,
) -> anyhow::Result<()>
where
    B: BackendController + 'static,
{
    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!("Failed to accept connection: {e}");
                continue;
            }
        };

        tracing::info!("Connection from {peer_addr}");
        let config = Arc::clone(&config);
        let backend = Arc::clone(&backend);
        tokio::spawn(async move {
            match session::handle_connection(stream, &config, &*backend).await {
                Ok(outcome) => tracing::debug!("Connection from {peer_addr} finished: {outcome:?}"),
                Err(e) => tracing::warn!("Connection from {peer_addr} failed: {e:?}"),
            }
        });
    }
}
