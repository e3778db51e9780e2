//! Determines whether the backend is up by running a status
//! exchange against it, as a client would for the server list.

use crate::{
    backend::{BackendController, BackendState},
    connection::Connection,
    protocol::{
        packet::{client, client::handshake::NextState, server, state},
        PROBE_PROTOCOL_VERSION,
    },
    status::ServerStatus,
};
use anyhow::bail;
use std::{
    net::{IpAddr, SocketAddr},
    time::Duration,
};
use tokio::time::timeout;

/// Runs a status exchange with the server at `address:port`.
///
/// Returns `None` if the server could not be reached, did not answer
/// within `limit`, or answered with something other than a status.
pub async fn probe(address: IpAddr, port: u16, limit: Duration) -> Option<ServerStatus> {
    match timeout(limit, exchange_status(address, port)).await {
        Ok(Ok(status)) => Some(status),
        Ok(Err(e)) => {
            tracing::debug!("Status ping to {address}:{port} failed: {e:#}");
            None
        }
        Err(_) => {
            tracing::debug!("Status ping to {address}:{port} timed out");
            None
        }
    }
}

async fn exchange_status(address: IpAddr, port: u16) -> anyhow::Result<ServerStatus> {
    let mut connection = Connection::connect(SocketAddr::new(address, port)).await?;
    connection
        .send_packet(client::handshake::Packet::Handshake(
            client::handshake::Handshake {
                protocol_version: PROBE_PROTOCOL_VERSION,
                server_address: address.to_string(),
                server_port: port,
                next_state: NextState::Status,
            },
        ))
        .await?;

    let mut connection = connection.switch_state::<state::Status>();
    connection
        .send_packet(client::status::Packet::StatusRequest(
            client::status::StatusRequest {},
        ))
        .await?;

    match connection.recv_packet().await? {
        server::status::Packet::StatusResponse(response) => {
            Ok(ServerStatus::from_json(&response.json)?)
        }
        packet => bail!("expected a status response, got {}", packet.as_ref()),
    }
}

/// What to do when the lifecycle controller reports the backend stopped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IfStopped {
    /// Power it on and keep checking.
    Start,
    /// Report it unreachable.
    Skip,
}

/// A backend that answered a status ping.
#[derive(Debug, Clone)]
pub struct Reachable {
    pub address: IpAddr,
    pub status: ServerStatus,
}

/// Asks the lifecycle controller about the backend, then pings it.
///
/// Controller failures are logged and count as unreachable.
pub async fn check_backend<B: BackendController>(
    backend: &B,
    port: u16,
    probe_timeout: Duration,
    if_stopped: IfStopped,
) -> Option<Reachable> {
    match backend.status().await {
        Ok(BackendState::Stopped) => match if_stopped {
            IfStopped::Start => {
                if let Err(e) = backend.start().await {
                    tracing::warn!("Failed to start backend: {e:#}");
                }
            }
            IfStopped::Skip => return None,
        },
        Ok(state) => tracing::trace!("Backend is {}", state.as_ref()),
        Err(e) => tracing::warn!("Failed to query backend status: {e:#}"),
    }

    let address = match backend.public_address().await {
        Ok(Some(address)) => address,
        Ok(None) => {
            tracing::debug!("Backend has no public address yet");
            return None;
        }
        Err(e) => {
            tracing::warn!("Failed to look up backend address: {e:#}");
            return None;
        }
    };

    tracing::info!("Pinging {address}:{port}...");
    let status = probe(address, port, probe_timeout).await?;
    Some(Reachable { address, status })
}
