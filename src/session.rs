//! Per-connection state machine.
//!
//! ```text
//! Handshake -> Status
//!           -> Login -> Waking -> Transferred
//! ```
//!
//! A status connection answers the server-list ping, mirroring the backend's
//! status when it is up. A login connection is accepted with an offline
//! identity, kept alive while the backend boots, then told to reconnect to the
//! backend with a Transfer packet.

use crate::{
    backend::BackendController,
    config::ProxyConfig,
    connection::{Connection, ReadError},
    prober::{check_backend, IfStopped, Reachable},
    protocol::packet::{
        client, client::handshake::NextState, server, server::login::LoginSuccess, side, state,
    },
    status::ServerStatus,
};
use anyhow::{bail, Context};
use std::net::SocketAddr;
use tokio::{net::TcpStream, time::sleep};

type ServerConnection<State> = Connection<side::Server, State>;

/// How a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Answered a server-list ping.
    StatusServed,
    /// Sent the client to the backend.
    Transferred { username: String, to: SocketAddr },
    /// The wake policy ran out before the backend came up.
    GaveUp { username: String },
}

/// Drives a freshly accepted connection to completion.
///
/// The socket is closed when this returns, on every path.
pub async fn handle_connection<B: BackendController>(
    stream: TcpStream,
    config: &ProxyConfig,
    backend: &B,
) -> anyhow::Result<Outcome> {
    let mut connection = ServerConnection::<state::Handshake>::new(stream)?;

    let client::handshake::Packet::Handshake(handshake) = connection
        .recv_packet()
        .await
        .context("failed to read handshake")?;
    tracing::debug!(
        "Handshake from {}: protocol {}, addressed to {}:{}",
        connection.peer_addr(),
        handshake.protocol_version,
        handshake.server_address,
        handshake.server_port
    );

    match handshake.next_state {
        NextState::Status => {
            tracing::debug!("Transition to Status state");
            handle_status(connection.switch_state(), config, backend).await
        }
        NextState::Login => {
            tracing::debug!("Transition to Login state");
            let (connection, username) = login(connection.switch_state(), config).await?;
            wake_and_transfer(connection, username, config, backend).await
        }
    }
}

async fn handle_status<B: BackendController>(
    mut connection: ServerConnection<state::Status>,
    config: &ProxyConfig,
    backend: &B,
) -> anyhow::Result<Outcome> {
    match connection.recv_packet().await? {
        client::status::Packet::StatusRequest(_) => {}
        packet => bail!("expected a status request, got {}", packet.as_ref()),
    }

    let status = match check_backend(
        backend,
        config.backend_port,
        config.probe_timeout,
        IfStopped::Skip,
    )
    .await
    {
        Some(Reachable { status, .. }) => status,
        None => ServerStatus::offline(&config.motd),
    };
    connection
        .send_packet(server::status::Packet::StatusResponse(
            server::status::StatusResponse {
                json: serde_json::to_string(&status)?,
            },
        ))
        .await?;

    match connection.recv_packet().await {
        Ok(client::status::Packet::PingRequest(ping)) => {
            connection
                .send_packet(server::status::Packet::PongResponse(
                    server::status::PongResponse {
                        payload: ping.payload,
                    },
                ))
                .await?;
        }
        Ok(packet) => bail!("expected a ping, got {}", packet.as_ref()),
        Err(ReadError::ConnectionClosed) => {
            tracing::debug!("{} closed without pinging", connection.peer_addr());
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Outcome::StatusServed)
}

/// Accepts the login and returns once the client has entered
/// the configuration state.
async fn login(
    mut connection: ServerConnection<state::Login>,
    config: &ProxyConfig,
) -> anyhow::Result<(ServerConnection<state::Configuration>, String)> {
    let client::login::Packet::LoginStart(login_start) = connection
        .recv_packet()
        .await
        .context("failed to read login start")?
    else {
        bail!("expected login start");
    };
    let username = login_start.username;
    tracing::info!("Connecting user: {username}");

    // Some clients pipeline more bytes right after Login Start; they would
    // otherwise misalign the frame boundary of the next read.
    let discarded = connection.drain(config.drain_grace).await?;
    if discarded > 0 {
        tracing::debug!("Discarded {discarded} pipelined bytes from {username}");
    }

    connection
        .send_packet(server::login::Packet::LoginSuccess(LoginSuccess::offline(
            username.clone(),
        )))
        .await?;

    let acknowledgement = connection.recv_packet().await?;
    tracing::debug!("Ignoring {} from {username}", acknowledgement.as_ref());

    tracing::debug!("Transition to Configuration state");
    let mut connection = connection.switch_state::<state::Configuration>();
    let first = connection.recv_packet().await?;
    tracing::debug!("Ignoring {} from {username}", first.as_ref());

    Ok((connection, username))
}

async fn wake_and_transfer<B: BackendController>(
    mut connection: ServerConnection<state::Configuration>,
    username: String,
    config: &ProxyConfig,
    backend: &B,
) -> anyhow::Result<Outcome> {
    let mut attempts = config.wake_policy.start();
    let reachable = loop {
        if let Some(reachable) = check_backend(
            backend,
            config.backend_port,
            config.probe_timeout,
            IfStopped::Start,
        )
        .await
        {
            break reachable;
        }

        if !attempts.record_failure() {
            tracing::warn!(
                "Backend still down after {} checks over {:?}; disconnecting {username}",
                attempts.failures(),
                attempts.elapsed()
            );
            return Ok(Outcome::GaveUp { username });
        }

        keep_alive(&mut connection, config).await?;
        sleep(config.wake_policy.interval).await;
    };

    sleep(config.settle_delay).await;
    let to = SocketAddr::new(reachable.address, config.backend_port);
    connection
        .send_packet(server::configuration::Packet::Transfer(
            server::configuration::Transfer {
                host: reachable.address.to_string(),
                port: config.backend_port.into(),
            },
        ))
        .await?;
    tracing::info!("Transferred {username} to {to}");

    sleep(config.transfer_grace).await;
    tracing::info!("Cleaning up user: {username}");
    Ok(Outcome::Transferred { username, to })
}

/// Sends a KeepAlive and reads whatever the client sends back.
///
/// The echo is not checked against the ID sent. Anything other than the
/// client hanging up is logged and ignored.
async fn keep_alive(
    connection: &mut ServerConnection<state::Configuration>,
    config: &ProxyConfig,
) -> anyhow::Result<()> {
    let id: i64 = rand::random();
    connection
        .send_packet(server::configuration::Packet::KeepAlive(
            server::configuration::KeepAlive { id },
        ))
        .await?;
    tracing::debug!("Sent KeepAlive ID: {id}");

    match tokio::time::timeout(config.keep_alive_echo_timeout, connection.recv_packet()).await {
        Ok(Ok(client::configuration::Packet::KeepAlive(echo))) if echo.id != id => {
            tracing::debug!("KeepAlive echo {} does not match {id}", echo.id);
        }
        Ok(Ok(packet)) => tracing::trace!("Received {} while waking", packet.as_ref()),
        Ok(Err(ReadError::ConnectionClosed)) => bail!("client left while waiting for the backend"),
        Ok(Err(e)) => tracing::debug!("Error reading KeepAlive response: {e}"),
        Err(_) => tracing::debug!("No KeepAlive response within {:?}", config.keep_alive_echo_timeout),
    }
    Ok(())
}
