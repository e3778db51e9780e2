//! Fakes shared by the end-to-end tests.

#![allow(dead_code)]

use minecraft_wake_proxy::{
    backend::{BackendController, BackendState},
    config::ProxyConfig,
    connection::Connection,
    protocol::packet::{client, server, side, state},
    retry::RetryPolicy,
    server as proxy_server,
    status::{Players, ServerStatus, Version},
};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::net::TcpListener;

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Lifecycle controller whose backend comes up after a set number of
/// address lookups.
pub struct FakeBackend {
    running: AtomicBool,
    starts: AtomicUsize,
    lookups: AtomicUsize,
    /// Lookups before an address is handed out. `None` never does.
    available_after: Option<usize>,
}

impl FakeBackend {
    pub fn stopped(available_after: Option<usize>) -> Self {
        Self {
            running: AtomicBool::new(false),
            starts: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
            available_after,
        }
    }

    pub fn running() -> Self {
        Self {
            running: AtomicBool::new(true),
            ..Self::stopped(Some(1))
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

impl BackendController for FakeBackend {
    async fn status(&self) -> anyhow::Result<BackendState> {
        Ok(if self.running.load(Ordering::SeqCst) {
            BackendState::Running
        } else {
            BackendState::Stopped
        })
    }

    async fn start(&self) -> anyhow::Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn public_address(&self) -> anyhow::Result<Option<IpAddr>> {
        let lookups = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(match self.available_after {
            Some(after) if lookups >= after => Some(LOCALHOST),
            _ => None,
        })
    }
}

pub fn backend_status() -> ServerStatus {
    ServerStatus {
        version: Some(Version {
            name: "Paper 1.21.5".to_owned(),
            protocol: 770,
        }),
        players: Some(Players {
            max: 20,
            online: 3,
            sample: None,
        }),
        description: Some(serde_json::json!("The real server")),
        favicon: None,
        enforces_secure_chat: Some(false),
        extra: Default::default(),
    }
}

/// Answers every status ping with [`backend_status`]. Returns its port.
pub async fn spawn_status_server() -> u16 {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut connection =
                    Connection::<side::Server, state::Handshake>::new(stream).unwrap();
                connection.recv_packet().await.unwrap();
                let mut connection = connection.switch_state::<state::Status>();
                connection.recv_packet().await.unwrap();
                connection
                    .send_packet(server::status::Packet::StatusResponse(
                        server::status::StatusResponse {
                            json: serde_json::to_string(&backend_status()).unwrap(),
                        },
                    ))
                    .await
                    .unwrap();
            });
        }
    });
    port
}

pub fn test_config(backend_port: u16) -> ProxyConfig {
    ProxyConfig {
        bind: SocketAddr::new(LOCALHOST, 0),
        backend_port,
        probe_timeout: Duration::from_millis(500),
        wake_policy: RetryPolicy::unbounded(Duration::from_millis(20)),
        keep_alive_echo_timeout: Duration::from_millis(500),
        settle_delay: Duration::from_millis(10),
        transfer_grace: Duration::from_millis(10),
        drain_grace: Duration::from_millis(20),
        motd: "§aServer Down, Connect to Start".to_owned(),
    }
}

/// Starts the proxy on an ephemeral port.
pub async fn spawn_proxy(config: ProxyConfig, backend: Arc<FakeBackend>) -> SocketAddr {
    let listener = TcpListener::bind(config.bind).await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(proxy_server::run(listener, Arc::new(config), backend));
    address
}

pub fn handshake(port: u16, next_state: client::handshake::NextState) -> client::handshake::Packet {
    client::handshake::Packet::Handshake(client::handshake::Handshake {
        protocol_version: 770,
        server_address: "play.example.com".to_owned(),
        server_port: port,
        next_state,
    })
}
