//! Command-line configuration.

use crate::{
    backend::{Backend, BackendCommands, CommandBackend, StaticBackend},
    retry::RetryPolicy,
    status::DEFAULT_MOTD,
};
use clap::{Parser, Subcommand};
use std::{
    net::{IpAddr, SocketAddr},
    time::Duration,
};

/// Settings shared read-only by every connection.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Address the proxy listens on.
    pub bind: SocketAddr,
    /// Port the backend serves on. Never taken from the client's handshake.
    pub backend_port: u16,
    /// Bound on a whole status ping to the backend.
    pub probe_timeout: Duration,
    /// How long to keep a login waiting for the backend.
    pub wake_policy: RetryPolicy,
    /// How long to wait for the client to answer a KeepAlive.
    pub keep_alive_echo_timeout: Duration,
    /// Pause between the backend answering and sending the Transfer.
    pub settle_delay: Duration,
    /// How long to hold the connection open after the Transfer.
    pub transfer_grace: Duration,
    /// How long to wait for pipelined bytes after Login Start.
    pub drain_grace: Duration,
    /// Description shown while the backend is down.
    pub motd: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 25565)),
            backend_port: 25565,
            probe_timeout: Duration::from_secs(2),
            wake_policy: RetryPolicy::default(),
            keep_alive_echo_timeout: Duration::from_secs(5),
            settle_delay: Duration::from_secs(1),
            transfer_grace: Duration::from_secs(5),
            drain_grace: Duration::from_millis(50),
            motd: DEFAULT_MOTD.to_owned(),
        }
    }
}

/// Wakes a sleeping Minecraft server when a player logs in,
/// then transfers them to it.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    #[arg(long, default_value = "0.0.0.0:25565")]
    pub bind: SocketAddr,
    #[arg(long, default_value_t = 25565)]
    pub backend_port: u16,
    #[arg(long, default_value_t = 2000)]
    pub probe_timeout_ms: u64,
    #[arg(long, default_value_t = 1000)]
    pub wake_interval_ms: u64,
    /// Give up waking after this many failed checks. Unlimited if unset.
    #[arg(long)]
    pub wake_max_attempts: Option<u32>,
    /// Give up waking after this many seconds. Unlimited if unset.
    #[arg(long)]
    pub wake_deadline_secs: Option<u64>,
    #[arg(long, default_value_t = 5000)]
    pub keep_alive_echo_timeout_ms: u64,
    #[arg(long, default_value_t = 1000)]
    pub settle_delay_ms: u64,
    #[arg(long, default_value_t = 5000)]
    pub transfer_grace_ms: u64,
    #[arg(long, default_value_t = 50)]
    pub drain_grace_ms: u64,
    #[arg(long, default_value = DEFAULT_MOTD)]
    pub motd: String,
    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    pub log_level: String,
    #[command(subcommand)]
    pub backend: BackendArgs,
}

#[derive(Debug, Subcommand)]
pub enum BackendArgs {
    /// Backend is always at a fixed address and managed elsewhere.
    Static {
        #[arg(long)]
        address: IpAddr,
    },
    /// Backend is controlled through shell commands. `{instance}` and
    /// `{region}` in each command are replaced before running.
    Command {
        #[arg(long)]
        instance: String,
        #[arg(long)]
        region: String,
        /// Prints `running` or `stopped`.
        #[arg(long)]
        status_cmd: String,
        #[arg(long)]
        start_cmd: String,
        /// Prints the backend's public IP.
        #[arg(long)]
        address_cmd: String,
    },
}

impl Cli {
    pub fn proxy_config(&self) -> ProxyConfig {
        ProxyConfig {
            bind: self.bind,
            backend_port: self.backend_port,
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            wake_policy: RetryPolicy {
                interval: Duration::from_millis(self.wake_interval_ms),
                max_attempts: self.wake_max_attempts,
                deadline: self.wake_deadline_secs.map(Duration::from_secs),
            },
            keep_alive_echo_timeout: Duration::from_millis(self.keep_alive_echo_timeout_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            transfer_grace: Duration::from_millis(self.transfer_grace_ms),
            drain_grace: Duration::from_millis(self.drain_grace_ms),
            motd: self.motd.clone(),
        }
    }

    pub fn backend(&self) -> Backend {
        match &self.backend {
            BackendArgs::Static { address } => Backend::Static(StaticBackend::new(*address)),
            BackendArgs::Command {
                instance,
                region,
                status_cmd,
                start_cmd,
                address_cmd,
            } => Backend::Command(CommandBackend::new(
                instance.clone(),
                region.clone(),
                BackendCommands {
                    status: status_cmd.clone(),
                    start: start_cmd.clone(),
                    address: address_cmd.clone(),
                },
            )),
        }
    }
}
