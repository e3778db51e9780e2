//! Enumerates the packet types of the phases this proxy speaks.
//!
//! Full parsing of packets is _not_ implemented. Only the fields the
//! proxy acts on are decoded; trailing data it does not care about is
//! kept as a `Vec<u8>` containing the rest of the packet's bytes.
//! (This keeps encoding/decoding lossless.)
//!
//! Layouts follow release 1.21.5 (protocol 770).

use crate::protocol::{Decode, Encode};
use std::fmt::Debug;

pub mod client;
pub mod server;

/// Type encoding for a side (client or server).
pub trait Side: Send + Sync + 'static + Copy + Clone {
    type SendPacket<State: ProtocolState>: Encode + Debug + AsRef<str> + Send + 'static;
    type RecvPacket<State: ProtocolState>: Decode + Debug + AsRef<str> + Send + 'static;
}

pub mod side {
    use super::*;

    /// We are the server: we receive client packets.
    #[derive(Debug, Copy, Clone)]
    pub struct Server;
    impl Side for Server {
        type SendPacket<State: ProtocolState> = State::ServerPacket;
        type RecvPacket<State: ProtocolState> = State::ClientPacket;
    }

    /// We are the client: we receive server packets.
    #[derive(Debug, Copy, Clone)]
    pub struct Client;
    impl Side for Client {
        type SendPacket<State: ProtocolState> = State::ClientPacket;
        type RecvPacket<State: ProtocolState> = State::ServerPacket;
    }
}

/// Type encoding for a protocol state.
pub trait ProtocolState: Send + Sync + 'static {
    /// Packet type sent by the server in this state.
    type ServerPacket: Encode + Decode + Debug + AsRef<str> + Send + 'static;
    /// Packet type sent by the client in this state.
    type ClientPacket: Encode + Decode + Debug + AsRef<str> + Send + 'static;
}

pub mod state {
    use super::*;
    use minecraft_wake_proxy_macros::{Decode, Encode};

    #[derive(Debug, Copy, Clone)]
    pub struct Handshake;
    impl ProtocolState for Handshake {
        type ServerPacket = EmptyPacket;
        type ClientPacket = client::handshake::Packet;
    }

    /// The server never speaks during the handshake.
    #[derive(Encode, Decode, Debug, Clone)]
    pub struct EmptyPacket;

    impl AsRef<str> for EmptyPacket {
        fn as_ref(&self) -> &str {
            ""
        }
    }

    #[derive(Debug, Copy, Clone)]
    pub struct Status;
    impl ProtocolState for Status {
        type ServerPacket = server::status::Packet;
        type ClientPacket = client::status::Packet;
    }

    #[derive(Debug, Copy, Clone)]
    pub struct Login;
    impl ProtocolState for Login {
        type ServerPacket = server::login::Packet;
        type ClientPacket = client::login::Packet;
    }

    #[derive(Debug, Copy, Clone)]
    pub struct Configuration;
    impl ProtocolState for Configuration {
        type ServerPacket = server::configuration::Packet;
        type ClientPacket = client::configuration::Packet;
    }
}
