//! Packets sent by the client.

pub mod configuration;
pub mod handshake;
pub mod login;
pub mod status;
