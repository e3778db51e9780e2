//! Packets sent by the server.

pub mod configuration;
pub mod login;
pub mod status;
