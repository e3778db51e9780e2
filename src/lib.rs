//! Front proxy for a Minecraft server that may be powered off.
//!
//! The proxy listens where players expect the server to be and speaks just
//! enough of the protocol to handle them without the backend:
//!
//! * Server-list pings are answered with the backend's own status if it is
//!   up, or with a placeholder saying it is asleep.
//! * A login is accepted with an offline identity, which wakes the backend
//!   through a [`BackendController`](backend::BackendController). While it
//!   boots, KeepAlive packets stop the client from timing out.
//! * Once the backend answers a status ping, the client receives a Transfer
//!   packet and reconnects to the backend directly.
//!
//! Only the handshake, status, login and configuration states are spoken,
//! with neither encryption nor compression.

pub mod backend;
pub mod config;
pub mod connection;
pub mod prober;
pub mod protocol;
pub mod retry;
pub mod server;
pub mod session;
pub mod status;
