//! A TCP connection speaking the framed protocol, typed by
//! which side we play and which protocol state it is in.

use crate::protocol::{
    packet,
    packet::{side, state, ProtocolState},
    FrameError, PacketCodec,
};
use std::{io, net::SocketAddr, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::{timeout_at, Instant},
};

/// An error while reading a packet from the socket.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("connection closed")]
    ConnectionClosed,
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

const READ_CHUNK_SIZE: usize = 512;

pub struct Connection<Side, State> {
    stream: TcpStream,
    peer_addr: SocketAddr,
    codec: PacketCodec<Side, State>,
}

impl Connection<side::Client, state::Handshake> {
    /// Opens a connection to a server.
    pub async fn connect(address: SocketAddr) -> io::Result<Self> {
        Self::new(TcpStream::connect(address).await?)
    }
}

impl<Side, State> Connection<Side, State>
where
    Side: packet::Side,
    State: ProtocolState,
{
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        stream.set_nodelay(true)?;
        Ok(Self {
            peer_addr: stream.peer_addr()?,
            stream,
            codec: PacketCodec::new(),
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn switch_state<NewState: ProtocolState>(self) -> Connection<Side, NewState> {
        Connection {
            stream: self.stream,
            peer_addr: self.peer_addr,
            codec: self.codec.switch_state(),
        }
    }

    /// Sends a packet as a single write.
    pub async fn send_packet(&mut self, packet: Side::SendPacket<State>) -> anyhow::Result<()> {
        let data = self.codec.encode_packet(&packet)?;
        self.stream.write_all(&data).await?;
        self.stream.flush().await?;
        tracing::trace!("Sent {} to {}", packet.as_ref(), self.peer_addr);
        Ok(())
    }

    /// Waits for the next packet.
    ///
    /// Cancel safe: bytes read before cancellation stay buffered.
    pub async fn recv_packet(&mut self) -> Result<Side::RecvPacket<State>, ReadError> {
        let mut buffer = [0u8; READ_CHUNK_SIZE];
        loop {
            if let Some(packet) = self.codec.decode_packet()? {
                tracing::trace!("Received {} from {}", packet.as_ref(), self.peer_addr);
                return Ok(packet);
            }

            let bytes_read = self.stream.read(&mut buffer).await?;
            if bytes_read == 0 {
                return Err(ReadError::ConnectionClosed);
            }
            self.codec.give_data(&buffer[..bytes_read]);
        }
    }

    /// Discards everything the peer has sent but we have not yet decoded.
    ///
    /// Reads without blocking until the socket would block, then waits at
    /// most until `grace` has elapsed for further bytes. Returns the number
    /// of bytes discarded.
    pub async fn drain(&mut self, grace: Duration) -> Result<usize, ReadError> {
        let deadline = Instant::now() + grace;
        let mut discarded = self.codec.clear();
        let mut buffer = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.stream.try_read(&mut buffer) {
                Ok(0) => return Err(ReadError::ConnectionClosed),
                Ok(n) => {
                    discarded += n;
                    if Instant::now() >= deadline {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    match timeout_at(deadline, self.stream.readable()).await {
                        Ok(ready) => ready?,
                        Err(_) => break,
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(discarded)
    }
}
