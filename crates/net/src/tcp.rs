use std::io;
use std::net::SocketAddr;

use bytes::Bytes;
use futures::StreamExt;
use tokio::net::{TcpSocket, TcpStream};
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::codec::FramedRead;

use crate::channel::{self, Transport, Writer};
use crate::codec::FrameDecoder;
use crate::config::ClientConfig;
use crate::connection::{Connection, DisconnectReason};
use crate::error::NetError;

/// Drives the reliable channel for one session: connect, then read and
/// write until the stream ends or the session is torn down.
pub(crate) async fn run(
    connection: Connection,
    generation: u64,
    remote: SocketAddr,
    outbound: UnboundedReceiver<Bytes>,
) {
    let config = connection.config().clone();

    let stream = match open_stream(remote, &config).await {
        Ok(stream) => stream,
        Err(e) => {
            log::warn!("TCP connect to {} failed: {}", remote, e);
            connection.end_session(generation, DisconnectReason::ConnectFailed);
            return;
        }
    };

    let local = match stream.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            log::warn!("TCP socket has no local address: {}", e);
            connection.end_session(generation, DisconnectReason::ReadError);
            return;
        }
    };

    if !connection.mark_stream_open(generation, local) {
        return;
    }

    let (read_half, write_half) = stream.into_split();
    let reader = FramedRead::with_capacity(
        read_half,
        FrameDecoder::new(config.max_frame_len),
        config.recv_buffer_size,
    );

    tokio::select! {
        reason = read_loop(&connection, generation, reader) => {
            connection.end_session(generation, reason);
        }
        () = channel::write_loop(Transport::Reliable, Writer::Tcp(write_half), outbound) => {}
    }
}

async fn open_stream(remote: SocketAddr, config: &ClientConfig) -> io::Result<TcpStream> {
    let socket = socket_for(remote, config)?;
    let stream = socket.connect(remote).await?;
    if let Err(e) = stream.set_nodelay(config.tcp_nodelay) {
        log::debug!("Could not set TCP_NODELAY: {}", e);
    }
    Ok(stream)
}

/// Creates the unconnected socket with its kernel buffers sized to
/// `recv_buffer_size`.
fn socket_for(remote: SocketAddr, config: &ClientConfig) -> io::Result<TcpSocket> {
    let socket = if remote.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    let size = u32::try_from(config.recv_buffer_size).unwrap_or(u32::MAX);
    if let Err(e) = socket.set_recv_buffer_size(size) {
        log::debug!("Could not set TCP receive buffer to {}: {}", size, e);
    }
    if let Err(e) = socket.set_send_buffer_size(size) {
        log::debug!("Could not set TCP send buffer to {}: {}", size, e);
    }
    Ok(socket)
}

async fn read_loop(
    connection: &Connection,
    generation: u64,
    mut reader: FramedRead<OwnedReadHalf, FrameDecoder>,
) -> DisconnectReason {
    while let Some(frame) = reader.next().await {
        match frame {
            Ok(frame) => connection.deliver_frame(generation, Transport::Reliable, &frame),
            Err(NetError::Io(e)) => {
                log::warn!("TCP read failed: {}", e);
                return DisconnectReason::ReadError;
            }
            Err(e) => {
                log::warn!("TCP stream violated framing: {}", e);
                return DisconnectReason::ProtocolViolation;
            }
        }
    }
    DisconnectReason::ClosedByPeer
}
