use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::channel::{self, Transport, Writer};
use crate::config::MalformedDatagramPolicy;
use crate::connection::{Connection, DisconnectReason};
use crate::message::Message;

pub const MAX_DATAGRAM_SIZE: usize = 64 * 1024;

/// Drives the unreliable channel for one session. The socket arrives
/// already bound and associated with the server.
pub(crate) async fn run(
    connection: Connection,
    generation: u64,
    socket: std::net::UdpSocket,
    local_id: i32,
    outbound: UnboundedReceiver<Bytes>,
) {
    let socket = match UdpSocket::from_std(socket) {
        Ok(socket) => socket,
        Err(e) => {
            log::warn!("Could not register UDP socket: {}", e);
            connection.end_session(generation, DisconnectReason::DatagramError);
            return;
        }
    };

    // Lets the server learn our address before it has anything to send us.
    if let Err(e) = socket.send(&local_id.to_le_bytes()).await {
        log::warn!("Error sending data to server via UDP: {}", e);
    }

    let policy = connection.config().malformed_datagram;
    tokio::select! {
        reason = receive_loop(&connection, generation, &socket, policy) => {
            connection.end_session(generation, reason);
        }
        () = channel::write_loop(Transport::Unreliable, Writer::Udp(&socket), outbound) => {}
    }
}

async fn receive_loop(
    connection: &Connection,
    generation: u64,
    socket: &UdpSocket,
    policy: MalformedDatagramPolicy,
) -> DisconnectReason {
    let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
    loop {
        let len = match socket.recv(&mut buffer).await {
            Ok(len) => len,
            Err(e) => {
                log::warn!("UDP receive failed: {}", e);
                return DisconnectReason::DatagramError;
            }
        };

        match Message::decode_datagram(&buffer[..len]) {
            Ok(message) => connection.deliver(generation, Transport::Unreliable, message),
            Err(e) => match policy {
                MalformedDatagramPolicy::Disconnect => {
                    log::warn!("Closing on bad datagram: {}", e);
                    return DisconnectReason::DatagramMalformed;
                }
                MalformedDatagramPolicy::Drop => {
                    log::debug!("Dropping bad datagram: {}", e);
                }
            },
        }
    }
}
