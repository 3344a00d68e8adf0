use std::fmt;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::UdpSocket;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::connection::SessionGuard;
use crate::error::{NetError, Result};
use crate::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Reliable,
    Unreliable,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Reliable => f.write_str("TCP"),
            Transport::Unreliable => f.write_str("UDP"),
        }
    }
}

/// Receives every decoded inbound message, on whichever I/O worker thread
/// completed the read.
pub type InboundSink = Arc<dyn Fn(SessionGuard, Transport, Message) + Send + Sync + 'static>;

/// One open channel: a queue of framed outbound bytes and the task that
/// owns the socket. Dropping the task releases the socket.
pub struct ChannelHandle {
    transport: Transport,
    outbound: UnboundedSender<Bytes>,
    task: JoinHandle<()>,
}

impl ChannelHandle {
    pub(crate) fn new(
        transport: Transport,
        outbound: UnboundedSender<Bytes>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            transport,
            outbound,
            task,
        }
    }

    /// Queues an already framed message. Never blocks.
    pub fn send(&self, frame: Bytes) -> Result<()> {
        self.outbound
            .send(frame)
            .map_err(|_| NetError::ChannelClosed)
    }

    pub fn close(self) {
        self.task.abort();
        log::debug!("{} channel closed", self.transport);
    }
}

pub(crate) enum Writer<'a> {
    Tcp(OwnedWriteHalf),
    Udp(&'a UdpSocket),
}

impl Writer<'_> {
    async fn write(&mut self, frame: &[u8]) -> io::Result<()> {
        match self {
            Writer::Tcp(stream) => stream.write_all(frame).await,
            Writer::Udp(socket) => socket.send(frame).await.map(|_| ()),
        }
    }
}

/// Drains the outbound queue into the socket until the handle is dropped.
///
/// Write failures are logged and the frame is dropped; the connection is
/// left to the read side to tear down.
pub(crate) async fn write_loop(
    transport: Transport,
    mut writer: Writer<'_>,
    mut outbound: UnboundedReceiver<Bytes>,
) {
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = writer.write(&frame).await {
            log::warn!("Error sending data to server via {}: {}", transport, e);
        }
    }
}
