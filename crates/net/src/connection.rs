use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::channel::{ChannelHandle, InboundSink, Transport};
use crate::config::ClientConfig;
use crate::error::{NetError, Result};
use crate::message::Message;
use crate::{tcp, udp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    /// TCP connect issued, not yet completed.
    Connecting,
    /// Stream open, waiting for the server's welcome.
    Handshaking,
    /// Welcome handled, both channels open.
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    Requested,
    ConnectFailed,
    ClosedByPeer,
    ReadError,
    ProtocolViolation,
    DatagramMalformed,
    DatagramError,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Requested => "disconnect requested",
            DisconnectReason::ConnectFailed => "connect failed",
            DisconnectReason::ClosedByPeer => "closed by server",
            DisconnectReason::ReadError => "read error",
            DisconnectReason::ProtocolViolation => "protocol violation",
            DisconnectReason::DatagramMalformed => "malformed datagram",
            DisconnectReason::DatagramError => "datagram error",
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names the session a message arrived on.
///
/// Messages can sit in the main-thread queue across a disconnect; the
/// guard lets the consumer skip the ones whose session is gone.
#[derive(Debug, Clone)]
pub struct SessionGuard {
    live: Arc<AtomicU64>,
    generation: u64,
}

impl SessionGuard {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while the session is neither torn down nor replaced.
    pub fn is_current(&self) -> bool {
        self.live.load(Ordering::SeqCst) == self.generation
    }
}

struct Session {
    state: ConnectionState,
    generation: u64,
    remote: Option<SocketAddr>,
    local: Option<SocketAddr>,
    tcp: Option<ChannelHandle>,
    udp: Option<ChannelHandle>,
    last_disconnect: Option<DisconnectReason>,
}

struct Shared {
    config: ClientConfig,
    runtime: Handle,
    inbound: InboundSink,
    local_id: AtomicI32,
    /// Generation of the open session, 0 while disconnected.
    live: Arc<AtomicU64>,
    session: Mutex<Session>,
}

/// The one active server connection.
///
/// Cheap to clone; every clone drives the same pair of channels. Pass a
/// clone to whatever needs to send or disconnect.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
}

impl Connection {
    pub fn new<F>(runtime: Handle, config: ClientConfig, inbound: F) -> Self
    where
        F: Fn(SessionGuard, Transport, Message) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                config,
                runtime,
                inbound: Arc::new(inbound),
                local_id: AtomicI32::new(0),
                live: Arc::new(AtomicU64::new(0)),
                session: Mutex::new(Session {
                    state: ConnectionState::Disconnected,
                    generation: 0,
                    remote: None,
                    local: None,
                    tcp: None,
                    udp: None,
                    last_disconnect: None,
                }),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    pub fn state(&self) -> ConnectionState {
        self.session().state
    }

    /// True from the moment a connect is issued until the session is torn
    /// down.
    pub fn is_connected(&self) -> bool {
        self.state() != ConnectionState::Disconnected
    }

    pub fn local_id(&self) -> i32 {
        self.shared.local_id.load(Ordering::SeqCst)
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.session().remote
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.session().local
    }

    pub fn last_disconnect_reason(&self) -> Option<DisconnectReason> {
        self.session().last_disconnect
    }

    /// Resolves `host` and starts connecting in the background.
    ///
    /// Returns once the connect has been issued; progress shows up in
    /// [`state`](Self::state). `host` may carry its own port
    /// (`"10.0.0.2:4000"`), otherwise the configured port is used.
    pub fn connect(&self, host: &str) -> Result<()> {
        let remote = resolve(host, self.shared.config.port)?;

        let mut session = self.session();
        if session.state != ConnectionState::Disconnected {
            return Err(NetError::AlreadyConnected);
        }
        session.generation += 1;
        session.state = ConnectionState::Connecting;
        session.remote = Some(remote);
        session.local = None;
        session.last_disconnect = None;
        self.shared.local_id.store(0, Ordering::SeqCst);
        self.shared.live.store(session.generation, Ordering::SeqCst);

        let (outbound, receiver) = mpsc::unbounded_channel();
        let task = self
            .shared
            .runtime
            .spawn(tcp::run(self.clone(), session.generation, remote, receiver));
        session.tcp = Some(ChannelHandle::new(Transport::Reliable, outbound, task));

        log::info!("Connecting to {}", remote);
        Ok(())
    }

    /// Finishes the welcome exchange: records the id the server assigned
    /// and opens the unreliable channel.
    pub fn complete_handshake(&self, local_id: i32) -> Result<()> {
        let mut session = self.session();
        match session.state {
            ConnectionState::Handshaking => {}
            ConnectionState::Connected => return Err(NetError::AlreadyConnected),
            _ => return Err(NetError::NotConnected),
        }
        let (Some(remote), Some(local)) = (session.remote, session.local) else {
            return Err(NetError::NotConnected);
        };

        let port = self.shared.config.udp_local_port.unwrap_or(local.port());
        let socket = std::net::UdpSocket::bind(SocketAddr::new(unspecified(remote.ip()), port))?;
        socket.connect(remote)?;
        socket.set_nonblocking(true)?;

        self.shared.local_id.store(local_id, Ordering::SeqCst);

        let (outbound, receiver) = mpsc::unbounded_channel();
        let task = self.shared.runtime.spawn(udp::run(
            self.clone(),
            session.generation,
            socket,
            local_id,
            receiver,
        ));
        session.udp = Some(ChannelHandle::new(Transport::Unreliable, outbound, task));
        session.state = ConnectionState::Connected;

        log::info!("Handshake complete, local id {} (UDP port {})", local_id, port);
        Ok(())
    }

    pub fn send_reliable(&self, message: &Message) -> Result<()> {
        let session = self.session();
        let channel = session.tcp.as_ref().ok_or(NetError::NotConnected)?;
        channel.send(message.encode())
    }

    pub fn send_unreliable(&self, message: &Message) -> Result<()> {
        let session = self.session();
        let channel = session.udp.as_ref().ok_or(NetError::NotConnected)?;
        channel.send(message.encode_with_sender(self.local_id()))
    }

    /// Closes both channels. Safe to call any number of times; returns
    /// whether this call did the teardown.
    pub fn disconnect(&self) -> bool {
        let mut session = self.session();
        self.teardown(&mut session, DisconnectReason::Requested)
    }

    pub(crate) fn end_session(&self, generation: u64, reason: DisconnectReason) {
        let mut session = self.session();
        if session.generation == generation {
            self.teardown(&mut session, reason);
        }
    }

    pub(crate) fn mark_stream_open(&self, generation: u64, local: SocketAddr) -> bool {
        let mut session = self.session();
        if session.generation != generation || session.state != ConnectionState::Connecting {
            return false;
        }
        session.state = ConnectionState::Handshaking;
        session.local = Some(local);
        if let Some(remote) = session.remote {
            log::info!("Connected to {} (local {})", remote, local);
        }
        true
    }

    pub(crate) fn deliver(&self, generation: u64, transport: Transport, message: Message) {
        log::trace!("{} message {} received", transport, message.type_id());
        (self.shared.inbound)(self.guard(generation), transport, message);
    }

    pub(crate) fn deliver_frame(&self, generation: u64, transport: Transport, frame: &[u8]) {
        match Message::decode(frame) {
            Ok(message) => self.deliver(generation, transport, message),
            Err(e) => log::warn!("Dropping {} frame: {}", transport, e),
        }
    }

    fn guard(&self, generation: u64) -> SessionGuard {
        SessionGuard {
            live: Arc::clone(&self.shared.live),
            generation,
        }
    }

    fn teardown(&self, session: &mut Session, reason: DisconnectReason) -> bool {
        if session.state == ConnectionState::Disconnected {
            return false;
        }
        session.state = ConnectionState::Disconnected;
        self.shared.live.store(0, Ordering::SeqCst);
        if let Some(tcp) = session.tcp.take() {
            tcp.close();
        }
        if let Some(udp) = session.udp.take() {
            udp.close();
        }
        session.last_disconnect = Some(reason);
        log::info!("Disconnected from server ({})", reason);
        true
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.shared
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn unspecified(remote: IpAddr) -> IpAddr {
    match remote {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    }
}

/// Resolves a host name or address, preferring IPv4.
pub fn resolve(host: &str, default_port: u16) -> Result<SocketAddr> {
    if let Ok(addr) = host.parse::<SocketAddr>() {
        return Ok(addr);
    }
    let addrs: Vec<SocketAddr> = (host, default_port)
        .to_socket_addrs()
        .map_err(|e| NetError::Resolve(format!("{host}: {e}")))?
        .collect();
    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| NetError::Resolve(host.to_string()))
}
