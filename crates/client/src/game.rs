use std::collections::HashMap;

use exodus::{Connection, DispatchTable, Message, ServerPacket, outbound};

/// Everything handlers are allowed to touch. Lives on the main thread only.
pub struct GameState {
    pub connection: Connection,
    pub username: String,
    pub local_id: Option<i32>,
    pub server_message: Option<String>,
    pub received: HashMap<ServerPacket, u64>,
    pub game_over: bool,
}

impl GameState {
    pub fn new(connection: Connection, username: impl Into<String>) -> Self {
        Self {
            connection,
            username: username.into(),
            local_id: None,
            server_message: None,
            received: HashMap::new(),
            game_over: false,
        }
    }

    pub fn received(&self, packet: ServerPacket) -> u64 {
        self.received.get(&packet).copied().unwrap_or(0)
    }

    pub fn total_received(&self) -> u64 {
        self.received.values().sum()
    }

    fn record(&mut self, packet: ServerPacket) {
        *self.received.entry(packet).or_default() += 1;
    }
}

/// Handlers for every server message. Game payloads other than the
/// welcome are counted and logged, not interpreted.
pub fn dispatch_table() -> exodus::Result<DispatchTable<GameState>> {
    let mut table = DispatchTable::new();
    table.register(ServerPacket::Welcome, welcome)?;

    for packet in ServerPacket::ALL {
        match packet {
            ServerPacket::Welcome => {}
            ServerPacket::GameOver => {
                table.register(packet, |state: &mut GameState, message: Message| {
                    state.record(ServerPacket::GameOver);
                    state.game_over = true;
                    log::info!("Game over ({} payload bytes)", message.unread_len());
                })?;
            }
            _ => {
                table.register(packet, move |state: &mut GameState, message: Message| {
                    state.record(packet);
                    log::debug!("{:?} ({} payload bytes)", packet, message.unread_len());
                })?;
            }
        }
    }

    Ok(table)
}

fn welcome(state: &mut GameState, mut message: Message) {
    state.record(ServerPacket::Welcome);

    let (text, id) = match read_welcome(&mut message) {
        Ok(fields) => fields,
        Err(e) => {
            log::error!("Malformed welcome: {}", e);
            state.connection.disconnect();
            return;
        }
    };

    log::info!("Message from server: {}", text);
    state.server_message = Some(text);
    state.local_id = Some(id);

    if let Err(e) = state.connection.complete_handshake(id) {
        log::error!("Failed to open UDP channel: {}", e);
        state.connection.disconnect();
        return;
    }
    if let Err(e) = outbound::welcome_received(&state.connection, &state.username) {
        log::warn!("Failed to acknowledge welcome: {}", e);
    }
}

fn read_welcome(message: &mut Message) -> exodus::Result<(String, i32)> {
    let text = message.read_string()?;
    let id = message.read_i32()?;
    Ok((text, id))
}
