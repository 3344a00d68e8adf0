use crate::error::NetError;

pub const DEFAULT_PORT: u16 = 26950;
pub const DATA_BUFFER_SIZE: usize = 4096 * 1024;

/// Messages the server sends to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ServerPacket {
    Welcome = 1,
    SpawnPlayer,
    PlayerPosition,
    PlayerRotation,
    PlayerShooting,
    BulletPosition,
    BulletDestroy,
    PlayerDisconnected,
    PlayerHit,
    PlayerDestroy,
    PlayerRespawn,
    SpawnPowerUp,
    PlayerPowerUp,
    AsteroidSpawn,
    AsteroidMovement,
    AsteroidDestroy,
    GameOver,
}

impl ServerPacket {
    pub const ALL: [ServerPacket; 17] = [
        Self::Welcome,
        Self::SpawnPlayer,
        Self::PlayerPosition,
        Self::PlayerRotation,
        Self::PlayerShooting,
        Self::BulletPosition,
        Self::BulletDestroy,
        Self::PlayerDisconnected,
        Self::PlayerHit,
        Self::PlayerDestroy,
        Self::PlayerRespawn,
        Self::SpawnPowerUp,
        Self::PlayerPowerUp,
        Self::AsteroidSpawn,
        Self::AsteroidMovement,
        Self::AsteroidDestroy,
        Self::GameOver,
    ];

    pub fn id(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for ServerPacket {
    type Error = NetError;

    fn try_from(id: i32) -> Result<Self, NetError> {
        Self::ALL
            .into_iter()
            .find(|packet| packet.id() == id)
            .ok_or(NetError::UnknownMessageType(id))
    }
}

/// Messages the client sends to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ClientPacket {
    WelcomeReceived = 1,
    PlayerMovement,
    PlayerShooting,
    GameOver,
}

impl ClientPacket {
    pub const ALL: [ClientPacket; 4] = [
        Self::WelcomeReceived,
        Self::PlayerMovement,
        Self::PlayerShooting,
        Self::GameOver,
    ];

    pub fn id(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for ClientPacket {
    type Error = NetError;

    fn try_from(id: i32) -> Result<Self, NetError> {
        Self::ALL
            .into_iter()
            .find(|packet| packet.id() == id)
            .ok_or(NetError::UnknownMessageType(id))
    }
}

impl From<ServerPacket> for i32 {
    fn from(packet: ServerPacket) -> i32 {
        packet.id()
    }
}

impl From<ClientPacket> for i32 {
    fn from(packet: ClientPacket) -> i32 {
        packet.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_ids_are_contiguous_from_one() {
        for (index, packet) in ServerPacket::ALL.iter().enumerate() {
            assert_eq!(packet.id(), index as i32 + 1);
            assert_eq!(ServerPacket::try_from(packet.id()).unwrap(), *packet);
        }
        assert_eq!(ServerPacket::GameOver.id(), 17);
    }

    #[test]
    fn test_unknown_ids_rejected() {
        assert!(matches!(
            ServerPacket::try_from(0),
            Err(NetError::UnknownMessageType(0))
        ));
        assert!(ClientPacket::try_from(5).is_err());
        assert_eq!(ClientPacket::try_from(2).unwrap(), ClientPacket::PlayerMovement);
    }
}
