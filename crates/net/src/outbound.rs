//! Client-to-server messages.

use crate::connection::Connection;
use crate::error::Result;
use crate::message::Message;
use crate::protocol::ClientPacket;

pub fn welcome_received(connection: &Connection, username: &str) -> Result<()> {
    connection.send_reliable(&welcome_received_message(connection.local_id(), username))
}

pub fn player_movement(connection: &Connection, inputs: &[bool]) -> Result<()> {
    connection.send_unreliable(&player_movement_message(inputs))
}

pub fn player_shooting(connection: &Connection, weapon_level: i32, projectile_speed: f32) -> Result<()> {
    connection.send_reliable(&player_shooting_message(weapon_level, projectile_speed))
}

pub fn game_over(connection: &Connection, winner: i32) -> Result<()> {
    connection.send_reliable(&game_over_message(winner))
}

fn welcome_received_message(local_id: i32, username: &str) -> Message {
    let mut message = Message::new(ClientPacket::WelcomeReceived.id());
    message.write_i32(local_id).write_str(username);
    message
}

fn player_movement_message(inputs: &[bool]) -> Message {
    let mut message = Message::new(ClientPacket::PlayerMovement.id());
    message.write_i32(inputs.len() as i32);
    for input in inputs {
        message.write_bool(*input);
    }
    message
}

fn player_shooting_message(weapon_level: i32, projectile_speed: f32) -> Message {
    let mut message = Message::new(ClientPacket::PlayerShooting.id());
    message.write_i32(weapon_level).write_f32(projectile_speed);
    message
}

fn game_over_message(winner: i32) -> Message {
    let mut message = Message::new(ClientPacket::GameOver.id());
    message.write_i32(winner);
    message
}
