pub mod ability;
pub mod net;
pub mod object;
pub mod player;
pub mod pose;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use glam::Vec3;

    use crate::ability::{AbilityContext, AbilityName};
    use crate::net::messages::{ClientMessage, ServerMessage};
    use crate::net::protocol::{
        decode_client_message, decode_server_message, encode_client_message,
        encode_server_message,
    };
    use crate::player::{Player, PlayerId};
    use crate::pose::Pose;

    /// Create `n` test players with sequential IDs starting at 1.
    pub fn make_players(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player::new(i as PlayerId + 1, format!("Player{}", i + 1)))
            .collect()
    }

    /// Pose at `(x, 0, z)` facing `yaw`.
    pub fn pose_at(x: f32, z: f32, yaw: f32) -> Pose {
        Pose::new(Vec3::new(x, 0.0, z), yaw)
    }

    pub fn start(player: PlayerId, ability: AbilityName) -> AbilityContext {
        AbilityContext::start(player, ability)
    }

    pub fn stop(player: PlayerId, ability: AbilityName) -> AbilityContext {
        AbilityContext::stop(player, ability)
    }

    /// Push a server message through the wire codec, as a peer would receive it.
    pub fn over_the_wire(msg: &ServerMessage) -> ServerMessage {
        let bytes = encode_server_message(msg).expect("server message must encode");
        decode_server_message(&bytes).expect("server message must decode")
    }

    /// Push a client message through the wire codec, as the host would receive it.
    pub fn client_over_the_wire(msg: &ClientMessage) -> ClientMessage {
        let bytes = encode_client_message(msg).expect("client message must encode");
        decode_client_message(&bytes).expect("client message must decode")
    }
}
