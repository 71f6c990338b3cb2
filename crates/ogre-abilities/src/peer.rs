//! The non-authoritative side of the protocol: local input in, encoded
//! requests out, host broadcasts mirrored.

use ogre_core::net::messages::ServerMessage;
use ogre_core::net::protocol::{ProtocolError, decode_server_message, encode_client_message};
use ogre_core::player::PlayerId;

use crate::catalog::AbilityCatalog;
use crate::executor::{AbilityExecutor, ExecutorEvent, Outbound};
use crate::input::{AbilityInputHandler, AbilityTrigger, ButtonState, CollisionEvent};
use crate::world::AbilityWorld;

#[derive(Debug)]
pub struct ClientPeer {
    player: PlayerId,
    input: AbilityInputHandler,
    executor: AbilityExecutor,
}

impl ClientPeer {
    pub fn new(player: PlayerId, catalog: AbilityCatalog, triggers: Vec<AbilityTrigger>) -> Self {
        Self {
            player,
            input: AbilityInputHandler::new(player, triggers),
            executor: AbilityExecutor::client(player, catalog),
        }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player
    }

    pub fn executor(&self) -> &AbilityExecutor {
        &self.executor
    }

    pub fn input_mut(&mut self) -> &mut AbilityInputHandler {
        &mut self.input
    }

    /// Evaluate this tick's input and return the encoded requests for the host.
    pub fn poll_input(
        &mut self,
        buttons: ButtonState,
        collisions: &[CollisionEvent],
    ) -> Result<Vec<Vec<u8>>, ProtocolError> {
        for context in self.input.evaluate(buttons, collisions) {
            if let Err(reason) = self.executor.request_ability_execution(context) {
                tracing::debug!(
                    player_id = self.player,
                    ability = %context.ability,
                    %reason,
                    "Local request refused"
                );
            }
        }
        self.executor
            .drain_outbox()
            .into_iter()
            .filter_map(|out| match out {
                Outbound::ToHost(msg) => Some(encode_client_message(&msg)),
                Outbound::Broadcast(_) => None,
            })
            .collect()
    }

    /// Decode and mirror one host message.
    pub fn receive(&mut self, data: &[u8]) -> Result<ServerMessage, ProtocolError> {
        let msg = decode_server_message(data)?;
        self.executor.apply_server_message(&msg);
        Ok(msg)
    }

    pub fn tick(&mut self, dt: f32, world: &mut dyn AbilityWorld) {
        self.executor.tick(dt, world);
    }

    pub fn drain_events(&mut self) -> Vec<ExecutorEvent> {
        self.executor.drain_events()
    }
}

#[cfg(test)]
mod tests {
    use ogre_core::ability::AbilityName;
    use ogre_core::net::messages::{AbilityStartedMsg, ClientMessage};
    use ogre_core::net::protocol::{decode_client_message, encode_server_message};
    use ogre_core::test_helpers::start;

    use super::*;
    use crate::config::default_bindings;
    use crate::input::Button;

    #[test]
    fn tap_produces_encoded_request() {
        let mut peer = ClientPeer::new(3, AbilityCatalog::default(), default_bindings());
        let out = peer
            .poll_input(ButtonState::pressed(&[Button::Attack]), &[])
            .unwrap();
        assert_eq!(out.len(), 1);
        match decode_client_message(&out[0]).unwrap() {
            ClientMessage::RequestAbility(m) => {
                assert_eq!(m.context, start(3, AbilityName::NormalAttack));
            },
            other => panic!("unexpected message: {other:?}"),
        }
        // Forwarded only: no local instance until the host confirms.
        assert_eq!(peer.executor().active_count(), 0);
    }

    #[test]
    fn receive_mirrors_start() {
        let mut peer = ClientPeer::new(3, AbilityCatalog::default(), default_bindings());
        let bytes = encode_server_message(&ServerMessage::AbilityStarted(AbilityStartedMsg {
            tick: 4,
            context: start(3, AbilityName::HammerAttack),
        }))
        .unwrap();
        peer.receive(&bytes).unwrap();
        assert!(peer.executor().is_active(3, AbilityName::HammerAttack));
    }

    #[test]
    fn receive_rejects_garbage() {
        let mut peer = ClientPeer::new(3, AbilityCatalog::default(), default_bindings());
        assert!(peer.receive(&[]).is_err());
        assert!(peer.receive(&[0xEE, 0x00]).is_err());
    }
}
