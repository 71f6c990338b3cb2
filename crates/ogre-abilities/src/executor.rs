//! Per-peer registry of running abilities.
//!
//! The host owns the authoritative instance of every activation and is the
//! only peer whose instances run gameplay hooks. Clients forward their
//! requests and keep non-authority mirrors that only track phase and
//! cooldown. Messages for the other side are queued in an outbox the caller
//! drains after each call.

use std::collections::BTreeMap;

use ogre_core::ability::{AbilityContext, AbilityName, AbilityPhase, ActionType, RejectReason};
use ogre_core::net::messages::{
    AbilityEndedMsg, AbilityRejectedMsg, AbilityStartedMsg, ClientMessage, RequestAbilityMsg,
    ServerMessage,
};
use ogre_core::player::PlayerId;

use crate::ability::Ability;
use crate::catalog::AbilityCatalog;
use crate::cooldown::CooldownManager;
use crate::world::AbilityWorld;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    Host,
    Client { local_player: PlayerId },
}

#[derive(Debug, Clone)]
pub struct AbilityRuntimeInfo {
    pub instance: Ability,
    pub is_authority_instance: bool,
}

/// What happened to an accepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Started locally with authority.
    Executed,
    /// Sent to the host.
    Forwarded,
    /// This many running instances were told to end.
    Stopped(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    ToHost(ClientMessage),
    Broadcast(ServerMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorEvent {
    Started {
        player: PlayerId,
        ability: AbilityName,
    },
    Ended {
        player: PlayerId,
        ability: AbilityName,
    },
    Rejected {
        context: AbilityContext,
        reason: RejectReason,
    },
    CooldownReady {
        player: PlayerId,
        ability: AbilityName,
    },
}

#[derive(Debug)]
pub struct AbilityExecutor {
    role: PeerRole,
    catalog: AbilityCatalog,
    active: BTreeMap<PlayerId, Vec<AbilityRuntimeInfo>>,
    /// Cooldowns that outlived their instance.
    cooldowns: BTreeMap<(PlayerId, AbilityName), CooldownManager>,
    pending_removals: Vec<(PlayerId, AbilityName)>,
    outbox: Vec<Outbound>,
    events: Vec<ExecutorEvent>,
    tick: u32,
}

impl AbilityExecutor {
    pub fn new(role: PeerRole, catalog: AbilityCatalog) -> Self {
        Self {
            role,
            catalog,
            active: BTreeMap::new(),
            cooldowns: BTreeMap::new(),
            pending_removals: Vec::new(),
            outbox: Vec::new(),
            events: Vec::new(),
            tick: 0,
        }
    }

    pub fn host(catalog: AbilityCatalog) -> Self {
        Self::new(PeerRole::Host, catalog)
    }

    pub fn client(local_player: PlayerId, catalog: AbilityCatalog) -> Self {
        Self::new(PeerRole::Client { local_player }, catalog)
    }

    pub fn role(&self) -> PeerRole {
        self.role
    }

    pub fn is_host(&self) -> bool {
        self.role == PeerRole::Host
    }

    pub fn current_tick(&self) -> u32 {
        self.tick
    }

    /// Entry point for locally produced triggers.
    ///
    /// The host executes immediately; a client forwards requests for its own
    /// player and refuses anyone else's.
    pub fn request_ability_execution(
        &mut self,
        context: AbilityContext,
    ) -> Result<Dispatch, RejectReason> {
        match self.role {
            PeerRole::Host => self.execute_on_host(context),
            PeerRole::Client { local_player } => {
                if context.source_player != local_player {
                    return Err(RejectReason::NotOwner);
                }
                self.outbox
                    .push(Outbound::ToHost(ClientMessage::RequestAbility(RequestAbilityMsg {
                        context,
                    })));
                Ok(Dispatch::Forwarded)
            },
        }
    }

    /// Host side of a forwarded request from the peer controlling `from`.
    pub fn handle_remote_request(
        &mut self,
        from: PlayerId,
        context: AbilityContext,
    ) -> Result<Dispatch, RejectReason> {
        if !self.is_host() {
            tracing::warn!(player_id = from, "Client executor received a remote request");
            return Err(RejectReason::InvalidAction);
        }
        if context.source_player != from {
            tracing::warn!(
                player_id = from,
                claimed = context.source_player,
                "Request for a player the peer does not control"
            );
            self.reject(context, RejectReason::NotOwner);
            return Err(RejectReason::NotOwner);
        }
        self.execute_on_host(context)
    }

    fn execute_on_host(&mut self, context: AbilityContext) -> Result<Dispatch, RejectReason> {
        let result = match context.action {
            ActionType::Start => self.start_on_host(context).map(|()| Dispatch::Executed),
            ActionType::Stop => self.stop_on_host(context).map(Dispatch::Stopped),
        };
        if let Err(reason) = result {
            self.reject(context, reason);
        }
        result
    }

    fn reject(&mut self, context: AbilityContext, reason: RejectReason) {
        tracing::debug!(
            player_id = context.source_player,
            ability = %context.ability,
            %reason,
            "Ability request rejected"
        );
        self.outbox
            .push(Outbound::Broadcast(ServerMessage::AbilityRejected(
                AbilityRejectedMsg { context, reason },
            )));
        self.events.push(ExecutorEvent::Rejected { context, reason });
    }

    fn start_on_host(&mut self, context: AbilityContext) -> Result<(), RejectReason> {
        let (player, ability) = (context.source_player, context.ability);
        if ability.is_sentinel() {
            return Err(RejectReason::InvalidAction);
        }
        let already_active = self.has_instance(player, ability);
        if !already_active && self.board_counting(player, ability) {
            return Err(RejectReason::OnCooldown);
        }
        let mut instance = self
            .catalog
            .instantiate(ability)
            .ok_or(RejectReason::UnknownAbility)?;
        instance.try_initialize_with_trigger(context, already_active)?;

        self.cooldowns.remove(&(player, ability));
        self.active.entry(player).or_default().push(AbilityRuntimeInfo {
            instance,
            is_authority_instance: true,
        });
        self.outbox
            .push(Outbound::Broadcast(ServerMessage::AbilityStarted(
                AbilityStartedMsg {
                    tick: self.tick,
                    context,
                },
            )));
        self.events.push(ExecutorEvent::Started { player, ability });
        tracing::debug!(player_id = player, %ability, tick = self.tick, "Ability started");
        Ok(())
    }

    fn stop_on_host(&mut self, context: AbilityContext) -> Result<usize, RejectReason> {
        let (player, ability) = (context.source_player, context.ability);
        let all = ability.is_sentinel();
        let mut stopped = 0;
        if let Some(infos) = self.active.get_mut(&player) {
            for info in infos
                .iter_mut()
                .filter(|i| i.is_authority_instance && (all || i.instance.name() == ability))
            {
                if info.instance.phase().is_running() {
                    info.instance.force_end();
                    stopped += 1;
                }
            }
        }
        if stopped == 0 && !all {
            return Err(RejectReason::NotRunning);
        }
        Ok(stopped)
    }

    /// Client side: mirror the host's lifecycle broadcasts.
    pub fn apply_server_message(&mut self, msg: &ServerMessage) {
        if self.is_host() {
            return;
        }
        match msg {
            ServerMessage::AbilityStarted(m) => self.mirror_started(m.context),
            ServerMessage::AbilityEnded(m) => self.mirror_ended(m.player_id, m.ability),
            ServerMessage::AbilityRejected(m) => {
                if let PeerRole::Client { local_player } = self.role
                    && m.context.source_player == local_player
                {
                    self.events.push(ExecutorEvent::Rejected {
                        context: m.context,
                        reason: m.reason,
                    });
                }
            },
            _ => {},
        }
    }

    fn mirror_started(&mut self, context: AbilityContext) {
        let (player, ability) = (context.source_player, context.ability);
        if let Some(existing) = self.find(player, ability) {
            if existing.instance.phase().is_running() {
                tracing::debug!(player_id = player, %ability, "Duplicate start mirror ignored");
                return;
            }
            // The host already ended this activation; the new start may
            // arrive before our next tick removes the old mirror.
            self.retire_mirror_now(player, ability);
        }
        let Some(mut instance) = self.catalog.instantiate(ability) else {
            tracing::warn!(player_id = player, %ability, "Start mirror for unknown ability");
            return;
        };
        if !instance.mirror_start(context) {
            return;
        }
        self.cooldowns.remove(&(player, ability));
        self.active.entry(player).or_default().push(AbilityRuntimeInfo {
            instance,
            is_authority_instance: false,
        });
        self.events.push(ExecutorEvent::Started { player, ability });
    }

    fn mirror_ended(&mut self, player: PlayerId, ability: AbilityName) {
        let mirror = self.active.get_mut(&player).and_then(|infos| {
            infos
                .iter_mut()
                .find(|i| !i.is_authority_instance && i.instance.name() == ability)
        });
        match mirror {
            Some(info) => info.instance.force_end(),
            None => {
                tracing::debug!(player_id = player, %ability, "End mirror without an instance");
            },
        }
    }

    /// Advance every instance by one tick.
    ///
    /// Shared variables (cooldowns) advance on every instance; only authority
    /// instances run the phase machine, mirrors just settle. Ended instances
    /// are removed after the loop.
    pub fn tick(&mut self, dt: f32, world: &mut dyn AbilityWorld) {
        self.tick = self.tick.wrapping_add(1);

        let mut ready = Vec::new();
        self.cooldowns.retain(|&key, cooldown| {
            if cooldown.tick(dt) {
                ready.push(key);
                false
            } else {
                cooldown.is_counting()
            }
        });
        for (player, ability) in ready {
            self.events
                .push(ExecutorEvent::CooldownReady { player, ability });
        }

        for (&player, infos) in self.active.iter_mut() {
            for info in infos.iter_mut() {
                let ability = info.instance.name();
                if info.instance.calculate_shared_variables(dt) {
                    self.events
                        .push(ExecutorEvent::CooldownReady { player, ability });
                }
                let ended = if info.is_authority_instance {
                    info.instance.tick(dt, world)
                } else {
                    info.instance.settle()
                };
                if ended {
                    self.pending_removals.push((player, ability));
                }
            }
        }

        self.flush_removals();
    }

    fn flush_removals(&mut self) {
        for (player, ability) in std::mem::take(&mut self.pending_removals) {
            let Some(infos) = self.active.get_mut(&player) else {
                continue;
            };
            let Some(idx) = infos
                .iter()
                .position(|i| i.instance.name() == ability && i.instance.phase().is_terminal())
            else {
                continue;
            };
            let info = infos.remove(idx);
            if infos.is_empty() {
                self.active.remove(&player);
            }
            self.retire(player, info);
        }
    }

    /// Remove an ending mirror without waiting for the next tick.
    fn retire_mirror_now(&mut self, player: PlayerId, ability: AbilityName) {
        let Some(infos) = self.active.get_mut(&player) else {
            return;
        };
        let Some(idx) = infos
            .iter()
            .position(|i| !i.is_authority_instance && i.instance.name() == ability)
        else {
            return;
        };
        let mut info = infos.remove(idx);
        if infos.is_empty() {
            self.active.remove(&player);
        }
        info.instance.settle();
        self.pending_removals.retain(|&(p, a)| !(p == player && a == ability));
        self.retire(player, info);
    }

    fn retire(&mut self, player: PlayerId, info: AbilityRuntimeInfo) {
        let ability = info.instance.name();
        let cooldown = info.instance.cooldown();
        if cooldown.is_counting() {
            self.cooldowns.insert((player, ability), cooldown.clone());
        }
        if info.is_authority_instance && self.is_host() {
            self.outbox
                .push(Outbound::Broadcast(ServerMessage::AbilityEnded(AbilityEndedMsg {
                    tick: self.tick,
                    player_id: player,
                    ability,
                })));
        }
        self.events.push(ExecutorEvent::Ended { player, ability });
        tracing::debug!(player_id = player, %ability, tick = self.tick, "Ability ended");
    }

    /// Drop everything a departing player owns. Authority instances still run
    /// their `on_end` so spawned objects are cleaned up.
    pub fn player_left(&mut self, player: PlayerId, world: &mut dyn AbilityWorld) {
        if let Some(infos) = self.active.remove(&player) {
            for mut info in infos {
                if info.is_authority_instance {
                    info.instance.finish_now(world);
                }
                self.retire(player, info);
            }
        }
        self.cooldowns.retain(|&(p, _), _| p != player);
        self.pending_removals.retain(|&(p, _)| p != player);
    }

    fn has_instance(&self, player: PlayerId, ability: AbilityName) -> bool {
        self.find(player, ability).is_some()
    }

    fn board_counting(&self, player: PlayerId, ability: AbilityName) -> bool {
        self.cooldowns
            .get(&(player, ability))
            .is_some_and(CooldownManager::is_counting)
    }

    fn find(&self, player: PlayerId, ability: AbilityName) -> Option<&AbilityRuntimeInfo> {
        self.active
            .get(&player)?
            .iter()
            .find(|i| i.instance.name() == ability)
    }

    pub fn is_active(&self, player: PlayerId, ability: AbilityName) -> bool {
        self.has_instance(player, ability)
    }

    pub fn phase_of(&self, player: PlayerId, ability: AbilityName) -> Option<AbilityPhase> {
        self.find(player, ability).map(|i| i.instance.phase())
    }

    /// Seconds until `ability` can start again for `player`.
    pub fn cooldown_remaining(&self, player: PlayerId, ability: AbilityName) -> f32 {
        if let Some(info) = self.find(player, ability)
            && info.instance.cooldown().is_counting()
        {
            return info.instance.cooldown().remaining();
        }
        self.cooldowns
            .get(&(player, ability))
            .filter(|c| c.is_counting())
            .map_or(0.0, CooldownManager::remaining)
    }

    pub fn instances(&self, player: PlayerId) -> &[AbilityRuntimeInfo] {
        self.active.get(&player).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn active_count(&self) -> usize {
        self.active.values().map(Vec::len).sum()
    }

    pub fn drain_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    pub fn drain_events(&mut self) -> Vec<ExecutorEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use ogre_core::test_helpers::{pose_at, start, stop};

    use super::*;
    use crate::arena::ArenaWorld;
    use crate::config::AbilityConfig;

    const DT: f32 = 1.0 / 30.0;

    /// Hammer with no wind-up or recovery: start, strike, end over three ticks.
    fn quick_catalog() -> AbilityCatalog {
        let mut config = AbilityConfig::default();
        config.hammer_attack.windup_secs = 0.0;
        config.hammer_attack.recovery_secs = 0.0;
        config.hammer_attack.cooldown_secs = 1.0;
        AbilityCatalog::from_config(&config)
    }

    fn arena(players: &[PlayerId]) -> ArenaWorld {
        let mut world = ArenaWorld::new();
        for (i, &p) in players.iter().enumerate() {
            world.add_player(p, pose_at(i as f32 * 10.0, 0.0, 0.0));
        }
        world
    }

    fn tick_n(exec: &mut AbilityExecutor, world: &mut ArenaWorld, n: usize) {
        for _ in 0..n {
            exec.tick(DT, world);
        }
    }

    fn broadcasts(exec: &mut AbilityExecutor) -> Vec<ServerMessage> {
        exec.drain_outbox()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Broadcast(m) => Some(m),
                Outbound::ToHost(_) => None,
            })
            .collect()
    }

    #[test]
    fn host_start_broadcasts_and_registers_authority_instance() {
        let mut exec = AbilityExecutor::host(quick_catalog());
        let dispatch = exec
            .request_ability_execution(start(1, AbilityName::HammerAttack))
            .unwrap();
        assert_eq!(dispatch, Dispatch::Executed);
        assert_eq!(exec.instances(1).len(), 1);
        assert!(exec.instances(1)[0].is_authority_instance);
        assert_eq!(
            exec.phase_of(1, AbilityName::HammerAttack),
            Some(AbilityPhase::Started)
        );
        let sent = broadcasts(&mut exec);
        assert!(matches!(
            sent.as_slice(),
            [ServerMessage::AbilityStarted(m)] if m.context == start(1, AbilityName::HammerAttack)
        ));
    }

    #[test]
    fn duplicate_start_is_rejected_without_second_instance() {
        let mut exec = AbilityExecutor::host(quick_catalog());
        exec.request_ability_execution(start(1, AbilityName::HammerAttack))
            .unwrap();
        exec.drain_outbox();
        let err = exec
            .request_ability_execution(start(1, AbilityName::HammerAttack))
            .unwrap_err();
        assert_eq!(err, RejectReason::AlreadyActive);
        assert_eq!(exec.active_count(), 1);
        let sent = broadcasts(&mut exec);
        assert!(matches!(
            sent.as_slice(),
            [ServerMessage::AbilityRejected(m)] if m.reason == RejectReason::AlreadyActive
        ));
    }

    #[test]
    fn different_players_run_same_ability_independently() {
        let mut exec = AbilityExecutor::host(quick_catalog());
        exec.request_ability_execution(start(1, AbilityName::HammerAttack))
            .unwrap();
        exec.request_ability_execution(start(2, AbilityName::HammerAttack))
            .unwrap();
        assert_eq!(exec.active_count(), 2);
    }

    #[test]
    fn host_lifecycle_ends_removes_and_keeps_cooldown() {
        let mut world = arena(&[1]);
        let mut exec = AbilityExecutor::host(quick_catalog());
        exec.request_ability_execution(start(1, AbilityName::HammerAttack))
            .unwrap();
        tick_n(&mut exec, &mut world, 3);

        assert!(!exec.is_active(1, AbilityName::HammerAttack));
        assert_eq!(exec.active_count(), 0);
        let sent = broadcasts(&mut exec);
        assert!(matches!(sent.first(), Some(ServerMessage::AbilityStarted(_))));
        assert!(matches!(
            sent.last(),
            Some(ServerMessage::AbilityEnded(m))
                if m.player_id == 1 && m.ability == AbilityName::HammerAttack
        ));

        let remaining = exec.cooldown_remaining(1, AbilityName::HammerAttack);
        assert!(remaining > 0.0 && remaining < 1.0);
        assert_eq!(
            exec.request_ability_execution(start(1, AbilityName::HammerAttack)),
            Err(RejectReason::OnCooldown)
        );

        exec.drain_events();
        tick_n(&mut exec, &mut world, 30);
        let ready = exec
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, ExecutorEvent::CooldownReady { player: 1, .. }))
            .count();
        assert_eq!(ready, 1);
        assert_eq!(exec.cooldown_remaining(1, AbilityName::HammerAttack), 0.0);
        assert_eq!(
            exec.request_ability_execution(start(1, AbilityName::HammerAttack)),
            Ok(Dispatch::Executed)
        );
    }

    #[test]
    fn stop_all_ends_every_running_ability() {
        let mut world = arena(&[1]);
        let mut exec = AbilityExecutor::host(AbilityCatalog::default());
        exec.request_ability_execution(start(1, AbilityName::NormalAttack))
            .unwrap();
        exec.request_ability_execution(start(1, AbilityName::GenerateFloor))
            .unwrap();
        exec.tick(DT, &mut world);
        assert_eq!(world.object_count(), 1);

        let stopped = exec
            .request_ability_execution(stop(1, AbilityName::All))
            .unwrap();
        assert_eq!(stopped, Dispatch::Stopped(2));
        exec.tick(DT, &mut world);
        assert_eq!(exec.active_count(), 0);
        assert_eq!(world.object_count(), 0);
    }

    #[test]
    fn stop_all_with_nothing_running_is_ok() {
        let mut exec = AbilityExecutor::host(AbilityCatalog::default());
        assert_eq!(
            exec.request_ability_execution(stop(4, AbilityName::All)),
            Ok(Dispatch::Stopped(0))
        );
    }

    #[test]
    fn stop_named_not_running_is_rejected() {
        let mut exec = AbilityExecutor::host(AbilityCatalog::default());
        assert_eq!(
            exec.request_ability_execution(stop(1, AbilityName::HammerAttack)),
            Err(RejectReason::NotRunning)
        );
    }

    #[test]
    fn starting_sentinel_or_unknown_is_rejected() {
        let mut exec = AbilityExecutor::host(AbilityCatalog::empty());
        assert_eq!(
            exec.request_ability_execution(start(1, AbilityName::All)),
            Err(RejectReason::InvalidAction)
        );
        assert_eq!(
            exec.request_ability_execution(start(1, AbilityName::NormalAttack)),
            Err(RejectReason::UnknownAbility)
        );
        assert_eq!(exec.active_count(), 0);
    }

    #[test]
    fn remote_request_for_other_player_is_rejected() {
        let mut exec = AbilityExecutor::host(AbilityCatalog::default());
        let err = exec
            .handle_remote_request(2, start(3, AbilityName::NormalAttack))
            .unwrap_err();
        assert_eq!(err, RejectReason::NotOwner);
        assert_eq!(exec.active_count(), 0);
        assert!(matches!(
            broadcasts(&mut exec).as_slice(),
            [ServerMessage::AbilityRejected(m)] if m.reason == RejectReason::NotOwner
        ));
    }

    #[test]
    fn client_forwards_own_requests_only() {
        let mut exec = AbilityExecutor::client(5, AbilityCatalog::default());
        assert_eq!(
            exec.request_ability_execution(start(5, AbilityName::NormalAttack)),
            Ok(Dispatch::Forwarded)
        );
        assert_eq!(
            exec.request_ability_execution(start(6, AbilityName::NormalAttack)),
            Err(RejectReason::NotOwner)
        );
        assert_eq!(exec.active_count(), 0);
        let out = exec.drain_outbox();
        assert_eq!(
            out,
            vec![Outbound::ToHost(ClientMessage::RequestAbility(
                RequestAbilityMsg {
                    context: start(5, AbilityName::NormalAttack)
                }
            ))]
        );
    }

    #[test]
    fn client_mirror_follows_host_without_side_effects() {
        let mut world = arena(&[1]);
        let mut exec = AbilityExecutor::client(2, AbilityCatalog::default());
        exec.apply_server_message(&ServerMessage::AbilityStarted(AbilityStartedMsg {
            tick: 10,
            context: start(1, AbilityName::GenerateFloor),
        }));
        assert_eq!(
            exec.phase_of(1, AbilityName::GenerateFloor),
            Some(AbilityPhase::Active)
        );
        assert!(!exec.instances(1)[0].is_authority_instance);

        tick_n(&mut exec, &mut world, 5);
        assert_eq!(world.object_count(), 0);
        assert!(exec.cooldown_remaining(1, AbilityName::GenerateFloor) > 0.0);

        exec.apply_server_message(&ServerMessage::AbilityEnded(AbilityEndedMsg {
            tick: 20,
            player_id: 1,
            ability: AbilityName::GenerateFloor,
        }));
        assert_eq!(
            exec.phase_of(1, AbilityName::GenerateFloor),
            Some(AbilityPhase::Ending)
        );
        exec.tick(DT, &mut world);
        assert!(!exec.is_active(1, AbilityName::GenerateFloor));
        assert!(exec.cooldown_remaining(1, AbilityName::GenerateFloor) > 0.0);
        assert!(exec.drain_outbox().is_empty());
    }

    #[test]
    fn client_reports_only_its_own_rejections() {
        let mut exec = AbilityExecutor::client(2, AbilityCatalog::default());
        for player in [1, 2] {
            exec.apply_server_message(&ServerMessage::AbilityRejected(AbilityRejectedMsg {
                context: start(player, AbilityName::HammerAttack),
                reason: RejectReason::OnCooldown,
            }));
        }
        let events = exec.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            ExecutorEvent::Rejected { context, .. } if context.source_player == 2
        ));
    }

    #[test]
    fn duplicate_start_mirror_is_ignored() {
        let mut exec = AbilityExecutor::client(2, AbilityCatalog::default());
        let msg = ServerMessage::AbilityStarted(AbilityStartedMsg {
            tick: 1,
            context: start(1, AbilityName::NormalAttack),
        });
        exec.apply_server_message(&msg);
        exec.apply_server_message(&msg);
        assert_eq!(exec.active_count(), 1);
    }

    #[test]
    fn start_after_end_replaces_ending_mirror() {
        let mut exec = AbilityExecutor::client(2, AbilityCatalog::default());
        let started = ServerMessage::AbilityStarted(AbilityStartedMsg {
            tick: 1,
            context: start(1, AbilityName::NormalAttack),
        });
        exec.apply_server_message(&started);
        exec.apply_server_message(&ServerMessage::AbilityEnded(AbilityEndedMsg {
            tick: 5,
            player_id: 1,
            ability: AbilityName::NormalAttack,
        }));
        exec.apply_server_message(&started);

        assert_eq!(exec.active_count(), 1);
        assert_eq!(
            exec.phase_of(1, AbilityName::NormalAttack),
            Some(AbilityPhase::Active)
        );
        let ended = exec
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, ExecutorEvent::Ended { player: 1, .. }))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn stop_before_first_tick_still_starts_cooldown() {
        let mut world = arena(&[1]);
        let mut exec = AbilityExecutor::host(quick_catalog());
        exec.request_ability_execution(start(1, AbilityName::HammerAttack))
            .unwrap();
        assert_eq!(
            exec.request_ability_execution(stop(1, AbilityName::HammerAttack)),
            Ok(Dispatch::Stopped(1))
        );
        exec.tick(DT, &mut world);

        assert!(!exec.is_active(1, AbilityName::HammerAttack));
        assert!(exec.cooldown_remaining(1, AbilityName::HammerAttack) > 0.0);
        assert_eq!(
            exec.request_ability_execution(start(1, AbilityName::HammerAttack)),
            Err(RejectReason::OnCooldown)
        );
    }

    #[test]
    fn player_left_cleans_up_instances_and_objects() {
        let mut world = arena(&[1]);
        let mut exec = AbilityExecutor::host(AbilityCatalog::default());
        exec.request_ability_execution(start(1, AbilityName::GenerateFloor))
            .unwrap();
        exec.tick(DT, &mut world);
        assert_eq!(world.object_count(), 1);
        exec.drain_outbox();

        exec.player_left(1, &mut world);
        assert_eq!(exec.active_count(), 0);
        assert_eq!(world.object_count(), 0);
        assert_eq!(exec.cooldown_remaining(1, AbilityName::GenerateFloor), 0.0);
        assert!(matches!(
            broadcasts(&mut exec).as_slice(),
            [ServerMessage::AbilityEnded(m)] if m.player_id == 1
        ));
    }

    #[test]
    fn host_ignores_server_messages() {
        let mut exec = AbilityExecutor::host(AbilityCatalog::default());
        exec.apply_server_message(&ServerMessage::AbilityStarted(AbilityStartedMsg {
            tick: 1,
            context: start(1, AbilityName::NormalAttack),
        }));
        assert_eq!(exec.active_count(), 0);
    }
}
