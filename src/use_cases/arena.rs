// The authoritative arena: players, parties and projectiles behind one consistency boundary.
//
// Every command and every tick goes through `&mut Arena`, so the world task that owns it
// serializes all mutation. Handlers for unknown ids are silent no-ops.

use super::types::{BulletsUpdate, Dispatch, GameEvent, PlayerCommand, ServerEvent};
use crate::domain::systems::combat::{self, ShotRequest};
use crate::domain::systems::projectiles::{self, ProjectileConfig};
use crate::domain::tuning::arena::ArenaBounds;
use crate::domain::tuning::player::PlayerTuning;
use crate::domain::{
    CombatOutcome, PartyBook, PartyState, PlayerId, PlayerSnapshot, PlayerStore, Projectile,
    ProjectileSnapshot,
};
use std::time::Instant;
use tracing::{debug, info};

pub struct Arena {
    players: PlayerStore,
    parties: PartyBook,
    projectiles: Vec<Projectile>,
    next_projectile_id: u64,
    tick: u64,
    projectile_cfg: ProjectileConfig,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(PlayerTuning::default(), ArenaBounds::default())
    }
}

impl Arena {
    pub fn new(player_tuning: PlayerTuning, bounds: ArenaBounds) -> Self {
        Self {
            players: PlayerStore::new(player_tuning),
            parties: PartyBook::new(),
            projectiles: Vec::new(),
            next_projectile_id: 1,
            tick: 0,
            projectile_cfg: ProjectileConfig {
                bounds,
                player_hitbox: player_tuning.hitbox,
            },
        }
    }

    pub fn players(&self) -> &PlayerStore {
        &self.players
    }

    pub fn parties(&self) -> &PartyBook {
        &self.parties
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Applies one inbound event and returns the deltas it produced.
    pub fn handle(&mut self, event: GameEvent, now: Instant) -> Vec<Dispatch> {
        let mut out = Vec::new();
        match event {
            GameEvent::Connect { player_id } => self.connect(player_id, &mut out),
            GameEvent::Disconnect { player_id } => self.disconnect(player_id, &mut out),
            GameEvent::Command { player_id, command } => {
                self.command(player_id, command, now, &mut out)
            }
        }
        out
    }

    /// Advances projectiles one step. Returns the hit/kill deltas and the full snapshot.
    pub fn tick(&mut self) -> (Vec<Dispatch>, BulletsUpdate) {
        self.tick += 1;

        let outcomes = projectiles::tick_projectiles(
            &mut self.players,
            &mut self.projectiles,
            self.projectile_cfg,
        );

        let mut out = Vec::new();
        self.publish_outcomes(outcomes, &mut out);

        let update = BulletsUpdate {
            tick: self.tick,
            projectiles: self.projectiles.iter().map(ProjectileSnapshot::from).collect(),
        };
        (out, update)
    }

    fn connect(&mut self, player_id: PlayerId, out: &mut Vec<Dispatch>) {
        if self.players.contains(player_id) {
            debug!(player_id, "duplicate connect ignored");
            return;
        }

        let (x, y) = {
            let player = self.players.insert(player_id);
            (player.x, player.y)
        };
        info!(player_id, players = self.players.len(), "player joined");

        let everyone: Vec<PlayerSnapshot> = self.players.iter().map(PlayerSnapshot::from).collect();
        push(out, vec![player_id], ServerEvent::Identity { id: player_id });
        push(out, vec![player_id], ServerEvent::CurrentPlayers(everyone));
        push(
            out,
            self.everyone_except(player_id),
            ServerEvent::NewPlayer {
                id: player_id,
                x,
                y,
            },
        );
    }

    fn disconnect(&mut self, player_id: PlayerId, out: &mut Vec<Dispatch>) {
        if self.players.remove(player_id).is_none() {
            return;
        }
        self.projectiles.retain(|p| p.owner_id != player_id);
        info!(player_id, players = self.players.len(), "player left");

        push(
            out,
            self.players.ids(),
            ServerEvent::PlayerDisconnected { id: player_id },
        );

        for party in self.parties.remove_member(player_id) {
            debug!(code = %party.code, leader = party.leader, "party membership changed");
            let update = self.party_update(&party);
            push(out, party.members.clone(), update);
        }
    }

    fn command(
        &mut self,
        player_id: PlayerId,
        command: PlayerCommand,
        now: Instant,
        out: &mut Vec<Dispatch>,
    ) {
        match command {
            PlayerCommand::SetName { name } => {
                if self.players.set_name(player_id, &name) {
                    debug!(player_id, "name updated");
                }
            }
            PlayerCommand::Move { x, y } => {
                if let Some(player) = self.players.move_to(player_id, x, y) {
                    let moved = ServerEvent::PlayerMoved(PlayerSnapshot::from(player));
                    push(out, self.players.ids(), moved);
                }
            }
            PlayerCommand::Respawn => {
                if let Some(player) = self.players.respawn(player_id) {
                    let respawned = ServerEvent::PlayerRespawned(PlayerSnapshot::from(player));
                    info!(player_id, "player respawned");
                    push(out, self.players.ids(), respawned);
                }
            }
            PlayerCommand::Shoot { weapon, direction } => {
                let outcomes = combat::shoot(
                    &mut self.players,
                    &mut self.projectiles,
                    &mut self.next_projectile_id,
                    ShotRequest {
                        shooter: player_id,
                        weapon,
                        direction,
                        now,
                    },
                );
                match outcomes {
                    Some(outcomes) => self.publish_outcomes(outcomes, out),
                    None => debug!(player_id, ?weapon, "shot rejected"),
                }
            }
            PlayerCommand::CreateParty { code } => {
                // Party membership is only cleared by disconnect, so absent ids must not enter.
                if !self.players.contains(player_id) {
                    return;
                }
                if let Some(party) = self.parties.create(player_id, &code) {
                    info!(player_id, code = %party.code, "party created");
                    let party = party.clone();
                    self.publish_party(&party, out);
                }
            }
            PlayerCommand::JoinParty { code } => {
                if !self.players.contains(player_id) {
                    return;
                }
                if let Some(party) = self.parties.join(player_id, &code) {
                    info!(player_id, code = %party.code, "party joined");
                    let party = party.clone();
                    self.publish_party(&party, out);
                }
            }
            PlayerCommand::StartMatch { code } => {
                if let Some(party) = self.parties.led_by(player_id, &code) {
                    info!(player_id, code = %party.code, members = party.members.len(), "match started");
                    let members = self.resolve_members(party);
                    push(
                        out,
                        party.members.clone(),
                        ServerEvent::MatchStarted { members },
                    );
                }
            }
        }
    }

    fn publish_outcomes(&self, outcomes: Vec<CombatOutcome>, out: &mut Vec<Dispatch>) {
        for outcome in outcomes {
            let event = match outcome {
                CombatOutcome::Hit { victim, hp } => ServerEvent::PlayerHit { victim, hp },
                CombatOutcome::Killed { killer, victim } => {
                    ServerEvent::PlayerKilled { killer, victim }
                }
            };
            push(out, self.players.ids(), event);
        }
    }

    fn publish_party(&self, party: &PartyState, out: &mut Vec<Dispatch>) {
        let update = self.party_update(party);
        push(out, party.members.clone(), update);
    }

    fn party_update(&self, party: &PartyState) -> ServerEvent {
        ServerEvent::PartyUpdate {
            code: party.code.clone(),
            leader: party.leader,
            members: self.resolve_members(party),
        }
    }

    fn resolve_members(&self, party: &PartyState) -> Vec<PlayerSnapshot> {
        party
            .members
            .iter()
            .filter_map(|id| self.players.get(*id))
            .map(PlayerSnapshot::from)
            .collect()
    }

    fn everyone_except(&self, player_id: PlayerId) -> Vec<PlayerId> {
        self.players
            .iter()
            .map(|p| p.id)
            .filter(|id| *id != player_id)
            .collect()
    }
}

fn push(out: &mut Vec<Dispatch>, recipients: Vec<PlayerId>, event: ServerEvent) {
    if recipients.is_empty() {
        return;
    }
    out.push(Dispatch { recipients, event });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, ProjectileKind, WeaponClass};
    use std::time::Duration;

    struct Harness {
        arena: Arena,
        start: Instant,
    }

    impl Harness {
        fn with_players(ids: &[PlayerId]) -> Self {
            let mut harness = Self {
                arena: Arena::default(),
                start: Instant::now(),
            };
            for id in ids {
                harness.connect(*id);
            }
            harness
        }

        fn connect(&mut self, player_id: PlayerId) -> Vec<Dispatch> {
            self.arena
                .handle(GameEvent::Connect { player_id }, self.start)
        }

        fn disconnect(&mut self, player_id: PlayerId) -> Vec<Dispatch> {
            self.arena
                .handle(GameEvent::Disconnect { player_id }, self.start)
        }

        fn send(&mut self, player_id: PlayerId, command: PlayerCommand) -> Vec<Dispatch> {
            self.send_at(player_id, command, 0)
        }

        fn send_at(
            &mut self,
            player_id: PlayerId,
            command: PlayerCommand,
            after_ms: u64,
        ) -> Vec<Dispatch> {
            self.arena.handle(
                GameEvent::Command { player_id, command },
                self.start + Duration::from_millis(after_ms),
            )
        }

        fn player(&self, id: PlayerId) -> PlayerSnapshot {
            self.arena
                .players()
                .get(id)
                .map(PlayerSnapshot::from)
                .expect("player should exist")
        }
    }

    fn events(dispatches: &[Dispatch]) -> Vec<&ServerEvent> {
        dispatches.iter().map(|d| &d.event).collect()
    }

    fn create(code: &str) -> PlayerCommand {
        PlayerCommand::CreateParty {
            code: code.to_string(),
        }
    }

    fn join(code: &str) -> PlayerCommand {
        PlayerCommand::JoinParty {
            code: code.to_string(),
        }
    }

    fn start(code: &str) -> PlayerCommand {
        PlayerCommand::StartMatch {
            code: code.to_string(),
        }
    }

    fn rapid(direction: Direction) -> PlayerCommand {
        PlayerCommand::Shoot {
            weapon: WeaponClass::Rapid,
            direction: Some(direction),
        }
    }

    fn kill(harness: &mut Harness, id: PlayerId) {
        if let Some(player) = harness.arena.players.get_mut(id) {
            player.hp = 0;
            player.dead = true;
        }
    }

    #[test]
    fn when_player_connects_then_snapshot_goes_to_them_and_announcement_to_others() {
        let mut harness = Harness::with_players(&[1, 2]);

        let out = harness.connect(3);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].recipients, vec![3]);
        assert_eq!(out[0].event, ServerEvent::Identity { id: 3 });
        assert_eq!(out[1].recipients, vec![3]);
        match &out[1].event {
            ServerEvent::CurrentPlayers(players) => {
                let ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
                assert_eq!(ids, vec![1, 2, 3]);
            }
            other => panic!("expected current players, got {other:?}"),
        }
        assert_eq!(out[2].recipients, vec![1, 2]);
        assert_eq!(
            out[2].event,
            ServerEvent::NewPlayer {
                id: 3,
                x: 400.0,
                y: 300.0
            }
        );
    }

    #[test]
    fn when_first_player_connects_then_no_announcement_is_sent() {
        let mut harness = Harness::with_players(&[]);

        let out = harness.connect(1);

        assert_eq!(out.len(), 2);
        assert!(matches!(out[1].event, ServerEvent::CurrentPlayers(_)));
    }

    #[test]
    fn when_player_moves_then_full_state_is_broadcast_to_all() {
        let mut harness = Harness::with_players(&[1, 2]);

        let out = harness.send(1, PlayerCommand::Move { x: 10.0, y: 20.0 });

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].recipients, vec![1, 2]);
        match &out[0].event {
            ServerEvent::PlayerMoved(player) => {
                assert_eq!(player.id, 1);
                assert_eq!((player.x, player.y), (10.0, 20.0));
                assert_eq!(player.hp, 100);
                assert_eq!(player.name, "Anonymous");
            }
            other => panic!("expected player moved, got {other:?}"),
        }
    }

    #[test]
    fn when_dead_player_moves_or_shoots_then_world_is_unchanged() {
        let mut harness = Harness::with_players(&[1, 2]);
        kill(&mut harness, 1);

        let moved = harness.send(1, PlayerCommand::Move { x: 10.0, y: 20.0 });
        let shot = harness.send(1, rapid(Direction::Up));
        let slashed = harness.send(
            1,
            PlayerCommand::Shoot {
                weapon: WeaponClass::Melee,
                direction: None,
            },
        );

        assert!(moved.is_empty());
        assert!(shot.is_empty());
        assert!(slashed.is_empty());
        assert!(harness.arena.projectiles().is_empty());
        let player = harness.player(1);
        assert_eq!((player.x, player.y), (400.0, 300.0));
    }

    #[test]
    fn when_name_is_set_then_later_payloads_carry_it_without_a_broadcast() {
        let mut harness = Harness::with_players(&[1]);

        let out = harness.send(
            1,
            PlayerCommand::SetName {
                name: "Falcon".to_string(),
            },
        );
        let moved = harness.send(1, PlayerCommand::Move { x: 1.0, y: 1.0 });

        assert!(out.is_empty());
        match &moved[0].event {
            ServerEvent::PlayerMoved(player) => assert_eq!(player.name, "Falcon"),
            other => panic!("expected player moved, got {other:?}"),
        }
    }

    #[test]
    fn when_player_respawns_then_reset_state_is_broadcast() {
        let mut harness = Harness::with_players(&[1, 2]);
        harness.send(1, PlayerCommand::Move { x: 5.0, y: 5.0 });
        kill(&mut harness, 1);

        let out = harness.send(1, PlayerCommand::Respawn);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].recipients, vec![1, 2]);
        match &out[0].event {
            ServerEvent::PlayerRespawned(player) => {
                assert_eq!((player.x, player.y), (400.0, 300.0));
                assert_eq!(player.hp, 100);
                assert!(!player.dead);
            }
            other => panic!("expected player respawned, got {other:?}"),
        }
    }

    #[test]
    fn when_player_disconnects_then_others_are_told_and_state_is_dropped() {
        let mut harness = Harness::with_players(&[1, 2]);
        harness.send(1, rapid(Direction::Up));

        let out = harness.disconnect(1);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].recipients, vec![2]);
        assert_eq!(out[0].event, ServerEvent::PlayerDisconnected { id: 1 });
        assert!(!harness.arena.players().contains(1));
        // Projectiles of the departed owner go with them.
        assert!(harness.arena.projectiles().is_empty());
    }

    #[test]
    fn when_commands_arrive_after_disconnect_then_no_state_is_recreated() {
        let mut harness = Harness::with_players(&[1, 2]);
        harness.send(2, create("77"));
        harness.disconnect(1);

        let outputs = [
            harness.send(1, create("ghost")),
            harness.send(1, join("77")),
            harness.send(1, PlayerCommand::Move { x: 1.0, y: 1.0 }),
            harness.send(1, PlayerCommand::Respawn),
            harness.send(1, rapid(Direction::Left)),
            harness.send(
                1,
                PlayerCommand::SetName {
                    name: "Ghost".to_string(),
                },
            ),
        ];

        assert!(outputs.iter().all(|out| out.is_empty()));
        assert!(!harness.arena.players().contains(1));
        assert!(harness.arena.parties().get("ghost").is_none());
        assert_eq!(
            harness.arena.parties().get("77").map(|p| p.members.clone()),
            Some(vec![2])
        );
        assert!(harness.disconnect(1).is_empty());
    }

    #[test]
    fn when_rapid_shots_hit_twice_then_health_drops_without_a_kill() {
        let mut harness = Harness::with_players(&[1, 2]);
        harness.send(1, PlayerCommand::Move { x: 100.0, y: 100.0 });
        harness.send(2, PlayerCommand::Move { x: 110.0, y: 100.0 });

        harness.send_at(1, rapid(Direction::Right), 0);
        let (first, _) = harness.arena.tick();
        harness.send_at(1, rapid(Direction::Right), 200);
        let (second, _) = harness.arena.tick();

        let hits: Vec<&ServerEvent> = events(&first)
            .into_iter()
            .chain(events(&second))
            .collect();
        assert_eq!(
            hits,
            vec![
                &ServerEvent::PlayerHit { victim: 2, hp: 80 },
                &ServerEvent::PlayerHit { victim: 2, hp: 60 },
            ]
        );
        assert!(!harness.player(2).dead);
    }

    #[test]
    fn when_sniper_hits_wounded_player_then_one_kill_and_later_hits_are_noops() {
        let mut harness = Harness::with_players(&[1, 2]);
        harness.send(1, PlayerCommand::Move { x: 100.0, y: 100.0 });
        harness.send(2, PlayerCommand::Move { x: 130.0, y: 100.0 });
        if let Some(victim) = harness.arena.players.get_mut(2) {
            victim.hp = 40;
        }
        let sniper = PlayerCommand::Shoot {
            weapon: WeaponClass::Sniper,
            direction: Some(Direction::Right),
        };

        harness.send_at(1, sniper.clone(), 0);
        let (first, _) = harness.arena.tick();
        harness.send_at(1, sniper, 1000);
        let (second, _) = harness.arena.tick();

        assert_eq!(
            events(&first),
            vec![&ServerEvent::PlayerKilled {
                killer: 1,
                victim: 2
            }]
        );
        assert!(second.is_empty());
        let victim = harness.player(2);
        assert_eq!((victim.hp, victim.dead), (0, true));
    }

    #[test]
    fn when_sniper_fires_across_the_arena_then_it_lands_on_the_first_tick() {
        let mut harness = Harness::with_players(&[1, 2]);
        harness.send(1, PlayerCommand::Move { x: 0.0, y: 300.0 });
        harness.send(2, PlayerCommand::Move { x: 780.0, y: 300.0 });

        harness.send(
            1,
            PlayerCommand::Shoot {
                weapon: WeaponClass::Sniper,
                direction: Some(Direction::Right),
            },
        );
        let (out, update) = harness.arena.tick();

        assert_eq!(
            events(&out),
            vec![&ServerEvent::PlayerHit { victim: 2, hp: 25 }]
        );
        assert!(update.projectiles.is_empty());
    }

    #[test]
    fn when_melee_lands_then_hits_are_reported_immediately_and_pulse_is_snapshotted() {
        let mut harness = Harness::with_players(&[1, 2, 3]);
        harness.send(2, PlayerCommand::Move { x: 420.0, y: 300.0 });
        harness.send(3, PlayerCommand::Move { x: 600.0, y: 300.0 });

        let out = harness.send(
            1,
            PlayerCommand::Shoot {
                weapon: WeaponClass::Melee,
                direction: None,
            },
        );

        assert_eq!(
            events(&out),
            vec![&ServerEvent::PlayerKilled {
                killer: 1,
                victim: 2
            }]
        );
        assert_eq!(out[0].recipients, vec![1, 2, 3]);

        let (_, update) = harness.arena.tick();
        assert_eq!(update.projectiles.len(), 1);
        assert_eq!(update.projectiles[0].kind, ProjectileKind::MeleePulse);
        let (_, update) = harness.arena.tick();
        assert!(update.projectiles.is_empty());
    }

    #[test]
    fn tick_snapshot_lists_every_live_projectile() {
        let mut harness = Harness::with_players(&[1, 2]);
        harness.send(2, PlayerCommand::Move { x: 100.0, y: 100.0 });
        harness.send(1, rapid(Direction::Up));
        harness.send(2, rapid(Direction::Down));

        let (out, update) = harness.arena.tick();

        assert!(out.is_empty());
        assert_eq!(update.tick, 1);
        let owners: Vec<PlayerId> = update.projectiles.iter().map(|p| p.owner_id).collect();
        assert_eq!(owners, vec![1, 2]);
        assert_eq!(update.projectiles[0].y, 288.0);
        assert_eq!(update.projectiles[1].y, 112.0);
    }

    #[test]
    fn when_party_is_created_then_update_goes_to_the_creator() {
        let mut harness = Harness::with_players(&[1, 2]);

        let out = harness.send(1, create("1234"));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].recipients, vec![1]);
        match &out[0].event {
            ServerEvent::PartyUpdate {
                code,
                leader,
                members,
            } => {
                assert_eq!(code, "1234");
                assert_eq!(*leader, 1);
                assert_eq!(members.len(), 1);
                assert_eq!(members[0].id, 1);
            }
            other => panic!("expected party update, got {other:?}"),
        }
    }

    #[test]
    fn when_party_code_is_taken_then_second_create_is_silent() {
        let mut harness = Harness::with_players(&[1, 2]);
        harness.send(1, create("1234"));

        let out = harness.send(2, create("1234"));

        assert!(out.is_empty());
        assert_eq!(
            harness.arena.parties().get("1234").map(|p| p.leader),
            Some(1)
        );
    }

    #[test]
    fn when_player_joins_then_whole_group_gets_resolved_members() {
        let mut harness = Harness::with_players(&[1, 2, 3]);
        harness.send(1, create("77"));

        let out = harness.send(2, join("77"));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].recipients, vec![1, 2]);
        match &out[0].event {
            ServerEvent::PartyUpdate { members, .. } => {
                let ids: Vec<PlayerId> = members.iter().map(|p| p.id).collect();
                assert_eq!(ids, vec![1, 2]);
            }
            other => panic!("expected party update, got {other:?}"),
        }
        assert!(harness.send(3, join("78")).is_empty());
    }

    #[test]
    fn start_match_succeeds_only_for_the_leader() {
        let mut harness = Harness::with_players(&[1, 2]);
        harness.send(1, create("77"));
        harness.send(2, join("77"));

        assert!(harness.send(2, start("77")).is_empty());
        assert!(harness.send(1, start("404")).is_empty());

        let out = harness.send(1, start("77"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].recipients, vec![1, 2]);
        match &out[0].event {
            ServerEvent::MatchStarted { members } => {
                let ids: Vec<PlayerId> = members.iter().map(|p| p.id).collect();
                assert_eq!(ids, vec![1, 2]);
            }
            other => panic!("expected match started, got {other:?}"),
        }
    }

    #[test]
    fn when_leader_disconnects_then_remaining_members_get_new_leader() {
        let mut harness = Harness::with_players(&[1, 2, 3]);
        harness.send(1, create("77"));
        harness.send(2, join("77"));
        harness.send(3, join("77"));

        let out = harness.disconnect(1);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].event, ServerEvent::PlayerDisconnected { id: 1 });
        assert_eq!(out[1].recipients, vec![2, 3]);
        match &out[1].event {
            ServerEvent::PartyUpdate {
                leader, members, ..
            } => {
                assert_eq!(*leader, 2);
                assert_eq!(members.len(), 2);
            }
            other => panic!("expected party update, got {other:?}"),
        }
        assert!(!harness.send(2, start("77")).is_empty());
    }

    #[test]
    fn when_only_member_disconnects_then_party_is_disbanded() {
        let mut harness = Harness::with_players(&[1, 2]);
        harness.send(1, create("77"));

        let out = harness.disconnect(1);

        assert_eq!(events(&out), vec![&ServerEvent::PlayerDisconnected { id: 1 }]);
        assert!(harness.arena.parties().get("77").is_none());
    }
}
