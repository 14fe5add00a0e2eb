//! The tick loop, turn state machine, action validation, card logic,
//! per-client staleness tracking, and message draining. This is the heart
//! of the core, grounded on the event-driven validate/apply/drain shape
//! the teacher's game backends share, generalized to this game's rules.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use hex_protocol::{
    Action, ActionType, ActorState, AnimationType, Color, HexCoord, MessageFromServer,
    MessageToServer, ObjectiveMessage, Role, TurnState, FOLLOWER_MOVES_PER_TURN,
    LEADER_MOVES_PER_TURN, turn_duration_seconds,
};

use crate::actor::Actor;
use crate::error::EngineError;
use crate::id_assigner::IdAssigner;
use crate::map_provider::MapProvider;

const HEARTBEAT: Duration = Duration::seconds(1);

#[derive(Default, Clone, Copy)]
struct StaleBits {
    synced: bool,
    map_stale: bool,
    objectives_stale: bool,
    turn_state_pending: bool,
}

/// Owns every piece of mutable room state: the map, the actor table, and
/// the per-client staleness/outbox bookkeeping the drain loop reads from.
/// Mutated exclusively by [`RoomState::tick`] and the `handle_*` methods;
/// sessions never touch these tables directly.
pub struct RoomState<P: MapProvider> {
    map_provider: P,
    id_assigner: IdAssigner,
    actors: HashMap<u32, Actor>,
    role_to_actor: HashMap<Role, u32>,
    outbox: HashMap<u32, VecDeque<Action>>,
    stale: HashMap<u32, StaleBits>,
    immediate: HashMap<u32, Vec<MessageFromServer>>,
    objectives: Vec<ObjectiveMessage>,
    turn_state: TurnState,
    current_set_invalid: bool,
    last_tick: DateTime<Utc>,
    done: bool,
}

impl<P: MapProvider> RoomState<P> {
    pub fn new(map_provider: P, now: DateTime<Utc>) -> RoomState<P> {
        RoomState {
            map_provider,
            id_assigner: IdAssigner::new(),
            actors: HashMap::new(),
            role_to_actor: HashMap::new(),
            outbox: HashMap::new(),
            stale: HashMap::new(),
            immediate: HashMap::new(),
            objectives: Vec::new(),
            turn_state: TurnState {
                turn: Role::Leader,
                moves_remaining: LEADER_MOVES_PER_TURN,
                turns_left: 6,
                turn_end: now + Duration::seconds(turn_duration_seconds(Role::Leader)),
                game_start: now,
                sets_collected: 0,
                score: 0,
                game_over: false,
            },
            current_set_invalid: false,
            last_tick: now,
            done: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn turn_state(&self) -> &TurnState {
        &self.turn_state
    }

    /// Whether a seat for `role` is currently occupied.
    pub fn has_role(&self, role: Role) -> bool {
        self.role_to_actor.contains_key(&role)
    }

    // ---- admission / lifecycle -------------------------------------------------

    pub fn create_actor(&mut self, role: Role) -> Result<u32, EngineError> {
        if self.role_to_actor.contains_key(&role) {
            return Err(EngineError::RoomFull);
        }
        let spawn = self.map_provider.take_spawn_point().unwrap_or(HexCoord::ORIGIN);
        let actor_id = self.id_assigner.allocate();
        let asset_id = match role {
            Role::Leader => 1,
            Role::Follower => 2,
            Role::None => 0,
        };
        self.actors.insert(actor_id, Actor::new(actor_id, asset_id, role, spawn));
        self.role_to_actor.insert(role, actor_id);
        self.outbox.insert(actor_id, VecDeque::new());
        self.immediate.insert(actor_id, Vec::new());
        self.stale.insert(
            actor_id,
            StaleBits { synced: false, map_stale: true, objectives_stale: true, turn_state_pending: true },
        );
        self.desync_all();
        Ok(actor_id)
    }

    pub fn free_actor(&mut self, actor_id: u32) {
        if let Some(actor) = self.actors.remove(&actor_id) {
            self.role_to_actor.remove(&actor.role);
        }
        self.outbox.remove(&actor_id);
        self.stale.remove(&actor_id);
        self.immediate.remove(&actor_id);
        self.id_assigner.free(actor_id);
        self.desync_all();
    }

    pub fn actor_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.actors.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    // ---- desync / resync -------------------------------------------------------

    pub fn desync(&mut self, actor_id: u32) {
        if let Some(bits) = self.stale.get_mut(&actor_id) {
            bits.synced = false;
        }
    }

    pub fn desync_all(&mut self) {
        let ids: Vec<u32> = self.stale.keys().copied().collect();
        for id in ids {
            self.desync(id);
        }
    }

    pub fn is_synced(&self, actor_id: u32) -> bool {
        self.stale.get(&actor_id).map(|b| b.synced).unwrap_or(false)
    }

    // ---- inbound packets --------------------------------------------------------

    pub fn handle_packet(&mut self, actor_id: u32, msg: MessageToServer, now: DateTime<Utc>) {
        match msg {
            MessageToServer::Actions { actions } => {
                for action in actions {
                    self.handle_action(actor_id, action);
                }
            }
            MessageToServer::Objective { text } | MessageToServer::Instruction { text } => {
                self.handle_objective(actor_id, text);
            }
            MessageToServer::ObjectiveCompleted { uuid }
            | MessageToServer::InstructionDone { uuid } => {
                self.handle_objective_complete(actor_id, uuid);
            }
            MessageToServer::TurnComplete => {
                self.handle_turn_complete(actor_id, now);
            }
            MessageToServer::StateSyncRequest => {
                self.desync(actor_id);
            }
            MessageToServer::Interrupt => {
                self.handle_interrupt(actor_id);
            }
            MessageToServer::PositiveFeedback => {
                self.handle_feedback(actor_id, true);
            }
            MessageToServer::NegativeFeedback => {
                self.handle_feedback(actor_id, false);
            }
            MessageToServer::Pong => {
                tracing::trace!(actor_id, "received pong");
            }
            MessageToServer::JoinQueue
            | MessageToServer::JoinLeaderQueue
            | MessageToServer::JoinFollowerQueue
            | MessageToServer::Leave => {
                tracing::warn!(actor_id, "queue message reached a running room; ignoring");
            }
        }
    }

    fn handle_action(&mut self, actor_id: u32, action: Action) {
        if action.id != actor_id {
            tracing::warn!(actor_id, action_id = action.id, "action id mismatch, desyncing");
            self.desync(actor_id);
            return;
        }
        if let Some(actor) = self.actors.get_mut(&actor_id) {
            actor.add_action(action);
        } else {
            tracing::warn!(actor_id, "action from unknown actor");
        }
    }

    fn handle_objective(&mut self, actor_id: u32, text: String) {
        let Some(actor) = self.actors.get(&actor_id) else { return };
        if actor.role != Role::Leader {
            tracing::warn!(actor_id, "non-leader submitted an objective");
            return;
        }
        self.objectives.push(ObjectiveMessage {
            sender: Role::Leader,
            text,
            uuid: uuid::Uuid::new_v4().to_string(),
            completed: false,
            cancelled: false,
        });
        self.mark_objectives_stale_all();
    }

    fn handle_objective_complete(&mut self, actor_id: u32, uuid: String) {
        let Some(actor) = self.actors.get(&actor_id) else { return };
        if actor.role != Role::Follower {
            tracing::warn!(actor_id, "non-follower completed an objective");
            return;
        }
        if let Some(objective) = self.objectives.iter_mut().find(|o| o.uuid == uuid) {
            objective.completed = true;
        }
        self.mark_objectives_stale_all();
    }

    fn handle_interrupt(&mut self, actor_id: u32) {
        let Some(actor) = self.actors.get(&actor_id) else { return };
        if actor.role != Role::Leader {
            return;
        }
        if let Some(objective) = self.objectives.iter_mut().rev().find(|o| !o.completed && !o.cancelled) {
            objective.cancelled = true;
        }
        self.mark_objectives_stale_all();
    }

    fn handle_feedback(&mut self, actor_id: u32, positive: bool) {
        let Some(actor) = self.actors.get(&actor_id) else { return };
        if actor.role != Role::Leader {
            return;
        }
        if let Some(&follower_id) = self.role_to_actor.get(&Role::Follower) {
            if let Some(queue) = self.immediate.get_mut(&follower_id) {
                queue.push(MessageFromServer::LiveFeedback { positive });
            }
        }
    }

    fn handle_turn_complete(&mut self, actor_id: u32, now: DateTime<Utc>) {
        let Some(actor) = self.actors.get(&actor_id) else { return };
        if actor.role != self.turn_state.turn {
            tracing::warn!(actor_id, "turn-complete from the player not on turn");
            return;
        }
        self.end_turn_if_over(now, true);
        self.mark_turn_state_pending_all();
    }

    // ---- action validation -------------------------------------------------------

    pub fn valid_action(&self, action: &Action) -> bool {
        match action.action_type {
            ActionType::Translate => action.displacement.cartesian_norm() <= hex_protocol::hex_coord::DISTANCE_TOLERANCE,
            ActionType::Rotate => action.rotation_deg.abs() <= 60.01,
            _ => false,
        }
    }

    // ---- tick loop -----------------------------------------------------------

    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self.done {
            return;
        }

        // 1. terminal check.
        if self.turn_state.turns_left <= -1 {
            self.turn_state.game_over = true;
            self.mark_turn_state_pending_all();
            self.done = true;
            return;
        }

        // 2. heartbeat: re-emit turn state and the state-machine tick marker.
        if now - self.last_tick >= HEARTBEAT {
            self.last_tick = now;
            self.mark_turn_state_pending_all();
            self.push_state_machine_tick_all();
        }

        // 3. turn expiry.
        if now >= self.turn_state.turn_end {
            self.end_turn_if_over(now, false);
            self.mark_turn_state_pending_all();
        }

        // 4. drain actor queues, in a deterministic actor-id order.
        for actor_id in self.actor_ids() {
            self.drain_one_actor_action(actor_id, now);
        }

        // 5. card set logic.
        self.apply_card_logic(now);
    }

    fn drain_one_actor_action(&mut self, actor_id: u32, now: DateTime<Utc>) {
        let Some(actor) = self.actors.get(&actor_id) else { return };
        if !actor.has_actions() {
            return;
        }
        let role = actor.role;
        let action = actor.peek().cloned().expect("has_actions just checked");

        if role != self.turn_state.turn {
            tracing::info!(actor_id, "action dropped: not this actor's turn");
            self.actors.get_mut(&actor_id).unwrap().drop_pending();
            self.desync(actor_id);
            return;
        }
        if self.turn_state.moves_remaining == 0 {
            tracing::info!(actor_id, "action dropped: no moves remaining");
            self.actors.get_mut(&actor_id).unwrap().drop_pending();
            self.desync(actor_id);
            return;
        }
        if !self.valid_action(&action) {
            tracing::info!(actor_id, ?action.action_type, "action dropped: invalid");
            self.actors.get_mut(&actor_id).unwrap().drop_pending();
            self.desync(actor_id);
            return;
        }

        let committed = self.actors.get_mut(&actor_id).unwrap().step().expect("step just validated");
        self.turn_state.moves_remaining -= 1;
        self.broadcast_action(committed.clone());

        if committed.action_type == ActionType::Translate {
            self.handle_card_step_on(actor_id, now);
        }
    }

    fn handle_card_step_on(&mut self, actor_id: u32, now: DateTime<Utc>) {
        let location = self.actors[&actor_id].location;
        let Some(card) = self.map_provider.card_by_location(location) else { return };
        let card_id = card.id;
        let now_selected = !card.selected;
        self.map_provider.set_selected(card_id, now_selected);

        let color = if self.current_set_invalid { Color::RED } else { Color::BLUE };
        let outline = outline_action(card_id, location, color, now);
        self.broadcast_action(outline);
    }

    fn apply_card_logic(&mut self, now: DateTime<Utc>) {
        let collides = self.map_provider.selected_cards_collide();
        if collides && !self.current_set_invalid {
            self.current_set_invalid = true;
            self.recolor_selected(Color::RED, now);
        } else if !collides && self.current_set_invalid {
            self.current_set_invalid = false;
            self.recolor_selected(Color::BLUE, now);
        }

        if self.map_provider.selected_valid_set() {
            self.current_set_invalid = false;
            let bonus = bonus_for_set_index(self.turn_state.sets_collected);
            self.turn_state.sets_collected += 1;
            self.turn_state.score += 1;
            self.turn_state.turns_left += bonus;
            self.mark_turn_state_pending_all();

            let selected_ids: Vec<u32> =
                self.map_provider.selected_cards().iter().map(|c| c.id).collect();
            for id in selected_ids {
                let location = self.map_provider.card_mut(id).map(|c| c.location).unwrap_or(HexCoord::ORIGIN);
                self.broadcast_action(outline_action(id, location, Color::NONE, now));
                self.map_provider.remove_card(id);
            }
            self.map_provider.add_random_cards(3);
            self.mark_map_stale_all();
        }
    }

    fn recolor_selected(&mut self, color: Color, now: DateTime<Utc>) {
        let selected: Vec<(u32, HexCoord)> =
            self.map_provider.selected_cards().iter().map(|c| (c.id, c.location)).collect();
        for (id, location) in selected {
            self.broadcast_action(outline_action(id, location, color, now));
        }
    }

    /// Appends to every actor's outbox, including the originator, which
    /// intentionally sees its own committed action as a confirmation echo.
    fn broadcast_action(&mut self, action: Action) {
        for queue in self.outbox.values_mut() {
            queue.push_back(action.clone());
        }
    }

    // ---- turn state machine -----------------------------------------------------

    fn end_turn_if_over(&mut self, now: DateTime<Utc>, force: bool) {
        let end_of_turn = force || now >= self.turn_state.turn_end;
        if !end_of_turn {
            return;
        }
        let next_role = self.turn_state.turn.opposite();
        self.turn_state.turn = next_role;
        self.turn_state.moves_remaining = match next_role {
            Role::Leader => LEADER_MOVES_PER_TURN,
            Role::Follower => FOLLOWER_MOVES_PER_TURN,
            Role::None => 0,
        };
        self.turn_state.turns_left -= 1;
        self.turn_state.turn_end = now + Duration::seconds(turn_duration_seconds(next_role));
    }

    fn mark_turn_state_pending_all(&mut self) {
        for bits in self.stale.values_mut() {
            bits.turn_state_pending = true;
        }
    }

    fn mark_objectives_stale_all(&mut self) {
        for bits in self.stale.values_mut() {
            bits.objectives_stale = true;
        }
    }

    fn mark_map_stale_all(&mut self) {
        for bits in self.stale.values_mut() {
            bits.map_stale = true;
        }
    }

    /// Queues the per-second marker every client's step loop blocks on,
    /// bypassing the priority drain the same way `LiveFeedback` does.
    fn push_state_machine_tick_all(&mut self) {
        for queue in self.immediate.values_mut() {
            queue.push(MessageFromServer::StateMachineTick);
        }
    }

    // ---- drain -----------------------------------------------------------------

    /// Immediate, out-of-band messages (live feedback) that bypass the
    /// priority drain below; the session write loop polls this too.
    pub fn drain_immediate(&mut self, actor_id: u32) -> Vec<MessageFromServer> {
        self.immediate.get_mut(&actor_id).map(std::mem::take).unwrap_or_default()
    }

    /// Returns at most one message per call, in the fixed priority order
    /// MapUpdate → StateSync → Actions → Objectives → TurnState → None.
    pub fn drain_message(&mut self, actor_id: u32) -> Option<MessageFromServer> {
        let role = self.actors.get(&actor_id)?.role;
        let bits = *self.stale.get(&actor_id)?;

        if bits.map_stale {
            self.stale.get_mut(&actor_id).unwrap().map_stale = false;
            return Some(MessageFromServer::MapUpdate(self.map_provider.map()));
        }
        if !bits.synced {
            return Some(self.sync_message_for_transmission(actor_id));
        }
        if let Some(queue) = self.outbox.get_mut(&actor_id) {
            if !queue.is_empty() {
                let actions: Vec<Action> = queue.drain(..).collect();
                let actions = if role == Role::Follower {
                    actions.into_iter().map(Action::censor_for_follower).collect()
                } else {
                    actions
                };
                return Some(MessageFromServer::Actions { actions });
            }
        }
        if bits.objectives_stale {
            self.stale.get_mut(&actor_id).unwrap().objectives_stale = false;
            return Some(MessageFromServer::Objective { list: self.objectives.clone() });
        }
        if bits.turn_state_pending {
            self.stale.get_mut(&actor_id).unwrap().turn_state_pending = false;
            return Some(MessageFromServer::GameState(self.turn_state.clone()));
        }
        None
    }

    fn sync_message_for_transmission(&mut self, actor_id: u32) -> MessageFromServer {
        let mut actors: Vec<ActorState> = self
            .actors
            .values()
            .map(|a| ActorState {
                actor_id: a.actor_id,
                asset_id: a.asset_id,
                role: a.role,
                location: a.location,
                heading_degrees: a.heading_degrees,
            })
            .collect();
        actors.sort_by_key(|a| a.actor_id);
        self.stale.get_mut(&actor_id).unwrap().synced = true;
        MessageFromServer::StateSync { actors }
    }
}

fn outline_action(card_id: u32, location: HexCoord, color: Color, now: DateTime<Utc>) -> Action {
    Action {
        id: card_id,
        action_type: ActionType::Outline,
        animation_type: AnimationType::None,
        displacement: HexCoord::ORIGIN,
        rotation_deg: 0.0,
        border_radius: 1.0,
        border_color: color,
        duration_s: 0.0,
        expiration: now,
    }
}

fn bonus_for_set_index(sets_collected_before: u32) -> i32 {
    match sets_collected_before {
        0 => 5,
        1 | 2 => 4,
        3 | 4 => 3,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_provider::RandomMapProvider;

    fn room_with_players(now: DateTime<Utc>) -> (RoomState<RandomMapProvider>, u32, u32) {
        let provider = RandomMapProvider::new(10, 10, 7);
        let mut room = RoomState::new(provider, now);
        let leader = room.create_actor(Role::Leader).unwrap();
        let follower = room.create_actor(Role::Follower).unwrap();
        (room, leader, follower)
    }

    fn translate(actor_id: u32, displacement: HexCoord, now: DateTime<Utc>) -> Action {
        Action {
            id: actor_id,
            action_type: ActionType::Translate,
            animation_type: AnimationType::Translate,
            displacement,
            rotation_deg: 0.0,
            border_radius: 0.0,
            border_color: Color::NONE,
            duration_s: 0.5,
            expiration: now,
        }
    }

    fn drain_all(room: &mut RoomState<RandomMapProvider>, actor_id: u32) -> Vec<MessageFromServer> {
        let mut out = Vec::new();
        while let Some(msg) = room.drain_message(actor_id) {
            out.push(msg);
        }
        out
    }

    // Scenario 1.
    #[test]
    fn fresh_room_has_expected_initial_turn_state() {
        let now = Utc::now();
        let (room, _leader, _follower) = room_with_players(now);
        assert_eq!(room.turn_state.turn, Role::Leader);
        assert_eq!(room.turn_state.moves_remaining, 5);
        assert_eq!(room.turn_state.turns_left, 6);
    }

    #[test]
    fn fresh_room_drain_yields_map_then_sync_then_turn_state() {
        let now = Utc::now();
        let (mut room, leader, _follower) = room_with_players(now);
        let messages = drain_all(&mut room, leader);
        assert!(matches!(messages[0], MessageFromServer::MapUpdate(_)));
        assert!(matches!(messages[1], MessageFromServer::StateSync { .. }));
        assert!(matches!(messages.last().unwrap(), MessageFromServer::GameState(_)));
    }

    // Scenario 2.
    #[test]
    fn translate_by_unit_vector_decrements_moves_and_advances_position() {
        let now = Utc::now();
        let (mut room, leader, _follower) = room_with_players(now);
        let _ = drain_all(&mut room, leader); // clear initial sync noise

        room.handle_action(leader, translate(leader, HexCoord::new(0, 0, 1), now));
        room.tick(now);

        assert_eq!(room.turn_state.moves_remaining, 4);
        assert_eq!(room.actors[&leader].location, HexCoord::new(0, 0, 1));
    }

    // Scenario 3.
    #[test]
    fn end_turn_flips_role_and_resets_moves_and_duration() {
        let now = Utc::now();
        let (mut room, leader, _follower) = room_with_players(now);
        room.handle_turn_complete(leader, now);
        room.tick(now);

        assert_eq!(room.turn_state.turn, Role::Follower);
        assert_eq!(room.turn_state.moves_remaining, 10);
        assert_eq!(room.turn_state.turns_left, 5);
        assert_eq!(
            (room.turn_state.turn_end - now).num_seconds(),
            45
        );
    }

    // Scenario 4 / P7.
    #[test]
    fn oversized_translate_is_dropped_and_desyncs() {
        let now = Utc::now();
        let (mut room, leader, _follower) = room_with_players(now);
        let _ = drain_all(&mut room, leader);
        assert!(room.is_synced(leader));

        room.handle_action(leader, translate(leader, HexCoord::new(0, 1, 1), now));
        room.tick(now);

        assert!(!room.is_synced(leader));
        assert_eq!(room.actors[&leader].location, HexCoord::ORIGIN);
        let messages = drain_all(&mut room, leader);
        assert!(matches!(messages[0], MessageFromServer::StateSync { .. }));
    }

    // P1.
    #[test]
    fn moves_remaining_never_goes_negative() {
        let now = Utc::now();
        let (mut room, leader, _follower) = room_with_players(now);
        for _ in 0..10 {
            room.handle_action(leader, translate(leader, HexCoord::new(0, 0, 1), now));
            room.tick(now);
        }
        assert_eq!(room.turn_state.moves_remaining, 0);
    }

    // P2.
    #[test]
    fn turn_alternates_on_forced_end() {
        let now = Utc::now();
        let (mut room, leader, follower) = room_with_players(now);
        room.handle_turn_complete(leader, now);
        room.tick(now);
        assert_eq!(room.turn_state.turn, Role::Follower);

        room.handle_turn_complete(follower, now);
        room.tick(now);
        assert_eq!(room.turn_state.turn, Role::Leader);
    }

    // P8.
    #[test]
    fn leader_feedback_crosses_turn_but_leader_moves_do_not() {
        let now = Utc::now();
        let (mut room, leader, follower) = room_with_players(now);
        room.handle_turn_complete(leader, now); // now Follower's turn.
        room.tick(now);

        room.handle_feedback(leader, true);
        let follower_immediate = room.drain_immediate(follower);
        assert_eq!(follower_immediate.len(), 1);

        room.handle_action(leader, translate(leader, HexCoord::new(0, 0, 1), now));
        room.tick(now);
        assert!(!room.is_synced(leader));
    }

    // P6 (bonus table) + scenario 5 grounding.
    #[test]
    fn bonus_table_matches_spec() {
        assert_eq!(bonus_for_set_index(0), 5);
        assert_eq!(bonus_for_set_index(1), 4);
        assert_eq!(bonus_for_set_index(2), 4);
        assert_eq!(bonus_for_set_index(3), 3);
        assert_eq!(bonus_for_set_index(4), 3);
        assert_eq!(bonus_for_set_index(5), 0);
        assert_eq!(bonus_for_set_index(100), 0);
    }

    #[test]
    fn heartbeat_emits_one_state_machine_tick_per_actor_per_second() {
        let now = Utc::now();
        let (mut room, leader, follower) = room_with_players(now);

        room.tick(now + Duration::milliseconds(500));
        assert!(room.drain_immediate(leader).is_empty(), "heartbeat fired early");

        room.tick(now + Duration::seconds(2));
        assert_eq!(room.drain_immediate(leader).len(), 1);
        let follower_ticks = room.drain_immediate(follower);
        assert_eq!(follower_ticks.len(), 1);
        assert!(matches!(follower_ticks[0], MessageFromServer::StateMachineTick));
    }

    #[test]
    fn collecting_a_valid_set_awards_score_and_refreshes_cards() {
        let now = Utc::now();
        let provider = RandomMapProvider::new(10, 10, 7);
        let mut room = RoomState::new(provider, now);
        let leader = room.create_actor(Role::Leader).unwrap();
        let _follower = room.create_actor(Role::Follower).unwrap();

        // Hand-place a valid set under the leader's own spawn so a single
        // step-on toggles it selected without needing real pathing.
        let loc = room.actors[&leader].location;
        room.map_provider.cards_mut_for_test().clear();
        room.map_provider.push_card_for_test(hex_protocol::Card {
            id: 100,
            location: loc,
            color: hex_protocol::CardColor::Red,
            shape: hex_protocol::CardShape::Star,
            count: 1,
            selected: true,
        });
        room.map_provider.push_card_for_test(hex_protocol::Card {
            id: 101,
            location: HexCoord::new(0, 5, 5),
            color: hex_protocol::CardColor::Blue,
            shape: hex_protocol::CardShape::Torus,
            count: 2,
            selected: true,
        });
        room.map_provider.push_card_for_test(hex_protocol::Card {
            id: 102,
            location: HexCoord::new(0, 6, 6),
            color: hex_protocol::CardColor::Green,
            shape: hex_protocol::CardShape::Heart,
            count: 3,
            selected: true,
        });

        room.tick(now);

        assert_eq!(room.turn_state.sets_collected, 1);
        assert_eq!(room.turn_state.score, 1);
        assert_eq!(room.turn_state.turns_left, 11); // 6 + bonus 5
        assert_eq!(room.map_provider.cards().len(), 3); // 3 removed, 3 added
    }

    // Disconnect scenario (6).
    #[test]
    fn free_actor_desyncs_the_survivor() {
        let now = Utc::now();
        let (mut room, leader, follower) = room_with_players(now);
        let _ = drain_all(&mut room, follower);
        assert!(room.is_synced(follower));

        room.free_actor(leader);
        assert!(!room.is_synced(follower));
    }
}
