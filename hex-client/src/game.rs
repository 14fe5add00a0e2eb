//! The client-side mirror of a room: joins, keeps a local copy of map,
//! actor, and turn state in sync with the server's broadcasts, and
//! exposes a small step-based API for driving a player programmatically.

use std::time::{Duration, Instant};

use hex_protocol::{
    Action, ActorState, MapUpdate, MessageFromServer, MessageToServer, ObjectiveMessage,
    PropUpdate, QueueType, Role, TurnState,
};
use tokio::time::timeout;

use crate::connection::Connection;
use crate::error::ClientError;

/// A snapshot of everything the mirror knows after processing one batch
/// of server messages, returned to the caller from [`Game::step`].
#[derive(Clone, Debug)]
pub struct Observation {
    pub turn_state: TurnState,
    pub actors: Vec<ActorState>,
    pub map: Option<MapUpdate>,
    pub props: Option<PropUpdate>,
    pub objectives: Vec<ObjectiveMessage>,
    pub last_actions: Vec<Action>,
}

/// The pure, network-free half of [`Game`]: local belief about room state
/// and the can-act rule, kept separate so it is testable without a socket.
#[derive(Default)]
struct Mirror {
    role: Role,
    turn_state: Option<TurnState>,
    actors: Vec<ActorState>,
    map: Option<MapUpdate>,
    props: Option<PropUpdate>,
    objectives: Vec<ObjectiveMessage>,
    pending_pongs: u32,
}

impl Mirror {
    /// The leader can always act — it can give feedback during the
    /// follower's turn — everyone else only on their own turn.
    fn can_act(&self) -> bool {
        self.role == Role::Leader
            || self.turn_state.as_ref().map(|t| t.turn == self.role).unwrap_or(false)
    }

    fn over(&self) -> bool {
        self.turn_state.as_ref().map(|t| t.game_over).unwrap_or(false)
    }

    fn absorb(&mut self, msg: MessageFromServer, last_actions: &mut Vec<Action>) {
        match msg {
            MessageFromServer::Actions { actions } => last_actions.extend(actions),
            MessageFromServer::StateSync { actors } => self.actors = actors,
            MessageFromServer::MapUpdate(map) => self.map = Some(map),
            MessageFromServer::PropUpdate(props) => self.props = Some(props),
            MessageFromServer::GameState(turn_state) => self.turn_state = Some(turn_state),
            MessageFromServer::Objective { list } => self.objectives = list,
            MessageFromServer::Ping => self.pending_pongs += 1,
            MessageFromServer::RoomManagement(_)
            | MessageFromServer::LiveFeedback { .. }
            | MessageFromServer::StateMachineTick => {}
        }
    }

    fn observation(&self, last_actions: Vec<Action>) -> Observation {
        Observation {
            turn_state: self.turn_state.clone().unwrap_or_default(),
            actors: self.actors.clone(),
            map: self.map.clone(),
            props: self.props.clone(),
            objectives: self.objectives.clone(),
            last_actions,
        }
    }
}

/// Tracks which of the join handshake's required broadcasts have arrived;
/// the handshake only completes once every one of them has been seen.
#[derive(Default)]
struct JoinChecklist {
    state_sync: bool,
    map_update: bool,
    prop_update: bool,
    game_state: bool,
}

impl JoinChecklist {
    fn observe(&mut self, msg: &MessageFromServer) {
        match msg {
            MessageFromServer::StateSync { .. } => self.state_sync = true,
            MessageFromServer::MapUpdate(_) => self.map_update = true,
            MessageFromServer::PropUpdate(_) => self.prop_update = true,
            MessageFromServer::GameState(_) => self.game_state = true,
            _ => {}
        }
    }

    fn complete(&self) -> bool {
        self.state_sync && self.map_update && self.prop_update && self.game_state
    }
}

fn queue_message(queue: QueueType) -> MessageToServer {
    match queue {
        QueueType::LeaderOnly => MessageToServer::JoinLeaderQueue,
        QueueType::FollowerOnly => MessageToServer::JoinFollowerQueue,
        QueueType::Default => MessageToServer::JoinQueue,
    }
}

/// Remaining time until `deadline`, or zero if it has already passed.
fn remaining_until(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

pub struct Game {
    connection: Connection,
    mirror: Mirror,
}

impl Game {
    /// Connects, sends the requested join message, and then reads frames —
    /// bounded by `join_timeout` as a hard ceiling — until it has observed
    /// admission plus a StateSync, MapUpdate, PropUpdate, and GameState, in
    /// any order. Only then is the `Game` constructed.
    pub async fn join(url: &str, queue: QueueType, join_timeout: Duration) -> Result<Game, ClientError> {
        let mut connection = Connection::connect(url).await?;
        connection.send(&queue_message(queue)).await?;

        let deadline = Instant::now() + join_timeout;

        let role = loop {
            let response = timeout(remaining_until(deadline), connection.recv())
                .await
                .map_err(|_| ClientError::Timeout("join response"))?
                .ok_or(ClientError::NoJoinResponse)??;
            match response {
                MessageFromServer::RoomManagement(admission) if admission.booted_from_queue => {
                    return Err(ClientError::JoinRejected);
                }
                MessageFromServer::RoomManagement(admission) if admission.joined => break admission.role,
                // Still queued (joined=false, not booted) or some other frame
                // arriving before admission: keep waiting.
                _ => continue,
            }
        };

        let mut mirror = Mirror { role, ..Mirror::default() };
        let mut checklist = JoinChecklist::default();
        let mut discard = Vec::new();
        while !checklist.complete() {
            let msg = timeout(remaining_until(deadline), connection.recv())
                .await
                .map_err(|_| ClientError::Timeout("initial game state"))?
                .ok_or(ClientError::NoJoinResponse)??;
            checklist.observe(&msg);
            mirror.absorb(msg, &mut discard);
        }

        Ok(Game { connection, mirror })
    }

    pub fn role(&self) -> Role {
        self.mirror.role
    }

    pub fn can_act(&self) -> bool {
        self.mirror.can_act()
    }

    pub fn over(&self) -> bool {
        self.mirror.over()
    }

    /// Submits one action, refusing locally if it is not this seat's turn,
    /// then blocks on the tick marker — looping past extra ticks if the
    /// turn hasn't come back around yet — before returning the refreshed
    /// local mirror.
    pub async fn step(&mut self, action: Action) -> Result<Observation, ClientError> {
        if !self.can_act() {
            return Ok(self.mirror.observation(Vec::new()));
        }
        self.connection.send(&MessageToServer::Actions { actions: vec![action] }).await?;
        self.flush_queued().await?;

        let mut last_actions = Vec::new();
        self.wait_for_tick(&mut last_actions).await?;
        while !self.mirror.can_act() {
            self.wait_for_tick(&mut last_actions).await?;
        }
        Ok(self.mirror.observation(last_actions))
    }

    /// Drains up to and including the next tick marker without submitting
    /// anything; useful for the Follower watching the Leader's turn play out.
    pub async fn pump(&mut self) -> Result<Observation, ClientError> {
        self.flush_queued().await?;
        let mut last_actions = Vec::new();
        self.wait_for_tick(&mut last_actions).await?;
        Ok(self.mirror.observation(last_actions))
    }

    /// Reads and absorbs messages until a STATE_MACHINE_TICK marker is
    /// observed, which is what bounds every `step`/`pump` call.
    async fn wait_for_tick(&mut self, last_actions: &mut Vec<Action>) -> Result<(), ClientError> {
        const TICK_TIMEOUT: Duration = Duration::from_secs(65);
        loop {
            let msg = timeout(TICK_TIMEOUT, self.connection.recv())
                .await
                .map_err(|_| ClientError::Timeout("state machine tick"))?
                .ok_or(ClientError::Timeout("state machine tick"))??;
            let is_tick = matches!(msg, MessageFromServer::StateMachineTick);
            self.mirror.absorb(msg, last_actions);
            if is_tick {
                return Ok(());
            }
        }
    }

    /// Sends one Pong per Ping absorbed since the last flush.
    async fn flush_queued(&mut self) -> Result<(), ClientError> {
        while self.mirror.pending_pongs > 0 {
            self.connection.send(&MessageToServer::Pong).await?;
            self.mirror.pending_pongs -= 1;
        }
        Ok(())
    }

    pub async fn send_objective(&mut self, text: String) -> Result<(), ClientError> {
        self.connection.send(&MessageToServer::Objective { text }).await
    }

    pub async fn complete_objective(&mut self, uuid: String) -> Result<(), ClientError> {
        self.connection.send(&MessageToServer::ObjectiveCompleted { uuid }).await
    }

    pub async fn end_turn(&mut self) -> Result<(), ClientError> {
        self.connection.send(&MessageToServer::TurnComplete).await
    }

    pub async fn send_feedback(&mut self, positive: bool) -> Result<(), ClientError> {
        let msg = if positive {
            MessageToServer::PositiveFeedback
        } else {
            MessageToServer::NegativeFeedback
        };
        self.connection.send(&msg).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn turn_state(turn: Role, game_over: bool) -> TurnState {
        TurnState {
            turn,
            moves_remaining: 1,
            turns_left: 1,
            turn_end: Utc::now(),
            game_start: Utc::now(),
            sets_collected: 0,
            score: 0,
            game_over,
        }
    }

    #[test]
    fn cannot_act_before_any_turn_state_arrives() {
        let mirror = Mirror { role: Role::Follower, ..Mirror::default() };
        assert!(!mirror.can_act());
    }

    #[test]
    fn follower_can_act_only_on_its_own_turn() {
        let mut mirror = Mirror { role: Role::Follower, ..Mirror::default() };
        mirror.turn_state = Some(turn_state(Role::Leader, false));
        assert!(!mirror.can_act());

        mirror.turn_state = Some(turn_state(Role::Follower, false));
        assert!(mirror.can_act());
    }

    #[test]
    fn leader_can_always_act() {
        // The leader gives feedback during the follower's turn, so can_act
        // never gates on whose turn it is for that role.
        let mut mirror = Mirror { role: Role::Leader, ..Mirror::default() };
        assert!(!mirror.can_act()); // no turn state yet: still true by role.
        mirror.turn_state = Some(turn_state(Role::Follower, false));
        assert!(mirror.can_act());
        mirror.turn_state = Some(turn_state(Role::Leader, false));
        assert!(mirror.can_act());
    }

    #[test]
    fn over_reflects_latest_turn_state() {
        let mut mirror = Mirror { role: Role::Leader, ..Mirror::default() };
        assert!(!mirror.over());
        mirror.turn_state = Some(turn_state(Role::Leader, true));
        assert!(mirror.over());
    }

    #[test]
    fn absorb_accumulates_actions_and_replaces_snapshots() {
        let mut mirror = Mirror { role: Role::Leader, ..Mirror::default() };
        let mut last_actions = Vec::new();
        mirror.absorb(MessageFromServer::StateSync { actors: vec![] }, &mut last_actions);
        mirror.absorb(MessageFromServer::Objective { list: vec![] }, &mut last_actions);
        assert!(last_actions.is_empty());
        assert!(mirror.actors.is_empty());
        assert!(mirror.objectives.is_empty());
    }

    // R2: re-applying a StateSync that already matches the mirror is a
    // no-op on observable state.
    #[test]
    fn reapplying_an_identical_state_sync_is_a_no_op() {
        let mut mirror = Mirror { role: Role::Leader, ..Mirror::default() };
        let actors = vec![ActorState {
            actor_id: 1,
            asset_id: 0,
            role: Role::Leader,
            location: Default::default(),
            heading_degrees: 0.0,
        }];
        let mut last_actions = Vec::new();
        mirror.absorb(MessageFromServer::StateSync { actors: actors.clone() }, &mut last_actions);
        let before = mirror.observation(Vec::new());

        mirror.absorb(MessageFromServer::StateSync { actors }, &mut last_actions);
        let after = mirror.observation(Vec::new());

        assert_eq!(before.actors.len(), after.actors.len());
        assert_eq!(before.actors[0].actor_id, after.actors[0].actor_id);
        assert_eq!(before.actors[0].location, after.actors[0].location);
        assert!(last_actions.is_empty());
    }

    // R3: a duplicate PING yields one Pong per PING — verified at the point
    // where that fact is tracked, since sending the Pong itself needs a live
    // connection.
    #[test]
    fn duplicate_ping_queues_one_pong_each() {
        let mut mirror = Mirror::default();
        let mut discard = Vec::new();
        mirror.absorb(MessageFromServer::Ping, &mut discard);
        mirror.absorb(MessageFromServer::Ping, &mut discard);
        assert_eq!(mirror.pending_pongs, 2);
    }

    #[test]
    fn join_checklist_requires_every_broadcast_before_completing() {
        let mut checklist = JoinChecklist::default();
        assert!(!checklist.complete());
        checklist.observe(&MessageFromServer::StateSync { actors: vec![] });
        checklist.observe(&MessageFromServer::MapUpdate(MapUpdate { rows: 1, cols: 1, tiles: vec![] }));
        assert!(!checklist.complete());
        checklist.observe(&MessageFromServer::PropUpdate(PropUpdate { props: vec![] }));
        checklist.observe(&MessageFromServer::GameState(turn_state(Role::Leader, false)));
        assert!(checklist.complete());
    }
}
