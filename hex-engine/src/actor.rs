//! One player's avatar: position, heading, role, and a FIFO of pending
//! proposed actions awaiting validation by the room's tick loop.

use std::collections::VecDeque;

use hex_protocol::{Action, HexCoord, Role};

pub struct Actor {
    pub actor_id: u32,
    pub asset_id: u32,
    pub role: Role,
    pub location: HexCoord,
    pub heading_degrees: f64,
    pending: VecDeque<Action>,
}

impl Actor {
    pub fn new(actor_id: u32, asset_id: u32, role: Role, spawn: HexCoord) -> Actor {
        Actor {
            actor_id,
            asset_id,
            role,
            location: spawn,
            heading_degrees: 0.0,
            pending: VecDeque::new(),
        }
    }

    pub fn add_action(&mut self, action: Action) {
        self.pending.push_back(action);
    }

    pub fn has_actions(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn peek(&self) -> Option<&Action> {
        self.pending.front()
    }

    /// Discards the head of the queue without applying it.
    pub fn drop_pending(&mut self) {
        self.pending.pop_front();
    }

    /// Applies the head action's displacement and rotation, only ever called
    /// by the engine after `valid_action` has succeeded.
    pub fn step(&mut self) -> Option<Action> {
        let action = self.pending.pop_front()?;
        self.location = self.location.add(action.displacement);
        self.heading_degrees += action.rotation_deg;
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hex_protocol::{ActionType, AnimationType, Color};

    fn translate(displacement: HexCoord) -> Action {
        Action {
            id: 0,
            action_type: ActionType::Translate,
            animation_type: AnimationType::Translate,
            displacement,
            rotation_deg: 0.0,
            border_radius: 0.0,
            border_color: Color::NONE,
            duration_s: 0.5,
            expiration: Utc::now(),
        }
    }

    #[test]
    fn step_applies_displacement_and_dequeues() {
        let mut actor = Actor::new(0, 0, Role::Leader, HexCoord::ORIGIN);
        actor.add_action(translate(HexCoord::new(0, 0, 1)));
        assert!(actor.has_actions());
        actor.step();
        assert!(!actor.has_actions());
        assert_eq!(actor.location, HexCoord::new(0, 0, 1));
    }

    #[test]
    fn drop_pending_discards_without_moving() {
        let mut actor = Actor::new(0, 0, Role::Leader, HexCoord::ORIGIN);
        actor.add_action(translate(HexCoord::new(0, 0, 1)));
        actor.drop_pending();
        assert_eq!(actor.location, HexCoord::ORIGIN);
        assert!(!actor.has_actions());
    }
}
