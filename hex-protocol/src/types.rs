//! Shared value types that cross the wire: roles, actions, cards, turn state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::hex_coord::HexCoord;

/// A player's seat in the room. Discriminants are disjoint by construction;
/// the original event-origin enum this was translated from reused `1` for
/// both roles, which the property tests in `hex-engine` guard against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Role {
    #[default]
    None = 0,
    Leader = 1,
    Follower = 2,
}

impl Role {
    pub fn opposite(self) -> Role {
        match self {
            Role::Leader => Role::Follower,
            Role::Follower => Role::Leader,
            Role::None => Role::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ActionType {
    Init = 0,
    Instant = 1,
    Rotate = 2,
    Translate = 3,
    Outline = 4,
    Death = 5,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum AnimationType {
    None = 0,
    Idle = 1,
    Walking = 2,
    Instant = 3,
    Translate = 4,
    AccelDecel = 5,
    Skipping = 6,
    Rotate = 7,
}

/// An RGBA color, used for presentational outline state only.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const RED: Color = Color { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const BLUE: Color = Color { r: 0.0, g: 0.0, b: 1.0, a: 1.0 };
    pub const NONE: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };
}

/// An immutable, already-validated action as it is broadcast to clients.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Action {
    pub id: u32,
    pub action_type: ActionType,
    pub animation_type: AnimationType,
    pub displacement: HexCoord,
    pub rotation_deg: f64,
    pub border_radius: f64,
    pub border_color: Color,
    pub duration_s: f64,
    pub expiration: DateTime<Utc>,
}

impl Action {
    /// Rewrites a red (invalid-set) outline color to blue before it reaches
    /// a Follower, hiding set-validity information the Follower should not
    /// see ahead of the Leader. A no-op for every other action.
    pub fn censor_for_follower(mut self) -> Action {
        if self.action_type == ActionType::Outline && self.border_color == Color::RED {
            self.border_color = Color::BLUE;
        }
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum CardColor {
    Black = 0,
    Blue = 1,
    Green = 2,
    Orange = 3,
    Pink = 4,
    Red = 5,
    Yellow = 6,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum CardShape {
    Plain = 0,
    Star = 1,
    Torus = 2,
    Heart = 3,
}

/// One selectable card on the map. `count` is 1..=3.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Card {
    pub id: u32,
    pub location: HexCoord,
    pub color: CardColor,
    pub shape: CardShape,
    pub count: u8,
    pub selected: bool,
}

/// Current turn-clock state, re-emitted on every heartbeat.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TurnState {
    pub turn: Role,
    pub moves_remaining: u32,
    pub turns_left: i32,
    pub turn_end: DateTime<Utc>,
    pub game_start: DateTime<Utc>,
    pub sets_collected: u32,
    pub score: u32,
    pub game_over: bool,
}

/// A Leader-authored instruction and its Follower-reported lifecycle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectiveMessage {
    pub sender: Role,
    pub text: String,
    pub uuid: String,
    pub completed: bool,
    pub cancelled: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectiveCompleteMessage {
    pub uuid: String,
}

/// One actor's observable state, as carried by a StateSync snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActorState {
    pub actor_id: u32,
    pub asset_id: u32,
    pub role: Role,
    pub location: HexCoord,
    pub heading_degrees: f64,
}

pub const LEADER_MOVES_PER_TURN: u32 = 5;
pub const FOLLOWER_MOVES_PER_TURN: u32 = 10;

pub fn turn_duration_seconds(role: Role) -> i64 {
    match role {
        Role::Leader => 60,
        Role::Follower => 45,
        Role::None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_discriminants_are_distinct() {
        assert_ne!(Role::Leader as u8, Role::Follower as u8);
        assert_ne!(Role::Leader as u8, Role::None as u8);
        assert_ne!(Role::Follower as u8, Role::None as u8);
    }

    #[test]
    fn censor_rewrites_only_red_outline() {
        let red_outline = Action {
            id: 1,
            action_type: ActionType::Outline,
            animation_type: AnimationType::None,
            displacement: HexCoord::ORIGIN,
            rotation_deg: 0.0,
            border_radius: 1.0,
            border_color: Color::RED,
            duration_s: 0.0,
            expiration: Utc::now(),
        };
        assert_eq!(red_outline.clone().censor_for_follower().border_color, Color::BLUE);

        let mut translate = red_outline;
        translate.action_type = ActionType::Translate;
        assert_eq!(translate.clone().censor_for_follower().border_color, Color::RED);
    }
}
