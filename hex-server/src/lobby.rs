//! Room registry and admission queue. Each room owns one running [`Room`]
//! engine, shared by its sessions behind a mutex; this module decides which
//! room a new connection lands in, queues it with role preference when both
//! seats are taken, and reports queue position back to the caller.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use hex_engine::{RandomMapProvider, RoomState};
use hex_protocol::{Config, Role};
use rand::Rng;
use tokio::sync::{Mutex, RwLock};

pub type Room = RoomState<RandomMapProvider>;

/// One entrant waiting for a seat, in arrival order.
struct Waiter {
    id: u64,
    wants: Role,
}

/// One room slot: the shared engine and the FIFO queue of connections
/// waiting for a seat to open up. Seat occupancy is read live from the
/// engine rather than tracked separately, so it can never drift out of sync
/// with who `free_actor` actually released.
pub struct RoomEntry {
    pub engine: Arc<Mutex<Room>>,
    waiting: VecDeque<Waiter>,
    seated: HashMap<u64, (u32, Role)>,
    next_ticket: u64,
}

impl RoomEntry {
    fn fresh(seed: u64) -> RoomEntry {
        let provider = RandomMapProvider::new(14, 14, seed);
        RoomEntry {
            engine: Arc::new(Mutex::new(RoomState::new(provider, Utc::now()))),
            waiting: VecDeque::new(),
            seated: HashMap::new(),
            next_ticket: 0,
        }
    }

    /// Walks the queue front-to-back and hands each open seat to the first
    /// waiter who can take it (FIFO with role preference): a waiter asking
    /// for a specific role only takes that role's seat; `Role::None` takes
    /// whichever opens first. Seated waiters are moved into `self.seated`
    /// for their next poll to collect; everyone else keeps their place.
    fn admit(&mut self, engine: &mut Room) {
        let mut leader_open = !engine.has_role(Role::Leader);
        let mut follower_open = !engine.has_role(Role::Follower);
        if !leader_open && !follower_open {
            return;
        }

        let mut still_waiting = VecDeque::with_capacity(self.waiting.len());
        while let Some(waiter) = self.waiting.pop_front() {
            let seat = match waiter.wants {
                Role::Leader if leader_open => Some(Role::Leader),
                Role::Follower if follower_open => Some(Role::Follower),
                Role::None if leader_open => Some(Role::Leader),
                Role::None if follower_open => Some(Role::Follower),
                _ => None,
            };
            match seat {
                Some(role) => match engine.create_actor(role) {
                    Ok(actor_id) => {
                        match role {
                            Role::Leader => leader_open = false,
                            Role::Follower => follower_open = false,
                            Role::None => unreachable!("seat is always resolved above"),
                        }
                        self.seated.insert(waiter.id, (actor_id, role));
                    }
                    Err(_) => still_waiting.push_back(waiter),
                },
                None => still_waiting.push_back(waiter),
            }
        }
        self.waiting = still_waiting;
    }
}

#[derive(Default)]
pub struct AppState {
    pub rooms: Mutex<HashMap<String, RoomEntry>>,
    pub config: RwLock<Config>,
}

/// The outcome of polling a queue ticket.
pub enum QueueStatus {
    /// A seat opened up; the caller owns `actor_id` in `role` from now on.
    Seated(Arc<Mutex<Room>>, u32, Role),
    /// Still waiting; `u32` is the 1-based position in the FIFO queue.
    Waiting(u32),
    /// The room this ticket was queued against is gone (finished and
    /// reaped) before a seat ever opened.
    Booted,
}

/// Reads the ambient config file, falling back to defaults the first time
/// the server starts with no file on disk.
pub async fn reload_config(state: &Arc<AppState>) -> Result<(), String> {
    let path = "HexConfig.json";
    let loaded = match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content).map_err(|e| format!("bad config: {e}"))?,
        Err(_) => Config::default(),
    };
    *state.config.write().await = loaded;
    Ok(())
}

/// Registers a new connection's role preference in `room_id`'s FIFO queue,
/// creating the room on first arrival. Returns the ticket to poll.
pub async fn enter_queue(state: &Arc<AppState>, room_id: &str, wants: Role) -> u64 {
    let mut rooms = state.rooms.lock().await;
    let entry = rooms
        .entry(room_id.to_string())
        .or_insert_with(|| RoomEntry::fresh(rand::thread_rng().gen::<u64>()));
    let ticket = entry.next_ticket;
    entry.next_ticket += 1;
    entry.waiting.push_back(Waiter { id: ticket, wants });
    ticket
}

/// Tries to admit queued connections, then reports this ticket's status.
pub async fn poll_queue(state: &Arc<AppState>, room_id: &str, ticket: u64) -> QueueStatus {
    let mut rooms = state.rooms.lock().await;
    let Some(entry) = rooms.get_mut(room_id) else {
        return QueueStatus::Booted;
    };

    {
        let mut engine = entry.engine.lock().await;
        if engine.is_done() {
            entry.waiting.retain(|w| w.id != ticket);
            entry.seated.remove(&ticket);
            return QueueStatus::Booted;
        }
        entry.admit(&mut engine);
    }

    if let Some((actor_id, role)) = entry.seated.remove(&ticket) {
        return QueueStatus::Seated(entry.engine.clone(), actor_id, role);
    }
    if let Some(position) = entry.waiting.iter().position(|w| w.id == ticket) {
        return QueueStatus::Waiting(position as u32 + 1);
    }
    // Already resolved and collected, or never actually entered: nothing
    // left for this ticket to wait on.
    QueueStatus::Booted
}

/// Removes a ticket from the queue (or frees its seat, if it had already
/// been seated but the connection never collected it) when the connection
/// gives up — on disconnect or an explicit `Leave` while still queued.
pub async fn cancel_queue(state: &Arc<AppState>, room_id: &str, ticket: u64) {
    let mut rooms = state.rooms.lock().await;
    if let Some(entry) = rooms.get_mut(room_id) {
        entry.waiting.retain(|w| w.id != ticket);
        if let Some((actor_id, _role)) = entry.seated.remove(&ticket) {
            entry.engine.lock().await.free_actor(actor_id);
        }
    }
}

/// Releases a seat so a queued connection can claim it; the room itself is
/// kept around for the rest of its process lifetime.
pub async fn leave_room(state: &Arc<AppState>, room_id: &str, actor_id: u32, _role: Role) {
    let mut rooms = state.rooms.lock().await;
    if let Some(entry) = rooms.get_mut(room_id) {
        entry.engine.lock().await.free_actor(actor_id);
    }
}

/// Drops rooms whose engine reports the game is over, freeing memory for
/// finished sessions nobody reconnects to. Fallback cleanup; normal
/// departures already release their own seats via [`leave_room`].
pub async fn cleanup_finished_rooms(state: &Arc<AppState>) {
    let mut rooms = state.rooms.lock().await;
    let mut finished = Vec::new();
    for (room_id, entry) in rooms.iter() {
        if entry.engine.lock().await.is_done() {
            finished.push(room_id.clone());
        }
    }
    for room_id in finished {
        tracing::info!(room_id, "removing finished room");
        rooms.remove(&room_id);
    }
}
