//! Per-connection handling: admission, then two paired tasks (send/receive)
//! raced against each other so either side tearing down ends the session,
//! mirroring the split-socket idiom used throughout this server.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use hex_protocol::{JoinResponse, MessageFromServer, MessageToServer, Role, Transmission};
use tokio::sync::Mutex;

use crate::lobby::{AppState, QueueStatus, Room, cancel_queue, enter_queue, leave_room, poll_queue};

const DRAIN_INTERVAL: Duration = Duration::from_millis(50);
const QUEUE_POLL_INTERVAL: Duration = Duration::from_millis(500);

async fn send_json(sender: &mut SplitSink<WebSocket, Message>, msg: MessageFromServer) -> bool {
    let wrapped = Transmission::now(msg);
    let text = match serde_json::to_string(&wrapped) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(?err, "failed to encode outbound message");
            return false;
        }
    };
    sender.send(Message::Text(text)).await.is_ok()
}

fn requested_role(msg: &MessageToServer) -> Option<Role> {
    match msg {
        MessageToServer::JoinLeaderQueue => Some(Role::Leader),
        MessageToServer::JoinFollowerQueue => Some(Role::Follower),
        MessageToServer::JoinQueue => Some(Role::None),
        _ => None,
    }
}

/// Reads the first frame, expects a join request, admits the connection
/// into a room, and hands control to the paired send/receive tasks.
pub async fn handle_connection(socket: WebSocket, state: Arc<AppState>, room_id: String) {
    let (mut sender, mut receiver) = socket.split();

    let Some(Ok(Message::Text(first))) = receiver.next().await else {
        tracing::warn!(room_id, "connection closed before a join request arrived");
        return;
    };
    let Ok(join_msg) = serde_json::from_str::<MessageToServer>(&first) else {
        tracing::warn!(room_id, "first frame was not a valid message");
        let _ = send_json(&mut sender, rejected_join()).await;
        return;
    };
    let Some(wants) = requested_role(&join_msg) else {
        tracing::warn!(room_id, "first frame was not a join request");
        let _ = send_json(&mut sender, rejected_join()).await;
        return;
    };

    let ticket = enter_queue(&state, &room_id, wants).await;
    let (engine, actor_id, role) = match wait_for_seat(&mut sender, &mut receiver, &state, &room_id, ticket).await {
        Some(seated) => seated,
        None => return,
    };

    let accepted = send_json(
        &mut sender,
        MessageFromServer::RoomManagement(JoinResponse {
            joined: true,
            role,
            place_in_queue: 0,
            booted_from_queue: false,
        }),
    )
    .await;

    if !accepted {
        leave_room(&state, &room_id, actor_id, role).await;
        return;
    }

    let wrapped_sender = Arc::new(Mutex::new(sender));

    let mut receive_task = tokio::spawn(receive_loop(receiver, engine.clone(), actor_id));
    let mut send_task = tokio::spawn(drain_loop(wrapped_sender.clone(), engine.clone(), actor_id));

    tokio::select! {
        _ = &mut receive_task => { send_task.abort(); }
        _ = &mut send_task => { receive_task.abort(); }
    }

    leave_room(&state, &room_id, actor_id, role).await;
    let mut sender = wrapped_sender.lock().await;
    let _ = sender.send(Message::Close(None)).await;
}

fn rejected_join() -> MessageFromServer {
    MessageFromServer::RoomManagement(JoinResponse {
        joined: false,
        role: Role::None,
        place_in_queue: 0,
        booted_from_queue: false,
    })
}

/// Polls the FIFO queue for `ticket` until a seat opens, reporting this
/// connection's position each time it changes, while still watching the
/// socket so an early `Leave` or disconnect drops out of the queue instead
/// of waiting forever. Returns `None` if the connection gave up or was
/// booted; the caller should close the socket in that case.
async fn wait_for_seat(
    sender: &mut SplitSink<WebSocket, Message>,
    receiver: &mut SplitStream<WebSocket>,
    state: &Arc<AppState>,
    room_id: &str,
    ticket: u64,
) -> Option<(Arc<Mutex<Room>>, u32, Role)> {
    let mut poll_interval = tokio::time::interval(QUEUE_POLL_INTERVAL);
    let mut last_reported_position = None;

    loop {
        tokio::select! {
            _ = poll_interval.tick() => {
                match poll_queue(state, room_id, ticket).await {
                    QueueStatus::Seated(engine, actor_id, role) => return Some((engine, actor_id, role)),
                    QueueStatus::Waiting(position) => {
                        if last_reported_position != Some(position) {
                            last_reported_position = Some(position);
                            let sent = send_json(
                                sender,
                                MessageFromServer::RoomManagement(JoinResponse {
                                    joined: false,
                                    role: Role::None,
                                    place_in_queue: position,
                                    booted_from_queue: false,
                                }),
                            )
                            .await;
                            if !sent {
                                cancel_queue(state, room_id, ticket).await;
                                return None;
                            }
                        }
                    }
                    QueueStatus::Booted => {
                        let _ = send_json(
                            sender,
                            MessageFromServer::RoomManagement(JoinResponse {
                                joined: false,
                                role: Role::None,
                                place_in_queue: 0,
                                booted_from_queue: true,
                            }),
                        )
                        .await;
                        return None;
                    }
                }
            }
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if matches!(serde_json::from_str::<MessageToServer>(&text), Ok(MessageToServer::Leave)) {
                            cancel_queue(state, room_id, ticket).await;
                            return None;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        cancel_queue(state, room_id, ticket).await;
                        return None;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::info!(room_id, ticket, ?err, "transport error while queued");
                        cancel_queue(state, room_id, ticket).await;
                        return None;
                    }
                    None => {
                        tracing::info!(room_id, ticket, "connection closed while queued");
                        cancel_queue(state, room_id, ticket).await;
                        return None;
                    }
                }
            }
        }
    }
}

/// Decodes inbound frames and feeds them straight into the engine; a
/// malformed frame desyncs the actor instead of tearing the socket down,
/// matching the protocol-violation handling in the error design.
async fn receive_loop(mut receiver: SplitStream<WebSocket>, engine: Arc<Mutex<Room>>, actor_id: u32) {
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<MessageToServer>(&text) {
                Ok(msg) => {
                    let mut room = engine.lock().await;
                    room.handle_packet(actor_id, msg, Utc::now());
                }
                Err(err) => {
                    tracing::warn!(actor_id, ?err, "dropping malformed frame");
                    let mut room = engine.lock().await;
                    room.desync(actor_id);
                }
            },
            Ok(Message::Close(_)) => return,
            Ok(_) => {}
            Err(err) => {
                tracing::info!(actor_id, ?err, "transport error, ending session");
                return;
            }
        }
    }
}

/// Periodically ticks the shared room forward (a no-op if another session's
/// drain loop just did it) and flushes whatever this actor's queue has.
async fn drain_loop(sender: Arc<Mutex<SplitSink<WebSocket, Message>>>, engine: Arc<Mutex<Room>>, actor_id: u32) {
    let mut interval = tokio::time::interval(DRAIN_INTERVAL);
    loop {
        interval.tick().await;
        let mut outgoing = Vec::new();
        {
            let mut room = engine.lock().await;
            room.tick(Utc::now());
            while let Some(msg) = room.drain_message(actor_id) {
                outgoing.push(msg);
            }
            outgoing.extend(room.drain_immediate(actor_id));
        }
        let mut sender = sender.lock().await;
        for msg in outgoing {
            if !send_json(&mut sender, msg).await {
                return;
            }
        }
    }
}
