//! Player WebSocket sessions.
//!
//! Each connection binds to one room and one user id. The first frame must
//! be a `hello`; after that the client pushes event envelopes and receives
//! peer events, fresh snapshots for its own applied events, and rejection
//! notices for events that did not apply.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use rand::Rng;
use tokio::{sync::broadcast::error::RecvError, sync::mpsc, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    dto::ws::{ClientMessage, ServerMessage},
    engine::EventKind,
    sync::{RoomError, RoomHandle},
};

const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle the full lifecycle for an individual player WebSocket connection.
pub async fn handle_socket(room: RoomHandle, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(IDENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("websocket identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let hello = match serde_json::from_str::<ClientMessage>(&initial_message) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "failed to parse client message");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let Some(user_id) = hello.hello_user_id() else {
        warn!("first message was not hello");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    };

    let user_id = if user_id.is_empty() {
        let generated = format!("player-{:04x}", rand::rng().random::<u16>());
        info!(room = %room.id, user = %generated, "assigning generated user id");
        generated
    } else {
        user_id.to_owned()
    };

    // Subscribe before sending the welcome snapshot so no peer event can fall
    // between the snapshot and the first relayed message.
    let mut relay = room.subscribe_events();

    if send_message(
        &outbound_tx,
        &ServerMessage::Welcome {
            user_id: user_id.clone(),
            snapshot: room.snapshot(),
        },
    )
    .is_err()
    {
        finalize(writer_task, outbound_tx).await;
        return;
    }

    info!(room = %room.id, user = %user_id, "player connected");

    loop {
        tokio::select! {
            relayed = relay.recv() => {
                match relayed {
                    Ok(envelope) => {
                        // This connection's own events are answered with a
                        // snapshot on apply; only forward peer events.
                        if envelope.event.user_id == user_id {
                            continue;
                        }
                        if send_message(&outbound_tx, &ServerMessage::Event { envelope }).is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Resync with a full snapshot instead of replaying.
                        warn!(room = %room.id, user = %user_id, skipped, "relay lagged; resyncing");
                        let message = ServerMessage::Snapshot { snapshot: room.snapshot() };
                        if send_message(&outbound_tx, &message).is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            inbound = receiver.next() => {
                let Some(message) = inbound else { break };
                match message {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Event { envelope }) => {
                                if handle_event(&room, &user_id, envelope, &outbound_tx).await.is_err() {
                                    break;
                                }
                            }
                            Ok(ClientMessage::Hello { .. }) => {
                                warn!(user = %user_id, "ignoring duplicate hello message");
                            }
                            Ok(ClientMessage::Unknown) => {
                                warn!(user = %user_id, "ignoring unknown client message");
                            }
                            Err(err) => {
                                warn!(user = %user_id, error = %err, "failed to parse client message");
                            }
                        }
                    }
                    Ok(Message::Ping(payload)) => {
                        let _ = outbound_tx.send(Message::Pong(payload));
                    }
                    Ok(Message::Close(frame)) => {
                        let _ = outbound_tx.send(Message::Close(frame));
                        break;
                    }
                    Ok(Message::Binary(_)) => {}
                    Ok(Message::Pong(_)) => {}
                    Err(err) => {
                        warn!(user = %user_id, error = %err, "websocket error");
                        break;
                    }
                }
            }
        }
    }

    info!(room = %room.id, user = %user_id, "player disconnected");
    finalize(writer_task, outbound_tx).await;
}

/// Run one client event through the room and report the verdict back.
///
/// Returns `Err(())` only when the writer channel is gone and the connection
/// should be torn down.
async fn handle_event(
    room: &RoomHandle,
    user_id: &str,
    mut envelope: crate::sync::EventEnvelope,
    outbound_tx: &mpsc::UnboundedSender<Message>,
) -> Result<(), ()> {
    if envelope.event.user_id != user_id {
        warn!(
            user = %user_id,
            claimed = %envelope.event.user_id,
            "dropping event with mismatched originator"
        );
        return send_message(
            outbound_tx,
            &ServerMessage::Rejected {
                message: "event originator does not match the connection".into(),
            },
        );
    }

    if ensure_display_name(&mut envelope.event.kind) {
        info!(user = %user_id, "assigning generated display name");
    }

    match room.apply(envelope).await {
        Ok(()) => send_message(
            outbound_tx,
            &ServerMessage::Snapshot {
                snapshot: room.snapshot(),
            },
        ),
        Err(RoomError::Rejected(rejected)) => send_message(
            outbound_tx,
            &ServerMessage::Rejected {
                message: rejected.to_string(),
            },
        ),
        Err(RoomError::Closed) => Err(()),
    }
}

/// Serialize a payload and push it onto the writer channel.
///
/// Serialization failure is a permanent error (bug in code) and is logged
/// rather than tearing the connection down.
fn send_message(tx: &mpsc::UnboundedSender<Message>, value: &ServerMessage) -> Result<(), ()> {
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize server message");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into())).map_err(|_| ())
}

/// Substitute a generated `Player-XXXX` name when a join carries a blank one.
///
/// The substitution happens before the event is applied and relayed, so every
/// replica sees the same name.
fn ensure_display_name(kind: &mut EventKind) -> bool {
    match kind {
        EventKind::Join { name } if name.trim().is_empty() => {
            *name = format!("Player-{:04X}", rand::rng().random::<u16>());
            true
        }
        _ => false,
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
