use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use chrono::SecondsFormat;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use veil_db::Database;
use veil_db::models::MessageRow;
use veil_session::SessionUser;
use veil_types::events::{ClientEvent, ServerEvent};

use crate::registry::GroupRegistry;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Drive one authenticated WebSocket connection until it closes.
///
/// The session cookie was already verified at the HTTP upgrade, so the
/// socket arrives with its identity bound; it keeps that identity for its
/// whole lifetime (there is no mid-connection re-authentication). On exit
/// the connection is removed from every group broadcast set.
pub async fn handle_socket(
    socket: WebSocket,
    registry: GroupRegistry,
    db: Arc<Database>,
    user: SessionUser,
) {
    let (mut sender, mut receiver) = socket.split();

    let conn_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    info!("{} ({}) connected to gateway", user.name, user.id);

    // Shared flag for heartbeat
    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward queued events -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = rx.recv() => {
                    let Some(event) = result else { break };
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("failed to encode gateway event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!(
                                "heartbeat timeout (missed {} pongs), dropping connection",
                                missed_heartbeats
                            );
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read events from the client, strictly in arrival order
    let registry_recv = registry.clone();
    let conn_user = user.clone();
    let event_tx = tx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => {
                        handle_event(&registry_recv, &db, &conn_user, conn_id, &event_tx, event)
                            .await;
                    }
                    Err(e) => {
                        let preview: String = text.chars().take(200).collect();
                        warn!(
                            "{} ({}) bad event: {} -- raw: {}",
                            conn_user.name, conn_user.id, e, preview
                        );
                        let _ = event_tx.send(ServerEvent::Error {
                            message: "unrecognized event".into(),
                        });
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    registry.leave_all(conn_id).await;
    info!("{} ({}) disconnected from gateway", user.name, user.id);
}

async fn handle_event(
    registry: &GroupRegistry,
    db: &Arc<Database>,
    user: &SessionUser,
    conn_id: Uuid,
    tx: &mpsc::UnboundedSender<ServerEvent>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::JoinGroup { group_id } => {
            if group_id.is_empty() {
                let _ = tx.send(ServerEvent::Error {
                    message: "groupId is required".into(),
                });
                return;
            }

            registry.join(&group_id, conn_id, tx.clone()).await;
            let members = registry.member_count(&group_id).await;
            info!(
                "{} ({}) joined group {} ({} connected)",
                user.name, user.id, group_id, members
            );
        }

        ClientEvent::SendMessage {
            group_id,
            content,
            is_anonymous,
            timestamp,
        } => {
            if group_id.is_empty() {
                warn!("{} ({}) sent a message without a group", user.name, user.id);
                let _ = tx.send(ServerEvent::Error {
                    message: "groupId is required".into(),
                });
                return;
            }

            // Identity always comes from the connection, never the payload.
            let now = chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            let row = MessageRow {
                id: Uuid::new_v4().to_string(),
                group_id,
                sender_id: user.id.to_string(),
                sender_name: user.name.clone(),
                content,
                is_anonymous,
                timestamp: timestamp.unwrap_or_else(|| now.clone()),
                created_at: now,
            };

            // Durable write first; the broadcast below reuses exactly the
            // persisted payload rather than re-reading any shared state.
            let db = db.clone();
            let persisted = tokio::task::spawn_blocking(move || -> anyhow::Result<MessageRow> {
                db.insert_message(&row)?;
                Ok(row)
            })
            .await;

            let row = match persisted {
                Ok(Ok(row)) => row,
                Ok(Err(e)) => {
                    warn!("{} ({}) message persist failed: {}", user.name, user.id, e);
                    let _ = tx.send(ServerEvent::Error {
                        message: "message could not be delivered".into(),
                    });
                    return;
                }
                Err(e) => {
                    warn!("message persist task failed: {}", e);
                    let _ = tx.send(ServerEvent::Error {
                        message: "message could not be delivered".into(),
                    });
                    return;
                }
            };

            let delivered = registry
                .broadcast(
                    &row.group_id,
                    conn_id,
                    ServerEvent::ReceiveMessage {
                        group_id: row.group_id.clone(),
                        sender_id: user.id,
                        sender_name: row.sender_name.clone(),
                        content: row.content.clone(),
                        is_anonymous: row.is_anonymous,
                        timestamp: row.timestamp.clone(),
                    },
                )
                .await;
            debug!(
                "{} ({}) -> {}: relayed to {} members",
                user.name, user.id, row.group_id, delivered
            );
        }

        ClientEvent::UpdateAnonStatus { is_anonymous } => {
            // Acts on the connection's own user id only; the event carries
            // no target field, so a forged one is dropped at parse time.
            let db = db.clone();
            let user_id = user.id.to_string();
            let updated = tokio::task::spawn_blocking(move || {
                db.update_preferences(&user_id, None, Some(is_anonymous))
            })
            .await;

            match updated {
                Ok(Ok(Some(_))) => {
                    debug!(
                        "{} ({}) set anonymity to {}",
                        user.name, user.id, is_anonymous
                    );
                }
                Ok(Ok(None)) => {
                    warn!(
                        "{} ({}) anonymity update found no user row",
                        user.name, user.id
                    );
                }
                Ok(Err(e)) => {
                    warn!("{} ({}) anonymity update failed: {}", user.name, user.id, e);
                    let _ = tx.send(ServerEvent::Error {
                        message: "preference update failed".into(),
                    });
                }
                Err(e) => {
                    warn!("anonymity update task failed: {}", e);
                    let _ = tx.send(ServerEvent::Error {
                        message: "preference update failed".into(),
                    });
                }
            }
        }
    }
}
