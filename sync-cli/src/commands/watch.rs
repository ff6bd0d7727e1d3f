//! Follow a room live until Ctrl+C, or until the connection ends for good.

use anyhow::{bail, Context, Result};
use serde_json::json;
use std::sync::Arc;
use sync_client::{
    ConnectionConfig, ConnectionSession, MemoryStore, MockFactory, MockTransport, SessionHandlers,
    SocketIoFactory, TracingSink, TransportFactory,
};
use sync_core::RoomState;
use sync_types::RequestKind;
use tokio::sync::broadcast::error::RecvError;

use crate::config::ClientConfig;

/// Run the watch command.
pub async fn run(config: ClientConfig, mock: bool) -> Result<()> {
    let connection = config.connection()?;

    if mock {
        let factory = demo_factory(connection.room_id.as_str());
        let session = ConnectionSession::new(factory.clone());
        follow(session, connection, move || {
            if let Some(transport) = factory.last() {
                play_demo(&transport);
            }
        })
        .await
    } else {
        follow(
            ConnectionSession::new(SocketIoFactory::default()),
            connection,
            || {},
        )
        .await
    }
}

async fn follow<F: TransportFactory>(
    mut session: ConnectionSession<F>,
    connection: ConnectionConfig,
    after_start: impl FnOnce(),
) -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let mut changes = store.subscribe();
    let mut flashes = store.subscribe_flashes();

    let room_id = connection.room_id.clone();
    println!("Watching room {}. Press Ctrl+C to stop.", room_id);
    println!();

    let handlers = SessionHandlers {
        sink: Arc::new(TracingSink),
        store: store.clone(),
    };
    session
        .start(connection, handlers)
        .await
        .context("Failed to start session")?;
    after_start();

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl+C")?;
                break;
            }
            _ = session.finished() => {
                session.stop().await;
                bail!("Connection to room {} ended and will not be retried", room_id);
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = changes.borrow_and_update().clone();
                println!("{}", describe(&state));
            }
            flash = flashes.recv() => match flash {
                Ok(count) => println!("FLASH x{}", count),
                Err(RecvError::Lagged(missed)) => tracing::debug!("Missed {} flash signals", missed),
                Err(RecvError::Closed) => break,
            },
        }
    }

    println!();
    println!("Shutting down...");
    session.stop().await;
    println!("Done.");

    Ok(())
}

/// One-line summary of the merged room state.
pub fn describe(state: &RoomState) -> String {
    let mut parts = vec![format!(
        "room {}",
        state.room_name.as_deref().unwrap_or("(loading)")
    )];

    if state.room_blackout {
        parts.push("BLACKOUT".to_string());
    }
    if let Some(focus) = &state.room_focus {
        parts.push(format!("focus \"{}\"", focus));
    }

    match &state.playback.current_timer_id {
        None => parts.push("no timer".to_string()),
        Some(id) => {
            let name = if state.timer_is_current() {
                state.timer.name.as_str()
            } else {
                id.as_str()
            };
            let mode = if state.playback.is_running {
                "running"
            } else {
                "stopped"
            };
            parts.push(format!("timer {} [{}]", name, mode));
        }
    }

    if state.message.showing {
        parts.push(format!("message \"{}\"", state.message.text));
    }

    parts.join(" | ")
}

/// Scripted replies standing in for the service.
fn demo_factory(room_id: &str) -> MockFactory {
    let factory = MockFactory::new();
    factory.respond_ok(
        RequestKind::GetRoom,
        json!({ "_id": room_id, "name": "Demo room", "blackout": false, "focus_message": null }),
    );
    factory.respond_ok(
        RequestKind::GetStatus,
        json!({ "timer_id": "T1", "running": false, "start": null, "finish": null, "pause": null }),
    );
    factory.respond_ok(
        RequestKind::GetTimer,
        json!({
            "name": "Opening remarks",
            "speaker": "Host",
            "notes": "",
            "duration": 300_000,
            "wrap_up_yellow": 60_000,
            "wrap_up_red": 15_000,
        }),
    );
    factory
}

/// A few push events, as a presenter would trigger them.
fn play_demo(transport: &MockTransport) {
    transport.push_event(
        "playback_status",
        json!({ "timer_id": "T1", "running": true, "start": 0, "finish": 300_000, "pause": null }),
    );
    transport.push_event(
        "message",
        json!({ "showing": true, "text": "Welcome!", "color": "green", "bold": true, "uppercase": false }),
    );
    transport.push_event("flash", json!({ "count": 3 }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_client::TransportSignal;
    use sync_types::{MessageSnapshot, PlaybackSnapshot, TimerId, TimerSnapshot};

    #[test]
    fn describe_empty_state() {
        assert_eq!(describe(&RoomState::new()), "room (loading) | no timer");
    }

    #[test]
    fn describe_full_state() {
        let state = RoomState {
            room_name: Some("Main".into()),
            room_blackout: true,
            room_focus: Some("Speed up".into()),
            playback: PlaybackSnapshot {
                current_timer_id: Some(TimerId::new("T1")),
                is_running: true,
                ..PlaybackSnapshot::default()
            },
            timer: TimerSnapshot {
                timer_id: Some(TimerId::new("T1")),
                name: "Keynote".into(),
                ..TimerSnapshot::default()
            },
            message: MessageSnapshot {
                showing: true,
                text: "Hi".into(),
                ..MessageSnapshot::default()
            },
            ..RoomState::default()
        };

        assert_eq!(
            describe(&state),
            "room Main | BLACKOUT | focus \"Speed up\" | timer Keynote [running] | message \"Hi\""
        );
    }

    #[test]
    fn describe_uses_id_until_timer_details_match() {
        let state = RoomState {
            playback: PlaybackSnapshot {
                current_timer_id: Some(TimerId::new("T2")),
                ..PlaybackSnapshot::default()
            },
            timer: TimerSnapshot {
                timer_id: Some(TimerId::new("T1")),
                name: "Old".into(),
                ..TimerSnapshot::default()
            },
            ..RoomState::default()
        };

        assert!(describe(&state).contains("timer T2 [stopped]"));
    }

    #[tokio::test]
    async fn follow_fails_once_reconnection_gives_up() {
        let factory = MockFactory::new();
        factory.script_connect(vec![
            TransportSignal::ConnectError("unreachable".into()),
            TransportSignal::ReconnectFailed,
        ]);
        let connection =
            ConnectionConfig::from_api_url("https://api.example.io/", "r1", "key").unwrap();

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            follow(ConnectionSession::new(factory.clone()), connection, || {}),
        )
        .await
        .unwrap();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("will not be retried"), "got: {err}");
        assert_eq!(factory.last().unwrap().close_calls(), 1);
    }

    #[tokio::test]
    async fn demo_script_fills_the_store() {
        let factory = demo_factory("r1");
        let store = Arc::new(MemoryStore::new());
        let mut session = ConnectionSession::new(factory.clone());
        let connection =
            ConnectionConfig::from_api_url("https://api.example.io/", "r1", "key").unwrap();

        session
            .start(
                connection,
                SessionHandlers {
                    sink: Arc::new(TracingSink),
                    store: store.clone(),
                },
            )
            .await
            .unwrap();
        play_demo(&factory.last().unwrap());

        let mut changes = store.subscribe();
        let state = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            changes.wait_for(|s| {
                s.message.showing
                    && s.last_flash.is_some()
                    && s.timer.name == "Opening remarks"
                    && s.room_name.is_some()
            }),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();

        assert!(state.playback.is_running);
        assert_eq!(state.last_flash, Some(3));
        assert_eq!(state.room_id.as_ref().map(|id| id.as_str()), Some("r1"));
        session.stop().await;
    }
}
