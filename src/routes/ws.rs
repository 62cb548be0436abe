// WebSocket handlers: indicator sets and the panel

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use tokio::time::{Duration, Instant, interval_at, timeout};

use super::AppState;
use crate::coordinator::{Coordinator, RegistrationId};
use crate::models::{IndicatorCommand, PanelMessage, PanelRequest};
use crate::sinks::{IndicatorSet, PanelSlot};

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Unregisters the indicator set when its connection ends (however it ends).
struct RegistrationGuard {
    coordinator: Coordinator,
    id: RegistrationId,
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.coordinator.unregister(self.id);
    }
}

/// Releases the panel binding on drop unless another panel already replaced it.
struct PanelGuard {
    panel: Arc<PanelSlot>,
    id: RegistrationId,
}

impl Drop for PanelGuard {
    fn drop(&mut self) {
        self.panel.release(self.id);
    }
}

/// Sends one text frame; false when the client is gone or too slow.
async fn send_text(socket: &mut WebSocket, text: String) -> bool {
    let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(text.into()))).await;
    matches!(r, Ok(Ok(())))
}

/// First ping one period after connect.
fn new_ping_interval() -> tokio::time::Interval {
    let mut interval = interval_at(Instant::now() + WS_PING_INTERVAL, WS_PING_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval
}

async fn send_ping(socket: &mut WebSocket) -> bool {
    let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
    matches!(r, Ok(Ok(())))
}

pub(super) async fn ws_indicators(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = stream_indicators(socket, state).await {
            tracing::info!("Indicator stream error: {}", e);
        }
    })
}

async fn stream_indicators(mut socket: WebSocket, state: AppState) -> anyhow::Result<()> {
    let (sink, mut frames) = IndicatorSet::new();
    let id = state.coordinator.register(sink);
    let _guard = RegistrationGuard {
        coordinator: state.coordinator.clone(),
        id,
    };
    tracing::info!(registration = %id, "Client connected to indicator stream");

    // Indicators stay paused across reconnects while the mirrored flag says so.
    match state.settings_repo.load_status_bar_enabled().await {
        Ok(true) => {}
        Ok(false) => state.coordinator.set_paused(id, true),
        Err(e) => {
            tracing::warn!(error = %e, operation = "load_status_bar_enabled", "settings load failed")
        }
    }

    let welcome = serde_json::to_string(&serde_json::json!({ "type": "registered", "id": id }))?;
    if !send_text(&mut socket, welcome).await {
        return Ok(());
    }
    let initial = serde_json::to_string(&*frames.borrow_and_update())?;
    if !send_text(&mut socket, initial).await {
        return Ok(());
    }

    let mut ping_interval = new_ping_interval();
    loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let (json, disposed) = {
                    let frame = frames.borrow_and_update();
                    (serde_json::to_string(&*frame)?, frame.disposed)
                };
                if !send_text(&mut socket, json).await || disposed {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_indicator_command(&state, id, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = ping_interval.tick() => {
                if !send_ping(&mut socket).await {
                    break;
                }
            }
        }
    }
    tracing::info!(registration = %id, "Client disconnected from indicator stream");
    Ok(())
}

async fn handle_indicator_command(state: &AppState, id: RegistrationId, text: &str) {
    let command: IndicatorCommand = match serde_json::from_str(text) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, registration = %id, "ignoring unknown indicator message");
            return;
        }
    };
    match command {
        IndicatorCommand::TogglePause => {
            if let Some(paused) = state.coordinator.toggle_paused(id) {
                state.mirror_status_bar(id, paused).await;
            }
        }
        IndicatorCommand::Refresh => {
            state.coordinator.refresh_now();
        }
        IndicatorCommand::FocusPanel => {
            if !state.panel.focus() {
                tracing::debug!(registration = %id, "focus requested but no panel is bound");
            }
        }
    }
}

pub(super) async fn ws_panel(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = stream_panel(socket, state).await {
            tracing::info!("Panel stream error: {}", e);
        }
    })
}

async fn stream_panel(mut socket: WebSocket, state: AppState) -> anyhow::Result<()> {
    let (id, _binding, mut outbound) = state.panel.bind();
    let _guard = PanelGuard {
        panel: state.panel.clone(),
        id,
    };
    tracing::info!(registration = %id, "Client connected to panel stream");

    let settings = state.current_settings().await;
    for message in [
        PanelMessage::CurrentSettings { settings },
        PanelMessage::UpdateMonitoringState {
            enabled: true,
            is_paused: false,
        },
    ] {
        if !send_text(&mut socket, serde_json::to_string(&message)?).await {
            return Ok(());
        }
    }

    let mut ping_interval = new_ping_interval();
    loop {
        tokio::select! {
            message = outbound.recv() => {
                // None: binding disposed (replaced by a newer panel or shutdown)
                let Some(message) = message else {
                    break;
                };
                if !send_text(&mut socket, serde_json::to_string(&message)?).await {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_panel_request(&state, id, text.as_str()).await
                            && !send_text(&mut socket, serde_json::to_string(&reply)?).await
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = ping_interval.tick() => {
                if !send_ping(&mut socket).await {
                    break;
                }
            }
        }
    }
    tracing::info!(registration = %id, "Client disconnected from panel stream");
    Ok(())
}

/// Handles one panel request; returns the direct reply, if any.
async fn handle_panel_request(
    state: &AppState,
    id: RegistrationId,
    text: &str,
) -> Option<PanelMessage> {
    let request: PanelRequest = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = %e, registration = %id, "ignoring unknown panel message");
            return None;
        }
    };
    match request {
        PanelRequest::ToggleMonitoring => {
            // The binding reports the new state itself (updateMonitoringState).
            state.coordinator.toggle_paused(id);
            None
        }
        PanelRequest::GetCurrentSettings => Some(PanelMessage::CurrentSettings {
            settings: state.current_settings().await,
        }),
        PanelRequest::SaveSettings { settings } => {
            match state.settings_repo.save_display(&settings).await {
                Ok(()) => {
                    state.coordinator.apply_settings(&settings);
                    tracing::info!(
                        update_interval_ms = settings.update_interval,
                        "display settings saved"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, operation = "save_display", "settings rejected");
                }
            }
            Some(PanelMessage::CurrentSettings {
                settings: state.current_settings().await,
            })
        }
        PanelRequest::RestoreDefaults => {
            if let Err(e) = state.settings_repo.reset_display().await {
                tracing::warn!(error = %e, operation = "reset_display", "settings reset failed");
            }
            let defaults = state.default_settings;
            state.coordinator.apply_settings(&defaults);
            tracing::info!("display settings restored to defaults");
            Some(PanelMessage::CurrentSettings { settings: defaults })
        }
    }
}
