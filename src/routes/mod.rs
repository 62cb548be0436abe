// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::coordinator::{Coordinator, RegistrationId};
use crate::models::DisplaySettings;
use crate::settings_repo::SettingsRepo;
use crate::sinks::PanelSlot;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) coordinator: Coordinator,
    pub(crate) panel: Arc<PanelSlot>,
    pub(crate) settings_repo: Arc<SettingsRepo>,
    pub(crate) default_settings: DisplaySettings,
}

impl AppState {
    /// Saved settings, falling back to config defaults.
    pub(crate) async fn current_settings(&self) -> DisplaySettings {
        match self.settings_repo.load_display().await {
            Ok(Some(settings)) => settings,
            Ok(None) => self.default_settings,
            Err(e) => {
                tracing::warn!(error = %e, operation = "load_display", "settings load failed; using defaults");
                self.default_settings
            }
        }
    }

    /// Mirrors an indicator set's pause state into the settings store.
    /// The panel's own pause is not mirrored.
    pub(crate) async fn mirror_status_bar(&self, id: RegistrationId, paused: bool) {
        if self.panel.bound() == Some(id) {
            return;
        }
        if let Err(e) = self.settings_repo.save_status_bar_enabled(!paused).await {
            tracing::warn!(error = %e, operation = "save_status_bar_enabled", "settings write failed");
        }
    }
}

pub fn app(
    coordinator: Coordinator,
    panel: Arc<PanelSlot>,
    settings_repo: Arc<SettingsRepo>,
    config: &AppConfig,
) -> Router {
    let state = AppState {
        coordinator,
        panel,
        settings_repo,
        default_settings: DisplaySettings::defaults(config.monitoring.update_interval_ms),
    };
    Router::new()
        .route("/", get(|| async { "hostmon: shared system sampler" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/status", get(http::status_handler)) // GET /api/status
        .route("/api/refresh", post(http::refresh_handler)) // POST /api/refresh
        .route(
            "/api/registrations/{id}/toggle-pause",
            post(http::toggle_pause_handler),
        ) // POST /api/registrations/{id}/toggle-pause
        .route("/ws/indicators", get(ws::ws_indicators)) // WS /ws/indicators
        .route("/ws/panel", get(ws::ws_panel)) // WS /ws/panel
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
