use anyhow::Result;
use hostmon::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let settings_repo = Arc::new(
        settings_repo::SettingsRepo::connect(
            &app_config.settings.path,
            app_config.settings.max_pool_size,
        )
        .await?,
    );
    settings_repo.init().await?;

    let defaults = models::DisplaySettings::defaults(app_config.monitoring.update_interval_ms);
    let display = match settings_repo.load_display().await {
        Ok(Some(saved)) => saved,
        Ok(None) => defaults,
        Err(e) => {
            tracing::warn!(error = %e, "saved display settings unreadable; using defaults");
            defaults
        }
    };

    let coordinator = coordinator::Coordinator::new(
        Arc::new(sysinfo_repo::SysinfoSource::new()),
        coordinator::CoordinatorConfig {
            update_interval_ms: display.update_interval,
            warm_start: app_config.monitoring.warm_start,
            matcher: metrics::ProcessMatcher::new(&app_config.monitoring.process_markers),
            visibility: display.visibility,
            ..Default::default()
        },
    );
    let panel = Arc::new(sinks::PanelSlot::new(
        coordinator.clone(),
        app_config.panel.channel_capacity,
    ));

    let stats_handle = tokio::spawn(log_stats(
        coordinator.clone(),
        app_config.monitoring.stats_log_interval_secs,
    ));

    let app = routes::app(coordinator.clone(), panel, settings_repo, &app_config);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
        }
    }

    stats_handle.abort();
    coordinator.shutdown();
    Ok(())
}

/// Logs coordinator counters at INFO every `interval_secs`.
async fn log_stats(coordinator: coordinator::Coordinator, interval_secs: u64) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval.tick().await;
    loop {
        interval.tick().await;
        let status = coordinator.status();
        tracing::info!(
            registrations = status.registrations,
            active = status.active,
            timer_running = status.timer_running,
            samples = status.samples_total,
            sample_failures = status.sample_failures_total,
            skipped_ticks = status.skipped_ticks_total,
            "app stats"
        );
    }
}
