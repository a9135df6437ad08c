//! Service lifecycle: startup refresh, background scheduler, HTTP listener.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};
use weekender_providers::CalendarProvider;

use crate::api::{AppState, router};
use crate::cache::{RefreshReport, VenueCache, system_today};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::scheduler::{Scheduler, SchedulerConfig};
use crate::signals::SignalHandler;

/// How long the scheduler gets to wind down after the listener stops.
const SCHEDULER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the refresh function driven by the scheduler.
fn refresher(
    cache: Arc<VenueCache>,
    provider: Arc<dyn CalendarProvider>,
) -> impl Fn() -> Pin<Box<dyn Future<Output = RefreshReport> + Send>> + Send + Sync {
    move || {
        let cache = cache.clone();
        let provider = provider.clone();
        Box::pin(async move { cache.refresh_all(provider.as_ref(), system_today()).await })
    }
}

/// Runs the service until SIGTERM or SIGINT.
///
/// The address is bound first, then every venue is refreshed once before the
/// listener accepts connections.
pub async fn run(config: ServerConfig, provider: Arc<dyn CalendarProvider>) -> ServerResult<()> {
    config.validate()?;

    // Nothing is spawned until the address is ours
    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|e| ServerError::bind(config.bind, e))?;

    let signals = SignalHandler::new();
    signals.spawn_listener()?;

    let cache = Arc::new(VenueCache::new(config.venues.clone()));
    let refresh = refresher(cache.clone(), provider.clone());

    let scheduler = Scheduler::new(SchedulerConfig::new(config.refresh_interval));
    let handle = scheduler.handle();

    info!(
        venues = cache.venues().len(),
        provider = provider.name(),
        "running startup refresh"
    );
    scheduler.startup(&refresh).await;

    let scheduler_task = tokio::spawn(scheduler.run(refresh, signals.shutdown()));

    // SIGHUP asks the scheduler for an extra cycle
    let mut reload = signals.reload();
    let reload_handle = handle.clone();
    let reload_task = tokio::spawn(async move {
        while reload.recv().await {
            if reload_handle.refresh_now().await.is_err() {
                break;
            }
        }
    });

    info!(addr = %config.bind, "listening");
    let app = router(AppState::new(cache, &config.static_dir));
    axum::serve(listener, app)
        .with_graceful_shutdown(signals.shutdown().wait())
        .await?;

    info!("listener closed, stopping scheduler");
    let _ = handle.stop().await;
    reload_task.abort();
    if tokio::time::timeout(SCHEDULER_STOP_TIMEOUT, scheduler_task)
        .await
        .is_err()
    {
        warn!("scheduler did not stop in time");
    }

    Ok(())
}
