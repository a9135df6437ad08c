//! Background refresh scheduler.
//!
//! Runs one refresh cycle at startup, then one per interval until shutdown.
//! Extra cycles can be requested through a [`SchedulerHandle`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::RefreshReport;
use crate::config::DEFAULT_REFRESH_INTERVAL;
use crate::signals::ShutdownSignal;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between periodic cycles.
    pub refresh_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl SchedulerConfig {
    pub fn new(refresh_interval: Duration) -> Self {
        Self { refresh_interval }
    }
}

/// Commands accepted by a running scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Run one extra cycle now.
    RefreshNow,
    /// Leave the loop.
    Stop,
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Startup,
    Periodic,
    Manual,
}

impl Trigger {
    fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Periodic => "periodic",
            Self::Manual => "manual",
        }
    }
}

/// Scheduler bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerState {
    /// Cycles that ran to completion.
    pub cycles_completed: u64,
    pub last_cycle_started: Option<DateTime<Utc>>,
    pub last_cycle_finished: Option<DateTime<Utc>>,
}

/// Shared scheduler state.
pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

/// Drives periodic refresh cycles.
pub struct Scheduler {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: SharedSchedulerState::default(),
            command_tx,
            command_rx,
        }
    }

    /// Returns a handle for sending commands to the scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Runs the startup cycle. Call before accepting traffic.
    pub async fn startup<F, Fut>(&self, refresh: &F) -> RefreshReport
    where
        F: Fn() -> Fut,
        Fut: Future<Output = RefreshReport>,
    {
        self.cycle(refresh, Trigger::Startup).await
    }

    /// Runs the periodic loop until shutdown or [`SchedulerCommand::Stop`].
    ///
    /// The first periodic cycle fires one interval after this is called. A
    /// cycle still in flight when shutdown arrives is dropped; the cache is
    /// only written after each venue's fetch completes, so nothing partial
    /// is left behind.
    pub async fn run<F, Fut>(mut self, refresh: F, shutdown: ShutdownSignal)
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = RefreshReport> + Send,
    {
        let period = self.config.refresh_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let shutdown = shutdown.wait();
        tokio::pin!(shutdown);

        info!(interval_secs = period.as_secs(), "scheduler started");

        loop {
            let trigger = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                cmd = self.command_rx.recv() => match cmd {
                    Some(SchedulerCommand::RefreshNow) => Trigger::Manual,
                    Some(SchedulerCommand::Stop) | None => break,
                },
                _ = ticker.tick() => Trigger::Periodic,
            };

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(trigger = trigger.as_str(), "abandoning in-flight refresh");
                    break;
                }
                _ = self.cycle(&refresh, trigger) => {}
            }
        }

        info!("scheduler stopped");
    }

    async fn cycle<F, Fut>(&self, refresh: &F, trigger: Trigger) -> RefreshReport
    where
        F: Fn() -> Fut,
        Fut: Future<Output = RefreshReport>,
    {
        let started = Utc::now();
        self.state.write().await.last_cycle_started = Some(started);
        debug!(trigger = trigger.as_str(), "refresh cycle starting");

        let report = refresh().await;

        let finished = Utc::now();
        {
            let mut state = self.state.write().await;
            state.cycles_completed += 1;
            state.last_cycle_finished = Some(finished);
        }

        info!(
            trigger = trigger.as_str(),
            venues = report.venues.len(),
            booked = report.total_booked(),
            through = %report.window.to,
            elapsed_ms = (finished - started).num_milliseconds(),
            "refresh cycle finished"
        );
        report
    }
}

/// Handle for sending commands to a running scheduler.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
}

impl SchedulerHandle {
    /// Requests an extra cycle.
    pub async fn refresh_now(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::RefreshNow).await
    }

    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Stop).await
    }

    /// Returns a snapshot of the scheduler state.
    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::NaiveDate;

    use crate::cache::fetch_window;
    use crate::signals::SignalHandler;

    const HOUR: Duration = Duration::from_secs(3600);

    fn empty_report() -> RefreshReport {
        RefreshReport {
            window: fetch_window(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()),
            venues: Vec::new(),
        }
    }

    fn counting(count: Arc<AtomicU32>) -> impl Fn() -> std::future::Ready<RefreshReport> {
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(empty_report())
        }
    }

    #[test]
    fn default_interval_is_four_hours() {
        assert_eq!(SchedulerConfig::default().refresh_interval, 4 * HOUR);
    }

    #[tokio::test]
    async fn startup_runs_one_cycle() {
        let scheduler = Scheduler::new(SchedulerConfig::default());
        let count = Arc::new(AtomicU32::new(0));

        scheduler.startup(&counting(count.clone())).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        let state = scheduler.handle().state().await;
        assert_eq!(state.cycles_completed, 1);
        assert!(state.last_cycle_started.is_some());
        assert!(state.last_cycle_finished >= state.last_cycle_started);
    }

    #[tokio::test(start_paused = true)]
    async fn cycles_follow_the_interval() {
        let signals = SignalHandler::new();
        let scheduler = Scheduler::new(SchedulerConfig::new(4 * HOUR));
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting(count.clone()), signals.shutdown()));

        tokio::time::sleep(4 * HOUR - Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(4 * HOUR + Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(handle.state().await.cycles_completed, 2);

        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_now_runs_an_extra_cycle() {
        let signals = SignalHandler::new();
        let scheduler = Scheduler::new(SchedulerConfig::new(4 * HOUR));
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting(count.clone()), signals.shutdown()));

        handle.refresh_now().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        signals.trigger_shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_abandons_in_flight_cycle() {
        let signals = SignalHandler::new();
        let scheduler = Scheduler::new(SchedulerConfig::new(HOUR));
        let handle = scheduler.handle();
        let started = Arc::new(AtomicU32::new(0));

        let started_in_cycle = started.clone();
        let refresh = move || {
            started_in_cycle.fetch_add(1, Ordering::SeqCst);
            std::future::pending::<RefreshReport>()
        };
        let task = tokio::spawn(scheduler.run(refresh, signals.shutdown()));

        tokio::time::sleep(HOUR + Duration::from_secs(1)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);

        signals.trigger_shutdown();
        let joined = tokio::time::timeout(Duration::from_secs(5), task).await;
        assert!(joined.is_ok());

        let state = handle.state().await;
        assert_eq!(state.cycles_completed, 0);
        assert!(state.last_cycle_started.is_some());
        assert!(state.last_cycle_finished.is_none());
    }

    #[tokio::test]
    async fn stop_command_ends_the_loop() {
        let signals = SignalHandler::new();
        let scheduler = Scheduler::new(SchedulerConfig::new(HOUR));
        let count = Arc::new(AtomicU32::new(0));

        let handle = scheduler.handle();
        let task = tokio::spawn(scheduler.run(counting(count), signals.shutdown()));
        handle.stop().await.unwrap();

        let joined = tokio::time::timeout(Duration::from_secs(1), task).await;
        assert!(joined.is_ok());
    }
}
