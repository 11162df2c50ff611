use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::schedule::ScheduleZone;
use crate::constants::{DEFAULT_FETCH_HOUR, DEFAULT_FETCH_MINUTE};
use crate::jobs::{FetchRequest, JobId, JobQueue};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Trimmed, non-empty, first occurrence wins
    pub symbols: Vec<String>,
    pub at: NaiveTime,
    pub zone: ScheduleZone,
}

impl ScheduleConfig {
    pub fn new<I, S>(symbols: I, at: NaiveTime) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for symbol in symbols {
            let symbol = symbol.as_ref().trim();
            if !symbol.is_empty() && !unique.iter().any(|s| s == symbol) {
                unique.push(symbol.to_string());
            }
        }
        Self {
            symbols: unique,
            at,
            zone: ScheduleZone::Local,
        }
    }

    /// Parses a comma separated list such as `"AAPL, MSFT,,BTC-USD"`.
    pub fn from_list(list: &str, at: NaiveTime) -> Self {
        Self::new(list.split(','), at)
    }

    pub fn with_zone(mut self, zone: ScheduleZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn default_time() -> NaiveTime {
        NaiveTime::from_hms_opt(DEFAULT_FETCH_HOUR, DEFAULT_FETCH_MINUTE, 0).unwrap_or(NaiveTime::MIN)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Result of one scheduling run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRunSummary {
    pub enqueued: Vec<(String, JobId)>,
    /// Symbol and the enqueue error
    pub failed: Vec<(String, String)>,
}

struct Timer {
    handle: JoinHandle<()>,
    stop: watch::Sender<bool>,
}

pub struct Scheduler {
    config: ScheduleConfig,
    queue: Arc<dyn JobQueue>,
    timer: Mutex<Option<Timer>>,
}

impl Scheduler {
    pub fn new(config: ScheduleConfig, queue: Arc<dyn JobQueue>) -> Self {
        Self {
            config,
            queue,
            timer: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn state(&self) -> SchedulerState {
        match self.timer.lock() {
            Ok(timer) if timer.is_some() => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    /// Enqueues one job per configured symbol, now.
    pub async fn run_once(&self) -> ScheduleRunSummary {
        enqueue_all(self.queue.as_ref(), &self.config.symbols).await
    }

    /// Arms the daily timer. Must be called from within a Tokio runtime.
    ///
    /// With no symbols configured the scheduler stays stopped. Calling this
    /// while already running changes nothing.
    pub fn start(&self) -> SchedulerState {
        if self.config.symbols.is_empty() {
            info!("Scheduler not started: no symbols configured");
            return SchedulerState::Stopped;
        }
        let Ok(mut timer) = self.timer.lock() else {
            error!("Scheduler state lock poisoned; not starting");
            return SchedulerState::Stopped;
        };
        if timer.is_some() {
            return SchedulerState::Running;
        }

        let (stop, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(timer_loop(
            self.config.clone(),
            Arc::clone(&self.queue),
            stop_rx,
        ));
        *timer = Some(Timer { handle, stop });
        info!(
            "Scheduler started: {} symbol(s) daily at {}",
            self.config.symbols.len(),
            self.config.at.format("%H:%M")
        );
        SchedulerState::Running
    }

    /// Cancels the timer and waits for a run in progress to finish.
    pub async fn shutdown(&self) -> SchedulerState {
        let timer = match self.timer.lock() {
            Ok(mut timer) => timer.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(Timer { handle, stop }) = timer {
            let _ = stop.send(true);
            if let Err(e) = handle.await {
                warn!("Scheduler timer ended abnormally: {}", e);
            }
            info!("Scheduler stopped");
        }
        SchedulerState::Stopped
    }
}

async fn enqueue_all(queue: &dyn JobQueue, symbols: &[String]) -> ScheduleRunSummary {
    let mut summary = ScheduleRunSummary::default();
    for symbol in symbols {
        match queue.enqueue(FetchRequest::for_symbol(symbol.clone())).await {
            Ok(id) => {
                info!("Enqueued fetch job {} for {}", id, symbol);
                summary.enqueued.push((symbol.clone(), id));
            }
            Err(e) => {
                error!("Failed to enqueue fetch job for {}: {}", symbol, e);
                summary.failed.push((symbol.clone(), e.to_string()));
            }
        }
    }
    summary
}

async fn timer_loop(
    config: ScheduleConfig,
    queue: Arc<dyn JobQueue>,
    mut stop: watch::Receiver<bool>,
) {
    let mut last_fire: Option<DateTime<Utc>> = None;
    loop {
        let now = Utc::now();
        // Never compute from before the previous fire, so a clock that lags
        // the timer cannot fire the same slot twice.
        let from = last_fire.map_or(now, |last| last.max(now));
        let next = config.zone.next_fire_after(from, config.at);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        info!("Next scheduled fetch at {}", next.to_rfc3339());

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                let summary = enqueue_all(queue.as_ref(), &config.symbols).await;
                info!(
                    "Scheduled run enqueued {} job(s), {} failure(s)",
                    summary.enqueued.len(),
                    summary.failed.len()
                );
                last_fire = Some(next);
            }
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
        }
    }
}
