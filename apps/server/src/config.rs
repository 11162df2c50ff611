use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};
use chrono::NaiveTime;
use quoteflow_core::jobs::WorkerConfig;
use quoteflow_core::scheduler::{ScheduleConfig, ScheduleZone};

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    /// Queue broker database; the price store file unless set
    pub queue_db_path: String,
    pub symbols: Vec<String>,
    pub fetch_time: NaiveTime,
    pub timezone: ScheduleZone,
    /// Run a worker pool inside the server process
    pub embedded_workers: bool,
    pub worker_concurrency: usize,
    pub job_timeout: Duration,
    pub provider_timeout: Duration,
    pub queue_visibility: Duration,
    pub max_attempts: u32,
    pub poll_interval: Duration,
    pub yahoo_base_url: Option<String>,
    pub request_timeout: Duration,
    pub cors_allow: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let listen_addr: SocketAddr =
            parse_or(&var, "QF_LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?;
        let db_path = var("QF_DB_PATH")
            .or_else(|| var("DATABASE_URL"))
            .unwrap_or_else(|| "./db/quoteflow.db".into());
        let queue_db_path = var("QF_QUEUE_DB_PATH").unwrap_or_else(|| db_path.clone());

        let symbols = ScheduleConfig::from_list(&var("QF_SYMBOLS").unwrap_or_default(), NaiveTime::MIN)
            .symbols;
        let fetch_time = match var("QF_FETCH_TIME") {
            Some(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                .with_context(|| format!("Invalid QF_FETCH_TIME '{}', expected HH:MM", raw))?,
            None => ScheduleConfig::default_time(),
        };
        let timezone = match var("QF_TIMEZONE") {
            Some(raw) => ScheduleZone::from_str(&raw).context("Invalid QF_TIMEZONE")?,
            None => ScheduleZone::Local,
        };

        let embedded_workers = match var("QF_EMBEDDED_WORKERS") {
            Some(raw) => parse_flag(&raw)
                .ok_or_else(|| anyhow!("Invalid QF_EMBEDDED_WORKERS '{}'", raw))?,
            None => true,
        };
        let defaults = WorkerConfig::default();
        let worker_concurrency = parse_or(&var, "QF_WORKER_CONCURRENCY", defaults.concurrency)?;
        let job_timeout = Duration::from_secs(parse_or(
            &var,
            "QF_JOB_TIMEOUT_SECS",
            defaults.job_timeout.as_secs(),
        )?);
        let provider_timeout =
            Duration::from_secs(parse_or(&var, "QF_PROVIDER_TIMEOUT_SECS", 30u64)?);
        let queue_visibility =
            Duration::from_secs(parse_or(&var, "QF_QUEUE_VISIBILITY_SECS", 600u64)?);
        let max_attempts = parse_or(&var, "QF_MAX_ATTEMPTS", defaults.max_attempts)?;
        let poll_interval = Duration::from_millis(parse_or(
            &var,
            "QF_POLL_INTERVAL_MS",
            defaults.poll_interval.as_millis() as u64,
        )?);

        let yahoo_base_url = var("QF_YAHOO_BASE_URL");
        let request_timeout =
            Duration::from_millis(parse_or(&var, "QF_REQUEST_TIMEOUT_MS", 60_000u64)?);
        let cors_allow = var("QF_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if worker_concurrency == 0 {
            return Err(anyhow!("QF_WORKER_CONCURRENCY must be at least 1"));
        }
        if max_attempts == 0 {
            return Err(anyhow!("QF_MAX_ATTEMPTS must be at least 1"));
        }

        Ok(Self {
            listen_addr,
            db_path,
            queue_db_path,
            symbols,
            fetch_time,
            timezone,
            embedded_workers,
            worker_concurrency,
            job_timeout,
            provider_timeout,
            queue_visibility,
            max_attempts,
            poll_interval,
            yahoo_base_url,
            request_timeout,
            cors_allow,
        })
    }

    pub fn schedule(&self) -> ScheduleConfig {
        ScheduleConfig::new(&self.symbols, self.fetch_time).with_zone(self.timezone)
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            concurrency: self.worker_concurrency,
            poll_interval: self.poll_interval,
            job_timeout: self.job_timeout,
            max_attempts: self.max_attempts,
            ..WorkerConfig::default()
        }
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {} '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
