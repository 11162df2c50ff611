//! Single-timer guard.
//!
//! An auto-reloading supervisor runs the server twice: a watcher parent and
//! the child that serves. Only the child marked as main may arm the timer.

pub const ENV_SCHEDULER_ENABLED: &str = "QF_SCHEDULER_ENABLED";
pub const ENV_RELOADER: &str = "QF_RELOADER";
pub const ENV_RUN_MAIN: &str = "QF_RUN_MAIN";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerGuard {
    pub enabled: bool,
    pub under_reloader: bool,
    pub is_main: bool,
}

impl Default for SchedulerGuard {
    fn default() -> Self {
        Self {
            enabled: true,
            under_reloader: false,
            is_main: false,
        }
    }
}

impl SchedulerGuard {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| lookup(key).map(|v| is_truthy(&v));
        Self {
            enabled: flag(ENV_SCHEDULER_ENABLED).unwrap_or(true),
            under_reloader: flag(ENV_RELOADER).unwrap_or(false),
            is_main: flag(ENV_RUN_MAIN).unwrap_or(false),
        }
    }

    pub fn should_start(&self) -> bool {
        self.enabled && (!self.under_reloader || self.is_main)
    }

    /// Why the timer is not armed, for the startup log.
    pub fn reason(&self) -> &'static str {
        if !self.enabled {
            "disabled by configuration"
        } else if self.under_reloader && !self.is_main {
            "reloader parent process"
        } else {
            "enabled"
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
