//! Daily enqueue scheduler.
//!
//! Once a day at a fixed local time the scheduler submits one fetch job per
//! configured symbol. It owns nothing but a timer task; all work goes through
//! the [`JobQueue`](crate::jobs::JobQueue).

pub mod guard;
pub mod schedule;
pub mod service;

pub use guard::SchedulerGuard;
pub use schedule::{next_fire_after, ScheduleZone};
pub use service::{ScheduleConfig, ScheduleRunSummary, Scheduler, SchedulerState};
