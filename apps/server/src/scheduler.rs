//! Daily price scheduler wiring for the server process.

use tracing::info;

use crate::main_lib::AppState;
use quoteflow_core::scheduler::{SchedulerGuard, SchedulerState};

/// Arms the daily timer unless the guard says this process must not.
pub fn start_price_scheduler(state: &AppState, guard: SchedulerGuard) -> SchedulerState {
    if !guard.should_start() {
        info!("Price scheduler not started: {}", guard.reason());
        return SchedulerState::Stopped;
    }
    state.scheduler.start()
}
