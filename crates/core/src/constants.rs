use chrono::NaiveDate;

/// First day fetched when a job carries no start date
pub const DEFAULT_HISTORY_START: (i32, u32, u32) = (2015, 1, 1);

/// Daily fire time of the scheduler
pub const DEFAULT_FETCH_HOUR: u32 = 1;
pub const DEFAULT_FETCH_MINUTE: u32 = 0;

/// Window served by price reads that do not name one
pub const DEFAULT_READ_WINDOW_DAYS: i64 = 180;

pub fn default_history_start() -> NaiveDate {
    let (y, m, d) = DEFAULT_HISTORY_START;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}
