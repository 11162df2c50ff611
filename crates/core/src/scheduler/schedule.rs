//! Fire time computation.

use std::str::FromStr;

use chrono::{DateTime, Duration, Local, LocalResult, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::errors::{Error, Result};

/// Zone the daily fire time is interpreted in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScheduleZone {
    /// The process's local time zone
    #[default]
    Local,
    Named(Tz),
}

impl ScheduleZone {
    /// Next fire instant strictly after `now`.
    pub fn next_fire_after(&self, now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
        match self {
            ScheduleZone::Local => next_fire_after(&now.with_timezone(&Local), at).with_timezone(&Utc),
            ScheduleZone::Named(tz) => next_fire_after(&now.with_timezone(tz), at).with_timezone(&Utc),
        }
    }
}

impl FromStr for ScheduleZone {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("local") {
            return Ok(ScheduleZone::Local);
        }
        value
            .parse::<Tz>()
            .map(ScheduleZone::Named)
            .map_err(|e| Error::InvalidConfigValue(format!("time zone '{}': {}", value, e)))
    }
}

/// First instant after `now` whose wall-clock time in `now`'s zone is `at`.
///
/// A wall-clock time skipped by a DST jump fires one hour later. A time that
/// occurs twice fires on its first occurrence only.
pub fn next_fire_after<Z: TimeZone>(now: &DateTime<Z>, at: NaiveTime) -> DateTime<Z> {
    let tz = now.timezone();
    let mut date = now.date_naive();
    for _ in 0..3 {
        let local = date.and_time(at);
        let candidate = match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => Some(dt),
            LocalResult::Ambiguous(earliest, _) => Some(earliest),
            LocalResult::None => tz.from_local_datetime(&(local + Duration::hours(1))).earliest(),
        };
        if let Some(dt) = candidate {
            if dt > *now {
                return dt;
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    now.clone() + Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_fires_later_today() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 30, 0).unwrap();
        assert_eq!(
            next_fire_after(&now, at(1, 0)),
            Utc.with_ymd_and_hms(2024, 3, 1, 1, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_fires_tomorrow_once_passed() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 1, 0, 0).unwrap();
        assert_eq!(
            next_fire_after(&now, at(1, 0)),
            Utc.with_ymd_and_hms(2024, 3, 2, 1, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_skipped_time_rolls_forward() {
        // 2024-03-10 02:30 does not exist in New York
        let now = New_York.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let fire = next_fire_after(&now, at(2, 30));
        assert_eq!(
            fire.naive_local(),
            chrono::NaiveDate::from_ymd_opt(2024, 3, 10)
                .unwrap()
                .and_time(at(3, 30))
        );
    }

    #[test]
    fn test_repeated_time_fires_once() {
        // 2024-11-03 01:30 happens twice in New York
        let first = New_York.with_ymd_and_hms(2024, 11, 3, 0, 0, 0).unwrap();
        let fire = next_fire_after(&first, at(1, 30));
        assert_eq!(fire.with_timezone(&Utc), Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap());

        let again = next_fire_after(&fire, at(1, 30));
        assert_eq!(again.with_timezone(&Utc), Utc.with_ymd_and_hms(2024, 11, 4, 6, 30, 0).unwrap());
    }

    #[test]
    fn test_named_zone_converts_to_utc() {
        let zone: ScheduleZone = "America/New_York".parse().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        assert_eq!(
            zone.next_fire_after(now, at(1, 0)),
            Utc.with_ymd_and_hms(2024, 7, 2, 5, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_zone_parsing() {
        assert_eq!("local".parse::<ScheduleZone>().unwrap(), ScheduleZone::Local);
        assert_eq!("".parse::<ScheduleZone>().unwrap(), ScheduleZone::Local);
        assert!("Mars/Olympus".parse::<ScheduleZone>().is_err());
    }
}
