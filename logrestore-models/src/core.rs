use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Display name of the log group every restore writes into.
pub const RESTORE_LOG_GROUP_NAME: &str = "Archive_Restore_Log_Grp";
pub const RESTORE_LOG_GROUP_DESCRIPTION: &str = "Log group for ingesting archived logs";
pub const DEFAULT_LOG_NAME: &str = "archive-restore-log";

/// Open interval of object creation times selected for a restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window for a requested `start`/`end` pair; the lower bound is `start`
    /// minus 24 hours.
    pub fn from_args(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start: start.and_utc() - Duration::hours(24),
            end: end.and_utc(),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start < instant && instant < self.end
    }
}

/// How far a bucket listing is followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingMode {
    /// One request of at most [`LIST_PAGE_LIMIT`] objects; anything beyond is not seen.
    #[default]
    SinglePage,
    AllPages,
}

pub const LIST_PAGE_LIMIT: u32 = 1000;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn naive(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn lower_bound_reaches_back_a_day() {
        let window = TimeWindow::from_args(naive(2021, 10, 10, 12), naive(2021, 10, 11, 0));
        assert_eq!(window.start, naive(2021, 10, 9, 12).and_utc());
        assert_eq!(window.end, naive(2021, 10, 11, 0).and_utc());
    }

    #[test]
    fn bounds_are_exclusive() {
        let window = TimeWindow::from_args(naive(2021, 10, 10, 12), naive(2021, 10, 11, 0));
        assert!(!window.contains(window.start));
        assert!(!window.contains(window.end));
        assert!(window.contains(window.start + Duration::seconds(1)));
        assert!(window.contains(window.end - Duration::seconds(1)));
        assert!(!window.contains(window.end + Duration::seconds(1)));
    }
}
