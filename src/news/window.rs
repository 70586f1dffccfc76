//! Publication-date windows.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open calendar-date interval `[after, before)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleWindow {
    pub after: NaiveDate,
    pub before: NaiveDate,
}

impl ArticleWindow {
    pub fn new(after: NaiveDate, before: NaiveDate) -> Self {
        Self { after, before }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.after <= date && date < self.before
    }
}

impl fmt::Display for ArticleWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.after, self.before)
    }
}

/// Rule mapping the run date to the window of admissible articles.
///
/// There is no holiday calendar; a run after a public holiday sees only the
/// holiday itself unless the policy is widened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowPolicy {
    /// Look back one business day; Monday covers Friday through Sunday.
    PriorBusinessDay {
        #[serde(default = "default_monday_lookback")]
        monday_lookback_days: i64,
        #[serde(default = "default_lookback")]
        lookback_days: i64,
    },
    /// Same lookback on every weekday.
    Rolling { days: i64 },
}

fn default_monday_lookback() -> i64 {
    3
}

fn default_lookback() -> i64 {
    1
}

impl Default for WindowPolicy {
    fn default() -> Self {
        WindowPolicy::PriorBusinessDay {
            monday_lookback_days: default_monday_lookback(),
            lookback_days: default_lookback(),
        }
    }
}

impl WindowPolicy {
    /// Window for a run on `today`; `today` itself is always excluded.
    pub fn window_for(&self, today: NaiveDate) -> ArticleWindow {
        let days = match *self {
            WindowPolicy::PriorBusinessDay {
                monday_lookback_days,
                lookback_days,
            } => {
                if today.weekday() == Weekday::Mon {
                    monday_lookback_days
                } else {
                    lookback_days
                }
            }
            WindowPolicy::Rolling { days } => days,
        };
        ArticleWindow::new(today - Duration::days(days.max(1)), today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_window_is_half_open() {
        let w = ArticleWindow::new(d(2025, 8, 18), d(2025, 8, 19));
        assert!(w.contains(d(2025, 8, 18)));
        assert!(!w.contains(d(2025, 8, 19)));
        assert!(!w.contains(d(2025, 8, 17)));
        assert_eq!(w.to_string(), "[2025-08-18, 2025-08-19)");
    }

    #[test]
    fn test_monday_covers_weekend() {
        // 2025-08-18 is a Monday
        let w = WindowPolicy::default().window_for(d(2025, 8, 18));
        assert_eq!(w, ArticleWindow::new(d(2025, 8, 15), d(2025, 8, 18)));
        assert!(w.contains(d(2025, 8, 15)));
        assert!(w.contains(d(2025, 8, 17)));
    }

    #[test]
    fn test_tuesday_covers_monday() {
        let w = WindowPolicy::default().window_for(d(2025, 8, 19));
        assert_eq!(w, ArticleWindow::new(d(2025, 8, 18), d(2025, 8, 19)));
    }

    #[test]
    fn test_rolling_policy() {
        let w = WindowPolicy::Rolling { days: 2 }.window_for(d(2025, 8, 18));
        assert_eq!(w, ArticleWindow::new(d(2025, 8, 16), d(2025, 8, 18)));
    }

    #[test]
    fn test_policy_from_yaml() {
        let p: WindowPolicy = serde_yaml::from_str("kind: prior_business_day").unwrap();
        assert_eq!(p, WindowPolicy::default());

        let p: WindowPolicy = serde_yaml::from_str("kind: rolling\ndays: 7").unwrap();
        assert_eq!(p, WindowPolicy::Rolling { days: 7 });
    }
}
