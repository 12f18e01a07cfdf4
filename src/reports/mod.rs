//! Pure aggregation over the stored session history for the reports
//! screen: headline totals, a last-7-days bar series and a per-category
//! distribution. No state, no side effects; everything is re-derivable
//! from the full session list at any time.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::models::Session;

/// Focused minutes for one calendar day of the 7-day window.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub minutes: u32,
}

/// Focused minutes for one category, with its share of the all-time total.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    pub minutes: u32,
    /// Percentage of all-time focused minutes, 0 when there is no history.
    pub share: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub today_minutes: u32,
    pub all_time_minutes: u32,
    pub total_distractions: u32,
    /// Oldest to newest, always 7 entries, zero-filled days included.
    pub last_seven_days: Vec<DailyTotal>,
    /// Ordered by first occurrence in the session list.
    pub categories: Vec<CategoryTotal>,
}

/// Aggregate the full session list into a [`Report`]. `today` anchors the
/// 7-day window and the "today" total; callers pass the local calendar day.
pub fn build_report(sessions: &[Session], today: NaiveDate) -> Report {
    let mut last_seven_days: Vec<DailyTotal> = (0..7)
        .rev()
        .map(|offset| DailyTotal {
            date: today - Days::new(offset),
            minutes: 0,
        })
        .collect();

    let mut categories: Vec<CategoryTotal> = Vec::new();
    let mut today_minutes = 0;
    let mut all_time_minutes = 0;
    let mut total_distractions = 0;

    for session in sessions {
        all_time_minutes += session.duration;
        total_distractions += session.distraction_count;
        if session.date == today {
            today_minutes += session.duration;
        }

        if let Some(bucket) = last_seven_days.iter_mut().find(|b| b.date == session.date) {
            bucket.minutes += session.duration;
        }

        match categories.iter_mut().find(|c| c.category == session.category) {
            Some(total) => total.minutes += session.duration,
            None => categories.push(CategoryTotal {
                category: session.category.clone(),
                minutes: session.duration,
                share: 0.0,
            }),
        }
    }

    if all_time_minutes > 0 {
        for total in &mut categories {
            total.share = f64::from(total.minutes) / f64::from(all_time_minutes) * 100.0;
        }
    }

    Report {
        today_minutes,
        all_time_minutes,
        total_distractions,
        last_seven_days,
        categories,
    }
}
