//! Daily activity histogram over a trailing window of calendar days.
//!
//! Two event kinds are counted: an item being created and a comment being
//! posted (replies at any depth included). Each day's score weights item
//! creation above comments. Dates are taken in the timezone of `now`.

use crate::model::ProjectItem;
use crate::model::comment;
use chrono::{DateTime, Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// Longest window that can be charted: ten years of days.
pub const MAX_WINDOW_DAYS: u32 = 3660;

/// Window length and event weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySettings {
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default = "default_item_weight")]
    pub item_weight: u32,
    #[serde(default = "default_comment_weight")]
    pub comment_weight: u32,
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            item_weight: default_item_weight(),
            comment_weight: default_comment_weight(),
        }
    }
}

impl ActivitySettings {
    /// Reject windows longer than [`MAX_WINDOW_DAYS`].
    pub const fn validate(&self) -> Result<(), WindowTooLong> {
        if self.window_days > MAX_WINDOW_DAYS {
            return Err(WindowTooLong(self.window_days));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("activity window of {0} days exceeds the {max}-day maximum", max = MAX_WINDOW_DAYS)]
pub struct WindowTooLong(pub u32);

const fn default_window_days() -> u32 {
    30
}

const fn default_item_weight() -> u32 {
    3
}

const fn default_comment_weight() -> u32 {
    1
}

/// Counts for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub items: u32,
    pub comments: u32,
    pub score: u64,
}

/// The whole histogram, oldest day first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub buckets: Vec<DayBucket>,
    pub total_items: u32,
    pub total_comments: u32,
    pub total_score: u64,
}

impl Activity {
    /// Highest single-day score, for scaling a chart.
    #[must_use]
    pub fn peak(&self) -> u64 {
        self.buckets.iter().map(|b| b.score).max().unwrap_or(0)
    }

    /// The bucket for `date`, if it falls inside the window.
    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<&DayBucket> {
        self.buckets.iter().find(|b| b.date == date)
    }
}

/// Build the histogram for the `settings.window_days` days ending on `now`'s date.
///
/// Windows beyond [`MAX_WINDOW_DAYS`] are cut to that length. Counts and
/// scores saturate instead of wrapping.
#[must_use]
pub fn aggregate<Tz: TimeZone>(
    items: &[ProjectItem],
    now: &DateTime<Tz>,
    settings: &ActivitySettings,
) -> Activity {
    let tz = now.timezone();
    let today = now.date_naive();
    let window = settings.window_days.min(MAX_WINDOW_DAYS);
    let first_day = today
        .checked_sub_days(Days::new(u64::from(window.saturating_sub(1))))
        .unwrap_or(NaiveDate::MIN);

    let mut buckets: Vec<DayBucket> = (0..window)
        .filter_map(|offset| first_day.checked_add_days(Days::new(u64::from(offset))))
        .map(|date| DayBucket {
            date,
            items: 0,
            comments: 0,
            score: 0,
        })
        .collect();

    let slot = |date: NaiveDate| -> Option<usize> {
        if window == 0 || date < first_day || date > today {
            return None;
        }
        usize::try_from((date - first_day).num_days()).ok()
    };

    for item in items {
        let created = slot(item.created_at.with_timezone(&tz).date_naive());
        if let Some(bucket) = created.and_then(|i| buckets.get_mut(i)) {
            bucket.items = bucket.items.saturating_add(1);
        }
        for (_, posted) in comment::walk(&item.comments) {
            let posted = slot(posted.created_at.with_timezone(&tz).date_naive());
            if let Some(bucket) = posted.and_then(|i| buckets.get_mut(i)) {
                bucket.comments = bucket.comments.saturating_add(1);
            }
        }
    }

    let mut activity = Activity {
        buckets,
        total_items: 0,
        total_comments: 0,
        total_score: 0,
    };
    for bucket in &mut activity.buckets {
        bucket.score = (u64::from(bucket.items) * u64::from(settings.item_weight))
            .saturating_add(u64::from(bucket.comments) * u64::from(settings.comment_weight));
        activity.total_items = activity.total_items.saturating_add(bucket.items);
        activity.total_comments = activity.total_comments.saturating_add(bucket.comments);
        activity.total_score = activity.total_score.saturating_add(bucket.score);
    }
    activity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Comment;
    use chrono::{FixedOffset, Utc};

    fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn item_on(created: DateTime<Utc>, comments: Vec<Comment>) -> ProjectItem {
        ProjectItem {
            id: format!("k{}", created.timestamp()),
            title: "t".to_string(),
            description: String::new(),
            attachments: Vec::new(),
            is_done: false,
            comments,
            created_at: created,
        }
    }

    #[test]
    fn item_and_two_comments_on_one_day_score_five() {
        let day = ts(2026, 10, 10, 8);
        let mut root = Comment::new("a", "root", day);
        root.children.push(Comment::new("b", "reply", day));
        let items = vec![item_on(day, vec![root])];

        let activity = aggregate(&items, &ts(2026, 10, 18, 12), &ActivitySettings::default());
        let bucket = activity.day(day.date_naive()).unwrap();
        assert_eq!(bucket.items, 1);
        assert_eq!(bucket.comments, 2);
        assert_eq!(bucket.score, 5);
        assert_eq!(activity.total_score, 5);
        assert_eq!(activity.peak(), 5);
    }

    #[test]
    fn window_has_fixed_length_ending_today() {
        let now = ts(2026, 10, 18, 12);
        let activity = aggregate(&[], &now, &ActivitySettings::default());
        assert_eq!(activity.buckets.len(), 30);
        assert_eq!(activity.buckets[29].date, now.date_naive());
        assert_eq!(
            activity.buckets[0].date,
            NaiveDate::from_ymd_opt(2026, 9, 19).unwrap()
        );
        assert_eq!(activity.total_score, 0);
    }

    #[test]
    fn events_outside_window_are_ignored() {
        let now = ts(2026, 10, 18, 12);
        let items = vec![
            item_on(ts(2026, 9, 18, 12), Vec::new()),
            item_on(ts(2026, 10, 19, 1), Vec::new()),
            item_on(ts(2026, 9, 19, 0), Vec::new()),
        ];
        let activity = aggregate(&items, &now, &ActivitySettings::default());
        assert_eq!(activity.total_items, 1);
    }

    #[test]
    fn dates_follow_the_timezone_of_now() {
        let jakarta = FixedOffset::east_opt(7 * 3600).unwrap();
        // 20:00 UTC on the 9th is already the 10th in UTC+7.
        let items = vec![item_on(ts(2026, 10, 9, 20), Vec::new())];
        let now = ts(2026, 10, 12, 0).with_timezone(&jakarta);
        let activity = aggregate(&items, &now, &ActivitySettings::default());
        let tenth = NaiveDate::from_ymd_opt(2026, 10, 10).unwrap();
        assert_eq!(activity.day(tenth).unwrap().items, 1);
    }

    #[test]
    fn custom_weights_and_empty_window() {
        let day = ts(2026, 10, 18, 1);
        let items = vec![item_on(day, vec![Comment::new("a", "x", day)])];
        let settings = ActivitySettings {
            window_days: 7,
            item_weight: 10,
            comment_weight: 2,
        };
        let activity = aggregate(&items, &day, &settings);
        assert_eq!(activity.buckets.len(), 7);
        assert_eq!(activity.total_score, 12);

        let none = ActivitySettings {
            window_days: 0,
            ..settings
        };
        let activity = aggregate(&items, &day, &none);
        assert!(activity.buckets.is_empty());
        assert_eq!(activity.total_score, 0);
    }

    #[test]
    fn huge_weights_saturate_instead_of_overflowing() {
        let day = ts(2026, 10, 18, 1);
        let items = vec![
            item_on(day, vec![Comment::new("a", "x", day)]),
            item_on(ts(2026, 10, 18, 2), Vec::new()),
        ];
        let settings = ActivitySettings {
            window_days: 2,
            item_weight: u32::MAX,
            comment_weight: u32::MAX,
        };
        let activity = aggregate(&items, &day, &settings);
        let expected = 3 * u64::from(u32::MAX);
        assert_eq!(activity.day(day.date_naive()).unwrap().score, expected);
        assert_eq!(activity.total_score, expected);
    }

    #[test]
    fn oversized_window_is_capped_and_still_ends_today() {
        let now = ts(2026, 10, 18, 12);
        let settings = ActivitySettings {
            window_days: u32::MAX,
            ..ActivitySettings::default()
        };
        assert_eq!(settings.validate(), Err(WindowTooLong(u32::MAX)));

        let activity = aggregate(&[], &now, &settings);
        assert_eq!(activity.buckets.len(), MAX_WINDOW_DAYS as usize);
        assert_eq!(activity.buckets.last().unwrap().date, now.date_naive());
        assert!(ActivitySettings::default().validate().is_ok());
    }
}
