use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Inclusive calendar-day bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// An end before the start means there is nothing to query.
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn clamp_to_today(self, today: NaiveDate) -> Self {
        Self {
            start: self.start,
            end: self.end.min(today),
        }
    }

    /// Intersection with `outer`; empty when the two do not overlap.
    pub fn clamp_within(self, outer: &Period) -> Self {
        Self {
            start: self.start.max(outer.start),
            end: self.end.min(outer.end),
        }
    }

    /// `[start 00:00:00, (end + 1 day) 00:00:00)` so intraday readings on the
    /// last day are kept.
    pub fn query_window(&self) -> QueryWindow {
        QueryWindow {
            start: self.start.and_time(NaiveTime::MIN),
            end_exclusive: (self.end + Duration::days(1)).and_time(NaiveTime::MIN),
        }
    }
}

/// Half-open time interval handed to the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: NaiveDateTime,
    pub end_exclusive: NaiveDateTime,
}

impl QueryWindow {
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts < self.end_exclusive
    }
}

/// Outcome of resolving a GDD window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GddWindow {
    Active { campaign: Period, period: Period },
    OutOfCampaign { campaign: Period },
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    // Fixed month/day constants are valid for every year chrono represents
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// Chill campaign Nov 1 → Mar 1 for reference year `year`.
pub fn chill_campaign(year: i32, today: NaiveDate) -> Period {
    let start_year = if today.month() >= 11 { year } else { year - 1 };
    Period::new(ymd(start_year, 11, 1), ymd(start_year + 1, 3, 1))
}

/// GDD campaign Apr 1 → Sep 30 of `year`.
pub fn gdd_campaign(year: i32) -> Period {
    Period::new(ymd(year, 4, 1), ymd(year, 9, 30))
}

pub fn gdd_campaign_active(year: i32, today: NaiveDate) -> bool {
    if year > today.year() {
        return false;
    }
    !(year == today.year() && today < ymd(year, 4, 1))
}

/// Chill window: the campaign, or a custom range, always clamped to today.
pub fn resolve_chill(year: i32, custom: Option<Period>, today: NaiveDate) -> Period {
    custom
        .unwrap_or_else(|| chill_campaign(year, today))
        .clamp_to_today(today)
}

/// GDD window. Custom ranges and the full-bloom start override are kept
/// inside the campaign, then clamped to today.
pub fn resolve_gdd(
    year: i32,
    custom: Option<Period>,
    bloom_start: Option<NaiveDate>,
    today: NaiveDate,
) -> GddWindow {
    let campaign = gdd_campaign(year);
    if !gdd_campaign_active(year, today) {
        return GddWindow::OutOfCampaign { campaign };
    }

    let mut period = custom.unwrap_or(campaign).clamp_within(&campaign);
    if let Some(bloom) = bloom_start {
        period.start = bloom.max(campaign.start);
    }

    GddWindow::Active {
        campaign,
        period: period.clamp_to_today(today),
    }
}
