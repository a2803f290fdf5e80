//! Per-user dashboard aggregates.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::repositories::DashboardRepository;
use crate::error::AppError;

/// Days covered by the visit histogram, today included.
pub const HISTOGRAM_DAYS: u64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyVisits {
    pub date: NaiveDate,
    pub visits: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_links: i64,
    pub total_visits: i64,
    pub avg_clicks_per_link: f64,
    pub daily_visits: Vec<DailyVisits>,
    pub visits_this_week: i64,
    pub visits_last_week: i64,
    pub visits_growth: f64,
}

/// Week-over-week growth in percent. Zero when there is no baseline.
pub fn visits_growth(this_week: i64, last_week: i64) -> f64 {
    if last_week == 0 {
        return 0.0;
    }
    (this_week - last_week) as f64 / last_week as f64 * 100.0
}

fn average(total: i64, count: i64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total as f64 / count as f64
}

/// Expands sparse per-day counts into a dense, oldest-first series ending at `today`.
pub fn dense_histogram(today: NaiveDate, days: u64, counts: &HashMap<NaiveDate, i64>) -> Vec<DailyVisits> {
    (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|date| DailyVisits {
            date,
            visits: counts.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

pub struct DashboardService<D: DashboardRepository + ?Sized = dyn DashboardRepository> {
    repository: Arc<D>,
}

impl<D: DashboardRepository + ?Sized> DashboardService<D> {
    pub fn new(repository: Arc<D>) -> Self {
        Self { repository }
    }

    /// Aggregates for `user_id` as of now.
    pub async fn stats(&self, user_id: i64) -> Result<DashboardStats, AppError> {
        self.stats_at(user_id, Utc::now()).await
    }

    /// Aggregates for `user_id` as of `now`.
    ///
    /// "This week" is the last 7 days up to `now`; "last week" is the 7 days before that.
    pub async fn stats_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<DashboardStats, AppError> {
        let today = now.date_naive();
        let since = today
            .checked_sub_days(Days::new(HISTOGRAM_DAYS - 1))
            .unwrap_or(today);

        let week = chrono::Duration::days(7);
        let this_week_start = now - week;
        let last_week_start = this_week_start - week;

        let (total_links, total_visits, daily, this_week, last_week) = tokio::try_join!(
            self.repository.count_links(user_id),
            self.repository.sum_clicks(user_id),
            self.repository.daily_visits(user_id, since),
            self.repository
                .count_clicks_between(user_id, this_week_start, now),
            self.repository
                .count_clicks_between(user_id, last_week_start, this_week_start),
        )?;

        let counts: HashMap<NaiveDate, i64> =
            daily.into_iter().map(|row| (row.day, row.visits)).collect();

        Ok(DashboardStats {
            total_links,
            total_visits,
            avg_clicks_per_link: average(total_visits, total_links),
            daily_visits: dense_histogram(today, HISTOGRAM_DAYS, &counts),
            visits_this_week: this_week,
            visits_last_week: last_week,
            visits_growth: visits_growth(this_week, last_week),
        })
    }
}
