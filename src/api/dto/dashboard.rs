//! DTOs for the dashboard endpoint.

use chrono::NaiveDate;
use serde::Serialize;

use crate::application::services::DashboardStats;

#[derive(Debug, Serialize)]
pub struct DailyVisitsResponse {
    pub date: NaiveDate,
    pub visits: i64,
}

/// Aggregates for the authenticated user.
///
/// `daily_visits` is oldest-first and always covers 7 days ending today (UTC).
/// `visits_growth` is a percentage; 0 when last week had no visits.
#[derive(Debug, Serialize)]
pub struct DashboardStatsResponse {
    pub total_links: i64,
    pub total_visits: i64,
    pub avg_clicks_per_link: f64,
    pub daily_visits: Vec<DailyVisitsResponse>,
    pub visits_this_week: i64,
    pub visits_last_week: i64,
    pub visits_growth: f64,
}

impl From<DashboardStats> for DashboardStatsResponse {
    fn from(stats: DashboardStats) -> Self {
        Self {
            total_links: stats.total_links,
            total_visits: stats.total_visits,
            avg_clicks_per_link: round2(stats.avg_clicks_per_link),
            daily_visits: stats
                .daily_visits
                .into_iter()
                .map(|d| DailyVisitsResponse {
                    date: d.date,
                    visits: d.visits,
                })
                .collect(),
            visits_this_week: stats.visits_this_week,
            visits_last_week: stats.visits_last_week,
            visits_growth: round2(stats.visits_growth),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
