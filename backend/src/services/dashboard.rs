//! Admin dashboard

use crate::error::ApiError;
use crate::repositories::DashboardRepository;
use bml_shared::types::DashboardStats;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

const NO_DATA: &str = "no data";

/// Relative age of something `seconds` old
pub fn time_ago(seconds: i64) -> String {
    let seconds = seconds.max(0);
    match seconds {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{} min ago", s / 60),
        s if s < 86_400 => format!("{} h ago", s / 3_600),
        s => format!("{} d ago", s / 86_400),
    }
}

fn since(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    at.map(|at| time_ago((now - at).num_seconds()))
        .unwrap_or_else(|| NO_DATA.to_string())
}

pub struct DashboardService;

impl DashboardService {
    pub async fn stats(pool: &PgPool) -> Result<DashboardStats, ApiError> {
        let stats = DashboardRepository::stats(pool)
            .await
            .map_err(ApiError::from_repo)?;
        let now = Utc::now();

        Ok(DashboardStats {
            total_users: stats.total_users,
            total_feeds: stats.total_feeds,
            total_communities: stats.total_communities,
            last_feed_registered: since(stats.last_feed_at, now),
            last_user_registered: since(stats.last_user_at, now),
            last_notice_registered: since(stats.last_notice_at, now),
        })
    }
}
