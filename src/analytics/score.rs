//! Composite engagement scoring and leaderboard ranking.
//!
//! The weights are deployment constants. Changing any of them makes scores
//! incomparable with previously stored leaderboards.

use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;

use crate::analytics::aggregate::JobCounts;
use crate::analytics::funnel::percentage;
use crate::error::BoardError;
use crate::models::JobId;

pub const W_CLICK: f64 = 3.0;
pub const W_SAVE: f64 = 2.0;
pub const W_VIEW: f64 = 0.1;
pub const W_RATE: f64 = 0.5;
pub const W_DAILY: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngagementCounts {
    pub unique_views: u64,
    pub unique_clicks: u64,
    pub saves: u64,
    pub days_active: u32,
}

impl EngagementCounts {
    pub fn from_job_counts(counts: &JobCounts, days_active: u32) -> Self {
        Self {
            unique_views: counts.unique_views,
            unique_clicks: counts.unique_clicks,
            saves: counts.saves,
            days_active,
        }
    }

    /// Unique clicks per hundred unique views. Zero views read as one.
    pub fn click_through_rate(&self) -> f64 {
        percentage(self.unique_clicks, self.unique_views)
    }

    /// Interactions per day live. `days_active` of zero reads as one.
    pub fn daily_rate(&self) -> f64 {
        let interactions = (self.unique_views + self.unique_clicks + self.saves) as f64;
        interactions / f64::from(self.days_active.max(1))
    }
}

pub fn compute_engagement_score(counts: &EngagementCounts) -> f64 {
    counts.unique_clicks as f64 * W_CLICK
        + counts.saves as f64 * W_SAVE
        + counts.unique_views as f64 * W_VIEW
        + counts.click_through_rate() * W_RATE
        + counts.daily_rate() * W_DAILY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankMetric {
    #[default]
    Score,
    Clicks,
    Saves,
}

impl FromStr for RankMetric {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "score" => Ok(RankMetric::Score),
            "clicks" => Ok(RankMetric::Clicks),
            "saves" => Ok(RankMetric::Saves),
            other => Err(BoardError::validation(format!(
                "Unknown ranking metric '{}' (expected score, clicks or saves)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredJob {
    pub job_id: JobId,
    pub title: String,
    pub company: String,
    pub counts: JobCounts,
    pub days_active: u32,
    pub score: f64,
}

impl ScoredJob {
    pub fn new(job_id: JobId, title: &str, company: &str, counts: JobCounts, days_active: u32) -> Self {
        let score = compute_engagement_score(&EngagementCounts::from_job_counts(&counts, days_active));
        Self {
            job_id,
            title: title.to_string(),
            company: company.to_string(),
            counts,
            days_active,
            score,
        }
    }

    fn compare_desc(&self, other: &Self, metric: RankMetric) -> Ordering {
        match metric {
            RankMetric::Score => other.score.total_cmp(&self.score),
            RankMetric::Clicks => other.counts.unique_clicks.cmp(&self.counts.unique_clicks),
            RankMetric::Saves => other.counts.saves.cmp(&self.counts.saves),
        }
    }
}

/// Descending by `metric`. Equal values keep their input order.
pub fn rank(mut jobs: Vec<ScoredJob>, metric: RankMetric) -> Vec<ScoredJob> {
    jobs.sort_by(|a, b| a.compare_desc(b, metric));
    jobs
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub job_id: JobId,
    pub title: String,
    pub company: String,
    pub score: f64,
    pub unique_views: u64,
    pub unique_clicks: u64,
    pub saves: u64,
}

pub fn leaderboard(jobs: Vec<ScoredJob>, metric: RankMetric, limit: usize) -> Vec<LeaderboardEntry> {
    rank(jobs, metric)
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, job)| LeaderboardEntry {
            rank: i + 1,
            job_id: job.job_id,
            title: job.title,
            company: job.company,
            score: job.score,
            unique_views: job.counts.unique_views,
            unique_clicks: job.counts.unique_clicks,
            saves: job.counts.saves,
        })
        .collect()
}
