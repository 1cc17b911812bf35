//! Engagement analytics: aggregation, scoring, funnels and the dashboard
//! report built from them.

pub mod aggregate;
pub mod funnel;
pub mod report;
pub mod score;

pub use aggregate::{
    DailyCount, JobCounts, Timestamped, UniqueCount, bucket_by_day, count_unique, count_unique_actors, days_active,
    group_by_job, summarize_jobs,
};
pub use funnel::{Funnel, compute_funnel, percentage};
pub use report::{EngagementReport, EventSource, ReportRequest, Totals, Trends, build_report};
pub use score::{
    EngagementCounts, LeaderboardEntry, RankMetric, ScoredJob, compute_engagement_score, leaderboard, rank,
};
