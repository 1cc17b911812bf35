//! Dashboard assembly: fetch every event kind up front, then aggregate and
//! score in memory.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::analytics::aggregate::{DailyCount, UniqueCount, bucket_by_day, count_unique, days_active, summarize_jobs};
use crate::analytics::funnel::{Funnel, compute_funnel};
use crate::analytics::score::{LeaderboardEntry, RankMetric, ScoredJob, leaderboard};
use crate::models::{DateRange, Event, EventFilter, EventKind, Job, JobFilter, JobId};

/// Row source the report reads from. The store implements it; tests use an
/// in-memory fake.
pub trait EventSource {
    /// Rows of one kind matching `filter`, in no particular order.
    fn fetch_events(&self, kind: EventKind, filter: &EventFilter) -> Result<Vec<Event>>;
    fn fetch_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>>;
}

#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub range: DateRange,
    /// Restrict to one poster's jobs. `None` means platform-wide.
    pub created_by: Option<String>,
    pub metric: RankMetric,
    pub limit: usize,
    pub as_of: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trends {
    pub views: Vec<DailyCount>,
    pub clicks: Vec<DailyCount>,
    pub applications: Vec<DailyCount>,
    pub postings: Vec<DailyCount>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Totals {
    pub views: UniqueCount,
    pub clicks: UniqueCount,
    pub saves: u64,
    pub applications: u64,
    pub jobs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngagementReport {
    pub range: DateRange,
    pub created_by: Option<String>,
    pub metric: RankMetric,
    pub totals: Totals,
    pub trends: Trends,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub funnel: Funnel,
}

pub fn build_report<S: EventSource + ?Sized>(source: &S, request: &ReportRequest) -> Result<EngagementReport> {
    let jobs = source
        .fetch_jobs(&JobFilter {
            status: None,
            created_by: request.created_by.clone(),
        })
        .context("Failed to fetch jobs")?;

    let job_scope: Option<Vec<JobId>> = request
        .created_by
        .as_ref()
        .map(|_| jobs.iter().map(|job| job.id).collect());

    let filter = EventFilter {
        date_range: Some(request.range),
        job_ids: job_scope,
    };

    let fetch = |kind: EventKind| {
        source
            .fetch_events(kind, &filter)
            .with_context(|| format!("Failed to fetch {} events", kind))
    };
    let views = fetch(EventKind::JobView)?;
    let clicks = fetch(EventKind::LinkClick)?;
    let saves = fetch(EventKind::Save)?;
    let applications = fetch(EventKind::Application)?;

    debug!(
        "Fetched {} jobs, {} views, {} clicks, {} saves, {} applications",
        jobs.len(),
        views.len(),
        clicks.len(),
        saves.len(),
        applications.len()
    );

    let (start, end) = (request.range.start(), request.range.end());
    let trends = Trends {
        views: bucket_by_day(&views, start, end)?,
        clicks: bucket_by_day(&clicks, start, end)?,
        applications: bucket_by_day(&applications, start, end)?,
        postings: bucket_by_day(&jobs, start, end)?,
    };

    let actor = |event: &Event| event.actor_id.clone();
    let totals = Totals {
        views: count_unique(&views, actor),
        clicks: count_unique(&clicks, actor),
        saves: saves.len() as u64,
        applications: applications.len() as u64,
        jobs: jobs.len() as u64,
    };

    let published: Vec<&Job> = jobs.iter().filter(|job| job.status.was_published()).collect();
    let ids: Vec<JobId> = published.iter().map(|job| job.id).collect();
    let summary = summarize_jobs(&ids, &views, &clicks, &saves, &applications);

    let scored: Vec<ScoredJob> = published
        .iter()
        .map(|job| {
            let counts = summary.get(&job.id).copied().unwrap_or_default();
            ScoredJob::new(
                job.id,
                &job.title,
                &job.company,
                counts,
                days_active(job.created_at, request.as_of),
            )
        })
        .collect();

    let board = leaderboard(scored, request.metric, request.limit);
    let funnel = compute_funnel(totals.views.total, totals.clicks.total, totals.applications);

    info!(
        "Built engagement report for {}..{} ({} days, {} ranked jobs)",
        start,
        end,
        request.range.num_days(),
        board.len()
    );

    Ok(EngagementReport {
        range: request.range,
        created_by: request.created_by.clone(),
        metric: request.metric,
        totals,
        trends,
        leaderboard: board,
        funnel,
    })
}
