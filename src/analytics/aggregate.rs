//! Event-stream aggregation.
//!
//! Turns flat event rows into daily series, per-job groups and unique-actor
//! counts. Every function here is pure over its inputs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::error::Result;
use crate::models::{DateRange, Event, Job, JobId};

/// Anything with a point in time that can land in a daily bucket.
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

impl Timestamped for Event {
    fn timestamp(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl Timestamped for Job {
    fn timestamp(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UniqueCount {
    pub total: u64,
    pub unique: u64,
}

/// Per-job engagement tallies, zero-filled for jobs without events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub views: u64,
    pub unique_views: u64,
    pub clicks: u64,
    pub unique_clicks: u64,
    pub saves: u64,
    pub applications: u64,
}

/// One bucket per calendar day in `[start, end]`, ascending. Events are
/// bucketed by their UTC date; anything outside the range is skipped.
pub fn bucket_by_day<T: Timestamped>(events: &[T], start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyCount>> {
    let range = DateRange::new(start, end)?;
    let mut buckets: Vec<DailyCount> = range.days().map(|date| DailyCount { date, count: 0 }).collect();

    for event in events {
        let date = event.timestamp().date_naive();
        if !range.contains(date) {
            continue;
        }
        let offset = (date - range.start()).num_days() as usize;
        buckets[offset].count += 1;
    }

    Ok(buckets)
}

/// `total` counts every event; `unique` counts distinct keys, ignoring events
/// whose key is absent.
pub fn count_unique<T, K, F>(events: &[T], key_fn: F) -> UniqueCount
where
    K: Eq + Hash,
    F: Fn(&T) -> Option<K>,
{
    let keys: HashSet<K> = events.iter().filter_map(&key_fn).collect();
    UniqueCount {
        total: events.len() as u64,
        unique: keys.len() as u64,
    }
}

/// Unique-actor count, the usual key for engagement events.
pub fn count_unique_actors(events: &[&Event]) -> UniqueCount {
    count_unique(events, |event| event.actor_id.clone())
}

/// Jobs without events are absent from the map; callers default-fill.
pub fn group_by_job(events: &[Event]) -> HashMap<JobId, Vec<&Event>> {
    let mut groups: HashMap<JobId, Vec<&Event>> = HashMap::new();
    for event in events {
        groups.entry(event.job_id).or_default().push(event);
    }
    groups
}

/// Count views, clicks, saves and applications for each of `job_ids`.
pub fn summarize_jobs(
    job_ids: &[JobId],
    views: &[Event],
    clicks: &[Event],
    saves: &[Event],
    applications: &[Event],
) -> HashMap<JobId, JobCounts> {
    let views = group_by_job(views);
    let clicks = group_by_job(clicks);
    let saves = group_by_job(saves);
    let applications = group_by_job(applications);

    job_ids
        .iter()
        .map(|id| {
            let view_counts = views.get(id).map(|v| count_unique_actors(v)).unwrap_or_default();
            let click_counts = clicks.get(id).map(|c| count_unique_actors(c)).unwrap_or_default();
            let counts = JobCounts {
                views: view_counts.total,
                unique_views: view_counts.unique,
                clicks: click_counts.total,
                unique_clicks: click_counts.unique,
                saves: saves.get(id).map_or(0, |s| s.len() as u64),
                applications: applications.get(id).map_or(0, |a| a.len() as u64),
            };
            (*id, counts)
        })
        .collect()
}

/// Whole days a posting has been live as of `as_of`, never less than one.
pub fn days_active(created_at: DateTime<Utc>, as_of: DateTime<Utc>) -> u32 {
    let days = (as_of - created_at).num_days();
    days.clamp(1, i64::from(u32::MAX)) as u32
}
