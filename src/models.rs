use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BoardError;

pub type JobId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Active,
    Rejected,
    Removed,
    Archived,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Pending,
        JobStatus::Active,
        JobStatus::Rejected,
        JobStatus::Removed,
        JobStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Active => "active",
            JobStatus::Rejected => "rejected",
            JobStatus::Removed => "removed",
            JobStatus::Archived => "archived",
        }
    }

    /// Whether students could ever have seen the posting.
    pub fn was_published(&self) -> bool {
        matches!(self, JobStatus::Active | JobStatus::Removed | JobStatus::Archived)
    }

    /// Moderation and expiry moves. Removed and archived postings are final.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Active)
                | (JobStatus::Pending, JobStatus::Rejected)
                | (JobStatus::Rejected, JobStatus::Active)
                | (JobStatus::Active, JobStatus::Removed)
                | (JobStatus::Active, JobStatus::Archived)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BoardError::validation(format!("Unknown job status '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Applied,
    Viewed,
    Interview,
    Hired,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Viewed,
        ApplicationStatus::Interview,
        ApplicationStatus::Hired,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Viewed => "viewed",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Hired | ApplicationStatus::Rejected)
    }

    /// Review only moves forward; rejection is reachable from any open state.
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == ApplicationStatus::Rejected || next > *self
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BoardError::validation(format!("Unknown application status '{}'", s)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub company: String,
    pub job_type: Option<String>, // "full-time", "internship", "co-op", etc.
    pub industry: Option<String>,
    pub status: JobStatus,
    pub deadline: Option<NaiveDate>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by a poster. Everything else is assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub job_type: Option<String>,
    pub industry: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub created_by: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    JobView,
    LinkClick,
    Save,
    Application,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::JobView => "job_view",
            EventKind::LinkClick => "link_click",
            EventKind::Save => "save",
            EventKind::Application => "application",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable engagement row, whatever table it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub job_id: JobId,
    pub actor_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub application_status: Option<ApplicationStatus>,
}

impl Event {
    pub fn new(kind: EventKind, job_id: JobId, actor_id: Option<&str>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            job_id,
            actor_id: actor_id.map(str::to_string),
            occurred_at,
            application_status: None,
        }
    }
}

/// Inclusive calendar-date range. Construction rejects `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, BoardError> {
        if start > end {
            return Err(BoardError::invalid_date_range(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The `days` calendar days ending on `end`, inclusive.
    pub fn last_days(end: NaiveDate, days: u32) -> Result<Self, BoardError> {
        if days == 0 {
            return Err(BoardError::invalid_date_range("range must cover at least one day"));
        }
        let start = end
            .checked_sub_days(chrono::Days::new(u64::from(days) - 1))
            .ok_or_else(|| {
                BoardError::invalid_date_range(format!("{} days before {} is out of range", days, end))
            })?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn num_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.num_days())
    }
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub date_range: Option<DateRange>,
    pub job_ids: Option<Vec<JobId>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_job_status_moderation_paths() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Active));
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Rejected));
        assert!(JobStatus::Rejected.can_transition_to(JobStatus::Active));
        assert!(JobStatus::Active.can_transition_to(JobStatus::Archived));
        assert!(JobStatus::Active.can_transition_to(JobStatus::Removed));

        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Archived));
        assert!(!JobStatus::Removed.can_transition_to(JobStatus::Active));
        assert!(!JobStatus::Archived.can_transition_to(JobStatus::Active));
        assert!(!JobStatus::Active.can_transition_to(JobStatus::Active));
    }

    #[test]
    fn test_application_status_moves_forward_only() {
        assert!(ApplicationStatus::Applied.can_transition_to(ApplicationStatus::Interview));
        assert!(ApplicationStatus::Viewed.can_transition_to(ApplicationStatus::Rejected));
        assert!(!ApplicationStatus::Interview.can_transition_to(ApplicationStatus::Viewed));
        assert!(!ApplicationStatus::Hired.can_transition_to(ApplicationStatus::Rejected));
        assert!(!ApplicationStatus::Rejected.can_transition_to(ApplicationStatus::Applied));
    }

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!("Active".parse::<JobStatus>().unwrap(), JobStatus::Active);
        assert_eq!(" hired ".parse::<ApplicationStatus>().unwrap(), ApplicationStatus::Hired);
        assert!("closed".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        let err = DateRange::new(date(2024, 3, 2), date(2024, 3, 1)).unwrap_err();
        assert_eq!(err.code(), "E001");
    }

    #[test]
    fn test_date_range_last_days() {
        let range = DateRange::last_days(date(2024, 3, 7), 7).unwrap();
        assert_eq!(range.start(), date(2024, 3, 1));
        assert_eq!(range.num_days(), 7);
        assert_eq!(range.days().last(), Some(date(2024, 3, 7)));
        assert!(DateRange::last_days(date(2024, 3, 7), 0).is_err());
    }

    #[test]
    fn test_date_range_last_days_overflow_is_an_error() {
        let err = DateRange::last_days(date(2024, 3, 7), u32::MAX).unwrap_err();
        assert_eq!(err.code(), "E001");
    }

    #[test]
    fn test_date_range_single_day() {
        let range = DateRange::new(date(2024, 2, 29), date(2024, 2, 29)).unwrap();
        assert_eq!(range.num_days(), 1);
        assert!(range.contains(date(2024, 2, 29)));
        assert!(!range.contains(date(2024, 3, 1)));
    }
}
