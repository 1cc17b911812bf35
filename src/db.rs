use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analytics::EventSource;
use crate::error::BoardError;
use crate::models::{ApplicationStatus, Event, EventFilter, EventKind, Job, JobFilter, JobId, JobStatus, NewJob};

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        debug!("Opened database at {}", path.display());
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                company TEXT NOT NULL,
                job_type TEXT,
                industry TEXT,
                status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'active', 'rejected', 'removed', 'archived')),
                deadline TEXT,
                url TEXT,
                description TEXT,
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS job_views (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id INTEGER NOT NULL REFERENCES jobs(id),
                actor_id TEXT,
                occurred_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS link_clicks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id INTEGER NOT NULL REFERENCES jobs(id),
                actor_id TEXT NOT NULL,
                occurred_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS saved_jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id INTEGER NOT NULL REFERENCES jobs(id),
                actor_id TEXT NOT NULL,
                saved_at TEXT NOT NULL,
                UNIQUE (job_id, actor_id)
            );

            CREATE TABLE IF NOT EXISTS applications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id INTEGER NOT NULL REFERENCES jobs(id),
                actor_id TEXT NOT NULL,
                applied_at TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'applied' CHECK (status IN ('applied', 'viewed', 'interview', 'hired', 'rejected')),
                UNIQUE (job_id, actor_id)
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
            CREATE INDEX IF NOT EXISTS idx_jobs_created_by ON jobs(created_by);
            CREATE INDEX IF NOT EXISTS idx_views_job_time ON job_views(job_id, occurred_at);
            CREATE INDEX IF NOT EXISTS idx_clicks_job_time ON link_clicks(job_id, occurred_at);
            CREATE INDEX IF NOT EXISTS idx_saves_job_time ON saved_jobs(job_id, saved_at);
            CREATE INDEX IF NOT EXISTS idx_applications_job_time ON applications(job_id, applied_at);
            "#,
        )?;
        info!("Initialized schema at {}", self.path.display());
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='jobs'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!("Database not initialized. Run 'careerboard init' first."));
        }
        Ok(())
    }

    // --- Job operations ---

    pub fn add_job(&self, job: &NewJob, created_at: DateTime<Utc>) -> Result<JobId> {
        for (field, value) in [("title", &job.title), ("company", &job.company), ("poster", &job.created_by)] {
            if value.trim().is_empty() {
                return Err(BoardError::validation(format!("Job {} must not be empty", field)).into());
            }
        }

        self.conn.execute(
            "INSERT INTO jobs (title, company, job_type, industry, status, deadline, url, description, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                job.title.trim(),
                job.company.trim(),
                job.job_type,
                job.industry,
                JobStatus::Pending,
                job.deadline,
                job.url,
                job.description,
                job.created_by,
                created_at,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!("Job #{} '{}' submitted by {}", id, job.title, job.created_by);
        Ok(id)
    }

    pub fn get_job(&self, id: JobId) -> Result<Option<Job>> {
        self.conn
            .query_row(
                "SELECT id, title, company, job_type, industry, status, deadline, url, description, created_by, created_at
                 FROM jobs WHERE id = ?1",
                [id],
                Self::row_to_job,
            )
            .optional()
            .context("Failed to load job")
    }

    fn require_job(&self, id: JobId) -> Result<Job> {
        self.get_job(id)?
            .ok_or_else(|| BoardError::not_found(format!("Job #{} not found", id)).into())
    }

    pub fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let mut sql = String::from(
            "SELECT id, title, company, job_type, industry, status, deadline, url, description, created_by, created_at
             FROM jobs WHERE 1=1",
        );
        let mut values: Vec<Box<dyn ToSql>> = vec![];

        if let Some(status) = filter.status {
            sql.push_str(&format!(" AND status = ?{}", values.len() + 1));
            values.push(Box::new(status));
        }

        if let Some(poster) = &filter.created_by {
            sql.push_str(&format!(" AND created_by = ?{}", values.len() + 1));
            values.push(Box::new(poster.clone()));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), Self::row_to_job)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list jobs")
    }

    /// Apply a moderation decision. Returns the job as it now stands.
    pub fn set_job_status(&self, id: JobId, next: JobStatus) -> Result<Job> {
        let job = self.require_job(id)?;
        if !job.status.can_transition_to(next) {
            return Err(BoardError::invalid_transition(format!(
                "Job #{} cannot move from {} to {}",
                id, job.status, next
            ))
            .into());
        }

        self.conn
            .execute("UPDATE jobs SET status = ?1 WHERE id = ?2", params![next, id])?;
        info!("Job #{} moved from {} to {}", id, job.status, next);

        Ok(Job { status: next, ..job })
    }

    /// Archive every active job whose deadline is before `today`.
    pub fn expire_jobs(&self, today: NaiveDate) -> Result<usize> {
        let expired = self.conn.execute(
            "UPDATE jobs SET status = ?1
             WHERE status = ?2 AND deadline IS NOT NULL AND deadline < ?3",
            params![JobStatus::Archived, JobStatus::Active, today],
        )?;
        if expired > 0 {
            info!("Archived {} job(s) past their deadline", expired);
        }
        Ok(expired)
    }

    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<Job> {
        Ok(Job {
            id: row.get(0)?,
            title: row.get(1)?,
            company: row.get(2)?,
            job_type: row.get(3)?,
            industry: row.get(4)?,
            status: row.get(5)?,
            deadline: row.get(6)?,
            url: row.get(7)?,
            description: row.get(8)?,
            created_by: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    // --- Event operations ---

    pub fn record_view(&self, job_id: JobId, actor: Option<&str>, at: DateTime<Utc>) -> Result<()> {
        self.require_job(job_id)?;
        self.conn.execute(
            "INSERT INTO job_views (job_id, actor_id, occurred_at) VALUES (?1, ?2, ?3)",
            params![job_id, actor, at],
        )?;
        debug!("View of job #{} by {:?}", job_id, actor);
        Ok(())
    }

    /// Log an apply-link click and hand back the link to follow.
    pub fn record_click(&self, job_id: JobId, actor: &str, at: DateTime<Utc>) -> Result<Option<String>> {
        require_actor(actor)?;
        let job = self.require_job(job_id)?;
        self.conn.execute(
            "INSERT INTO link_clicks (job_id, actor_id, occurred_at) VALUES (?1, ?2, ?3)",
            params![job_id, actor, at],
        )?;
        debug!("Click on job #{} by {}", job_id, actor);
        Ok(job.url)
    }

    /// Save or unsave. Returns whether the job is saved afterwards.
    pub fn toggle_save(&self, job_id: JobId, actor: &str, at: DateTime<Utc>) -> Result<bool> {
        require_actor(actor)?;
        self.require_job(job_id)?;

        let removed = self.conn.execute(
            "DELETE FROM saved_jobs WHERE job_id = ?1 AND actor_id = ?2",
            params![job_id, actor],
        )?;
        if removed > 0 {
            debug!("Job #{} unsaved by {}", job_id, actor);
            return Ok(false);
        }

        self.conn.execute(
            "INSERT INTO saved_jobs (job_id, actor_id, saved_at) VALUES (?1, ?2, ?3)",
            params![job_id, actor, at],
        )?;
        debug!("Job #{} saved by {}", job_id, actor);
        Ok(true)
    }

    pub fn record_application(&self, job_id: JobId, actor: &str, at: DateTime<Utc>) -> Result<()> {
        require_actor(actor)?;
        let job = self.require_job(job_id)?;
        if job.status != JobStatus::Active {
            return Err(BoardError::validation(format!(
                "Job #{} is {} and not accepting applications",
                job_id, job.status
            ))
            .into());
        }

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO applications (job_id, actor_id, applied_at, status) VALUES (?1, ?2, ?3, ?4)",
            params![job_id, actor, at, ApplicationStatus::Applied],
        )?;
        if inserted == 0 {
            return Err(BoardError::validation(format!("{} already applied to job #{}", actor, job_id)).into());
        }
        info!("{} applied to job #{}", actor, job_id);
        Ok(())
    }

    pub fn set_application_status(&self, job_id: JobId, actor: &str, next: ApplicationStatus) -> Result<()> {
        let current: ApplicationStatus = self
            .conn
            .query_row(
                "SELECT status FROM applications WHERE job_id = ?1 AND actor_id = ?2",
                params![job_id, actor],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| BoardError::not_found(format!("No application by {} for job #{}", actor, job_id)))?;

        if !current.can_transition_to(next) {
            bail!(BoardError::invalid_transition(format!(
                "Application cannot move from {} to {}",
                current, next
            )));
        }

        self.conn.execute(
            "UPDATE applications SET status = ?1 WHERE job_id = ?2 AND actor_id = ?3",
            params![next, job_id, actor],
        )?;
        info!("Application by {} for job #{} moved to {}", actor, job_id, next);
        Ok(())
    }

    pub fn fetch_events(&self, kind: EventKind, filter: &EventFilter) -> Result<Vec<Event>> {
        let (table, time_col, status_col) = match kind {
            EventKind::JobView => ("job_views", "occurred_at", "NULL"),
            EventKind::LinkClick => ("link_clicks", "occurred_at", "NULL"),
            EventKind::Save => ("saved_jobs", "saved_at", "NULL"),
            EventKind::Application => ("applications", "applied_at", "status"),
        };

        let mut sql = format!(
            "SELECT job_id, actor_id, {time}, {status} FROM {table} WHERE 1=1",
            time = time_col,
            status = status_col,
            table = table
        );
        let mut values: Vec<Box<dyn ToSql>> = vec![];

        if let Some(range) = filter.date_range {
            let from = range.start().and_time(chrono::NaiveTime::MIN).and_utc();
            sql.push_str(&format!(" AND {} >= ?{}", time_col, values.len() + 1));
            values.push(Box::new(from));
            // No upper bound when the range ends on the last representable day
            if let Some(next_day) = range.end().checked_add_days(chrono::Days::new(1)) {
                let until = next_day.and_time(chrono::NaiveTime::MIN).and_utc();
                sql.push_str(&format!(" AND {} < ?{}", time_col, values.len() + 1));
                values.push(Box::new(until));
            }
        }

        if let Some(ids) = &filter.job_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders: Vec<String> = (0..ids.len())
                .map(|i| format!("?{}", values.len() + i + 1))
                .collect();
            sql.push_str(&format!(" AND job_id IN ({})", placeholders.join(", ")));
            for id in ids {
                values.push(Box::new(*id));
            }
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(Event {
                kind,
                job_id: row.get(0)?,
                actor_id: row.get(1)?,
                occurred_at: row.get(2)?,
                application_status: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to fetch {} events", kind))
    }
}

impl EventSource for Database {
    fn fetch_events(&self, kind: EventKind, filter: &EventFilter) -> Result<Vec<Event>> {
        Database::fetch_events(self, kind, filter)
    }

    fn fetch_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        self.list_jobs(filter)
    }
}

fn require_actor(actor: &str) -> Result<()> {
    if actor.trim().is_empty() {
        bail!(BoardError::validation("An acting user is required"));
    }
    Ok(())
}

impl ToSql for JobStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for JobStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: BoardError| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for ApplicationStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for ApplicationStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: BoardError| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{RankMetric, ReportRequest, build_report};
    use crate::models::DateRange;
    use chrono::TimeZone;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        db
    }

    fn posting(title: &str, poster: &str, deadline: Option<NaiveDate>) -> NewJob {
        NewJob {
            title: title.to_string(),
            company: "Acme Corp".to_string(),
            job_type: Some("internship".to_string()),
            industry: Some("Engineering".to_string()),
            deadline,
            url: Some("https://acme.example/apply".to_string()),
            description: None,
            created_by: poster.to_string(),
        }
    }

    fn active_job(db: &Database, title: &str, poster: &str) -> JobId {
        let id = db.add_job(&posting(title, poster, None), at(1, 8)).unwrap();
        db.set_job_status(id, JobStatus::Active).unwrap();
        id
    }

    fn board_error(err: &anyhow::Error) -> &BoardError {
        err.downcast_ref::<BoardError>().expect("expected a BoardError")
    }

    #[test]
    fn test_ensure_initialized_before_init() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.ensure_initialized().is_err());
        db.init().unwrap();
        assert!(db.ensure_initialized().is_ok());
    }

    #[test]
    fn test_open_on_disk_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("board.db");
        let db = Database::open(&path).unwrap();
        db.init().unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), &path);
    }

    #[test]
    fn test_add_job_starts_pending() {
        let db = setup();
        let id = db.add_job(&posting("Data Analyst Intern", "rep-1", Some(date(20))), at(1, 8)).unwrap();
        let job = db.get_job(id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.deadline, Some(date(20)));
        assert_eq!(job.created_at, at(1, 8));
        assert!(db.get_job(id + 1).unwrap().is_none());
    }

    #[test]
    fn test_add_job_requires_title() {
        let db = setup();
        let err = db.add_job(&posting("  ", "rep-1", None), at(1, 8)).unwrap_err();
        assert_eq!(board_error(&err).code(), "E004");
    }

    #[test]
    fn test_list_jobs_filters() {
        let db = setup();
        let a = active_job(&db, "Analyst", "rep-1");
        db.add_job(&posting("Engineer", "rep-2", None), at(2, 8)).unwrap();
        db.add_job(&posting("Designer", "rep-1", None), at(3, 8)).unwrap();

        assert_eq!(db.list_jobs(&JobFilter::default()).unwrap().len(), 3);

        let active = db
            .list_jobs(&JobFilter {
                status: Some(JobStatus::Active),
                created_by: None,
            })
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, a);

        let mine = db
            .list_jobs(&JobFilter {
                status: Some(JobStatus::Pending),
                created_by: Some("rep-1".to_string()),
            })
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "Designer");
    }

    #[test]
    fn test_moderation_rejects_invalid_transition() {
        let db = setup();
        let id = db.add_job(&posting("Analyst", "rep-1", None), at(1, 8)).unwrap();

        let err = db.set_job_status(id, JobStatus::Archived).unwrap_err();
        assert_eq!(board_error(&err).code(), "E002");

        db.set_job_status(id, JobStatus::Rejected).unwrap();
        let job = db.set_job_status(id, JobStatus::Active).unwrap();
        assert_eq!(job.status, JobStatus::Active);

        let err = db.set_job_status(999, JobStatus::Active).unwrap_err();
        assert_eq!(board_error(&err).code(), "E003");
    }

    #[test]
    fn test_expire_jobs_only_archives_past_deadline_active_jobs() {
        let db = setup();
        let past = db.add_job(&posting("Past", "rep-1", Some(date(4))), at(1, 8)).unwrap();
        let today = db.add_job(&posting("Today", "rep-1", Some(date(5))), at(1, 8)).unwrap();
        let pending = db.add_job(&posting("Pending", "rep-1", Some(date(2))), at(1, 8)).unwrap();
        let open = db.add_job(&posting("Open", "rep-1", None), at(1, 8)).unwrap();
        for id in [past, today, open] {
            db.set_job_status(id, JobStatus::Active).unwrap();
        }

        assert_eq!(db.expire_jobs(date(5)).unwrap(), 1);

        let status = |id| db.get_job(id).unwrap().unwrap().status;
        assert_eq!(status(past), JobStatus::Archived);
        assert_eq!(status(today), JobStatus::Active);
        assert_eq!(status(pending), JobStatus::Pending);
        assert_eq!(status(open), JobStatus::Active);
    }

    #[test]
    fn test_toggle_save() {
        let db = setup();
        let id = active_job(&db, "Analyst", "rep-1");

        assert!(db.toggle_save(id, "student-1", at(2, 9)).unwrap());
        assert_eq!(db.fetch_events(EventKind::Save, &EventFilter::default()).unwrap().len(), 1);

        assert!(!db.toggle_save(id, "student-1", at(2, 10)).unwrap());
        assert!(db.fetch_events(EventKind::Save, &EventFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_application_rules() {
        let db = setup();
        let id = active_job(&db, "Analyst", "rep-1");
        let pending = db.add_job(&posting("Later", "rep-1", None), at(1, 8)).unwrap();

        db.record_application(id, "student-1", at(3, 9)).unwrap();
        let err = db.record_application(id, "student-1", at(3, 10)).unwrap_err();
        assert_eq!(board_error(&err).code(), "E004");

        let err = db.record_application(pending, "student-1", at(3, 9)).unwrap_err();
        assert_eq!(board_error(&err).code(), "E004");

        db.set_application_status(id, "student-1", ApplicationStatus::Interview).unwrap();
        let err = db
            .set_application_status(id, "student-1", ApplicationStatus::Viewed)
            .unwrap_err();
        assert_eq!(board_error(&err).code(), "E002");

        let apps = db.fetch_events(EventKind::Application, &EventFilter::default()).unwrap();
        assert_eq!(apps[0].application_status, Some(ApplicationStatus::Interview));
    }

    #[test]
    fn test_click_returns_apply_link_and_requires_actor() {
        let db = setup();
        let id = active_job(&db, "Analyst", "rep-1");
        let url = db.record_click(id, "student-1", at(2, 9)).unwrap();
        assert_eq!(url.as_deref(), Some("https://acme.example/apply"));
        assert!(db.record_click(id, "", at(2, 9)).is_err());
    }

    #[test]
    fn test_fetch_events_range_includes_boundary_days() {
        let db = setup();
        let id = active_job(&db, "Analyst", "rep-1");
        db.record_view(id, None, at(1, 23)).unwrap();
        db.record_view(id, Some("s1"), at(2, 0)).unwrap();
        db.record_view(id, Some("s1"), Utc.with_ymd_and_hms(2024, 3, 4, 23, 59, 59).unwrap()).unwrap();
        db.record_view(id, Some("s2"), at(5, 0)).unwrap();

        let filter = EventFilter {
            date_range: Some(DateRange::new(date(2), date(4)).unwrap()),
            job_ids: None,
        };
        let views = db.fetch_events(EventKind::JobView, &filter).unwrap();
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| v.kind == EventKind::JobView));
    }

    #[test]
    fn test_fetch_events_by_job_ids() {
        let db = setup();
        let a = active_job(&db, "Analyst", "rep-1");
        let b = active_job(&db, "Engineer", "rep-2");
        db.record_view(a, Some("s1"), at(2, 9)).unwrap();
        db.record_view(b, Some("s1"), at(2, 9)).unwrap();
        db.record_view(b, Some("s2"), at(2, 9)).unwrap();

        let only_b = EventFilter {
            date_range: None,
            job_ids: Some(vec![b]),
        };
        assert_eq!(db.fetch_events(EventKind::JobView, &only_b).unwrap().len(), 2);

        let none = EventFilter {
            date_range: None,
            job_ids: Some(vec![]),
        };
        assert!(db.fetch_events(EventKind::JobView, &none).unwrap().is_empty());
    }

    #[test]
    fn test_fetch_events_range_ending_on_last_representable_day() {
        let db = setup();
        let filter = EventFilter {
            date_range: Some(DateRange::new(NaiveDate::MAX, NaiveDate::MAX).unwrap()),
            job_ids: None,
        };
        assert!(db.fetch_events(EventKind::JobView, &filter).unwrap().is_empty());
    }

    #[test]
    fn test_report_built_from_store() {
        let db = setup();
        let a = active_job(&db, "Analyst", "rep-1");
        let b = active_job(&db, "Engineer", "rep-2");
        db.add_job(&posting("Unreviewed", "rep-1", None), at(2, 8)).unwrap();

        db.record_view(a, Some("s1"), at(2, 9)).unwrap();
        db.record_view(a, Some("s2"), at(3, 9)).unwrap();
        db.record_view(a, None, at(3, 10)).unwrap();
        db.record_view(b, Some("s3"), at(3, 11)).unwrap();
        db.record_view(a, Some("s4"), at(9, 9)).unwrap(); // outside range
        db.record_click(a, "s1", at(3, 12)).unwrap();
        db.record_click(b, "s3", at(4, 12)).unwrap();
        db.toggle_save(a, "s2", at(3, 13)).unwrap();
        db.record_application(a, "s1", at(4, 9)).unwrap();

        let request = |poster: Option<&str>| ReportRequest {
            range: DateRange::new(date(1), date(7)).unwrap(),
            created_by: poster.map(str::to_string),
            metric: RankMetric::Score,
            limit: 10,
            as_of: at(8, 0),
        };

        let report = build_report(&db, &request(None)).unwrap();
        assert_eq!((report.totals.views.total, report.totals.views.unique), (4, 3));
        assert_eq!((report.totals.clicks.total, report.totals.clicks.unique), (2, 2));
        assert_eq!(report.totals.saves, 1);
        assert_eq!(report.totals.applications, 1);
        let views: Vec<u64> = report.trends.views.iter().map(|d| d.count).collect();
        assert_eq!(views, vec![0, 1, 2, 0, 0, 0, 0]);
        let ids: Vec<JobId> = report.leaderboard.iter().map(|e| e.job_id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(report.funnel.view_to_click, 50.0);
        assert_eq!(report.funnel.overall, 25.0);

        let scoped = build_report(&db, &request(Some("rep-2"))).unwrap();
        assert_eq!(scoped.totals.jobs, 1);
        assert_eq!(scoped.totals.views.total, 1);
        assert_eq!(scoped.totals.clicks.total, 1);
        assert_eq!(scoped.totals.applications, 0);
        let ids: Vec<JobId> = scoped.leaderboard.iter().map(|e| e.job_id).collect();
        assert_eq!(ids, vec![b]);
    }

    #[test]
    fn test_view_of_missing_job_is_not_found() {
        let db = setup();
        let err = db.record_view(42, None, at(2, 9)).unwrap_err();
        assert_eq!(board_error(&err).code(), "E003");
    }
}
