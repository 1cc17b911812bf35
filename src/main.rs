use anyhow::{Context, Result};
use careerboard::analytics::{DailyCount, EngagementReport, RankMetric, ReportRequest, build_report};
use careerboard::config::{Config, LogConfig};
use careerboard::db::Database;
use careerboard::models::{ApplicationStatus, DateRange, JobFilter, JobId, JobStatus, NewJob};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "careerboard")]
#[command(about = "Career-services job board - post, moderate, track and analyze job engagement")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Post and moderate jobs
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Record student engagement
    Track {
        #[command(subcommand)]
        command: TrackCommands,
    },

    /// Engagement analytics
    Report {
        /// Which part of the report to show
        #[arg(value_enum, default_value = "summary")]
        view: ReportView,

        #[command(flatten)]
        args: ReportArgs,
    },
}

#[derive(Subcommand)]
enum JobCommands {
    /// Submit a job for moderation
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        company: String,

        /// Poster (representative or faculty) id
        #[arg(long)]
        poster: String,

        /// Job type (full-time, part-time, internship, co-op)
        #[arg(long = "type")]
        job_type: Option<String>,

        #[arg(long)]
        industry: Option<String>,

        /// Application deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<NaiveDate>,

        /// External apply link
        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// List jobs
    List {
        /// Filter by status (pending, active, rejected, removed, archived)
        #[arg(short, long)]
        status: Option<JobStatus>,

        /// Filter by poster
        #[arg(short, long)]
        poster: Option<String>,
    },

    /// Show job details
    Show {
        /// Job ID
        id: JobId,
    },

    /// Approve a pending or rejected job
    Approve { id: JobId },

    /// Reject a pending job
    Reject { id: JobId },

    /// Take an active job down
    Remove { id: JobId },

    /// Archive an active job
    Archive { id: JobId },

    /// Archive active jobs whose deadline has passed
    Expire {
        /// Treat this date as today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum TrackCommands {
    /// Record a job detail view
    View {
        job_id: JobId,

        /// Viewer id; omit for anonymous views
        #[arg(short, long)]
        actor: Option<String>,
    },

    /// Record an apply-link click
    Click {
        job_id: JobId,

        #[arg(short, long)]
        actor: String,
    },

    /// Save a job, or unsave it if already saved
    Save {
        job_id: JobId,

        #[arg(short, long)]
        actor: String,
    },

    /// Record an application
    Apply {
        job_id: JobId,

        #[arg(short, long)]
        actor: String,
    },

    /// Update an application's review status
    Status {
        job_id: JobId,

        #[arg(short, long)]
        actor: String,

        /// New status (viewed, interview, hired, rejected)
        #[arg(short, long)]
        status: ApplicationStatus,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportView {
    Summary,
    Trends,
    Leaderboard,
    Funnel,
}

#[derive(Args)]
struct ReportArgs {
    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD), defaults to today
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Range length in days when --from is not given
    #[arg(short, long)]
    days: Option<u32>,

    /// Only this poster's jobs
    #[arg(short, long)]
    poster: Option<String>,

    /// Ranking metric (score, clicks, saves)
    #[arg(short, long, default_value = "score")]
    metric: RankMetric,

    /// Number of leaderboard entries
    #[arg(short, long)]
    limit: Option<usize>,

    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_range(args: &ReportArgs, default_days: u32, today: NaiveDate) -> Result<DateRange> {
    let days = args.days.unwrap_or(default_days);
    let range = match (args.from, args.to) {
        (Some(from), Some(to)) => DateRange::new(from, to)?,
        (Some(from), None) => DateRange::new(from, today)?,
        (None, Some(to)) => DateRange::last_days(to, days)?,
        (None, None) => DateRange::last_days(today, days)?,
    };
    Ok(range)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_logging(&config.log);

    let db = Database::open(&config.database_path())?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::Job { command } => {
            db.ensure_initialized()?;
            run_job_command(&db, command)?;
        }

        Commands::Track { command } => {
            db.ensure_initialized()?;
            run_track_command(&db, command)?;
        }

        Commands::Report { view, args } => {
            db.ensure_initialized()?;
            let now = Utc::now();
            let request = ReportRequest {
                range: resolve_range(&args, config.analytics.default_range_days, now.date_naive())?,
                created_by: args.poster.clone(),
                metric: args.metric,
                limit: args.limit.unwrap_or(config.analytics.leaderboard_size),
                as_of: now,
            };
            let report = build_report(&db, &request)?;
            if args.json {
                print_report_json(&report, view)?;
            } else {
                print_report(&report, view);
            }
        }
    }

    Ok(())
}

fn run_job_command(db: &Database, command: JobCommands) -> Result<()> {
    match command {
        JobCommands::Add {
            title,
            company,
            poster,
            job_type,
            industry,
            deadline,
            url,
            description,
        } => {
            let job = NewJob {
                title,
                company,
                job_type,
                industry,
                deadline,
                url,
                description,
                created_by: poster,
            };
            let id = db.add_job(&job, Utc::now())?;
            println!("Submitted job #{} for moderation", id);
        }

        JobCommands::List { status, poster } => {
            let jobs = db.list_jobs(&JobFilter {
                status,
                created_by: poster,
            })?;
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!(
                    "{:<6} {:<10} {:<30} {:<20} {:<12} {:>10}",
                    "ID", "STATUS", "TITLE", "COMPANY", "TYPE", "DEADLINE"
                );
                println!("{}", "-".repeat(93));
                for job in jobs {
                    let deadline = job
                        .deadline
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<6} {:<10} {:<30} {:<20} {:<12} {:>10}",
                        job.id,
                        job.status,
                        truncate(&job.title, 28),
                        truncate(&job.company, 18),
                        truncate(job.job_type.as_deref().unwrap_or("-"), 10),
                        deadline
                    );
                }
            }
        }

        JobCommands::Show { id } => match db.get_job(id)? {
            Some(job) => {
                println!("Job #{}", job.id);
                println!("Title: {}", job.title);
                println!("Company: {}", job.company);
                println!("Status: {}", job.status);
                if let Some(job_type) = &job.job_type {
                    println!("Type: {}", job_type);
                }
                if let Some(industry) = &job.industry {
                    println!("Industry: {}", industry);
                }
                if let Some(deadline) = job.deadline {
                    println!("Deadline: {}", deadline);
                }
                if let Some(url) = &job.url {
                    println!("Apply: {}", url);
                }
                println!("Posted by: {}", job.created_by);
                println!("Created: {}", job.created_at.format("%Y-%m-%d %H:%M"));
                if let Some(description) = &job.description {
                    println!("\n{}", textwrap::fill(description, 80));
                }
            }
            None => {
                println!("Job #{} not found.", id);
            }
        },

        JobCommands::Approve { id } => moderate(db, id, JobStatus::Active)?,
        JobCommands::Reject { id } => moderate(db, id, JobStatus::Rejected)?,
        JobCommands::Remove { id } => moderate(db, id, JobStatus::Removed)?,
        JobCommands::Archive { id } => moderate(db, id, JobStatus::Archived)?,

        JobCommands::Expire { today } => {
            let today = today.unwrap_or_else(|| Utc::now().date_naive());
            let expired = db.expire_jobs(today)?;
            println!("Archived {} job(s) past their deadline.", expired);
        }
    }

    Ok(())
}

fn moderate(db: &Database, id: JobId, status: JobStatus) -> Result<()> {
    let job = db.set_job_status(id, status)?;
    println!("Job #{} '{}' is now {}.", job.id, job.title, job.status);
    Ok(())
}

fn run_track_command(db: &Database, command: TrackCommands) -> Result<()> {
    let now = Utc::now();
    match command {
        TrackCommands::View { job_id, actor } => {
            db.record_view(job_id, actor.as_deref(), now)?;
            println!("Recorded view of job #{}", job_id);
        }

        TrackCommands::Click { job_id, actor } => match db.record_click(job_id, &actor, now)? {
            Some(url) => println!("Recorded click on job #{} -> {}", job_id, url),
            None => println!("Recorded click on job #{} (no apply link)", job_id),
        },

        TrackCommands::Save { job_id, actor } => {
            if db.toggle_save(job_id, &actor, now)? {
                println!("Saved job #{} for {}", job_id, actor);
            } else {
                println!("Removed job #{} from {}'s saved jobs", job_id, actor);
            }
        }

        TrackCommands::Apply { job_id, actor } => {
            db.record_application(job_id, &actor, now)?;
            println!("Recorded application by {} to job #{}", actor, job_id);
        }

        TrackCommands::Status { job_id, actor, status } => {
            db.set_application_status(job_id, &actor, status)
                .with_context(|| format!("Failed to update application by {} for job #{}", actor, job_id))?;
            println!("Application by {} for job #{} is now {}", actor, job_id, status);
        }
    }

    Ok(())
}

fn print_report_json(report: &EngagementReport, view: ReportView) -> Result<()> {
    fn dump<T: Serialize>(value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    match view {
        ReportView::Summary => dump(report),
        ReportView::Trends => dump(&report.trends),
        ReportView::Leaderboard => dump(&report.leaderboard),
        ReportView::Funnel => dump(&report.funnel),
    }
}

fn print_report(report: &EngagementReport, view: ReportView) {
    println!(
        "Engagement {} to {}{}",
        report.range.start(),
        report.range.end(),
        report
            .created_by
            .as_ref()
            .map(|p| format!(" (jobs posted by {})", p))
            .unwrap_or_default()
    );
    println!();

    match view {
        ReportView::Summary => {
            print_totals(report);
            println!();
            print_funnel(report);
            println!();
            print_leaderboard(report);
        }
        ReportView::Trends => print_trends(report),
        ReportView::Leaderboard => print_leaderboard(report),
        ReportView::Funnel => print_funnel(report),
    }
}

fn print_totals(report: &EngagementReport) {
    let totals = &report.totals;
    println!("Jobs:          {}", totals.jobs);
    println!("Views:         {} ({} unique)", totals.views.total, totals.views.unique);
    println!("Clicks:        {} ({} unique)", totals.clicks.total, totals.clicks.unique);
    println!("Saves:         {}", totals.saves);
    println!("Applications:  {}", totals.applications);
}

fn print_funnel(report: &EngagementReport) {
    let funnel = &report.funnel;
    println!("Funnel: {} views -> {} clicks -> {} applications", funnel.views, funnel.clicks, funnel.completions);
    println!("  view -> click:         {:>7.1}%", funnel.view_to_click);
    println!("  click -> application:  {:>7.1}%", funnel.click_to_completion);
    println!("  overall:               {:>7.1}%", funnel.overall);
}

fn print_leaderboard(report: &EngagementReport) {
    if report.leaderboard.is_empty() {
        println!("No jobs to rank.");
        return;
    }
    println!(
        "{:<5} {:<6} {:<25} {:<18} {:>7} {:>7} {:>6} {:>9}",
        "RANK", "ID", "TITLE", "COMPANY", "VIEWS", "CLICKS", "SAVES", "SCORE"
    );
    println!("{}", "-".repeat(90));
    for entry in &report.leaderboard {
        println!(
            "{:<5} {:<6} {:<25} {:<18} {:>7} {:>7} {:>6} {:>9.1}",
            entry.rank,
            entry.job_id,
            truncate(&entry.title, 23),
            truncate(&entry.company, 16),
            entry.unique_views,
            entry.unique_clicks,
            entry.saves,
            entry.score
        );
    }
}

fn print_trends(report: &EngagementReport) {
    let trends = &report.trends;
    println!("{:<12} {:>7} {:>7} {:>7} {:>8}", "DATE", "VIEWS", "CLICKS", "APPLIED", "POSTED");
    println!("{}", "-".repeat(45));
    let rows = trends
        .views
        .iter()
        .zip(&trends.clicks)
        .zip(&trends.applications)
        .zip(&trends.postings);
    for (((views, clicks), applications), postings) in rows {
        println!(
            "{:<12} {:>7} {:>7} {:>7} {:>8}",
            views.date, views.count, clicks.count, applications.count, postings.count
        );
    }
    println!("{}", "-".repeat(45));
    println!(
        "{:<12} {:>7} {:>7} {:>7} {:>8}",
        "TOTAL",
        sum(&trends.views),
        sum(&trends.clicks),
        sum(&trends.applications),
        sum(&trends.postings)
    );
}

fn sum(series: &[DailyCount]) -> u64 {
    series.iter().map(|d| d.count).sum()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
