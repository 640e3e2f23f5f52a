use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use project_window_scheduler::models::{
    kind_label, parse_end_bound, parse_start_bound, AssessmentType, ProjectType, Violation,
    WindowDraft, WindowType, DATE_FMT,
};
use project_window_scheduler::{db, report, rules};

#[derive(Parser)]
#[command(name = "window-scheduler")]
#[command(about = "Scheduling window planner for the project lifecycle portal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a realistic academic-year schedule
    Seed,
    /// Bulk-load windows from a CSV file, skipping rows that fail validation
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Pre-flight a candidate window against the stored schedule
    Check {
        #[arg(long)]
        project: String,
        #[arg(long)]
        window: String,
        #[arg(long)]
        assessment: Option<String>,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Window id to leave out of the conflict set (edit preview)
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Validate and schedule a new window
    Add {
        #[arg(long)]
        project: String,
        #[arg(long)]
        window: String,
        #[arg(long)]
        assessment: Option<String>,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Move an existing window to new dates
    Reschedule {
        #[arg(long)]
        id: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Delete a window
    Remove {
        #[arg(long)]
        id: String,
    },
    /// List the windows open at a given instant
    Open {
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        window: Option<String>,
        #[arg(long)]
        assessment: Option<String>,
        #[arg(long)]
        at: Option<String>,
    },
    /// Generate a markdown schedule report
    Report {
        #[arg(long)]
        project: Option<String>,
        #[arg(long, default_value = "schedule.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the portal's Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let inserted = db::seed(&pool).await?;
            if inserted == 0 {
                println!("Schedule already present; nothing seeded.");
            } else {
                println!("Seeded {inserted} windows.");
            }
        }
        Commands::Import { csv } => {
            let outcome = db::import_csv(&pool, &csv).await?;
            println!("Inserted {} windows from {}.", outcome.inserted, csv.display());
            if !outcome.skipped.is_empty() {
                println!("Skipped {} row(s):", outcome.skipped.len());
                for reason in &outcome.skipped {
                    println!("- {reason}");
                }
            }
        }
        Commands::Check {
            project,
            window,
            assessment,
            start,
            end,
            exclude,
        } => {
            let exclude = exclude.as_deref().map(parse_id).transpose()?;
            let windows = db::fetch_windows(&pool, None).await?;
            match WindowDraft::from_labels(&project, &window, assessment.as_deref(), &start, &end) {
                Err(violations) => print_blocked(&violations),
                Ok(draft) => {
                    let violations = rules::evaluate(&draft, &windows, exclude);
                    if violations.is_empty() {
                        println!(
                            "Allowed: {} {} from {} to {}.",
                            draft.project_type,
                            draft.kind_label(),
                            draft.start_at.format(DATE_FMT),
                            draft.end_at.format(DATE_FMT)
                        );
                    } else {
                        print_blocked(&violations);
                    }
                }
            }
        }
        Commands::Add {
            project,
            window,
            assessment,
            start,
            end,
        } => {
            let windows = db::fetch_windows(&pool, None).await?;
            match WindowDraft::from_labels(&project, &window, assessment.as_deref(), &start, &end) {
                Err(violations) => print_blocked(&violations),
                Ok(draft) => {
                    let violations = rules::evaluate(&draft, &windows, None);
                    if violations.is_empty() {
                        let window = draft.into_window(Uuid::new_v4());
                        db::insert_window(&pool, &window).await?;
                        println!(
                            "Scheduled {} {} from {} to {} (id {}).",
                            window.project_type,
                            window.kind_label(),
                            window.start_at.format(DATE_FMT),
                            window.end_at.format(DATE_FMT),
                            window.id
                        );
                    } else {
                        print_blocked(&violations);
                    }
                }
            }
        }
        Commands::Reschedule { id, start, end } => {
            let id = parse_id(&id)?;
            let windows = db::fetch_windows(&pool, None).await?;
            let Some(current) = windows.iter().find(|candidate| candidate.id == id) else {
                anyhow::bail!("no window with id {id}");
            };

            match (parse_start_bound(&start), parse_end_bound(&end)) {
                (Ok(start_at), Ok(end_at)) => {
                    let mut draft = current.draft();
                    draft.start_at = start_at;
                    draft.end_at = end_at;

                    let violations = rules::evaluate(&draft, &windows, Some(id));
                    if violations.is_empty() {
                        db::reschedule_window(&pool, id, start_at, end_at).await?;
                        println!(
                            "Rescheduled {} {}: {} to {}.",
                            draft.project_type,
                            draft.kind_label(),
                            start_at.format(DATE_FMT),
                            end_at.format(DATE_FMT)
                        );
                    } else {
                        print_blocked(&violations);
                    }
                }
                (start_result, end_result) => {
                    let violations: Vec<Violation> = [start_result.err(), end_result.err()]
                        .into_iter()
                        .flatten()
                        .collect();
                    print_blocked(&violations);
                }
            }
        }
        Commands::Remove { id } => {
            let id = parse_id(&id)?;
            if db::delete_window(&pool, id).await? {
                println!("Removed window {id}.");
            } else {
                println!("No window with id {id}.");
            }
        }
        Commands::Open {
            project,
            window,
            assessment,
            at,
        } => {
            let project = project.as_deref().map(parse_project).transpose()?;
            let window = window.as_deref().map(parse_window_type).transpose()?;
            let assessment = assessment.as_deref().map(parse_assessment).transpose()?;
            let now = match at.as_deref() {
                Some(raw) => parse_instant(raw)?,
                None => Utc::now(),
            };

            let windows = db::fetch_windows(&pool, project).await?;
            let open = rules::open_windows(&windows, project, window, assessment, now);

            if let (Some(project_type), Some(window_type)) = (project, window) {
                let status = if rules::is_open(&windows, project_type, window_type, assessment, now)
                {
                    "open"
                } else {
                    "closed"
                };
                println!(
                    "{} {} is {} at {}.",
                    project_type,
                    kind_label(window_type, assessment),
                    status,
                    now.format(DATE_FMT)
                );
            }

            if open.is_empty() {
                println!("No windows open at {}.", now.format(DATE_FMT));
            } else {
                println!("Open at {}:", now.format(DATE_FMT));
                for window in &open {
                    println!(
                        "- {} {} until {} (id {})",
                        window.project_type,
                        window.kind_label(),
                        window.end_at.format(DATE_FMT),
                        window.id
                    );
                }
                println!("{} window(s) open.", open.len());
            }
        }
        Commands::Report { project, out } => {
            let scope = project.as_deref().map(parse_project).transpose()?;
            let windows = db::fetch_windows(&pool, scope).await?;
            let scope_label = scope.map(|project| project.to_string());
            let report = report::build_report(scope_label.as_deref(), Utc::now(), &windows);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn print_blocked(violations: &[Violation]) {
    println!("Blocked:");
    for violation in violations {
        println!("- {}", violation.message);
    }
}

fn parse_id(raw: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("invalid window id '{raw}'"))
}

fn parse_project(raw: &str) -> anyhow::Result<ProjectType> {
    raw.parse().map_err(anyhow::Error::msg)
}

fn parse_window_type(raw: &str) -> anyhow::Result<WindowType> {
    raw.parse().map_err(anyhow::Error::msg)
}

fn parse_assessment(raw: &str) -> anyhow::Result<AssessmentType> {
    raw.parse().map_err(anyhow::Error::msg)
}

fn parse_instant(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    parse_start_bound(raw).map_err(|violation| anyhow::Error::msg(violation.message))
}
