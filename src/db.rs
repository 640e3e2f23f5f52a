use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    AssessmentType, ProjectType, Violation, Window, WindowDraft, WindowType, PROJECT_TYPES,
};
use crate::rules;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM window_scheduler.project_windows")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(0);
    }

    let plan: [(WindowType, Option<AssessmentType>, (i32, u32, u32), (i32, u32, u32)); 11] = [
        (WindowType::Proposal, None, (2025, 8, 1), (2025, 8, 15)),
        (WindowType::Application, None, (2025, 8, 18), (2025, 8, 31)),
        (
            WindowType::Submission,
            Some(AssessmentType::Cla1),
            (2025, 9, 15),
            (2025, 9, 30),
        ),
        (
            WindowType::Assessment,
            Some(AssessmentType::Cla1),
            (2025, 10, 1),
            (2025, 10, 10),
        ),
        (
            WindowType::Submission,
            Some(AssessmentType::Cla2),
            (2025, 11, 3),
            (2025, 11, 14),
        ),
        (
            WindowType::Assessment,
            Some(AssessmentType::Cla2),
            (2025, 11, 17),
            (2025, 11, 26),
        ),
        (
            WindowType::Submission,
            Some(AssessmentType::Cla3),
            (2026, 1, 5),
            (2026, 1, 20),
        ),
        (
            WindowType::Assessment,
            Some(AssessmentType::Cla3),
            (2026, 1, 21),
            (2026, 1, 30),
        ),
        (
            WindowType::Submission,
            Some(AssessmentType::External),
            (2026, 3, 2),
            (2026, 3, 13),
        ),
        (
            WindowType::Assessment,
            Some(AssessmentType::External),
            (2026, 3, 16),
            (2026, 3, 31),
        ),
        (WindowType::GradeRelease, None, (2026, 4, 15), (2026, 4, 30)),
    ];

    let mut inserted = 0usize;
    for (position, project_type) in PROJECT_TYPES.iter().enumerate() {
        // stagger the three programmes a week apart
        let offset = Duration::days(7 * position as i64);
        for (window_type, assessment_type, start, end) in plan {
            let window = Window {
                id: Uuid::new_v4(),
                project_type: *project_type,
                window_type,
                assessment_type,
                start_at: day_start(start)? + offset,
                end_at: day_end(end)? + offset,
            };
            insert_window(pool, &window).await?;
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn fetch_windows(
    pool: &PgPool,
    project: Option<ProjectType>,
) -> anyhow::Result<Vec<Window>> {
    let mut query = String::from(
        "SELECT id, project_type, window_type, assessment_type, start_at, end_at \
         FROM window_scheduler.project_windows",
    );
    if project.is_some() {
        query.push_str(" WHERE project_type = $1");
    }
    query.push_str(" ORDER BY start_at, end_at");

    let mut rows = sqlx::query(&query);
    if let Some(value) = project {
        rows = rows.bind(value.to_string());
    }

    let records = rows.fetch_all(pool).await?;
    let mut windows = Vec::new();

    for row in records {
        windows.push(window_from_row(&row)?);
    }

    Ok(windows)
}

pub async fn insert_window(pool: &PgPool, window: &Window) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO window_scheduler.project_windows
        (id, project_type, window_type, assessment_type, start_at, end_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(window.id)
    .bind(window.project_type.to_string())
    .bind(window.window_type.to_string())
    .bind(window.assessment_type.map(|assessment| assessment.to_string()))
    .bind(window.start_at)
    .bind(window.end_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn reschedule_window(
    pool: &PgPool,
    id: Uuid,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "UPDATE window_scheduler.project_windows SET start_at = $2, end_at = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(start_at)
    .bind(end_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_window(pool: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM window_scheduler.project_windows WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub struct ImportOutcome {
    pub inserted: usize,
    pub skipped: Vec<String>,
}

pub async fn import_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<ImportOutcome> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        project_type: String,
        window_type: String,
        assessment_type: Option<String>,
        start_at: String,
        end_at: String,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut accepted = fetch_windows(pool, None).await?;
    let mut outcome = ImportOutcome {
        inserted: 0,
        skipped: Vec::new(),
    };

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 2; // line 1 is the header
        let row = result?;

        let draft = match WindowDraft::from_labels(
            &row.project_type,
            &row.window_type,
            row.assessment_type.as_deref(),
            &row.start_at,
            &row.end_at,
        ) {
            Ok(draft) => draft,
            Err(violations) => {
                outcome.skipped.push(skip_reason(line, &violations));
                continue;
            }
        };

        // rows are checked against the stored schedule plus the rows
        // already accepted from this file
        let violations = rules::evaluate(&draft, &accepted, None);
        if !violations.is_empty() {
            outcome.skipped.push(skip_reason(line, &violations));
            continue;
        }

        let window = draft.into_window(Uuid::new_v4());
        insert_window(pool, &window).await?;
        accepted.push(window);
        outcome.inserted += 1;
    }

    Ok(outcome)
}

fn skip_reason(line: usize, violations: &[Violation]) -> String {
    let reasons: Vec<&str> = violations
        .iter()
        .map(|violation| violation.message.as_str())
        .collect();
    format!("line {line}: {}", reasons.join("; "))
}

fn window_from_row(row: &PgRow) -> anyhow::Result<Window> {
    let project_type: String = row.get("project_type");
    let window_type: String = row.get("window_type");
    let assessment_type: Option<String> = row.get("assessment_type");

    Ok(Window {
        id: row.get("id"),
        project_type: project_type.parse().map_err(anyhow::Error::msg)?,
        window_type: window_type.parse().map_err(anyhow::Error::msg)?,
        assessment_type: assessment_type
            .map(|raw| raw.parse().map_err(anyhow::Error::msg))
            .transpose()?,
        start_at: row.get("start_at"),
        end_at: row.get("end_at"),
    })
}

fn day_start((year, month, day): (i32, u32, u32)) -> anyhow::Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .context("invalid date")
}

fn day_end((year, month, day): (i32, u32, u32)) -> anyhow::Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, 23, 59, 59)
        .single()
        .context("invalid date")
}
