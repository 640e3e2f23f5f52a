use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{Window, DATE_FMT, PROJECT_TYPES};
use crate::rules;
use crate::workflow;

pub fn build_report(scope: Option<&str>, now: DateTime<Utc>, windows: &[Window]) -> String {
    let mut output = String::new();
    let scope_label = scope.unwrap_or("all project types");

    let _ = writeln!(output, "# Project Window Schedule");
    let _ = writeln!(
        output,
        "Generated for {} at {}",
        scope_label,
        now.format(DATE_FMT)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Open Now");

    let open = rules::open_windows(windows, None, None, None, now);
    if open.is_empty() {
        let _ = writeln!(output, "No windows are open right now.");
    } else {
        for window in open.iter() {
            let _ = writeln!(
                output,
                "- {} {}: open until {}",
                window.project_type,
                window.kind_label(),
                window.end_at.format(DATE_FMT)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Schedule");

    if windows.is_empty() {
        let _ = writeln!(output, "No windows scheduled.");
    }
    for project_type in PROJECT_TYPES {
        let mut scheduled: Vec<&Window> = windows
            .iter()
            .filter(|window| window.project_type == project_type)
            .collect();
        if scheduled.is_empty() {
            continue;
        }
        scheduled.sort_by_key(|window| {
            (
                workflow::stage_index(window.window_type, window.assessment_type),
                window.start_at,
            )
        });

        let _ = writeln!(output);
        let _ = writeln!(output, "### {project_type}");
        for window in scheduled {
            let _ = writeln!(
                output,
                "- {}: {} to {} (id {})",
                window.kind_label(),
                window.start_at.format(DATE_FMT),
                window.end_at.format(DATE_FMT),
                window.id
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Anomalies");

    let mut anomalies = Vec::new();
    for window in windows {
        for violation in rules::evaluate(&window.draft(), windows, Some(window.id)) {
            anomalies.push(format!(
                "- {} {} starting {}: {}",
                window.project_type,
                window.kind_label(),
                window.start_at.format(DATE_FMT),
                violation.message
            ));
        }
    }
    if anomalies.is_empty() {
        let _ = writeln!(output, "None detected.");
    } else {
        for anomaly in anomalies {
            let _ = writeln!(output, "{anomaly}");
        }
    }

    output
}
