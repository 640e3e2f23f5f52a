use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    kind_label, AssessmentType, ProjectType, Violation, ViolationKind, Window, WindowDraft,
    WindowType, DATE_FMT,
};
use crate::workflow;

pub fn ranges_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

pub fn check_shape(draft: &WindowDraft) -> Vec<Violation> {
    let mut violations = Vec::new();

    if draft.end_at <= draft.start_at {
        violations.push(Violation::new(
            ViolationKind::InvalidDateRange,
            format!(
                "end {} must come after start {}",
                draft.end_at.format(DATE_FMT),
                draft.start_at.format(DATE_FMT)
            ),
        ));
    }

    match (draft.window_type.requires_assessment(), draft.assessment_type) {
        (true, None) => violations.push(Violation::new(
            ViolationKind::MissingAssessmentType,
            format!(
                "{} windows need an assessment checkpoint (CLA-1, CLA-2, CLA-3, or External)",
                draft.window_type
            ),
        )),
        (false, Some(assessment)) => violations.push(Violation::new(
            ViolationKind::UnexpectedAssessmentType,
            format!(
                "{} windows are not tied to an assessment checkpoint (got {assessment})",
                draft.window_type
            ),
        )),
        _ => {}
    }

    violations
}

// The checkpoint only distinguishes submission/assessment windows; for
// the other stages two windows of the same type share a key regardless.
fn same_kind(draft: &WindowDraft, window: &Window) -> bool {
    if window.project_type != draft.project_type || window.window_type != draft.window_type {
        return false;
    }
    !draft.window_type.requires_assessment() || window.assessment_type == draft.assessment_type
}

/// Rejects a candidate whose date range overlaps an existing window of
/// the same kind. `exclude` names the window being edited, matched by
/// id, so an edit never conflicts with its own stored row.
pub fn check_overlap(
    draft: &WindowDraft,
    existing: &[Window],
    exclude: Option<Uuid>,
) -> Option<Violation> {
    existing
        .iter()
        .filter(|window| exclude != Some(window.id))
        .filter(|window| same_kind(draft, window))
        .find(|window| ranges_overlap(draft.start_at, draft.end_at, window.start_at, window.end_at))
        .map(|window| {
            Violation::new(
                ViolationKind::OverlapConflict,
                format!(
                    "a {} window for {} already runs {} to {} (id {})",
                    window.kind_label(),
                    window.project_type,
                    window.start_at.format(DATE_FMT),
                    window.end_at.format(DATE_FMT),
                    window.id
                ),
            )
        })
}

/// Rejects a candidate that starts before its workflow predecessor has
/// ended. When several predecessor windows exist the latest end wins;
/// when none are scheduled yet the check passes.
pub fn check_sequence(draft: &WindowDraft, existing: &[Window]) -> Option<Violation> {
    let (prev_type, prev_assessment) =
        workflow::predecessor(draft.window_type, draft.assessment_type)?;
    let latest_end = existing
        .iter()
        .filter(|window| window.project_type == draft.project_type)
        .filter(|window| {
            window.window_type == prev_type && window.assessment_type == prev_assessment
        })
        .map(|window| window.end_at)
        .max()?;

    if draft.start_at >= latest_end {
        return None;
    }

    Some(Violation::new(
        ViolationKind::OutOfSequence,
        format!(
            "{} cannot start {}: the {} window for {} runs until {}",
            draft.kind_label(),
            draft.start_at.format(DATE_FMT),
            kind_label(prev_type, prev_assessment),
            draft.project_type,
            latest_end.format(DATE_FMT)
        ),
    ))
}

/// Runs every check against a candidate and returns all violations at
/// once. Overlap and sequence only run on a well-shaped candidate.
pub fn evaluate(draft: &WindowDraft, existing: &[Window], exclude: Option<Uuid>) -> Vec<Violation> {
    let mut violations = check_shape(draft);
    if violations.is_empty() {
        violations.extend(check_overlap(draft, existing, exclude));
        violations.extend(check_sequence(draft, existing));
    }
    violations
}

/// Whether any window of the given kind is open at `now`. Boundaries
/// are inclusive on both ends, and several windows of the same kind may
/// be open at once.
pub fn is_open(
    windows: &[Window],
    project_type: ProjectType,
    window_type: WindowType,
    assessment_type: Option<AssessmentType>,
    now: DateTime<Utc>,
) -> bool {
    windows.iter().any(|window| {
        window.project_type == project_type
            && window.window_type == window_type
            && (!window_type.requires_assessment() || window.assessment_type == assessment_type)
            && window.start_at <= now
            && now <= window.end_at
    })
}

/// All windows open at `now`, optionally narrowed by project type,
/// window type, and checkpoint, in workflow order.
pub fn open_windows<'a>(
    windows: &'a [Window],
    project_type: Option<ProjectType>,
    window_type: Option<WindowType>,
    assessment_type: Option<AssessmentType>,
    now: DateTime<Utc>,
) -> Vec<&'a Window> {
    let mut open: Vec<&Window> = windows
        .iter()
        .filter(|window| project_type.is_none_or(|p| window.project_type == p))
        .filter(|window| window_type.is_none_or(|t| window.window_type == t))
        .filter(|window| assessment_type.is_none_or(|a| window.assessment_type == Some(a)))
        .filter(|window| window.start_at <= now && now <= window.end_at)
        .collect();

    open.sort_by_key(|window| {
        (
            window.project_type,
            workflow::stage_index(window.window_type, window.assessment_type),
            window.start_at,
        )
    });
    open
}
