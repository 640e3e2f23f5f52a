use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DATE_FMT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectType {
    Idp,
    Urop,
    Capstone,
}

pub const PROJECT_TYPES: [ProjectType; 3] = [
    ProjectType::Idp,
    ProjectType::Urop,
    ProjectType::Capstone,
];

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idp => "IDP",
            Self::Urop => "UROP",
            Self::Capstone => "CAPSTONE",
        };
        f.write_str(label)
    }
}

impl FromStr for ProjectType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_uppercase().as_str() {
            "IDP" => Ok(Self::Idp),
            "UROP" => Ok(Self::Urop),
            "CAPSTONE" => Ok(Self::Capstone),
            other => Err(format!(
                "unknown project type '{other}' (expected IDP, UROP, or CAPSTONE)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    Proposal,
    Application,
    Submission,
    Assessment,
    GradeRelease,
}

impl WindowType {
    /// Submission and assessment windows belong to a specific assessment
    /// checkpoint; the other stages are project-wide.
    pub fn requires_assessment(self) -> bool {
        matches!(self, Self::Submission | Self::Assessment)
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Proposal => "proposal",
            Self::Application => "application",
            Self::Submission => "submission",
            Self::Assessment => "assessment",
            Self::GradeRelease => "grade_release",
        };
        f.write_str(label)
    }
}

impl FromStr for WindowType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().replace('-', "_").as_str() {
            "proposal" => Ok(Self::Proposal),
            "application" => Ok(Self::Application),
            "submission" => Ok(Self::Submission),
            "assessment" => Ok(Self::Assessment),
            "grade_release" => Ok(Self::GradeRelease),
            other => Err(format!(
                "unknown window type '{other}' (expected proposal, application, \
                 submission, assessment, or grade_release)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessmentType {
    #[serde(rename = "CLA-1")]
    Cla1,
    #[serde(rename = "CLA-2")]
    Cla2,
    #[serde(rename = "CLA-3")]
    Cla3,
    External,
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Cla1 => "CLA-1",
            Self::Cla2 => "CLA-2",
            Self::Cla3 => "CLA-3",
            Self::External => "External",
        };
        f.write_str(label)
    }
}

impl FromStr for AssessmentType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_uppercase().as_str() {
            "CLA-1" | "CLA1" => Ok(Self::Cla1),
            "CLA-2" | "CLA2" => Ok(Self::Cla2),
            "CLA-3" | "CLA3" => Ok(Self::Cla3),
            "EXTERNAL" => Ok(Self::External),
            other => Err(format!(
                "unknown assessment type '{other}' (expected CLA-1, CLA-2, CLA-3, or External)"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    pub id: Uuid,
    pub project_type: ProjectType,
    pub window_type: WindowType,
    pub assessment_type: Option<AssessmentType>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl Window {
    pub fn kind_label(&self) -> String {
        kind_label(self.window_type, self.assessment_type)
    }

    pub fn draft(&self) -> WindowDraft {
        WindowDraft {
            project_type: self.project_type,
            window_type: self.window_type,
            assessment_type: self.assessment_type,
            start_at: self.start_at,
            end_at: self.end_at,
        }
    }
}

/// A candidate window that has not been persisted yet (create, edit
/// preview, or a CSV row). Carries no id; conflicts against an existing
/// window are suppressed by passing that window's id to the validators.
#[derive(Debug, Clone)]
pub struct WindowDraft {
    pub project_type: ProjectType,
    pub window_type: WindowType,
    pub assessment_type: Option<AssessmentType>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl WindowDraft {
    pub fn into_window(self, id: Uuid) -> Window {
        Window {
            id,
            project_type: self.project_type,
            window_type: self.window_type,
            assessment_type: self.assessment_type,
            start_at: self.start_at,
            end_at: self.end_at,
        }
    }

    pub fn kind_label(&self) -> String {
        kind_label(self.window_type, self.assessment_type)
    }

    /// Builds a draft from raw text fields (CLI flags, CSV cells),
    /// collecting every parse failure instead of stopping at the first.
    pub fn from_labels(
        project: &str,
        window: &str,
        assessment: Option<&str>,
        start: &str,
        end: &str,
    ) -> Result<Self, Vec<Violation>> {
        let assessment = assessment.map(str::trim).filter(|raw| !raw.is_empty());
        let mut violations = Vec::new();

        let project_type = push_err(
            project
                .parse::<ProjectType>()
                .map_err(|message| Violation::new(ViolationKind::UnknownLabel, message)),
            &mut violations,
        );
        let window_type = push_err(
            window
                .parse::<WindowType>()
                .map_err(|message| Violation::new(ViolationKind::UnknownLabel, message)),
            &mut violations,
        );
        let assessment_type = match assessment {
            None => Some(None),
            Some(raw) => push_err(
                raw.parse::<AssessmentType>()
                    .map_err(|message| Violation::new(ViolationKind::UnknownLabel, message)),
                &mut violations,
            )
            .map(Some),
        };
        let start_at = push_err(parse_start_bound(start), &mut violations);
        let end_at = push_err(parse_end_bound(end), &mut violations);

        match (project_type, window_type, assessment_type, start_at, end_at) {
            (
                Some(project_type),
                Some(window_type),
                Some(assessment_type),
                Some(start_at),
                Some(end_at),
            ) if violations.is_empty() => Ok(Self {
                project_type,
                window_type,
                assessment_type,
                start_at,
                end_at,
            }),
            _ => Err(violations),
        }
    }
}

pub fn kind_label(window_type: WindowType, assessment: Option<AssessmentType>) -> String {
    match assessment {
        Some(assessment) => format!("{window_type} ({assessment})"),
        None => window_type.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    UnknownLabel,
    InvalidDate,
    InvalidDateRange,
    MissingAssessmentType,
    UnexpectedAssessmentType,
    OverlapConflict,
    OutOfSequence,
}

impl Violation {
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Parses a window start boundary: RFC 3339, or a bare date taken as the
/// first instant of that day (UTC).
pub fn parse_start_bound(raw: &str) -> Result<DateTime<Utc>, Violation> {
    parse_bound(raw, false)
}

/// Parses a window end boundary: RFC 3339, or a bare date taken as the
/// last second of that day (UTC).
pub fn parse_end_bound(raw: &str) -> Result<DateTime<Utc>, Violation> {
    parse_bound(raw, true)
}

fn parse_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, Violation> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let (hour, minute, second) = if end_of_day { (23, 59, 59) } else { (0, 0, 0) };
        if let Some(datetime) = date.and_hms_opt(hour, minute, second) {
            return Ok(datetime.and_utc());
        }
    }
    Err(Violation::new(
        ViolationKind::InvalidDate,
        format!("invalid date '{raw}' (expected RFC 3339 or YYYY-MM-DD)"),
    ))
}

fn push_err<T>(result: Result<T, Violation>, violations: &mut Vec<Violation>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(violation) => {
            violations.push(violation);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_display_and_from_str() {
        for project in PROJECT_TYPES {
            assert_eq!(project.to_string().parse::<ProjectType>(), Ok(project));
        }
        assert_eq!(
            "grade-release".parse::<WindowType>(),
            Ok(WindowType::GradeRelease)
        );
        assert_eq!("cla1".parse::<AssessmentType>(), Ok(AssessmentType::Cla1));
        assert_eq!(
            "external".parse::<AssessmentType>(),
            Ok(AssessmentType::External)
        );
        assert!("midterm".parse::<AssessmentType>().is_err());
    }

    #[test]
    fn serde_uses_portal_wire_names() {
        assert_eq!(serde_json::to_string(&ProjectType::Idp).unwrap(), "\"IDP\"");
        assert_eq!(
            serde_json::to_string(&WindowType::GradeRelease).unwrap(),
            "\"grade_release\""
        );
        assert_eq!(
            serde_json::to_string(&AssessmentType::Cla2).unwrap(),
            "\"CLA-2\""
        );
        assert_eq!(
            serde_json::from_str::<AssessmentType>("\"External\"").unwrap(),
            AssessmentType::External
        );
    }

    #[test]
    fn bare_dates_expand_to_day_boundaries() {
        let start = parse_start_bound("2025-02-01").unwrap();
        let end = parse_end_bound("2025-02-01").unwrap();
        assert_eq!(start.to_rfc3339(), "2025-02-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-02-01T23:59:59+00:00");
        assert!(start < end);
    }

    #[test]
    fn rfc3339_bounds_are_taken_verbatim() {
        let instant = parse_start_bound("2025-02-01T09:30:00+08:00").unwrap();
        assert_eq!(instant.to_rfc3339(), "2025-02-01T01:30:00+00:00");
    }

    #[test]
    fn malformed_dates_are_reported_not_crashed_on() {
        let violation = parse_end_bound("not-a-date").unwrap_err();
        assert_eq!(violation.kind, ViolationKind::InvalidDate);
        assert!(violation.message.contains("not-a-date"));
    }

    #[test]
    fn from_labels_collects_every_failure() {
        let violations =
            WindowDraft::from_labels("PHD", "submission", Some("CLA-1"), "soon", "2025-03-01")
                .unwrap_err();
        assert_eq!(violations.len(), 2);
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::UnknownLabel));
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::InvalidDate));
    }

    #[test]
    fn from_labels_treats_blank_assessment_as_absent() {
        let draft =
            WindowDraft::from_labels("IDP", "proposal", Some("  "), "2025-01-01", "2025-01-10")
                .unwrap();
        assert_eq!(draft.assessment_type, None);
    }

    #[test]
    fn kind_label_names_the_checkpoint() {
        assert_eq!(
            kind_label(WindowType::Submission, Some(AssessmentType::Cla3)),
            "submission (CLA-3)"
        );
        assert_eq!(kind_label(WindowType::Proposal, None), "proposal");
    }
}
