use crate::models::{AssessmentType, WindowType};

/// The portal workflow, in the order stages open for a project type.
/// Submission and assessment alternate per checkpoint; grade release
/// closes the cycle.
pub const STAGES: [(WindowType, Option<AssessmentType>); 11] = [
    (WindowType::Proposal, None),
    (WindowType::Application, None),
    (WindowType::Submission, Some(AssessmentType::Cla1)),
    (WindowType::Assessment, Some(AssessmentType::Cla1)),
    (WindowType::Submission, Some(AssessmentType::Cla2)),
    (WindowType::Assessment, Some(AssessmentType::Cla2)),
    (WindowType::Submission, Some(AssessmentType::Cla3)),
    (WindowType::Assessment, Some(AssessmentType::Cla3)),
    (WindowType::Submission, Some(AssessmentType::External)),
    (WindowType::Assessment, Some(AssessmentType::External)),
    (WindowType::GradeRelease, None),
];

/// Position of a stage in the workflow.
///
/// Panics when the pairing is not a real stage (submission without a
/// checkpoint, proposal with one). User input is shape-checked in
/// `rules` before it is ordered, so reaching the panic means a bug in
/// the caller, not bad input.
pub fn stage_index(window_type: WindowType, assessment: Option<AssessmentType>) -> usize {
    STAGES
        .iter()
        .position(|stage| *stage == (window_type, assessment))
        .unwrap_or_else(|| {
            panic!("no workflow stage for {window_type} with assessment {assessment:?}")
        })
}

/// The stage immediately before the given one, or `None` for proposal.
pub fn predecessor(
    window_type: WindowType,
    assessment: Option<AssessmentType>,
) -> Option<(WindowType, Option<AssessmentType>)> {
    match stage_index(window_type, assessment) {
        0 => None,
        index => Some(STAGES[index - 1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_strictly_increasing() {
        for pair in STAGES.windows(2) {
            let earlier = stage_index(pair[0].0, pair[0].1);
            let later = stage_index(pair[1].0, pair[1].1);
            assert!(earlier < later);
        }
    }

    #[test]
    fn stage_order_matches_the_portal_workflow() {
        assert_eq!(stage_index(WindowType::Proposal, None), 0);
        assert_eq!(stage_index(WindowType::Application, None), 1);
        assert_eq!(
            stage_index(WindowType::Submission, Some(AssessmentType::Cla1)),
            2
        );
        assert_eq!(
            stage_index(WindowType::Assessment, Some(AssessmentType::Cla1)),
            3
        );
        assert_eq!(
            stage_index(WindowType::Submission, Some(AssessmentType::External)),
            8
        );
        assert_eq!(
            stage_index(WindowType::Assessment, Some(AssessmentType::External)),
            9
        );
        assert_eq!(stage_index(WindowType::GradeRelease, None), 10);
    }

    #[test]
    fn each_submission_precedes_its_own_assessment() {
        for assessment in [
            AssessmentType::Cla1,
            AssessmentType::Cla2,
            AssessmentType::Cla3,
            AssessmentType::External,
        ] {
            assert!(
                stage_index(WindowType::Submission, Some(assessment))
                    < stage_index(WindowType::Assessment, Some(assessment))
            );
        }
    }

    #[test]
    fn predecessors_walk_the_chain() {
        assert_eq!(predecessor(WindowType::Proposal, None), None);
        assert_eq!(
            predecessor(WindowType::Application, None),
            Some((WindowType::Proposal, None))
        );
        assert_eq!(
            predecessor(WindowType::Submission, Some(AssessmentType::Cla1)),
            Some((WindowType::Application, None))
        );
        assert_eq!(
            predecessor(WindowType::Submission, Some(AssessmentType::Cla2)),
            Some((WindowType::Assessment, Some(AssessmentType::Cla1)))
        );
        assert_eq!(
            predecessor(WindowType::GradeRelease, None),
            Some((WindowType::Assessment, Some(AssessmentType::External)))
        );
    }

    #[test]
    #[should_panic(expected = "no workflow stage")]
    fn submission_without_checkpoint_is_not_a_stage() {
        stage_index(WindowType::Submission, None);
    }

    #[test]
    #[should_panic(expected = "no workflow stage")]
    fn proposal_with_checkpoint_is_not_a_stage() {
        stage_index(WindowType::Proposal, Some(AssessmentType::Cla1));
    }
}
