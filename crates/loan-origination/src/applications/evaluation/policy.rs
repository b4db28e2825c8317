use super::EvaluationDetail;

pub const APPROVAL_MESSAGE: &str = "Application meets every underwriting requirement.";
pub const REJECTION_MESSAGE: &str = "Application does not meet the underwriting requirements.";

pub(crate) struct Verdict {
    pub approved: bool,
    pub message: &'static str,
}

/// Approval is all-or-nothing across the rule trail.
pub(crate) fn decide(details: &[EvaluationDetail]) -> Verdict {
    let approved = details.iter().all(|detail| detail.passed);
    let message = if approved {
        APPROVAL_MESSAGE
    } else {
        REJECTION_MESSAGE
    };

    Verdict { approved, message }
}
