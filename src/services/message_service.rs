use crate::models::build::BuildKind;

/// Customization point for user-facing strings. Deployments swap the
/// provider at startup instead of patching handlers.
pub trait MessageProvider: Send + Sync {
    fn thank_you(&self, kind: BuildKind) -> String;

    /// One generic message for every rejected submission. Deliberately
    /// does not say which check failed; the specific kind goes to the log.
    fn failure(&self) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct DefaultMessages;

impl MessageProvider for DefaultMessages {
    fn thank_you(&self, kind: BuildKind) -> String {
        match kind {
            BuildKind::Quiz => "Thank you. Your answers have been recorded.".to_string(),
            BuildKind::Feedback => "Thank you for your feedback.".to_string(),
            BuildKind::Survey => {
                "Thank you for your participation in the survey.".to_string()
            }
        }
    }

    fn failure(&self) -> String {
        "Something went wrong with your submission. Please try again.".to_string()
    }
}
