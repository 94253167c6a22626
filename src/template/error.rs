use thiserror::Error;

/// Errors produced while evaluating `{{ ... }}` actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TemplateError {
    #[error("unclosed action starting at byte {0} (missing '}}}}')")]
    Unclosed(usize),

    #[error("map has no entry for key \"{0}\"")]
    MissingKey(String),

    #[error("environment variable not set: {0}")]
    MissingEnv(String),

    #[error("invalid action '{action}': {reason}")]
    Syntax { action: String, reason: String },
}

impl TemplateError {
    pub(crate) fn syntax(action: &str, reason: impl Into<String>) -> Self {
        Self::Syntax {
            action: action.to_string(),
            reason: reason.into(),
        }
    }
}
