use thiserror::Error;

/// Errors raised while preparing a tree for generation.
///
/// Generation itself is total over valid input, so every failure surfaces
/// before any skeleton or mesh work starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("invalid configuration: `{field}` {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },
}

impl TreeError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }
}
