use thiserror::Error;

/// Terminal failures of a fetch. Malformed selectors are not errors here;
/// they surface as [`crate::ResolutionWarning`]s.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("host endpoint '{name}' not found")]
    HostEndpointNotFound { name: String },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::HostEndpointNotFound { .. })
    }
}
