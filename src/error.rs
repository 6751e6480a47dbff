/// Errors surfaced by the catalog, advisory and collection layers.
#[derive(Debug, thiserror::Error)]
pub enum FinderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog request failed (status={status}): {body}")]
    CatalogStatus { status: u16, body: String },

    #[error("model request failed (status={status}): {body}")]
    ModelStatus { status: u16, body: String },

    #[error("model returned an empty response")]
    EmptyModelResponse,

    #[error("model output failed validation: {0}")]
    InvalidModelOutput(String),

    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("collection store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl FinderError {
    /// Whether the failure was caused by the caller rather than a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::NotFound(_))
    }
}

pub type Result<T, E = FinderError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_caller_mistakes() {
        assert!(FinderError::InvalidInput("empty history".into()).is_client_error());
        assert!(FinderError::NotFound("list abc".into()).is_client_error());
        assert!(!FinderError::EmptyModelResponse.is_client_error());
        assert!(!FinderError::CatalogStatus {
            status: 500,
            body: String::new()
        }
        .is_client_error());
    }
}
