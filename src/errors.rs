use thiserror::Error;

pub type Result<T> = std::result::Result<T, LineageError>;

#[derive(Debug, Error)]
pub enum LineageError {
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    #[error("connection error: {0}")]
    ConnectionError(String),
    #[error("schema error: {0}")]
    SchemaError(String),
    #[error("query error: {0}")]
    QueryError(String),
    #[error("entity not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl LineageError {
    pub fn resource_not_found<T: Into<String>>(name: T) -> Self {
        LineageError::ResourceNotFound(name.into())
    }

    pub fn connection<T: Into<String>>(msg: T) -> Self {
        LineageError::ConnectionError(msg.into())
    }

    pub fn schema<T: Into<String>>(msg: T) -> Self {
        LineageError::SchemaError(msg.into())
    }

    pub fn query<T: Into<String>>(msg: T) -> Self {
        LineageError::QueryError(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        LineageError::NotFound(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        LineageError::InvalidInput(msg.into())
    }

    /// True for failures raised by the graph store itself rather than by
    /// validation or lookup of a missing resource.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            LineageError::ConnectionError(_)
                | LineageError::SchemaError(_)
                | LineageError::QueryError(_)
        )
    }
}
