use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("data source error: {0}")]
    Source(String),

    #[error("report sink error: {0}")]
    Sink(String),
}

impl ReportError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn source(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink(message.into())
    }

    /// Usage errors are rejected before any fetch and exit like clap does.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReportError::Usage(_) => 2,
            _ => 1,
        }
    }
}

impl From<postgres::Error> for ReportError {
    fn from(err: postgres::Error) -> Self {
        ReportError::Source(err.to_string())
    }
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Sink(err.to_string())
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
