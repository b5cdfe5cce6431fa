use thiserror::Error;

/// Schedule storage and expansion errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid recurrence rule: {0}")]
    RecurrenceError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;
