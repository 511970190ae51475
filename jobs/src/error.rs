//! Error types for background jobs
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug, PartialEq)]
pub struct Error {
    // Name of the task the error relates to
    pub task: String,
    // Enum representing which category of error
    pub error_kind: JobErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum JobErrorKind {
    // No handler registered under the task name
    UnknownTask,
    // The queue is at capacity
    QueueFull,
    // No worker is consuming the queue anymore
    QueueClosed,
    // Arguments did not match what the task expects
    InvalidArguments(String),
    // The task ran and reported a failure
    Failed(String),
    // The task was dropped before producing a result
    Abandoned,
}

impl Error {
    pub fn new(task: impl Into<String>, error_kind: JobErrorKind) -> Self {
        Error {
            task: task.into(),
            error_kind,
        }
    }

    pub fn invalid_arguments(task: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(task, JobErrorKind::InvalidArguments(reason.into()))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Job Error: {:?} (task {})", self.error_kind, self.task)
    }
}

impl StdError for Error {}
