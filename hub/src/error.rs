//! Error types for the connection hub.
use std::error::Error as StdError;
use std::fmt;

/// Errors surfaced to callers of the hub's handle.
///
/// Per-connection transport failures never show up here: they are handled
/// inside the owning session and only end that session.
#[derive(Debug, PartialEq)]
pub struct Error {
    // Id of the connection the operation was aimed at, when there is one
    pub connection_id: Option<String>,
    // Enum representing which category of error
    pub error_kind: HubErrorKind,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum HubErrorKind {
    // Direct send to an id that is not registered
    TargetNotFound,
    // Direct send hit a full or closed queue, the target has been evicted
    TargetGone,
    // A second registration reused a live connection id
    DuplicateConnection,
    // The hub loop is no longer running
    HubClosed,
}

impl Error {
    pub(crate) fn new(error_kind: HubErrorKind, connection_id: impl Into<String>) -> Self {
        Error {
            connection_id: Some(connection_id.into()),
            error_kind,
        }
    }

    pub(crate) fn hub_closed() -> Self {
        Error {
            connection_id: None,
            error_kind: HubErrorKind::HubClosed,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.connection_id {
            Some(id) => write!(f, "Hub Error: {:?} (connection {})", self.error_kind, id),
            None => write!(f, "Hub Error: {:?}", self.error_kind),
        }
    }
}

impl StdError for Error {}
