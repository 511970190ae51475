use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use hub::error::{Error as HubError, HubErrorKind};
use jobs::error::{Error as JobError, JobErrorKind};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Hub(HubError),
    Job(JobError),
}

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        match self {
            Error::Hub(e) => write!(fmt, "{e}"),
            Error::Job(e) => write!(fmt, "{e}"),
        }
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Hub(hub_error) => match hub_error.error_kind {
                HubErrorKind::TargetNotFound => (StatusCode::NOT_FOUND, "NOT FOUND").into_response(),
                HubErrorKind::TargetGone => (StatusCode::GONE, "GONE").into_response(),
                HubErrorKind::DuplicateConnection => {
                    (StatusCode::CONFLICT, "CONFLICT").into_response()
                }
                HubErrorKind::HubClosed => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                }
            },
            Error::Job(job_error) => match job_error.error_kind {
                JobErrorKind::UnknownTask => (StatusCode::NOT_FOUND, "NOT FOUND").into_response(),
                JobErrorKind::InvalidArguments(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE ENTITY").into_response()
                }
                JobErrorKind::QueueFull | JobErrorKind::QueueClosed => {
                    (StatusCode::SERVICE_UNAVAILABLE, "SERVICE UNAVAILABLE").into_response()
                }
                JobErrorKind::Failed(_) | JobErrorKind::Abandoned => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                }
            },
        }
    }
}

impl From<HubError> for Error {
    fn from(err: HubError) -> Self {
        Error::Hub(err)
    }
}

impl From<JobError> for Error {
    fn from(err: JobError) -> Self {
        Error::Job(err)
    }
}
