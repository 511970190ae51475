use crate::controller::ApiResponse;
use crate::params::job::{JobAccepted, SubmitParams};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use log::*;

/// POST a background job by task name
#[utoipa::path(
    post,
    path = "/jobs",
    request_body = SubmitParams,
    responses(
        (status = 202, description = "Job accepted by the queue", body = JobAccepted),
        (status = 404, description = "No task registered under this name"),
        (status = 503, description = "Job queue is full or no worker is running"),
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Json(params): Json<SubmitParams>,
) -> Result<impl IntoResponse, Error> {
    let handle = app_state.jobs.submit(params.into())?;
    let accepted = JobAccepted {
        id: handle.id.to_string(),
        name: handle.name.clone(),
    };
    info!("Accepted job {} ({})", accepted.id, accepted.name);

    // Nobody waits on the HTTP side, the outcome is only logged
    tokio::spawn(async move {
        let (id, name) = (handle.id, handle.name.clone());
        match handle.result().await {
            Ok(output) => info!("Job {id} ({name}) finished: {output}"),
            Err(e) => warn!("Job {id} ({name}) did not finish: {e}"),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::new(StatusCode::ACCEPTED.into(), accepted)),
    ))
}
