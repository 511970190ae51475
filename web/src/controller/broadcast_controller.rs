use crate::controller::ApiResponse;
use crate::params::broadcast::BroadcastParams;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use log::*;

/// POST a payload to every connection, or to one group
#[utoipa::path(
    post,
    path = "/broadcast",
    request_body = BroadcastParams,
    responses(
        (status = 202, description = "Broadcast submitted to the hub"),
        (status = 422, description = "Malformed broadcast body"),
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Json(params): Json<BroadcastParams>,
) -> impl IntoResponse {
    debug!("POST broadcast: {params:?}");

    app_state.hub.broadcast(params.into());

    (StatusCode::ACCEPTED, Json(ApiResponse::<()>::accepted()))
}
