use crate::controller::ApiResponse;
use crate::params::connection::ConnectionCounts;
use crate::{AppState, Error};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hub::ConnectionId;

use log::*;

/// GET how many connections and groups are currently registered
#[utoipa::path(
    get,
    path = "/connections",
    responses(
        (status = 200, description = "Current connection and group counts", body = ConnectionCounts),
    )
)]
pub async fn index(State(app_state): State<AppState>) -> impl IntoResponse {
    let registry = app_state.hub.registry();
    let counts = ConnectionCounts {
        connections: registry.len(),
        groups: registry.group_count(),
    };
    debug!("Connection counts: {counts:?}");

    Json(ApiResponse::new(StatusCode::OK.into(), counts))
}

/// POST a payload to exactly one connection
#[utoipa::path(
    post,
    path = "/connections/{id}/messages",
    params(
        ("id" = String, Path, description = "Connection id to deliver to"),
    ),
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 202, description = "Payload queued for the connection"),
        (status = 404, description = "No connection with this id"),
        (status = 410, description = "Connection could not take the payload and was dropped"),
    )
)]
pub async fn send(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    payload: Bytes,
) -> Result<impl IntoResponse, Error> {
    debug!("POST {} byte message to connection {id}", payload.len());

    app_state.hub.send_to_id(&ConnectionId::from(id), payload)?;

    Ok((StatusCode::ACCEPTED, Json(ApiResponse::<()>::accepted())))
}
