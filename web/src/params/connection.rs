use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query string of a WebSocket upgrade request.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConnectParams {
    /// Opaque identity supplied by the client
    #[serde(default)]
    pub user: String,
    /// Group to join; omitted or empty means no group
    #[serde(default)]
    pub group: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConnectionCounts {
    pub connections: usize,
    pub groups: usize,
}
