use serde::Serialize;
pub(crate) mod broadcast_controller;
pub(crate) mod connection_controller;
pub(crate) mod health_check_controller;
pub(crate) mod job_controller;

/// JSON envelope returned by every non-streaming endpoint.
#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status_code: u16, data: T) -> Self {
        Self {
            status_code,
            data: Some(data),
        }
    }

    pub fn accepted() -> ApiResponse<()> {
        ApiResponse {
            status_code: axum::http::StatusCode::ACCEPTED.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn serializes_data_when_present() {
        let response = ApiResponse::new(StatusCode::OK.into(), json!({"connections": 2}));
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(
            value,
            json!({"status_code": 200, "data": {"connections": 2}})
        );
    }

    #[test]
    fn accepted_omits_data() {
        let response = ApiResponse::<()>::accepted();
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            json!({"status_code": 202}).to_string()
        );
    }
}
