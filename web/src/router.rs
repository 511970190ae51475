use crate::controller::{
    broadcast_controller, connection_controller, health_check_controller, job_controller,
};
use crate::{params, ws, AppState};
use axum::{
    routing::{get, post},
    Router,
};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Chat Hub API"
        ),
        paths(
            broadcast_controller::create,
            connection_controller::index,
            connection_controller::send,
            health_check_controller::health_check,
            job_controller::create,
            ws::handler::connect,
        ),
        components(
            schemas(
                params::broadcast::BroadcastParams,
                params::connection::ConnectionCounts,
                params::job::SubmitParams,
                params::job::JobAccepted,
            )
        ),
        tags(
            (name = "chat_hub", description = "Real-time connection hub")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(connection_routes(app_state.clone()))
        .merge(broadcast_routes(app_state.clone()))
        .merge(job_routes(app_state.clone()))
        .merge(websocket_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn connection_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/connections", get(connection_controller::index))
        .route(
            "/connections/:id/messages",
            post(connection_controller::send),
        )
        .with_state(app_state)
}

fn broadcast_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/broadcast", post(broadcast_controller::create))
        .with_state(app_state)
}

fn job_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/jobs", post(job_controller::create))
        .with_state(app_state)
}

fn websocket_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::handler::connect))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use clap::Parser;
    use hub::{Hub, HubConfig};
    use jobs::tasks::{AddTask, ADD};
    use jobs::JobServer;
    use sea_orm::DatabaseConnection;
    use serde_json::{json, Value};
    use service::config::Config;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state(hub_config: HubConfig) -> AppState {
        let config = Config::try_parse_from(["chat_hub"]).unwrap();
        let db = Arc::new(DatabaseConnection::Disconnected);
        let (jobs, worker) = JobServer::new(8);
        jobs.register_task(ADD, Arc::new(AddTask));
        tokio::spawn(worker.launch("test", 1));

        AppState::new(
            service::AppState::new(config, &db),
            Hub::spawn(hub_config),
            jobs,
        )
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_text(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_check_responds() {
        let app = define_routes(test_state(HubConfig::default()));

        let (status, body) = send(app, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"healthy");
    }

    #[tokio::test]
    async fn connection_counts_reflect_registry() {
        let state = test_state(HubConfig::default());
        let (a, _a_queue) = state.hub.new_record("alice", "room1");
        let (b, _b_queue) = state.hub.new_record("bob", "");
        state.hub.register(a).await.unwrap();
        state.hub.register(b).await.unwrap();

        let (status, body) = send(define_routes(state), get("/connections")).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            json!({"status_code": 200, "data": {"connections": 2, "groups": 1}})
        );
    }

    #[tokio::test]
    async fn direct_message_reaches_its_target() {
        let state = test_state(HubConfig::default());
        let (record, mut queue) = state.hub.new_record("alice", "");
        state.hub.register(record.clone()).await.unwrap();
        let uri = format!("/connections/{}/messages", record.id());

        let (status, _) = send(define_routes(state), post_text(&uri, "hello")).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(&queue.try_recv().unwrap()[..], b"hello");
    }

    #[tokio::test]
    async fn direct_message_to_unknown_id_is_not_found() {
        let app = define_routes(test_state(HubConfig::default()));

        let (status, _) = send(app, post_text("/connections/nobody/messages", "hello")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn direct_message_to_saturated_connection_is_gone() {
        let state = test_state(HubConfig {
            queue_capacity: 1,
            ..HubConfig::default()
        });
        let (record, _undrained) = state.hub.new_record("slow", "");
        state.hub.register(record.clone()).await.unwrap();
        let uri = format!("/connections/{}/messages", record.id());
        let app = define_routes(state);

        let (first, _) = send(app.clone(), post_text(&uri, "one")).await;
        let (second, _) = send(app, post_text(&uri, "two")).await;

        assert_eq!(first, StatusCode::ACCEPTED);
        assert_eq!(second, StatusCode::GONE);

        // Eviction is applied by the hub loop
        for _ in 0..100 {
            if record.is_closed() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(record.is_closed());
    }

    #[tokio::test]
    async fn group_broadcast_skips_excluded_and_outsiders() {
        let state = test_state(HubConfig::default());
        let (a, mut a_queue) = state.hub.new_record("alice", "room1");
        let (b, mut b_queue) = state.hub.new_record("bob", "room1");
        let (c, mut c_queue) = state.hub.new_record("carol", "");
        for record in [a.clone(), b, c] {
            state.hub.register(record).await.unwrap();
        }

        let request = post_json(
            "/broadcast",
            json!({"group": "room1", "exclude": a.id().as_str(), "payload": "hi"}),
        );
        let (status, _) = send(define_routes(state), request).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let delivered = tokio::time::timeout(Duration::from_secs(1), b_queue.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&delivered[..], b"hi");
        assert!(a_queue.try_recv().is_err());
        assert!(c_queue.try_recv().is_err());
    }

    #[tokio::test]
    async fn malformed_broadcast_is_rejected() {
        let app = define_routes(test_state(HubConfig::default()));

        let (status, _) = send(app, post_json("/broadcast", json!({"group": "room1"}))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn known_job_is_accepted() {
        let app = define_routes(test_state(HubConfig::default()));

        let (status, body) = send(
            app,
            post_json("/jobs", json!({"name": "add", "args": [661, 5]})),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["data"]["name"], "add");
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let app = define_routes(test_state(HubConfig::default()));

        let (status, _) = send(app, post_json("/jobs", json!({"name": "resize"}))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn plain_get_on_websocket_route_is_rejected() {
        let app = define_routes(test_state(HubConfig::default()));

        let (status, _) = send(app, get("/ws?user=alice&group=room1")).await;

        assert!(status.is_client_error());
    }

    #[test]
    fn openapi_document_lists_hub_routes() {
        let doc = ApiDoc::openapi();

        for path in ["/ws", "/broadcast", "/connections/{id}/messages", "/jobs"] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
