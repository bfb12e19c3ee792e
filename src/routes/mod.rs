use axum::Router;

use crate::state::SharedState;

/// Swagger UI.
pub mod docs;
/// Health check.
pub mod health;
/// Node press and LED endpoints.
pub mod node;
/// Round inspection and operator reset.
pub mod round;
/// Server-sent event streams.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(node::router())
        .merge(round::router())
        .merge(sse::router())
        .merge(docs::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{config::AppConfig, services::audio::NoCue, state::AppState};

    fn app() -> (SharedState, Router<()>) {
        let state = AppState::new(&AppConfig::default(), Arc::new(NoCue));
        (state.clone(), router(state))
    }

    async fn send(app: &Router<()>, method: &str, uri: &str) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn press_then_color_is_red() {
        let (_state, app) = app();

        let response = send(&app, "POST", "/update/pico1").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"success": true}));

        let response = send(&app, "GET", "/led_state/pico1").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"color": [255, 0, 0]}));

        let response = send(&app, "GET", "/led_state/pico2").await;
        assert_eq!(json_body(response).await, json!({"color": [0, 0, 0]}));
    }

    #[tokio::test]
    async fn press_with_body_is_accepted() {
        let (_state, app) = app();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/update/pico2")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"button_state": true}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_node_is_a_client_error_without_mutation() {
        let (state, app) = app();
        let expected = json!({"success": false, "error": "Invalid Pico ID"});

        let response = send(&app, "POST", "/update/pico9").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, expected);

        let response = send(&app, "GET", "/led_state/pico9").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, expected);

        let snapshot = state.coordinator().snapshot().await;
        assert_eq!(snapshot.pressed, 0);
        assert_eq!(snapshot.round_id, None);
    }

    #[tokio::test]
    async fn round_snapshot_and_admin_reset() {
        let (_state, app) = app();
        send(&app, "POST", "/update/pico3").await;

        let snapshot = json_body(send(&app, "GET", "/round").await).await;
        assert_eq!(snapshot["phase"], "collecting");
        assert_eq!(snapshot["pressed"], 1);
        assert_eq!(snapshot["threshold"], 4);
        assert_eq!(
            snapshot["nodes"][2],
            json!({"id": "pico3", "pressed": true, "color": [255, 0, 0]})
        );
        assert!(snapshot["round_id"].is_string());

        let response = send(&app, "POST", "/admin/reset").await;
        assert_eq!(response.status(), StatusCode::OK);
        let snapshot = json_body(response).await;
        assert_eq!(snapshot["phase"], "idle");
        assert_eq!(snapshot["pressed"], 0);
        assert!(snapshot.get("round_id").is_none());
    }

    #[tokio::test]
    async fn healthcheck_reports_roster_size() {
        let (_state, app) = app();
        let response = send(&app, "GET", "/healthcheck").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"status": "ok", "nodes": 4}));
    }
}
