use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use radiopad_proto::protocol::{
    ErrorResponse, MessageResponse, Station, StatusResponse, VersionResponse,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::error::PlayerError;
use crate::playback::{PlaybackController, VOLUME_STEP};
use crate::supervisor::PlayerBackend;

type Controller<B> = State<Arc<PlaybackController<B>>>;

/// Handler failure, rendered as `500 {"error": "..."}`.
struct ApiError(PlayerError);

impl From<PlayerError> for ApiError {
    fn from(e: PlayerError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("HTTP API: {}", self.0);
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router<B: PlayerBackend + 'static>(controller: Arc<PlaybackController<B>>) -> Router {
    Router::new()
        .route("/version", get(version))
        .route("/stations", get(stations::<B>))
        .route("/status", get(status::<B>))
        .route("/play", post(play::<B>))
        .route("/next", post(next_station::<B>))
        .route("/prev", post(prev_station::<B>))
        .route("/stop", post(stop::<B>))
        .route("/volup", post(volume_up::<B>))
        .route("/voldown", post(volume_down::<B>))
        .layer(CorsLayer::permissive())
        .with_state(controller)
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn stations<B: PlayerBackend>(State(c): Controller<B>) -> Json<Vec<Station>> {
    Json(c.catalog().stations().to_vec())
}

async fn status<B: PlayerBackend>(State(c): Controller<B>) -> Json<StatusResponse> {
    Json(c.status().await)
}

async fn play<B: PlayerBackend>(State(c): Controller<B>) -> ApiResult<MessageResponse> {
    info!("HTTP API: Play");
    let station = c.play().await?;
    Ok(Json(MessageResponse::new(format!("Playing: {}", station.name))))
}

async fn next_station<B: PlayerBackend>(State(c): Controller<B>) -> ApiResult<MessageResponse> {
    info!("HTTP API: Next station");
    let station = c.next().await?;
    Ok(Json(MessageResponse::new(format!("Playing: {}", station.name))))
}

async fn prev_station<B: PlayerBackend>(State(c): Controller<B>) -> ApiResult<MessageResponse> {
    info!("HTTP API: Previous station");
    let station = c.previous().await?;
    Ok(Json(MessageResponse::new(format!("Playing: {}", station.name))))
}

async fn stop<B: PlayerBackend>(State(c): Controller<B>) -> ApiResult<MessageResponse> {
    info!("HTTP API: Stop");
    c.stop().await?;
    Ok(Json(MessageResponse::new("Playback stopped")))
}

async fn volume_up<B: PlayerBackend>(State(c): Controller<B>) -> ApiResult<MessageResponse> {
    let volume = c.adjust_volume(VOLUME_STEP).await?;
    Ok(Json(MessageResponse::new(format!("Volume: {}", volume))))
}

async fn volume_down<B: PlayerBackend>(State(c): Controller<B>) -> ApiResult<MessageResponse> {
    let volume = c.adjust_volume(-VOLUME_STEP).await?;
    Ok(Json(MessageResponse::new(format!("Volume: {}", volume))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{catalog_abc, FakeBackend};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> (Router, Arc<PlaybackController<FakeBackend>>) {
        let controller = Arc::new(PlaybackController::new(catalog_abc(), FakeBackend::default()));
        (router(controller.clone()), controller)
    }

    async fn call(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_stations_lists_catalog() {
        let (app, _) = app();
        let (status, body) = call(&app, Method::GET, "/stations").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                { "name": "A", "url": "urlA" },
                { "name": "B", "url": "urlB" },
                { "name": "C", "url": "urlC" },
            ])
        );
    }

    #[tokio::test]
    async fn test_command_sequence() {
        let (app, _) = app();

        let (status, body) = call(&app, Method::POST, "/next").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Playing: B" }));

        let (_, body) = call(&app, Method::POST, "/volup").await;
        assert_eq!(body, json!({ "message": "Volume: 60" }));

        let (_, body) = call(&app, Method::POST, "/prev").await;
        assert_eq!(body, json!({ "message": "Playing: A" }));

        let (_, body) = call(&app, Method::POST, "/stop").await;
        assert_eq!(body, json!({ "message": "Playback stopped" }));

        let (_, body) = call(&app, Method::POST, "/play").await;
        assert_eq!(body, json!({ "message": "Playing: A" }));

        let (_, body) = call(&app, Method::POST, "/voldown").await;
        assert_eq!(body, json!({ "message": "Volume: 50" }));

        let (status, body) = call(&app, Method::GET, "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "current_station": "A", "volume": 50 }));
    }

    #[tokio::test]
    async fn test_failure_maps_to_500_with_error_body() {
        let (app, controller) = app();
        controller.backend().fail_starts(true);

        let (status, body) = call(&app, Method::POST, "/play").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "failed to start mpv: fake spawn failure" }));

        // No player running: the stop command cannot be delivered.
        let (status, body) = call(&app, Method::POST, "/stop").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("unavailable"));
    }

    #[tokio::test]
    async fn test_version() {
        let (app, _) = app();
        let (status, body) = call(&app, Method::GET, "/version").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_commands_reject_get() {
        let (app, _) = app();
        let request = Request::builder()
            .method(Method::GET)
            .uri("/next")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
