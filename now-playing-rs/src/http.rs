use std::{net::SocketAddr, time::Instant};

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::{
    app_state::{AppState, ProfileState},
    logging::logger,
    player::{PlayerError, SessionSnapshot},
    presenter::DisplayState,
    profile::auth_error_message,
    stations::StationSummary,
};

const OPENAPI_SPEC: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/openapi.json"));

type ApiResponse = Result<Response, ApiError>;

fn extract_request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(|value| value.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn extract_client_ip(headers: &HeaderMap, remote: Option<&SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| remote.map(|addr| addr.ip().to_string()))
}

async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let request_id = extract_request_id(request.headers());
    let method = request.method().clone();
    let raw_url = request.uri().to_string();
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| &info.0);
    let client_ip = extract_client_ip(request.headers(), remote);
    let started_at = Instant::now();

    logger().info(
        "request.received",
        json!({
            "requestId": request_id,
            "method": method.as_str(),
            "rawUrl": raw_url,
            "clientIp": client_ip,
        }),
    );

    let mut response = next.run(request).await;
    let status = response.status().as_u16();
    let duration_ms = started_at.elapsed().as_secs_f64() * 1000.0;

    logger().info(
        "request.completed",
        json!({
            "requestId": request_id,
            "method": method.as_str(),
            "rawUrl": raw_url,
            "statusCode": status,
            "durationMs": duration_ms,
            "clientIp": client_ip,
        }),
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(header::HeaderName::from_static("x-request-id"), value);
    }

    response
}

fn json_response<T>(status: StatusCode, payload: T) -> Response
where
    T: Serialize,
{
    (status, Json(payload)).into_response()
}

#[derive(Debug)]
enum ApiError {
    BadRequest(&'static str),
    NotFound(&'static str),
    Conflict(&'static str),
    Identity { code: &'static str },
    Internal(anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

impl From<PlayerError> for ApiError {
    fn from(error: PlayerError) -> Self {
        match error {
            PlayerError::UnknownStation(_) => ApiError::NotFound("Station not found"),
            PlayerError::NothingPlaying => ApiError::Conflict("No station is playing"),
            PlayerError::Fetch(error) => ApiError::Internal(error.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse { error: message }),
            )
                .into_response(),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse { error: message }),
            )
                .into_response(),
            ApiError::Conflict(message) => {
                (StatusCode::CONFLICT, Json(ErrorResponse { error: message })).into_response()
            }
            ApiError::Identity { code } => {
                let status = if code == "auth/user-not-found" {
                    StatusCode::NOT_FOUND
                } else {
                    StatusCode::SERVICE_UNAVAILABLE
                };
                (
                    status,
                    Json(json!({
                        "error": auth_error_message(code),
                        "code": code,
                    })),
                )
                    .into_response()
            }
            ApiError::Internal(error) => {
                logger().error(
                    "internal.error",
                    json!({
                        "error": {
                            "message": error.to_string(),
                            "debug": format!("{:?}", error),
                        }
                    }),
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Internal Server Error",
                    }),
                )
                    .into_response()
            }
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/openapi.json", get(openapi_spec))
        .route("/stations", get(get_stations))
        .route("/stations/{station_id}", get(get_station))
        .route("/player/play", post(play))
        .route("/player/toggle", post(toggle))
        .route("/player/stop", post(stop))
        .route("/now-playing", get(now_playing))
        .route("/history", get(history))
        .route("/profile", get(profile))
        .with_state(state)
        .layer(middleware::from_fn(log_requests))
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let player = state.player.clone();
    let router = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    logger().info(
        "server.listening",
        json!({
            "address": addr.to_string()
        }),
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    player.stop().await;
    Ok(())
}

#[derive(Serialize)]
struct HealthResponse<'a> {
    status: &'a str,
}

async fn healthz() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn openapi_spec() -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "public, max-age=60"),
        ],
        OPENAPI_SPEC,
    )
        .into_response()
}

#[derive(Serialize)]
struct StationsResponse {
    total: usize,
    stations: Vec<StationSummary>,
}

async fn get_stations(State(state): State<AppState>) -> Response {
    let stations = state.catalog.summaries(state.profile.favorites());
    json_response(
        StatusCode::OK,
        StationsResponse {
            total: stations.len(),
            stations,
        },
    )
}

async fn get_station(
    State(state): State<AppState>,
    Path(station_id): Path<String>,
) -> ApiResponse {
    let station = state
        .catalog
        .get(&station_id)
        .ok_or(ApiError::NotFound("Station not found"))?;
    Ok(json_response(StatusCode::OK, station))
}

#[derive(Serialize)]
struct PlayerResponse {
    #[serde(flatten)]
    session: SessionSnapshot,
    display: DisplayState,
}

async fn player_response(state: &AppState, session: SessionSnapshot) -> Response {
    let display = state.board.snapshot().await;
    json_response(StatusCode::OK, PlayerResponse { session, display })
}

#[derive(Deserialize)]
struct PlayBody {
    #[serde(rename = "stationId")]
    station_id: Option<String>,
}

async fn play(State(state): State<AppState>, body: Bytes) -> ApiResponse {
    let station_id = serde_json::from_slice::<PlayBody>(&body)
        .ok()
        .and_then(|body| body.station_id)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::BadRequest("stationId is required"))?;

    let session = state.player.play(&station_id).await?;
    Ok(player_response(&state, session).await)
}

async fn toggle(State(state): State<AppState>) -> ApiResponse {
    let session = state.player.toggle().await?;
    Ok(player_response(&state, session).await)
}

async fn stop(State(state): State<AppState>) -> Response {
    let session = state.player.stop().await;
    player_response(&state, session).await
}

async fn now_playing(State(state): State<AppState>) -> Response {
    let session = state.player.snapshot().await;
    player_response(&state, session).await
}

async fn history(State(state): State<AppState>) -> Response {
    json_response(StatusCode::OK, state.player.history(Utc::now()).await)
}

async fn profile(State(state): State<AppState>) -> ApiResponse {
    match state.profile.as_ref() {
        ProfileState::Loaded(profile) => Ok(json_response(StatusCode::OK, profile)),
        ProfileState::Unavailable { code } => Err(ApiError::Identity { code: *code }),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            logger().error("server.signal_error", json!({ "error": error.to_string() }));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                logger().error("server.signal_error", json!({ "error": error.to_string() }));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    logger().info("server.shutdown", json!({}));
}
