//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::handlers::{
    adjacency, auth_status, cancel_video, delete_project, dismiss_error, generate_image,
    generate_plan, generate_video, get_project, health, hero_options, select_hero, select_key,
    set_hero, start_analysis, update_shot, update_visual_identity,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let project_routes = Router::new()
        .route("/project", get(get_project).delete(delete_project))
        .route("/project/error", delete(dismiss_error))
        .route("/analysis", post(start_analysis))
        .route("/hero/options", post(hero_options))
        .route("/hero/select", post(select_hero))
        .route("/hero", put(set_hero))
        .route("/visual-identity", patch(update_visual_identity))
        .route("/plan", post(generate_plan));

    let shot_routes = Router::new()
        .route("/scenes/:scene_id/shots/:shot_id", patch(update_shot))
        .route("/scenes/:scene_id/shots/:shot_id/adjacency", get(adjacency))
        .route("/scenes/:scene_id/shots/:shot_id/image", post(generate_image))
        .route(
            "/scenes/:scene_id/shots/:shot_id/video",
            post(generate_video).delete(cancel_video),
        );

    let auth_routes = Router::new()
        .route("/auth/status", get(auth_status))
        .route("/auth/select-key", post(select_key));

    let api_routes = Router::new()
        .merge(project_routes)
        .merge(shot_routes)
        .merge(auth_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Materialized video clips
    let pipeline_config = state.orchestrator.config();
    let media = ServeDir::new(&pipeline_config.media_dir);
    let media_prefix = pipeline_config.media_url_prefix.clone();

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .nest_service(&media_prefix, media)
        // Audio uploads exceed the extractor default; the layer below enforces the limit
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
