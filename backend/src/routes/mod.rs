//! Route definitions for the Produce Traceability Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Reception lifecycle and availability
        .nest("/receptions", reception_routes())
        // Consolidation allocation
        .nest("/consolidations", consolidation_routes())
        // Expedition allocation
        .nest("/expeditions", expedition_routes())
        // Physical storage tracking
        .nest("/storage", storage_routes())
        // Chain-of-custody queries
        .nest("/trace", trace_routes())
        // Certification gate reads
        .nest("/certifications", certification_routes())
}

/// Reception lifecycle routes
fn reception_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_receptions))
        .route("/:reception_id", get(handlers::get_reception))
        .route("/:reception_id/approve", post(handlers::approve_reception))
        .route("/:reception_id/reject", post(handlers::reject_reception))
        .route("/:reception_id/availability", get(handlers::get_availability))
        .route("/:reception_id/label", get(handlers::get_label_payload))
        .route(
            "/:reception_id/certifiable",
            get(handlers::check_certifiable),
        )
}

/// Consolidation routes
fn consolidation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_consolidations).post(handlers::create_consolidation),
        )
        .route(
            "/:lot_id",
            get(handlers::get_consolidation).delete(handlers::delete_consolidation),
        )
}

/// Expedition routes
fn expedition_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_expeditions).post(handlers::create_expedition),
        )
        .route(
            "/:expedition_id",
            get(handlers::get_expedition).delete(handlers::delete_expedition),
        )
}

/// Storage routes
fn storage_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/locations",
            get(handlers::list_locations).post(handlers::create_location),
        )
        .route(
            "/movements",
            get(handlers::list_movements).post(handlers::record_movement),
        )
        .route("/positions", get(handlers::list_positions))
        .route("/positions/:reception_id", get(handlers::get_position))
}

/// Traceability routes
fn trace_routes() -> Router<AppState> {
    Router::new()
        .route("/reception/:reception_id", get(handlers::trace_forward))
        .route(
            "/consolidation/:consolidated_lot_id",
            get(handlers::trace_backward_consolidation),
        )
        .route(
            "/expedition/:expedition_id",
            get(handlers::trace_backward_expedition),
        )
}

/// Certification routes
fn certification_routes() -> Router<AppState> {
    Router::new().route("/expiring", get(handlers::get_expiring_certifications))
}
