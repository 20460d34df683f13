use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{self, entries, review, students, webhooks};
use crate::AppState;

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/catalog", get(handlers::get_catalog))
        .route(
            "/api/logs/:kind",
            get(entries::list_entries).post(entries::create_entry),
        )
        .route("/api/logs/:kind/bulk-sign", post(review::bulk_sign))
        .route(
            "/api/logs/:kind/:id",
            get(entries::get_entry)
                .patch(entries::update_entry)
                .delete(entries::delete_entry),
        )
        .route("/api/logs/:kind/:id/submit", post(entries::submit_entry))
        .route("/api/logs/:kind/:id/sign", post(review::sign_entry))
        .route("/api/logs/:kind/:id/reject", post(review::reject_entry))
        .route("/api/review/pending", get(review::pending))
        .route("/api/students/:id/progress", get(students::progress))
        .route("/api/students/:id/logbook.csv", get(students::logbook_csv))
        .route("/api/webhooks/identity", post(webhooks::identity))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
