use axum::{routing::get, Router};

pub mod admin;
pub mod system;

/// Endpoints that sit beside the resource routes.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/api/v1/routes", get(system::routes))
        .nest("/admin", admin::router())
}
