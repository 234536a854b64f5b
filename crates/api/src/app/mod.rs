//! HTTP API application wiring (Axum router + shared services).
//!
//! - `router.rs`: route templates, viewsets and route-table compilation
//! - `viewsets.rs`: which actions each resource exposes
//! - `handlers.rs`: generic CRUD handlers, one instantiation per model
//! - `pagination.rs`: page-number pagination for list endpoints
//! - `services.rs`: shared state and store wiring
//! - `routes/`: health, route listing and admin endpoints
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use quizdesk_infra::{PaginationConfig, Store};
use quizdesk_schema::AdminSite;

use crate::middleware;

pub mod errors;
pub mod handlers;
pub mod pagination;
pub mod router;
pub mod routes;
pub mod services;
pub mod viewsets;

use router::{ResourceRouter, RouterError};
use services::AppServices;

/// Mount point of the resource routes.
pub const API_PREFIX: &str = "/api/v1";

/// Build the full HTTP router (public entrypoint used by `main.rs` and the tests).
///
/// Fails when the resource registrations collide.
pub fn build_app(store: Arc<dyn Store>, pagination: PaginationConfig) -> Result<Router, RouterError> {
    let mut resources = ResourceRouter::simple(API_PREFIX);
    viewsets::register_all(&mut resources)?;
    let table = resources.table();
    tracing::info!(routes = table.descriptors.len(), "route table compiled");

    let services = Arc::new(AppServices {
        store,
        paginator: pagination.into(),
        admin: AdminSite::with_defaults(),
        routes: table,
    });

    Ok(Router::new()
        .merge(resources.into_router())
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_log))
                .layer(Extension(services)),
        ))
}
