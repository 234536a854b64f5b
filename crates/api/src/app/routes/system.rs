use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app::services::AppServices;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /api/v1/routes - The compiled resource route table
pub async fn routes(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    let table = &services.routes;
    let routes: Vec<_> = table
        .descriptors
        .iter()
        .map(|d| {
            json!({
                "name": d.name,
                "verb": d.verb,
                "path": format!("{}{}", table.mount, d.path),
                "action": d.action,
                "detail": d.detail,
            })
        })
        .collect();
    Json(json!({ "routes": routes }))
}
