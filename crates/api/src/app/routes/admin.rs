//! Admin console endpoints.
//!
//! Read-mostly views over every registered model, plus the bulk actions declared
//! on each model's admin configuration.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path, Query},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

use quizdesk_core::{RecordId, ValidationErrors};
use quizdesk_schema::{ModelAdmin, Record, RecordIndex, ResourceKind};

use crate::app::errors::ApiError;
use crate::app::handlers::parse_body_as;
use crate::app::pagination::{PageQuery, Paginator};
use crate::app::services::AppServices;

// ─────────────────────────────────────────────────────────────────────────────
// Request DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub ids: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/:model", get(changelist))
        .route("/:model/actions/:action", post(run_action))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /admin - Site header and registered models
pub async fn index(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let site = &services.admin;
    let models: Vec<Value> = site
        .models()
        .map(|admin| {
            json!({
                "model": admin.kind.plural(),
                "name": admin.kind.model_name(),
                "url": format!("/admin/{}", admin.kind.plural()),
                "list_display": admin.list_display,
                "list_display_links": admin.list_display_links,
                "search_fields": admin.search_fields,
                "list_filter": admin.list_filter,
                "ordering": admin.ordering,
                "list_per_page": admin.list_per_page,
                "readonly_fields": admin.readonly_fields,
                "list_editable": admin.list_editable,
                "actions": admin
                    .actions
                    .iter()
                    .map(|a| json!({"name": a.name(), "description": a.description()}))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    Json(json!({
        "site_header": site.site_header,
        "index_title": site.index_title,
        "models": models,
    }))
    .into_response()
}

/// GET /admin/:model?q=&page=&<filter>= - Searchable, ordered, paginated rows
pub async fn changelist(
    Extension(services): Extension<Arc<AppServices>>,
    Path(model): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let admin = registered(&services, &model)?;

    let index = load_index(&services, admin).await?;
    let records = services.store.list(admin.kind).await?;

    let filters: Vec<(String, String)> = params
        .iter()
        .filter(|(key, _)| admin.list_filter.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let mut records = admin.select(records, &index, params.get("q").map(String::as_str), &filters);
    admin.order(&mut records, &index);

    let query = PageQuery {
        page: params.get("page").cloned(),
        page_size: None,
    };
    let page = Paginator::new(admin.list_per_page, admin.list_per_page)
        .paginate(records, &query)?
        .map(|record| Value::Object(admin.row(&record, &index)));

    let mut body = page.into_body("results");
    body["model"] = Value::from(admin.kind.plural());
    body["list_display"] = json!(admin.list_display);
    Ok(Json(body).into_response())
}

/// POST /admin/:model/actions/:action - Apply a bulk action to the given ids
pub async fn run_action(
    Extension(services): Extension<Arc<AppServices>>,
    Path((model, action)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let admin = registered(&services, &model)?;
    let action = admin
        .action(&action)
        .ok_or_else(|| ApiError::not_found(format!("Unknown action `{action}` for {}.", admin.kind)))?;
    let body: ActionRequest = parse_body_as(&body)?;

    let mut errors = ValidationErrors::new();
    let ids: Vec<RecordId> = body
        .ids
        .iter()
        .filter_map(|raw| match raw.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add("ids", format!("\"{raw}\" is not a valid identifier."));
                None
            }
        })
        .collect();
    errors.into_result(())?;

    let mut updated = 0usize;
    for id in ids {
        let Some(record) = services.store.get(admin.kind, id).await? else {
            continue;
        };
        if let Some(changed) = action.apply(&record) {
            if services.store.update(changed).await?.is_some() {
                updated += 1;
            }
        }
    }

    tracing::info!(model = %admin.kind, action = action.name(), updated, "admin action applied");
    Ok(Json(json!({
        "action": action.name(),
        "updated": updated,
        "message": format!("{updated} {} updated.", plural_label(admin.kind, updated)),
    }))
    .into_response())
}

fn registered<'a>(services: &'a AppServices, model: &str) -> Result<&'a ModelAdmin, ApiError> {
    model
        .parse::<ResourceKind>()
        .ok()
        .and_then(|kind| services.admin.get(kind))
        .ok_or_else(|| ApiError::not_found(format!("Unknown model `{model}`.")))
}

/// Records of the kinds `admin` follows references into while searching and rendering.
async fn load_index(services: &AppServices, admin: &ModelAdmin) -> Result<RecordIndex, ApiError> {
    let mut reachable: Vec<Record> = Vec::new();
    for kind in admin.reachable_kinds() {
        reachable.extend(services.store.list(kind).await?);
    }
    Ok(RecordIndex::new(reachable))
}

fn plural_label(kind: ResourceKind, n: usize) -> &'static str {
    if n == 1 { kind.singular() } else { kind.plural() }
}
