//! Generic CRUD handlers, instantiated once per model (`handlers::list::<Subject>`).

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Extension, Path, Query};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use quizdesk_core::validation::NON_FIELD_ERRORS;
use quizdesk_core::{Entity, RecordId, ValidationErrors, ValidationMode};
use quizdesk_infra::Store;
use quizdesk_schema::{Model, ModelSerializer, PendingReference};

use crate::app::errors::ApiError;
use crate::app::pagination::PageQuery;
use crate::app::services::AppServices;

type HandlerResult = Result<Response, ApiError>;

/// `GET /{prefix}`: one page of the collection, in creation order.
pub async fn list<M: Model>(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<PageQuery>,
) -> HandlerResult {
    let serializer = ModelSerializer::<M>::new();
    let records = services.store.list_models::<M>().await?;
    let page = services
        .paginator
        .paginate(records, &query)?
        .map(|m| serializer.to_representation(&m));
    Ok(Json(page.into_body(serializer.envelope().list)).into_response())
}

/// `POST /{prefix}`.
pub async fn create<M: Model>(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> HandlerResult {
    let serializer = ModelSerializer::<M>::new();
    let payload = parse_body(&body)?;
    let (fields, references) = serializer.validate(&payload, ValidationMode::Full)?;
    resolve_references(&services.store, &references).await?;

    let model = services.store.insert_model(serializer.create(fields)?).await?;
    tracing::info!(kind = %M::KIND, id = %model.id(), "record created");

    let mut body = Map::new();
    body.insert(serializer.envelope().created, serializer.to_representation(&model));

    let location = services.detail_url(M::KIND.singular(), &model.id().to_string());
    let mut response = (StatusCode::CREATED, Json(Value::Object(body))).into_response();
    if let Some(value) = location.and_then(|l| header::HeaderValue::from_str(&l).ok()) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    Ok(response)
}

/// `GET /{prefix}/{id}`.
pub async fn retrieve<M: Model>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(lookup): Path<String>,
) -> HandlerResult {
    let model = fetch::<M>(&services.store, &lookup).await?;
    Ok(item_response::<M>(&model))
}

/// `PUT /{prefix}/{id}`: every writable field is required.
pub async fn update<M: Model>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(lookup): Path<String>,
    body: Bytes,
) -> HandlerResult {
    apply_update::<M>(&services, &lookup, &body, ValidationMode::Full).await
}

/// `PATCH /{prefix}/{id}`: only the given fields change.
pub async fn partial_update<M: Model>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(lookup): Path<String>,
    body: Bytes,
) -> HandlerResult {
    apply_update::<M>(&services, &lookup, &body, ValidationMode::Partial).await
}

/// `DELETE /{prefix}/{id}`: removes the record and everything referencing it.
pub async fn destroy<M: Model>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(lookup): Path<String>,
) -> HandlerResult {
    let id = parse_lookup::<M>(&lookup)?;
    if !services.store.delete(M::KIND, id).await? {
        return Err(no_match::<M>());
    }
    tracing::info!(kind = %M::KIND, %id, "record deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `GET /{prefix}/random`: one uniformly chosen record.
pub async fn random<M: Model>(Extension(services): Extension<Arc<AppServices>>) -> HandlerResult {
    let records = services.store.list_models::<M>().await?;
    let model = records
        .choose(&mut rand::thread_rng())
        .ok_or_else(|| ApiError::not_found(format!("No {} records.", M::KIND)))?;
    Ok(item_response::<M>(model))
}

async fn apply_update<M: Model>(
    services: &AppServices,
    lookup: &str,
    body: &[u8],
    mode: ValidationMode,
) -> HandlerResult {
    let existing = fetch::<M>(&services.store, lookup).await?;

    let serializer = ModelSerializer::<M>::new();
    let payload = parse_body(body)?;
    let (fields, references) = serializer.validate(&payload, mode)?;
    resolve_references(&services.store, &references).await?;

    let updated = serializer.update(&existing, fields)?;
    let Some(stored) = services.store.update_model(updated).await? else {
        // Deleted between the read and the write.
        return Err(no_match::<M>());
    };
    tracing::info!(kind = %M::KIND, id = %stored.id(), "record updated");
    Ok(item_response::<M>(&stored))
}

async fn fetch<M: Model>(store: &Arc<dyn Store>, lookup: &str) -> Result<M, ApiError> {
    let id = parse_lookup::<M>(lookup)?;
    store.get_model::<M>(id).await?.ok_or_else(no_match::<M>)
}

/// Lookups that are not identity keys cannot match anything.
fn parse_lookup<M: Model>(lookup: &str) -> Result<RecordId, ApiError> {
    lookup.parse().map_err(|_| no_match::<M>())
}

fn no_match<M: Model>() -> ApiError {
    ApiError::not_found(format!("No {} matches the given query.", M::KIND))
}

fn item_response<M: Model>(model: &M) -> Response {
    let serializer = ModelSerializer::<M>::new();
    let mut body = Map::new();
    body.insert(
        serializer.envelope().item.to_string(),
        serializer.to_representation(model),
    );
    Json(Value::Object(body)).into_response()
}

/// An empty body reads as an empty object.
pub(crate) fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| body_error(format!("JSON parse error - {e}")))
}

/// Like [`parse_body`], then shaped into `T`. A wrong shape is a validation error too.
pub(crate) fn parse_body_as<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_value(parse_body(body)?).map_err(|e| body_error(format!("Invalid data - {e}")))
}

fn body_error(message: String) -> ApiError {
    let mut errors = ValidationErrors::new();
    errors.add(NON_FIELD_ERRORS, message);
    ApiError::Validation(errors)
}

/// Check that every referenced record exists; missing ones are field errors.
async fn resolve_references(
    store: &Arc<dyn Store>,
    references: &[PendingReference],
) -> Result<(), ApiError> {
    let mut errors = ValidationErrors::new();
    for reference in references {
        if store.get(reference.kind, reference.id).await?.is_none() {
            errors.merge(reference.missing());
        }
    }
    errors.into_result(()).map_err(ApiError::from)
}
