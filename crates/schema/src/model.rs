//! The `Model` trait: what every record type exposes to the store and the HTTP layer.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use quizdesk_core::{DomainError, DomainResult, Entity, ModelSchema, RecordId};

use crate::kind::ResourceKind;
use crate::record::Record;

/// A persisted record type.
///
/// The serde representation of a model is exactly `id` plus the fields named in
/// [`Model::SCHEMA`]; [`build`] and [`fields_of`] rely on that.
pub trait Model: Entity + Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    /// Writable field contract.
    const SCHEMA: ModelSchema;

    /// References held by this record, as `(kind, id)` pairs.
    fn references(&self) -> Vec<(ResourceKind, RecordId)>;

    /// Invariants that hold regardless of how the record was built.
    fn check_invariants(&self) -> DomainResult<()> {
        Ok(())
    }

    fn into_record(self) -> Record;

    fn from_record(record: Record) -> DomainResult<Self>;
}

/// Build a model from validated fields.
pub fn build<M: Model>(id: RecordId, mut fields: Map<String, Value>) -> DomainResult<M> {
    fields.insert("id".to_string(), Value::String(id.to_string()));
    let model: M = serde_json::from_value(Value::Object(fields))
        .map_err(|e| DomainError::validation(format!("{}: {}", M::KIND, e)))?;
    model.check_invariants()?;
    Ok(model)
}

/// Writable fields of a model, without its `id`.
pub fn fields_of<M: Model>(model: &M) -> Map<String, Value> {
    let mut fields = match serde_json::to_value(model) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    fields.remove("id");
    fields
}

/// Apply `changes` over the current fields of `existing`, keeping its identity.
pub fn merge<M: Model>(existing: &M, changes: Map<String, Value>) -> DomainResult<M> {
    let mut fields = fields_of(existing);
    fields.extend(changes);
    build(existing.id(), fields)
}

/// Text shortened for listings: the first 30 characters followed by `...`.
pub(crate) fn truncated(text: &str) -> String {
    let head: String = text.chars().take(30).collect();
    format!("{head}...")
}

/// Reject blank text.
pub(crate) fn ensure_not_blank(model: &str, field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::invariant(format!("{model}.{field} must not be empty")));
    }
    Ok(())
}
