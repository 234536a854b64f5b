//! Model serializers: field allowlists, payload-to-model conversion and response envelopes.

use std::marker::PhantomData;

use serde_json::{Map, Value};

use quizdesk_core::validation::NON_FIELD_ERRORS;
use quizdesk_core::{
    DomainError, Entity, RecordId, ValidationErrors, ValidationMode, validate,
};

use crate::kind::ResourceKind;
use crate::model::{self, Model};

/// Top-level keys wrapping a resource's responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Collection responses, e.g. `"subjects"`.
    pub list: &'static str,
    /// Single-record responses, e.g. `"subject"`.
    pub item: &'static str,
    /// Create responses, e.g. `"new_subject"`.
    pub created: String,
}

impl Envelope {
    pub fn for_kind(kind: ResourceKind) -> Self {
        Self {
            list: kind.plural(),
            item: kind.singular(),
            created: format!("new_{}", kind.singular()),
        }
    }
}

/// A reference found in a validated payload that still has to be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReference {
    pub field: &'static str,
    pub kind: ResourceKind,
    pub id: RecordId,
}

impl PendingReference {
    /// The report entry for a reference that does not resolve.
    pub fn missing(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.add(
            self.field,
            format!("Invalid pk \"{}\" - object does not exist.", self.id),
        );
        errors
    }
}

/// Serializer for one model type.
#[derive(Debug)]
pub struct ModelSerializer<M> {
    fields: Vec<&'static str>,
    _model: PhantomData<M>,
}

impl<M> Clone for ModelSerializer<M> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> Default for ModelSerializer<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> ModelSerializer<M> {
    /// Serializer exposing every declared field.
    pub fn new() -> Self {
        Self {
            fields: M::SCHEMA.fields.iter().map(|f| f.name).collect(),
            _model: PhantomData,
        }
    }

    pub fn envelope(&self) -> Envelope {
        Envelope::for_kind(M::KIND)
    }

    /// Wire form: `id` plus the allowlisted fields.
    pub fn to_representation(&self, model: &M) -> Value {
        let all = model::fields_of(model);
        let mut out = Map::new();
        out.insert("id".to_string(), Value::String(model.id().to_string()));
        for name in &self.fields {
            if let Some(value) = all.get(*name) {
                out.insert((*name).to_string(), value.clone());
            }
        }
        Value::Object(out)
    }

    /// Check a payload and list the references it carries.
    pub fn validate(
        &self,
        payload: &Value,
        mode: ValidationMode,
    ) -> Result<(Map<String, Value>, Vec<PendingReference>), ValidationErrors> {
        let fields = validate(&M::SCHEMA, payload, mode)?;
        let references = pending_references::<M>(&fields);
        Ok((fields, references))
    }

    /// Build a new record (fresh id) from validated fields.
    pub fn create(&self, fields: Map<String, Value>) -> Result<M, ValidationErrors> {
        model::build(RecordId::new(), fields).map_err(domain_to_validation)
    }

    /// Apply validated fields over `existing`.
    pub fn update(&self, existing: &M, fields: Map<String, Value>) -> Result<M, ValidationErrors> {
        model::merge(existing, fields).map_err(domain_to_validation)
    }
}

fn pending_references<M: Model>(fields: &Map<String, Value>) -> Vec<PendingReference> {
    M::SCHEMA
        .references()
        .filter_map(|spec| {
            let kind = ResourceKind::from_model_name(spec.target()?)?;
            let id = fields.get(spec.name)?.as_str()?.parse().ok()?;
            Some(PendingReference {
                field: spec.name,
                kind,
                id,
            })
        })
        .collect()
}

fn domain_to_validation(err: DomainError) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(NON_FIELD_ERRORS, err.to_string());
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    use crate::{Answer, Attempt, Student};

    #[test]
    fn envelope_keys_follow_resource_names() {
        let envelope = ModelSerializer::<Student>::new().envelope();
        assert_eq!(envelope.list, "students");
        assert_eq!(envelope.item, "student");
        assert_eq!(envelope.created, "new_student");
    }

    #[test]
    fn create_round_trips_input_fields() {
        let serializer = ModelSerializer::<Student>::new();
        let (fields, refs) = serializer
            .validate(&json!({"name": "Ivanov"}), ValidationMode::Full)
            .unwrap();
        assert!(refs.is_empty());

        let student = serializer.create(fields).unwrap();
        let wire = serializer.to_representation(&student);
        assert_eq!(wire["name"], "Ivanov");
        assert_eq!(wire["id"], student.id.to_string());
    }

    #[test]
    fn references_are_collected_for_resolution() {
        let student = RecordId::new();
        let subject = RecordId::new();
        let serializer = ModelSerializer::<Attempt>::new();
        let (_, refs) = serializer
            .validate(
                &json!({
                    "student": student.to_string(),
                    "subject": subject.to_string(),
                    "date": "2024-01-15",
                    "result": 80,
                }),
                ValidationMode::Full,
            )
            .unwrap();

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].kind, ResourceKind::Student);
        assert_eq!(refs[0].id, student);
        assert_eq!(refs[1].field, "subject");

        let report = refs[1].missing();
        assert_eq!(
            report.get("subject").unwrap(),
            [format!("Invalid pk \"{subject}\" - object does not exist.")]
        );
    }

    #[test]
    fn partial_update_keeps_unspecified_fields() {
        let question = RecordId::new();
        let answer = Answer::new("Forty two", false, question);
        let serializer = ModelSerializer::<Answer>::new();

        let (fields, _) = serializer
            .validate(&json!({"is_correct": true}), ValidationMode::Partial)
            .unwrap();
        let updated = serializer.update(&answer, fields).unwrap();

        assert_eq!(updated.id, answer.id);
        assert_eq!(updated.text, "Forty two");
        assert_eq!(updated.question, question);
        assert!(updated.is_correct);
    }

    proptest! {
        #[test]
        fn partial_update_touches_only_given_fields(
            text in "[a-zA-Z0-9 ]{0,40}[a-zA-Z0-9]",
            original in any::<bool>(),
            flip in any::<bool>(),
        ) {
            let question = RecordId::new();
            let answer = Answer::new("Original", original, question);
            let serializer = ModelSerializer::<Answer>::new();

            let payload = if flip {
                json!({"is_correct": !original})
            } else {
                json!({"text": text})
            };
            let (fields, _) = serializer.validate(&payload, ValidationMode::Partial).unwrap();
            let updated = serializer.update(&answer, fields).unwrap();

            prop_assert_eq!(updated.id, answer.id);
            prop_assert_eq!(updated.question, question);
            if flip {
                prop_assert_eq!(updated.text.as_str(), "Original");
                prop_assert_eq!(updated.is_correct, !original);
            } else {
                prop_assert_eq!(updated.text.as_str(), text.trim());
                prop_assert_eq!(updated.is_correct, original);
            }
        }
    }
}
