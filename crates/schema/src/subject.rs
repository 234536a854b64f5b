//! Subject: a topic that questions and attempts belong to.

use serde::{Deserialize, Serialize};

use quizdesk_core::{DomainResult, Entity, FieldSpec, ModelSchema, RecordId};

use crate::kind::ResourceKind;
use crate::model::{Model, ensure_not_blank};
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: RecordId,
    pub title: String,
}

impl Subject {
    pub fn new(title: impl Into<String>) -> DomainResult<Self> {
        let subject = Self {
            id: RecordId::new(),
            title: title.into(),
        };
        subject.check_invariants()?;
        Ok(subject)
    }
}

impl Entity for Subject {
    fn id(&self) -> RecordId {
        self.id
    }

    fn display(&self) -> String {
        self.title.clone()
    }
}

impl Model for Subject {
    const KIND: ResourceKind = ResourceKind::Subject;
    const SCHEMA: ModelSchema = ModelSchema {
        name: "Subject",
        fields: &[FieldSpec::text("title", Some(255))],
    };

    fn references(&self) -> Vec<(ResourceKind, RecordId)> {
        Vec::new()
    }

    fn check_invariants(&self) -> DomainResult<()> {
        ensure_not_blank("Subject", "title", &self.title)
    }

    fn into_record(self) -> Record {
        Record::from(self)
    }

    fn from_record(record: Record) -> DomainResult<Self> {
        Self::try_from(record)
    }
}
