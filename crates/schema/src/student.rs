//! Student: the person taking attempts.

use serde::{Deserialize, Serialize};

use quizdesk_core::{DomainResult, Entity, FieldSpec, ModelSchema, RecordId};

use crate::kind::ResourceKind;
use crate::model::{Model, ensure_not_blank};
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: RecordId,
    /// Surname and first name.
    pub name: String,
}

impl Student {
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let student = Self {
            id: RecordId::new(),
            name: name.into(),
        };
        student.check_invariants()?;
        Ok(student)
    }
}

impl Entity for Student {
    fn id(&self) -> RecordId {
        self.id
    }

    fn display(&self) -> String {
        self.name.clone()
    }
}

impl Model for Student {
    const KIND: ResourceKind = ResourceKind::Student;
    const SCHEMA: ModelSchema = ModelSchema {
        name: "Student",
        fields: &[FieldSpec::text("name", Some(255))],
    };

    fn references(&self) -> Vec<(ResourceKind, RecordId)> {
        Vec::new()
    }

    fn check_invariants(&self) -> DomainResult<()> {
        ensure_not_blank("Student", "name", &self.name)
    }

    fn into_record(self) -> Record {
        Record::from(self)
    }

    fn from_record(record: Record) -> DomainResult<Self> {
        Self::try_from(record)
    }
}
