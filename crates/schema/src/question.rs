//! Question: a prompt within a subject.

use serde::{Deserialize, Serialize};

use quizdesk_core::{DomainResult, Entity, FieldSpec, ModelSchema, RecordId};

use crate::kind::ResourceKind;
use crate::model::{Model, ensure_not_blank, truncated};
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: RecordId,
    pub text: String,
    pub subject: RecordId,
}

impl Question {
    pub fn new(text: impl Into<String>, subject: RecordId) -> DomainResult<Self> {
        let question = Self {
            id: RecordId::new(),
            text: text.into(),
            subject,
        };
        question.check_invariants()?;
        Ok(question)
    }
}

impl Entity for Question {
    fn id(&self) -> RecordId {
        self.id
    }

    fn display(&self) -> String {
        truncated(&self.text)
    }
}

impl Model for Question {
    const KIND: ResourceKind = ResourceKind::Question;
    const SCHEMA: ModelSchema = ModelSchema {
        name: "Question",
        fields: &[
            FieldSpec::text("text", None),
            FieldSpec::reference("subject", "Subject"),
        ],
    };

    fn references(&self) -> Vec<(ResourceKind, RecordId)> {
        vec![(ResourceKind::Subject, self.subject)]
    }

    fn check_invariants(&self) -> DomainResult<()> {
        ensure_not_blank("Question", "text", &self.text)
    }

    fn into_record(self) -> Record {
        Record::from(self)
    }

    fn from_record(record: Record) -> DomainResult<Self> {
        Self::try_from(record)
    }
}
