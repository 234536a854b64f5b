//! Testing: which answer was given to which question during an attempt.

use serde::{Deserialize, Serialize};

use quizdesk_core::{DomainResult, Entity, FieldSpec, ModelSchema, RecordId};

use crate::kind::ResourceKind;
use crate::model::Model;
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testing {
    pub id: RecordId,
    pub attempt: RecordId,
    pub question: RecordId,
    pub answer: RecordId,
}

impl Testing {
    pub fn new(attempt: RecordId, question: RecordId, answer: RecordId) -> Self {
        Self {
            id: RecordId::new(),
            attempt,
            question,
            answer,
        }
    }
}

impl Entity for Testing {
    fn id(&self) -> RecordId {
        self.id
    }

    fn display(&self) -> String {
        format!("Testing object ({})", self.id)
    }
}

impl Model for Testing {
    const KIND: ResourceKind = ResourceKind::Testing;
    const SCHEMA: ModelSchema = ModelSchema {
        name: "Testing",
        fields: &[
            FieldSpec::reference("attempt", "Attempt"),
            FieldSpec::reference("question", "Question"),
            FieldSpec::reference("answer", "Answer"),
        ],
    };

    fn references(&self) -> Vec<(ResourceKind, RecordId)> {
        vec![
            (ResourceKind::Attempt, self.attempt),
            (ResourceKind::Question, self.question),
            (ResourceKind::Answer, self.answer),
        ]
    }

    fn into_record(self) -> Record {
        Record::from(self)
    }

    fn from_record(record: Record) -> DomainResult<Self> {
        Self::try_from(record)
    }
}
