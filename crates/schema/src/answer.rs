//! Answer: a candidate answer to a question.

use serde::{Deserialize, Serialize};

use quizdesk_core::{DomainResult, Entity, FieldSpec, ModelSchema, RecordId};

use crate::kind::ResourceKind;
use crate::model::{Model, truncated};
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: RecordId,
    pub text: String,
    pub is_correct: bool,
    pub question: RecordId,
}

impl Answer {
    pub fn new(text: impl Into<String>, is_correct: bool, question: RecordId) -> Self {
        Self {
            id: RecordId::new(),
            text: text.into(),
            is_correct,
            question,
        }
    }
}

impl Entity for Answer {
    fn id(&self) -> RecordId {
        self.id
    }

    fn display(&self) -> String {
        truncated(&self.text)
    }
}

impl Model for Answer {
    const KIND: ResourceKind = ResourceKind::Answer;
    const SCHEMA: ModelSchema = ModelSchema {
        name: "Answer",
        fields: &[
            FieldSpec::text("text", None),
            FieldSpec::boolean("is_correct"),
            FieldSpec::reference("question", "Question"),
        ],
    };

    fn references(&self) -> Vec<(ResourceKind, RecordId)> {
        vec![(ResourceKind::Question, self.question)]
    }

    fn into_record(self) -> Record {
        Record::from(self)
    }

    fn from_record(record: Record) -> DomainResult<Self> {
        Self::try_from(record)
    }
}
