//! Attempt: one student's sitting of a subject, with its score.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use quizdesk_core::{DomainError, DomainResult, Entity, FieldSpec, ModelSchema, RecordId};
use quizdesk_core::validation::SMALL_UINT_MAX;

use crate::kind::ResourceKind;
use crate::model::Model;
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: RecordId,
    pub student: RecordId,
    pub subject: RecordId,
    pub date: NaiveDate,
    pub result: u16,
}

impl Attempt {
    pub fn new(student: RecordId, subject: RecordId, date: NaiveDate, result: u16) -> DomainResult<Self> {
        let attempt = Self {
            id: RecordId::new(),
            student,
            subject,
            date,
            result,
        };
        attempt.check_invariants()?;
        Ok(attempt)
    }
}

impl Entity for Attempt {
    fn id(&self) -> RecordId {
        self.id
    }

    fn display(&self) -> String {
        format!("Attempt object ({})", self.id)
    }
}

impl Model for Attempt {
    const KIND: ResourceKind = ResourceKind::Attempt;
    const SCHEMA: ModelSchema = ModelSchema {
        name: "Attempt",
        fields: &[
            FieldSpec::reference("student", "Student"),
            FieldSpec::reference("subject", "Subject"),
            FieldSpec::date("date"),
            FieldSpec::small_uint("result"),
        ],
    };

    fn references(&self) -> Vec<(ResourceKind, RecordId)> {
        vec![
            (ResourceKind::Student, self.student),
            (ResourceKind::Subject, self.subject),
        ]
    }

    fn check_invariants(&self) -> DomainResult<()> {
        if i64::from(self.result) > SMALL_UINT_MAX {
            return Err(DomainError::invariant(format!(
                "Attempt.result must be at most {SMALL_UINT_MAX}"
            )));
        }
        Ok(())
    }

    fn into_record(self) -> Record {
        Record::from(self)
    }

    fn from_record(record: Record) -> DomainResult<Self> {
        Self::try_from(record)
    }
}
