//! `Record`: one value of any record type, as held by the store.

use quizdesk_core::{DomainError, Entity, RecordId};

use crate::answer::Answer;
use crate::attempt::Attempt;
use crate::kind::ResourceKind;
use crate::model::Model;
use crate::question::Question;
use crate::student::Student;
use crate::subject::Subject;
use crate::testing::Testing;

/// Sum of all record types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Subject(Subject),
    Student(Student),
    Attempt(Attempt),
    Question(Question),
    Answer(Answer),
    Testing(Testing),
}

impl Record {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Record::Subject(_) => ResourceKind::Subject,
            Record::Student(_) => ResourceKind::Student,
            Record::Attempt(_) => ResourceKind::Attempt,
            Record::Question(_) => ResourceKind::Question,
            Record::Answer(_) => ResourceKind::Answer,
            Record::Testing(_) => ResourceKind::Testing,
        }
    }

    pub fn id(&self) -> RecordId {
        match self {
            Record::Subject(r) => r.id(),
            Record::Student(r) => r.id(),
            Record::Attempt(r) => r.id(),
            Record::Question(r) => r.id(),
            Record::Answer(r) => r.id(),
            Record::Testing(r) => r.id(),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Record::Subject(r) => r.display(),
            Record::Student(r) => r.display(),
            Record::Attempt(r) => r.display(),
            Record::Question(r) => r.display(),
            Record::Answer(r) => r.display(),
            Record::Testing(r) => r.display(),
        }
    }

    pub fn references(&self) -> Vec<(ResourceKind, RecordId)> {
        match self {
            Record::Subject(r) => r.references(),
            Record::Student(r) => r.references(),
            Record::Attempt(r) => r.references(),
            Record::Question(r) => r.references(),
            Record::Answer(r) => r.references(),
            Record::Testing(r) => r.references(),
        }
    }

    /// Whether this record points at `(kind, id)`.
    pub fn refers_to(&self, kind: ResourceKind, id: RecordId) -> bool {
        self.references().contains(&(kind, id))
    }

    /// Full serde representation (`id` plus every field).
    pub fn to_json(&self) -> serde_json::Value {
        let value = match self {
            Record::Subject(r) => serde_json::to_value(r),
            Record::Student(r) => serde_json::to_value(r),
            Record::Attempt(r) => serde_json::to_value(r),
            Record::Question(r) => serde_json::to_value(r),
            Record::Answer(r) => serde_json::to_value(r),
            Record::Testing(r) => serde_json::to_value(r),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}

macro_rules! impl_record_variant {
    ($model:ident) => {
        impl From<$model> for Record {
            fn from(value: $model) -> Self {
                Record::$model(value)
            }
        }

        impl TryFrom<Record> for $model {
            type Error = DomainError;

            fn try_from(record: Record) -> Result<Self, Self::Error> {
                match record {
                    Record::$model(value) => Ok(value),
                    other => Err(DomainError::KindMismatch {
                        expected: stringify!($model),
                        found: other.kind().model_name(),
                    }),
                }
            }
        }
    };
}

impl_record_variant!(Subject);
impl_record_variant!(Student);
impl_record_variant!(Attempt);
impl_record_variant!(Question);
impl_record_variant!(Answer);
impl_record_variant!(Testing);
