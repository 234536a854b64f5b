//! The closed set of record types.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use quizdesk_core::DomainError;

/// Record type discriminator (one per table).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Subject,
    Student,
    Attempt,
    Question,
    Answer,
    Testing,
}

impl ResourceKind {
    /// Every kind, parents before children.
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Subject,
        ResourceKind::Student,
        ResourceKind::Attempt,
        ResourceKind::Question,
        ResourceKind::Answer,
        ResourceKind::Testing,
    ];

    /// Model name as used in field contracts (`FieldKind::Reference { target }`).
    pub fn model_name(self) -> &'static str {
        match self {
            ResourceKind::Subject => "Subject",
            ResourceKind::Student => "Student",
            ResourceKind::Attempt => "Attempt",
            ResourceKind::Question => "Question",
            ResourceKind::Answer => "Answer",
            ResourceKind::Testing => "Testing",
        }
    }

    /// Lowercase singular, e.g. `"subject"`.
    pub fn singular(self) -> &'static str {
        match self {
            ResourceKind::Subject => "subject",
            ResourceKind::Student => "student",
            ResourceKind::Attempt => "attempt",
            ResourceKind::Question => "question",
            ResourceKind::Answer => "answer",
            ResourceKind::Testing => "testing",
        }
    }

    /// Lowercase plural, also the table name, e.g. `"subjects"`.
    pub fn plural(self) -> &'static str {
        match self {
            ResourceKind::Subject => "subjects",
            ResourceKind::Student => "students",
            ResourceKind::Attempt => "attempts",
            ResourceKind::Question => "questions",
            ResourceKind::Answer => "answers",
            ResourceKind::Testing => "testings",
        }
    }

    /// Resolve a model name from a field contract.
    pub fn from_model_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.model_name() == name)
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.model_name())
    }
}

impl FromStr for ResourceKind {
    type Err = DomainError;

    /// Accepts the singular or plural lowercase form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.singular() == s || k.plural() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown model: {s}")))
    }
}
