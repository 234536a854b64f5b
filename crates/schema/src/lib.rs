//! `quizdesk-schema`: record types, their field contracts and serializers.

pub mod admin;
pub mod answer;
pub mod attempt;
pub mod kind;
pub mod model;
pub mod question;
pub mod record;
pub mod serializer;
pub mod student;
pub mod subject;
pub mod testing;

pub use admin::{AdminAction, AdminSite, ModelAdmin, RecordIndex};
pub use answer::Answer;
pub use attempt::Attempt;
pub use kind::ResourceKind;
pub use model::Model;
pub use question::Question;
pub use record::Record;
pub use serializer::{Envelope, ModelSerializer, PendingReference};
pub use student::Student;
pub use subject::Subject;
pub use testing::Testing;
