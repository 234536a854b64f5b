//! `quizdesk-core`: foundation building blocks shared by every layer.
//!
//! This crate contains **pure** primitives (no storage or HTTP concerns):
//! identity keys, the domain error model and explicit field contracts.

pub mod entity;
pub mod error;
pub mod id;
pub mod validation;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::RecordId;
pub use validation::{
    FieldKind, FieldSpec, ModelSchema, ValidationErrors, ValidationMode, validate,
};
