//! Entity trait: identity + continuity across state changes.

use crate::id::RecordId;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Returns the entity identifier.
    fn id(&self) -> RecordId;

    /// Human-readable label, used wherever a record is listed by name.
    fn display(&self) -> String;
}
