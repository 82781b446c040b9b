//! Reetro Core - Entity Types
//!
//! Plain data structures shared by the storage and API crates: users, boards,
//! feedback, the error taxonomy, pagination arithmetic and the domain
//! validation rules applied before any write reaches a store.

mod entities;
mod enums;
mod error;
mod pagination;
pub mod validation;

pub use entities::*;
pub use enums::*;
pub use error::*;
pub use pagination::*;

use chrono::{DateTime, Utc};
use uuid::Uuid;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Entity identifier. Cache keys are this value rendered as a string.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new random entity id.
pub fn new_entity_id() -> EntityId {
    Uuid::new_v4()
}
