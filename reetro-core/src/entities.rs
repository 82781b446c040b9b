//! Persisted entities and the drafts/patches used to create and update them.

use serde::{Deserialize, Serialize};

use crate::{new_entity_id, ColumnType, EntityId, Role, Template, Timestamp};

// ============================================================================
// USER
// ============================================================================

/// A user row as the authoritative store holds it, password hash included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

impl User {
    /// Build a fresh user from a validated draft and an already-hashed password.
    pub fn from_draft(draft: NewUser, password_hash: String, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            first_name: draft.first_name,
            last_name: draft.last_name,
            username: draft.username,
            email: draft.email,
            role: draft.role,
            password_hash,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
            modified_at: self.modified_at,
        }
    }
}

/// Public projection of a user. This is what the cache stores for users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    #[serde(rename = "user_type")]
    pub role: Role,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        user.profile()
    }
}

/// Input for creating a user, before the password is hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub password: String,
}

// ============================================================================
// BOARD
// ============================================================================

/// A retro board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: EntityId,
    pub name: String,
    pub template: Template,
    pub columns: Vec<ColumnType>,
    pub created_by_id: EntityId,
    pub created_by: String,
    pub modified_by_id: EntityId,
    pub modified_by: String,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

/// Who is performing a write, stamped onto created_by/modified_by fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: EntityId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBoard {
    pub name: String,
    pub template: Template,
    pub columns: Vec<ColumnType>,
}

/// Partial board update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardPatch {
    pub name: Option<String>,
    pub template: Option<Template>,
    pub columns: Option<Vec<ColumnType>>,
}

impl Board {
    pub fn from_draft(draft: NewBoard, actor: &Actor, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            name: draft.name,
            template: draft.template,
            columns: draft.columns,
            created_by_id: actor.id,
            created_by: actor.username.clone(),
            modified_by_id: actor.id,
            modified_by: actor.username.clone(),
            created_at: now,
            modified_at: now,
        }
    }

    pub fn apply(&mut self, patch: BoardPatch, actor: &Actor, now: Timestamp) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(template) = patch.template {
            self.template = template;
        }
        if let Some(columns) = patch.columns {
            self.columns = columns;
        }
        self.modified_by_id = actor.id;
        self.modified_by = actor.username.clone();
        self.modified_at = now;
    }
}

// ============================================================================
// FEEDBACK
// ============================================================================

/// A feedback note posted on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: EntityId,
    pub message: String,
    pub board_id: EntityId,
    pub created_by_id: EntityId,
    pub created_by: String,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub message: String,
    pub board_id: EntityId,
}

impl Feedback {
    pub fn from_draft(draft: NewFeedback, actor: &Actor, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            message: draft.message,
            board_id: draft.board_id,
            created_by_id: actor.id,
            created_by: actor.username.clone(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Only the message of a feedback is editable.
    pub fn apply_message(&mut self, message: String, now: Timestamp) {
        self.message = message;
        self.modified_at = now;
    }
}

// ============================================================================
// LIST PAGE
// ============================================================================

/// One page of a paginated listing. `count` is the number of rows returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: usize,
    pub result: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(result: Vec<T>) -> Self {
        Self {
            count: result.len(),
            result,
        }
    }
}
