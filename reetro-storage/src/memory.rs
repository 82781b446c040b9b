//! In-memory authoritative store.
//!
//! Behaves like the relational variant (not-found on update/delete of an
//! absent row, unique username/email) without a database.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use reetro_core::{
    Actor, Board, BoardPatch, EntityId, EntityType, Feedback, Pagination, ReetroResult,
    StorageError, Timestamp, User,
};

use crate::store::AuthoritativeStore;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<EntityId, User>,
    boards: HashMap<EntityId, Board>,
    feedbacks: HashMap<EntityId, Feedback>,
}

/// Thread-safe in-memory store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all tables.
    pub fn clear(&self) {
        if let Ok(mut tables) = self.tables.write() {
            *tables = Tables::default();
        }
    }

    pub fn user_count(&self) -> usize {
        self.tables.read().map(|t| t.users.len()).unwrap_or(0)
    }

    pub fn board_count(&self) -> usize {
        self.tables.read().map(|t| t.boards.len()).unwrap_or(0)
    }

    pub fn feedback_count(&self) -> usize {
        self.tables.read().map(|t| t.feedbacks.len()).unwrap_or(0)
    }

    /// Replace a board row directly, bypassing any cache in front of the store.
    pub fn overwrite_board(&self, board: Board) -> ReetroResult<()> {
        let mut tables = self.tables.write().map_err(|_| StorageError::LockPoisoned)?;
        tables.boards.insert(board.id, board);
        Ok(())
    }

    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> ReetroResult<R> {
        let tables = self.tables.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(f(&tables))
    }

    fn write<R>(&self, f: impl FnOnce(&mut Tables) -> ReetroResult<R>) -> ReetroResult<R> {
        let mut tables = self.tables.write().map_err(|_| StorageError::LockPoisoned)?;
        f(&mut tables)
    }
}

/// Newest first, then the requested window.
fn paginate<T: Clone>(
    rows: &HashMap<EntityId, T>,
    created_at: impl Fn(&T) -> Timestamp,
    page: Pagination,
) -> Vec<T> {
    let mut all: Vec<&T> = rows.values().collect();
    all.sort_by_key(|row| std::cmp::Reverse(created_at(*row)));
    all.into_iter()
        .skip(page.offset.max(0) as usize)
        .take(page.limit.max(0) as usize)
        .cloned()
        .collect()
}

fn not_found(entity_type: EntityType, id: EntityId) -> StorageError {
    StorageError::NotFound { entity_type, id }
}

#[async_trait]
impl AuthoritativeStore for InMemoryStore {
    // === User Operations ===

    async fn user_insert(&self, user: &User) -> ReetroResult<User> {
        self.write(|tables| {
            if tables.users.contains_key(&user.id) {
                return Err(StorageError::InsertFailed {
                    entity_type: EntityType::User,
                    reason: "already exists".to_string(),
                }
                .into());
            }
            let clash = tables
                .users
                .values()
                .any(|u| u.username == user.username || u.email == user.email);
            if clash {
                return Err(StorageError::Conflict {
                    entity_type: EntityType::User,
                    reason: "username or email already taken".to_string(),
                }
                .into());
            }
            tables.users.insert(user.id, user.clone());
            Ok(user.clone())
        })
    }

    async fn user_get(&self, id: EntityId) -> ReetroResult<Option<User>> {
        self.read(|tables| tables.users.get(&id).cloned())
    }

    async fn user_get_by_username(&self, username: &str) -> ReetroResult<Option<User>> {
        self.read(|tables| {
            tables
                .users
                .values()
                .find(|u| u.username == username)
                .cloned()
        })
    }

    async fn user_get_by_email(&self, email: &str) -> ReetroResult<Option<User>> {
        self.read(|tables| tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn user_list(&self, page: Pagination) -> ReetroResult<Vec<User>> {
        self.read(|tables| paginate(&tables.users, |u| u.created_at, page))
    }

    async fn user_set_password(&self, id: EntityId, password_hash: &str) -> ReetroResult<User> {
        self.write(|tables| {
            let user = tables
                .users
                .get_mut(&id)
                .ok_or_else(|| not_found(EntityType::User, id))?;
            user.password_hash = password_hash.to_string();
            user.modified_at = Utc::now();
            Ok(user.clone())
        })
    }

    async fn user_delete(&self, id: EntityId) -> ReetroResult<()> {
        self.write(|tables| {
            tables
                .users
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| not_found(EntityType::User, id).into())
        })
    }

    // === Board Operations ===

    async fn board_insert(&self, board: &Board) -> ReetroResult<Board> {
        self.write(|tables| {
            if tables.boards.contains_key(&board.id) {
                return Err(StorageError::InsertFailed {
                    entity_type: EntityType::Board,
                    reason: "already exists".to_string(),
                }
                .into());
            }
            tables.boards.insert(board.id, board.clone());
            Ok(board.clone())
        })
    }

    async fn board_get(&self, id: EntityId) -> ReetroResult<Option<Board>> {
        self.read(|tables| tables.boards.get(&id).cloned())
    }

    async fn board_list(&self, page: Pagination) -> ReetroResult<Vec<Board>> {
        self.read(|tables| paginate(&tables.boards, |b| b.created_at, page))
    }

    async fn board_update(
        &self,
        id: EntityId,
        patch: BoardPatch,
        actor: &Actor,
    ) -> ReetroResult<Board> {
        self.write(|tables| {
            let board = tables
                .boards
                .get_mut(&id)
                .ok_or_else(|| not_found(EntityType::Board, id))?;
            board.apply(patch, actor, Utc::now());
            Ok(board.clone())
        })
    }

    async fn board_delete(&self, id: EntityId) -> ReetroResult<()> {
        self.write(|tables| {
            tables.boards.remove(&id).ok_or_else(|| not_found(EntityType::Board, id))?;
            tables.feedbacks.retain(|_, fb| fb.board_id != id);
            Ok(())
        })
    }

    // === Feedback Operations ===

    async fn feedback_insert(&self, feedback: &Feedback) -> ReetroResult<Feedback> {
        self.write(|tables| {
            if !tables.boards.contains_key(&feedback.board_id) {
                return Err(not_found(EntityType::Board, feedback.board_id).into());
            }
            if tables.feedbacks.contains_key(&feedback.id) {
                return Err(StorageError::InsertFailed {
                    entity_type: EntityType::Feedback,
                    reason: "already exists".to_string(),
                }
                .into());
            }
            tables.feedbacks.insert(feedback.id, feedback.clone());
            Ok(feedback.clone())
        })
    }

    async fn feedback_get(&self, id: EntityId) -> ReetroResult<Option<Feedback>> {
        self.read(|tables| tables.feedbacks.get(&id).cloned())
    }

    async fn feedback_list(&self, page: Pagination) -> ReetroResult<Vec<Feedback>> {
        self.read(|tables| paginate(&tables.feedbacks, |f| f.created_at, page))
    }

    async fn feedback_ids_for_board(&self, board_id: EntityId) -> ReetroResult<Vec<EntityId>> {
        self.read(|tables| {
            tables
                .feedbacks
                .values()
                .filter(|fb| fb.board_id == board_id)
                .map(|fb| fb.id)
                .collect()
        })
    }

    async fn feedback_update_message(
        &self,
        id: EntityId,
        message: &str,
    ) -> ReetroResult<Feedback> {
        self.write(|tables| {
            let feedback = tables
                .feedbacks
                .get_mut(&id)
                .ok_or_else(|| not_found(EntityType::Feedback, id))?;
            feedback.apply_message(message.to_string(), Utc::now());
            Ok(feedback.clone())
        })
    }

    async fn feedback_delete(&self, id: EntityId) -> ReetroResult<()> {
        self.write(|tables| {
            tables
                .feedbacks
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| not_found(EntityType::Feedback, id).into())
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
