//! The authoritative store capability.

use async_trait::async_trait;
use reetro_core::{
    Actor, Board, BoardPatch, EntityId, Feedback, Pagination, ReetroResult, User, UserProfile,
};

use crate::cache::CacheableEntity;

/// Relational persistence, the single source of truth.
///
/// `*_get` returns `Ok(None)` for an absent row. Updates and deletes look the
/// row up themselves and fail with `StorageError::NotFound` when it is absent.
#[async_trait]
pub trait AuthoritativeStore: Send + Sync {
    // ========================================================================
    // USER OPERATIONS
    // ========================================================================

    async fn user_insert(&self, user: &User) -> ReetroResult<User>;

    async fn user_get(&self, id: EntityId) -> ReetroResult<Option<User>>;

    async fn user_get_by_username(&self, username: &str) -> ReetroResult<Option<User>>;

    async fn user_get_by_email(&self, email: &str) -> ReetroResult<Option<User>>;

    async fn user_list(&self, page: Pagination) -> ReetroResult<Vec<User>>;

    async fn user_set_password(&self, id: EntityId, password_hash: &str) -> ReetroResult<User>;

    async fn user_delete(&self, id: EntityId) -> ReetroResult<()>;

    // ========================================================================
    // BOARD OPERATIONS
    // ========================================================================

    async fn board_insert(&self, board: &Board) -> ReetroResult<Board>;

    async fn board_get(&self, id: EntityId) -> ReetroResult<Option<Board>>;

    async fn board_list(&self, page: Pagination) -> ReetroResult<Vec<Board>>;

    async fn board_update(
        &self,
        id: EntityId,
        patch: BoardPatch,
        actor: &Actor,
    ) -> ReetroResult<Board>;

    async fn board_delete(&self, id: EntityId) -> ReetroResult<()>;

    // ========================================================================
    // FEEDBACK OPERATIONS
    // ========================================================================

    async fn feedback_insert(&self, feedback: &Feedback) -> ReetroResult<Feedback>;

    async fn feedback_get(&self, id: EntityId) -> ReetroResult<Option<Feedback>>;

    async fn feedback_list(&self, page: Pagination) -> ReetroResult<Vec<Feedback>>;

    /// Ids of every feedback row on a board, in no particular order.
    async fn feedback_ids_for_board(&self, board_id: EntityId) -> ReetroResult<Vec<EntityId>>;

    async fn feedback_update_message(
        &self,
        id: EntityId,
        message: &str,
    ) -> ReetroResult<Feedback>;

    async fn feedback_delete(&self, id: EntityId) -> ReetroResult<()>;
}

/// Loads a single entity from the authoritative store on a cache miss.
#[async_trait]
pub trait StorageFetcher<T: CacheableEntity>: Send + Sync {
    async fn fetch(&self, id: EntityId) -> ReetroResult<Option<T>>;
}

#[async_trait]
impl<S: AuthoritativeStore + ?Sized> StorageFetcher<UserProfile> for S {
    async fn fetch(&self, id: EntityId) -> ReetroResult<Option<UserProfile>> {
        Ok(self.user_get(id).await?.map(UserProfile::from))
    }
}

#[async_trait]
impl<S: AuthoritativeStore + ?Sized> StorageFetcher<Board> for S {
    async fn fetch(&self, id: EntityId) -> ReetroResult<Option<Board>> {
        self.board_get(id).await
    }
}

#[async_trait]
impl<S: AuthoritativeStore + ?Sized> StorageFetcher<Feedback> for S {
    async fn fetch(&self, id: EntityId) -> ReetroResult<Option<Feedback>> {
        self.feedback_get(id).await
    }
}
