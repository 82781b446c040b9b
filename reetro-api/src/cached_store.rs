//! Cached Store
//!
//! Per-entity operations the route handlers call. Single-entity reads, creates,
//! updates and deletes go through the [`CacheAside`] coordinator; list reads
//! and credential lookups go straight to the authoritative store.
//!
//! ```ignore
//! let board = cached.board_get(id).await?;          // cache, then store
//! let board = cached.board_create(board).await?;    // store, then cache
//! cached.board_delete(id).await?;                   // store, then invalidate
//! ```

use std::sync::Arc;

use reetro_core::{
    Actor, Board, BoardPatch, EntityId, Feedback, Page, Pagination, User, UserProfile,
};
use reetro_storage::{AuthoritativeStore, CacheAside, CacheStore};

use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct CachedStore {
    store: Arc<dyn AuthoritativeStore>,
    aside: CacheAside,
}

impl std::fmt::Debug for CachedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedStore")
            .field("aside", &self.aside)
            .finish_non_exhaustive()
    }
}

impl CachedStore {
    pub fn new(store: Arc<dyn AuthoritativeStore>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            aside: CacheAside::new(cache),
        }
    }

    /// The authoritative store, bypassing the cache.
    pub fn store(&self) -> &Arc<dyn AuthoritativeStore> {
        &self.store
    }

    pub fn aside(&self) -> &CacheAside {
        &self.aside
    }

    /// Drop every cache entry.
    pub async fn flush_cache(&self) -> ApiResult<()> {
        self.aside.flush().await.map_err(|e| {
            tracing::warn!(error = %e, "cache flush failed");
            ApiError::service_unavailable("Cache temporarily unavailable")
        })
    }

    // ========================================================================
    // USERS
    // ========================================================================

    pub async fn user_get(&self, id: EntityId) -> ApiResult<UserProfile> {
        let read = self
            .aside
            .fetch_by_id::<UserProfile, _>(id, self.store.as_ref())
            .await?;
        Ok(read.into_value())
    }

    pub async fn user_create(&self, user: User) -> ApiResult<UserProfile> {
        let store = &self.store;
        let written = self
            .aside
            .write(async move { store.user_insert(&user).await.map(|u| u.profile()) })
            .await?;
        Ok(written.into_value())
    }

    pub async fn user_set_password(&self, id: EntityId, password_hash: &str) -> ApiResult<UserProfile> {
        let store = &self.store;
        let written = self
            .aside
            .write(async move {
                store
                    .user_set_password(id, password_hash)
                    .await
                    .map(|u| u.profile())
            })
            .await?;
        Ok(written.into_value())
    }

    pub async fn user_delete(&self, id: EntityId) -> ApiResult<()> {
        self.aside
            .delete::<UserProfile, _>(id, self.store.user_delete(id))
            .await?;
        Ok(())
    }

    pub async fn user_list(&self, page: Pagination) -> ApiResult<Page<UserProfile>> {
        let users = self.store.user_list(page).await?;
        Ok(Page::new(users.iter().map(User::profile).collect()))
    }

    pub async fn user_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        Ok(self.store.user_get_by_username(username).await?)
    }

    pub async fn user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        Ok(self.store.user_get_by_email(email).await?)
    }

    // ========================================================================
    // BOARDS
    // ========================================================================

    pub async fn board_get(&self, id: EntityId) -> ApiResult<Board> {
        let read = self
            .aside
            .fetch_by_id::<Board, _>(id, self.store.as_ref())
            .await?;
        Ok(read.into_value())
    }

    pub async fn board_create(&self, board: Board) -> ApiResult<Board> {
        let store = &self.store;
        let written = self
            .aside
            .write(async move { store.board_insert(&board).await })
            .await?;
        Ok(written.into_value())
    }

    pub async fn board_update(
        &self,
        id: EntityId,
        patch: BoardPatch,
        actor: &Actor,
    ) -> ApiResult<Board> {
        let written = self
            .aside
            .write(self.store.board_update(id, patch, actor))
            .await?;
        Ok(written.into_value())
    }

    /// The store removes the board's feedback rows with it, so their cache
    /// entries are invalidated too.
    pub async fn board_delete(&self, id: EntityId) -> ApiResult<()> {
        let feedback_ids = self.store.feedback_ids_for_board(id).await?;
        self.aside
            .delete::<Board, _>(id, self.store.board_delete(id))
            .await?;
        for feedback_id in feedback_ids {
            self.aside.invalidate::<Feedback>(feedback_id).await;
        }
        Ok(())
    }

    pub async fn board_list(&self, page: Pagination) -> ApiResult<Page<Board>> {
        Ok(Page::new(self.store.board_list(page).await?))
    }

    // ========================================================================
    // FEEDBACK
    // ========================================================================

    pub async fn feedback_get(&self, id: EntityId) -> ApiResult<Feedback> {
        let read = self
            .aside
            .fetch_by_id::<Feedback, _>(id, self.store.as_ref())
            .await?;
        Ok(read.into_value())
    }

    pub async fn feedback_create(&self, feedback: Feedback) -> ApiResult<Feedback> {
        let store = &self.store;
        let written = self
            .aside
            .write(async move { store.feedback_insert(&feedback).await })
            .await?;
        Ok(written.into_value())
    }

    pub async fn feedback_update_message(&self, id: EntityId, message: &str) -> ApiResult<Feedback> {
        let written = self
            .aside
            .write(self.store.feedback_update_message(id, message))
            .await?;
        Ok(written.into_value())
    }

    pub async fn feedback_delete(&self, id: EntityId) -> ApiResult<()> {
        self.aside
            .delete::<Feedback, _>(id, self.store.feedback_delete(id))
            .await?;
        Ok(())
    }

    pub async fn feedback_list(&self, page: Pagination) -> ApiResult<Page<Feedback>> {
        Ok(Page::new(self.store.feedback_list(page).await?))
    }
}
