//! Reetro Test Utilities
//!
//! Shared test infrastructure for the reetro workspace:
//! - Instrumented doubles for the cache and the authoritative store
//! - Proptest generators for entity inputs
//! - Fixtures for common scenarios

pub use reetro_storage::{InMemoryCache, InMemoryStore};

pub use reetro_core::{
    Actor, Board, BoardPatch, CacheError, ColumnType, EntityId, EntityType, Feedback,
    NewBoard, NewFeedback, NewUser, Pagination, ReetroError, ReetroResult, Role, StorageError,
    Template, Timestamp, User, UserProfile,
};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reetro_storage::{AuthoritativeStore, CacheResult, CacheStore};

// ============================================================================
// RECORDING CACHE
// ============================================================================

#[derive(Debug, Default)]
struct CacheCounters {
    sets: AtomicUsize,
    gets: AtomicUsize,
    deletes: AtomicUsize,
    flushes: AtomicUsize,
    failing: AtomicBool,
}

/// Cache double that counts every call and can be switched to fail.
///
/// Clones share counters and contents.
#[derive(Debug, Clone, Default)]
pub struct RecordingCache {
    inner: InMemoryCache,
    counters: Arc<CacheCounters>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose every operation fails with a transport error.
    pub fn failing() -> Self {
        let cache = Self::new();
        cache.set_failing(true);
        cache
    }

    pub fn set_failing(&self, failing: bool) {
        self.counters.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sets(&self) -> usize {
        self.counters.sets.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.counters.gets.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.counters.deletes.load(Ordering::SeqCst)
    }

    pub fn flushes(&self) -> usize {
        self.counters.flushes.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.sets() + self.gets() + self.deletes() + self.flushes()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// The underlying cache, for seeding without touching the counters.
    pub fn backing(&self) -> &InMemoryCache {
        &self.inner
    }

    fn check(&self) -> CacheResult<()> {
        if self.counters.failing.load(Ordering::SeqCst) {
            return Err(CacheError::Transport {
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RecordingCache {
    async fn set_raw(&self, key: &str, value: String) -> CacheResult<()> {
        self.counters.sets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.set_raw(key, value).await
    }

    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        self.counters.gets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get_raw(key).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.delete(key).await
    }

    async fn flush_all(&self) -> CacheResult<()> {
        self.counters.flushes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.flush_all().await
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}

// ============================================================================
// COUNTING STORE
// ============================================================================

#[derive(Debug, Default)]
struct StoreCounters {
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

/// Store double over [`InMemoryStore`] that counts single-row reads and
/// writes, and can be told to reject writes.
#[derive(Debug, Clone, Default)]
pub struct CountingStore {
    inner: InMemoryStore,
    counters: Arc<StoreCounters>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.counters.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `*_get` calls by id.
    pub fn reads(&self) -> usize {
        self.counters.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.counters.writes.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    fn read(&self) {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn write(&self) -> ReetroResult<()> {
        self.counters.writes.fetch_add(1, Ordering::SeqCst);
        if self.counters.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::QueryFailed {
                reason: "duplicate key value violates unique constraint".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl AuthoritativeStore for CountingStore {
    async fn user_insert(&self, user: &User) -> ReetroResult<User> {
        self.write()?;
        self.inner.user_insert(user).await
    }

    async fn user_get(&self, id: EntityId) -> ReetroResult<Option<User>> {
        self.read();
        self.inner.user_get(id).await
    }

    async fn user_get_by_username(&self, username: &str) -> ReetroResult<Option<User>> {
        self.inner.user_get_by_username(username).await
    }

    async fn user_get_by_email(&self, email: &str) -> ReetroResult<Option<User>> {
        self.inner.user_get_by_email(email).await
    }

    async fn user_list(&self, page: Pagination) -> ReetroResult<Vec<User>> {
        self.inner.user_list(page).await
    }

    async fn user_set_password(&self, id: EntityId, password_hash: &str) -> ReetroResult<User> {
        self.write()?;
        self.inner.user_set_password(id, password_hash).await
    }

    async fn user_delete(&self, id: EntityId) -> ReetroResult<()> {
        self.write()?;
        self.inner.user_delete(id).await
    }

    async fn board_insert(&self, board: &Board) -> ReetroResult<Board> {
        self.write()?;
        self.inner.board_insert(board).await
    }

    async fn board_get(&self, id: EntityId) -> ReetroResult<Option<Board>> {
        self.read();
        self.inner.board_get(id).await
    }

    async fn board_list(&self, page: Pagination) -> ReetroResult<Vec<Board>> {
        self.inner.board_list(page).await
    }

    async fn board_update(
        &self,
        id: EntityId,
        patch: BoardPatch,
        actor: &Actor,
    ) -> ReetroResult<Board> {
        self.write()?;
        self.inner.board_update(id, patch, actor).await
    }

    async fn board_delete(&self, id: EntityId) -> ReetroResult<()> {
        self.write()?;
        self.inner.board_delete(id).await
    }

    async fn feedback_insert(&self, feedback: &Feedback) -> ReetroResult<Feedback> {
        self.write()?;
        self.inner.feedback_insert(feedback).await
    }

    async fn feedback_get(&self, id: EntityId) -> ReetroResult<Option<Feedback>> {
        self.read();
        self.inner.feedback_get(id).await
    }

    async fn feedback_list(&self, page: Pagination) -> ReetroResult<Vec<Feedback>> {
        self.inner.feedback_list(page).await
    }

    async fn feedback_ids_for_board(&self, board_id: EntityId) -> ReetroResult<Vec<EntityId>> {
        self.inner.feedback_ids_for_board(board_id).await
    }

    async fn feedback_update_message(
        &self,
        id: EntityId,
        message: &str,
    ) -> ReetroResult<Feedback> {
        self.write()?;
        self.inner.feedback_update_message(id, message).await
    }

    async fn feedback_delete(&self, id: EntityId) -> ReetroResult<()> {
        self.write()?;
        self.inner.feedback_delete(id).await
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for entity inputs.

    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Plausible email addresses.
    pub fn arb_email() -> impl Strategy<Value = String> {
        ("[a-z][a-z0-9._]{0,15}", "[a-z]{2,10}", "(com|org|io|dev)")
            .prop_map(|(local, domain, tld)| format!("{}@{}.{}", local, domain, tld))
    }

    pub fn arb_role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Guest), Just(Role::Member), Just(Role::Admin)]
    }

    pub fn arb_column() -> impl Strategy<Value = ColumnType> {
        prop_oneof![
            Just(ColumnType::GoodThing),
            Just(ColumnType::Learned),
            Just(ColumnType::ShoutOut),
            Just(ColumnType::WentWell),
            Just(ColumnType::ToImprove),
            Just(ColumnType::Action),
        ]
    }

    pub fn arb_new_board() -> impl Strategy<Value = NewBoard> {
        (
            "[A-Za-z][A-Za-z0-9 ]{0,30}",
            prop_oneof![Just(Template::Agile), Just(Template::Kanban), Just(Template::Pacman)],
            prop::collection::vec(arb_column(), 1..6),
        )
            .prop_map(|(name, template, columns)| NewBoard {
                name,
                template,
                columns,
            })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built entities for common testing scenarios.

    use super::*;
    use chrono::Utc;

    /// Placeholder hash; tests that log in hash a real password instead.
    pub const FIXTURE_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$fixture$fixture";

    pub fn make_user(username: &str, role: Role) -> User {
        User::from_draft(
            NewUser {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                username: username.to_string(),
                email: format!("{}@example.com", username),
                role,
                password: String::new(),
            },
            FIXTURE_PASSWORD_HASH.to_string(),
            Utc::now(),
        )
    }

    pub fn actor_for(user: &User) -> Actor {
        Actor {
            id: user.id,
            username: user.username.clone(),
        }
    }

    pub fn make_board(name: &str, creator: &Actor) -> Board {
        Board::from_draft(
            NewBoard {
                name: name.to_string(),
                template: Template::Agile,
                columns: vec![ColumnType::WentWell, ColumnType::ToImprove, ColumnType::Action],
            },
            creator,
            Utc::now(),
        )
    }

    pub fn make_feedback(message: &str, board: &Board, author: &Actor) -> Feedback {
        Feedback::from_draft(
            NewFeedback {
                message: message.to_string(),
                board_id: board.id,
            },
            author,
            Utc::now(),
        )
    }
}
