//! Database Connection Pool and Postgres Store
//!
//! PostgreSQL connection pooling with deadpool-postgres and the Postgres
//! variant of [`AuthoritativeStore`]. All queries are parameterized.

use crate::config::EnvSource;
use async_trait::async_trait;
use chrono::Utc;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use reetro_core::{
    Actor, Board, BoardPatch, ColumnType, ConfigError, EntityId, EntityType, Feedback,
    Pagination, ReetroResult, Role, StorageError, Template, User,
};
use reetro_storage::AuthoritativeStore;
use std::str::FromStr;
use std::time::Duration;
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("max_size", &self.max_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "reetro".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    pub fn from_source(env: &impl EnvSource) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: env.string_or("POSTGRES_HOST", &defaults.host),
            port: env.parse_or("POSTGRES_PORT", defaults.port)?,
            dbname: env.string_or("POSTGRES_DB", &defaults.dbname),
            user: env.string_or("POSTGRES_USER", &defaults.user),
            password: env.get("POSTGRES_PASSWORD").unwrap_or_default(),
            max_size: env.parse_or("POSTGRES_POOL_SIZE", defaults.max_size)?,
            timeout: Duration::from_secs(env.parse_or("POSTGRES_TIMEOUT_SECS", 30)?),
        })
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> Result<Pool, ConfigError> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        let mut pool = PoolConfig::new(self.max_size);
        pool.timeouts.wait = Some(self.timeout);
        pool.timeouts.create = Some(self.timeout);
        cfg.pool = Some(pool);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ConfigError::InvalidValue {
                field: "POSTGRES_HOST".to_string(),
                value: self.host.clone(),
                reason: format!("failed to create pool: {}", e),
            })
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    user_type TEXT NOT NULL DEFAULT 'guest_user',
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    modified_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS boards (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    template TEXT NOT NULL DEFAULT 'agile',
    columns TEXT[] NOT NULL,
    created_by_id UUID NOT NULL,
    created_by TEXT NOT NULL,
    modified_by_id UUID NOT NULL,
    modified_by TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    modified_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS feedbacks (
    id UUID PRIMARY KEY,
    message TEXT NOT NULL,
    board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
    created_by_id UUID NOT NULL,
    created_by TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    modified_at TIMESTAMPTZ NOT NULL
);
"#;

const USER_COLUMNS: &str =
    "id, first_name, last_name, username, email, user_type, password_hash, created_at, modified_at";
const BOARD_COLUMNS: &str = "id, name, template, columns, created_by_id, created_by, \
     modified_by_id, modified_by, created_at, modified_at";
const FEEDBACK_COLUMNS: &str =
    "id, message, board_id, created_by_id, created_by, created_at, modified_at";

// ============================================================================
// POSTGRES STORE
// ============================================================================

/// Authoritative store backed by PostgreSQL.
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Create the tables if they do not exist yet.
    pub async fn migrate(&self) -> ReetroResult<()> {
        let conn = self.conn().await?;
        conn.batch_execute(SCHEMA).await.map_err(query_failed)?;
        tracing::info!("database schema ready");
        Ok(())
    }

    async fn conn(&self) -> ReetroResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            StorageError::Unavailable {
                reason: e.to_string(),
            }
            .into()
        })
    }
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore")
            .field("pool_size", &self.pool_size())
            .finish()
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn query_failed(err: tokio_postgres::Error) -> StorageError {
    StorageError::QueryFailed {
        reason: err.to_string(),
    }
}

/// Map a write error, turning unique violations into `Conflict`.
fn write_failed(entity_type: EntityType, err: tokio_postgres::Error) -> StorageError {
    match err.code() {
        Some(code) if *code == SqlState::UNIQUE_VIOLATION => StorageError::Conflict {
            entity_type,
            reason: "unique constraint violated".to_string(),
        },
        Some(code) if *code == SqlState::FOREIGN_KEY_VIOLATION => StorageError::NoMatch {
            entity_type: EntityType::Board,
            field: "board_id".to_string(),
        },
        _ => StorageError::InsertFailed {
            entity_type,
            reason: err.to_string(),
        },
    }
}

fn parse_column<T: FromStr>(raw: &str, column: &str) -> Result<T, StorageError> {
    raw.parse().map_err(|_| StorageError::QueryFailed {
        reason: format!("unexpected value {:?} in column {}", raw, column),
    })
}

fn user_from_row(row: &Row) -> Result<User, StorageError> {
    let role: String = row.get("user_type");
    Ok(User {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        username: row.get("username"),
        email: row.get("email"),
        role: parse_column::<Role>(&role, "user_type")?,
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        modified_at: row.get("modified_at"),
    })
}

fn board_from_row(row: &Row) -> Result<Board, StorageError> {
    let template: String = row.get("template");
    let columns: Vec<String> = row.get("columns");
    Ok(Board {
        id: row.get("id"),
        name: row.get("name"),
        template: parse_column::<Template>(&template, "template")?,
        columns: columns
            .iter()
            .map(|c| parse_column::<ColumnType>(c, "columns"))
            .collect::<Result<_, _>>()?,
        created_by_id: row.get("created_by_id"),
        created_by: row.get("created_by"),
        modified_by_id: row.get("modified_by_id"),
        modified_by: row.get("modified_by"),
        created_at: row.get("created_at"),
        modified_at: row.get("modified_at"),
    })
}

fn feedback_from_row(row: &Row) -> Feedback {
    Feedback {
        id: row.get("id"),
        message: row.get("message"),
        board_id: row.get("board_id"),
        created_by_id: row.get("created_by_id"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        modified_at: row.get("modified_at"),
    }
}

fn column_strings(columns: &[ColumnType]) -> Vec<&'static str> {
    columns.iter().map(ColumnType::as_db_str).collect()
}

// ============================================================================
// STORE IMPLEMENTATION
// ============================================================================

#[async_trait]
impl AuthoritativeStore for PostgresStore {
    // === User Operations ===

    async fn user_insert(&self, user: &User) -> ReetroResult<User> {
        let conn = self.conn().await?;
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {USER_COLUMNS}"
        );
        let row = conn
            .query_one(
                &sql,
                &[
                    &user.id,
                    &user.first_name,
                    &user.last_name,
                    &user.username,
                    &user.email,
                    &user.role.as_db_str(),
                    &user.password_hash,
                    &user.created_at,
                    &user.modified_at,
                ],
            )
            .await
            .map_err(|e| write_failed(EntityType::User, e))?;
        Ok(user_from_row(&row)?)
    }

    async fn user_get(&self, id: EntityId) -> ReetroResult<Option<User>> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = conn.query_opt(&sql, &[&id]).await.map_err(query_failed)?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn user_get_by_username(&self, username: &str) -> ReetroResult<Option<User>> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = conn
            .query_opt(&sql, &[&username])
            .await
            .map_err(query_failed)?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn user_get_by_email(&self, email: &str) -> ReetroResult<Option<User>> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = conn.query_opt(&sql, &[&email]).await.map_err(query_failed)?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn user_list(&self, page: Pagination) -> ReetroResult<Vec<User>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        let rows = conn
            .query(&sql, &[&page.limit, &page.offset])
            .await
            .map_err(query_failed)?;
        Ok(rows.iter().map(user_from_row).collect::<Result<_, _>>()?)
    }

    async fn user_set_password(&self, id: EntityId, password_hash: &str) -> ReetroResult<User> {
        let conn = self.conn().await?;
        let sql = format!(
            "UPDATE users SET password_hash = $2, modified_at = $3 WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let row = conn
            .query_opt(&sql, &[&id, &password_hash, &Utc::now()])
            .await
            .map_err(query_failed)?
            .ok_or(StorageError::NotFound {
                entity_type: EntityType::User,
                id,
            })?;
        Ok(user_from_row(&row)?)
    }

    async fn user_delete(&self, id: EntityId) -> ReetroResult<()> {
        let conn = self.conn().await?;
        let deleted = conn
            .execute("DELETE FROM users WHERE id = $1", &[&id])
            .await
            .map_err(query_failed)?;
        if deleted == 0 {
            return Err(StorageError::NotFound {
                entity_type: EntityType::User,
                id,
            }
            .into());
        }
        Ok(())
    }

    // === Board Operations ===

    async fn board_insert(&self, board: &Board) -> ReetroResult<Board> {
        let conn = self.conn().await?;
        let sql = format!(
            "INSERT INTO boards ({BOARD_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {BOARD_COLUMNS}"
        );
        let row = conn
            .query_one(
                &sql,
                &[
                    &board.id,
                    &board.name,
                    &board.template.as_db_str(),
                    &column_strings(&board.columns),
                    &board.created_by_id,
                    &board.created_by,
                    &board.modified_by_id,
                    &board.modified_by,
                    &board.created_at,
                    &board.modified_at,
                ],
            )
            .await
            .map_err(|e| write_failed(EntityType::Board, e))?;
        Ok(board_from_row(&row)?)
    }

    async fn board_get(&self, id: EntityId) -> ReetroResult<Option<Board>> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = $1");
        let row = conn.query_opt(&sql, &[&id]).await.map_err(query_failed)?;
        Ok(row.as_ref().map(board_from_row).transpose()?)
    }

    async fn board_list(&self, page: Pagination) -> ReetroResult<Vec<Board>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {BOARD_COLUMNS} FROM boards ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        let rows = conn
            .query(&sql, &[&page.limit, &page.offset])
            .await
            .map_err(query_failed)?;
        Ok(rows.iter().map(board_from_row).collect::<Result<_, _>>()?)
    }

    async fn board_update(
        &self,
        id: EntityId,
        patch: BoardPatch,
        actor: &Actor,
    ) -> ReetroResult<Board> {
        let mut conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(query_failed)?;

        let select = format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = $1 FOR UPDATE");
        let row = tx
            .query_opt(&select, &[&id])
            .await
            .map_err(query_failed)?
            .ok_or(StorageError::NotFound {
                entity_type: EntityType::Board,
                id,
            })?;
        let mut board = board_from_row(&row)?;
        board.apply(patch, actor, Utc::now());

        let update = format!(
            "UPDATE boards SET name = $2, template = $3, columns = $4, modified_by_id = $5, \
             modified_by = $6, modified_at = $7 WHERE id = $1 RETURNING {BOARD_COLUMNS}"
        );
        let row = tx
            .query_one(
                &update,
                &[
                    &id,
                    &board.name,
                    &board.template.as_db_str(),
                    &column_strings(&board.columns),
                    &board.modified_by_id,
                    &board.modified_by,
                    &board.modified_at,
                ],
            )
            .await
            .map_err(|e| StorageError::UpdateFailed {
                entity_type: EntityType::Board,
                id,
                reason: e.to_string(),
            })?;
        tx.commit().await.map_err(query_failed)?;
        Ok(board_from_row(&row)?)
    }

    async fn board_delete(&self, id: EntityId) -> ReetroResult<()> {
        let conn = self.conn().await?;
        let deleted = conn
            .execute("DELETE FROM boards WHERE id = $1", &[&id])
            .await
            .map_err(query_failed)?;
        if deleted == 0 {
            return Err(StorageError::NotFound {
                entity_type: EntityType::Board,
                id,
            }
            .into());
        }
        Ok(())
    }

    // === Feedback Operations ===

    async fn feedback_insert(&self, feedback: &Feedback) -> ReetroResult<Feedback> {
        let conn = self.conn().await?;
        let sql = format!(
            "INSERT INTO feedbacks ({FEEDBACK_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {FEEDBACK_COLUMNS}"
        );
        let row = conn
            .query_one(
                &sql,
                &[
                    &feedback.id,
                    &feedback.message,
                    &feedback.board_id,
                    &feedback.created_by_id,
                    &feedback.created_by,
                    &feedback.created_at,
                    &feedback.modified_at,
                ],
            )
            .await
            .map_err(|e| write_failed(EntityType::Feedback, e))?;
        Ok(feedback_from_row(&row))
    }

    async fn feedback_get(&self, id: EntityId) -> ReetroResult<Option<Feedback>> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {FEEDBACK_COLUMNS} FROM feedbacks WHERE id = $1");
        let row = conn.query_opt(&sql, &[&id]).await.map_err(query_failed)?;
        Ok(row.as_ref().map(feedback_from_row))
    }

    async fn feedback_list(&self, page: Pagination) -> ReetroResult<Vec<Feedback>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedbacks ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        let rows = conn
            .query(&sql, &[&page.limit, &page.offset])
            .await
            .map_err(query_failed)?;
        Ok(rows.iter().map(feedback_from_row).collect())
    }

    async fn feedback_ids_for_board(&self, board_id: EntityId) -> ReetroResult<Vec<EntityId>> {
        let conn = self.conn().await?;
        let rows = conn
            .query("SELECT id FROM feedbacks WHERE board_id = $1", &[&board_id])
            .await
            .map_err(query_failed)?;
        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    async fn feedback_update_message(
        &self,
        id: EntityId,
        message: &str,
    ) -> ReetroResult<Feedback> {
        let conn = self.conn().await?;
        let sql = format!(
            "UPDATE feedbacks SET message = $2, modified_at = $3 WHERE id = $1 \
             RETURNING {FEEDBACK_COLUMNS}"
        );
        let row = conn
            .query_opt(&sql, &[&id, &message, &Utc::now()])
            .await
            .map_err(query_failed)?
            .ok_or(StorageError::NotFound {
                entity_type: EntityType::Feedback,
                id,
            })?;
        Ok(feedback_from_row(&row))
    }

    async fn feedback_delete(&self, id: EntityId) -> ReetroResult<()> {
        let conn = self.conn().await?;
        let deleted = conn
            .execute("DELETE FROM feedbacks WHERE id = $1", &[&id])
            .await
            .map_err(query_failed)?;
        if deleted == 0 {
            return Err(StorageError::NotFound {
                entity_type: EntityType::Feedback,
                id,
            }
            .into());
        }
        Ok(())
    }
}
