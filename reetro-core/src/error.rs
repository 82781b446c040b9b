//! Error types for reetro operations

use crate::EntityType;
use thiserror::Error;
use uuid::Uuid;

/// Authoritative store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("No {entity_type} matches {field}")]
    NoMatch {
        entity_type: EntityType,
        field: String,
    },

    #[error("Conflict on {entity_type}: {reason}")]
    Conflict {
        entity_type: EntityType,
        reason: String,
    },

    #[error("Insert failed for {entity_type}: {reason}")]
    InsertFailed {
        entity_type: EntityType,
        reason: String,
    },

    #[error("Update failed for {entity_type} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: Uuid,
        reason: String,
    },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. } | StorageError::NoMatch { .. })
    }
}

/// Cache store errors. Never surfaced to HTTP clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    #[error("Cache transport failed: {reason}")]
    Transport { reason: String },

    #[error("Cache serialization failed for {key}: {reason}")]
    Serialization { key: String, reason: String },

    #[error("Cache value for {key} does not match the requested shape: {reason}")]
    Deserialization { key: String, reason: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            ValidationError::RequiredFieldMissing { field } => field,
            ValidationError::InvalidValue { field, .. } => field,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all reetro errors.
#[derive(Debug, Clone, Error)]
pub enum ReetroError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for reetro operations.
pub type ReetroResult<T> = Result<T, ReetroError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            entity_type: EntityType::Board,
            id: Uuid::nil(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("board"));
        assert!(msg.contains("00000000-0000-0000-0000-000000000000"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_cache_error_display_key_not_found() {
        let err = CacheError::KeyNotFound {
            key: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "key not found: abc");
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "JWT_SECRET_KEY".to_string(),
            value: "<redacted>".to_string(),
            reason: "too short".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("JWT_SECRET_KEY"));
        assert!(msg.contains("too short"));
    }

    #[test]
    fn test_validation_error_field() {
        let err = ValidationError::InvalidValue {
            field: "email".to_string(),
            reason: "missing @".to_string(),
        };
        assert_eq!(err.field(), "email");
    }

    #[test]
    fn test_reetro_error_from_variants() {
        let storage = ReetroError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, ReetroError::Storage(_)));

        let cache = ReetroError::from(CacheError::Transport {
            reason: "down".to_string(),
        });
        assert!(matches!(cache, ReetroError::Cache(_)));

        let validation = ReetroError::from(ValidationError::RequiredFieldMissing {
            field: "name".to_string(),
        });
        assert!(matches!(validation, ReetroError::Validation(_)));

        let config = ReetroError::from(ConfigError::MissingRequired {
            field: "JWT_SECRET_KEY".to_string(),
        });
        assert!(matches!(config, ReetroError::Config(_)));
    }
}
