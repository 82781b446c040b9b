//! Enum types shared across entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ValidationError;

/// Entity type discriminator, used in error messages and cache logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    User,
    Board,
    Feedback,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::User => "user",
            EntityType::Board => "board",
            EntityType::Feedback => "feedback",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ROLE
// ============================================================================

/// Role classification carried by an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    #[serde(rename = "guest_user")]
    Guest,
    #[serde(rename = "team_member")]
    Member,
    #[serde(rename = "super_admin")]
    Admin,
}

impl Role {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest_user",
            Role::Member => "team_member",
            Role::Admin => "super_admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest_user" => Ok(Role::Guest),
            "team_member" => Ok(Role::Member),
            "super_admin" => Ok(Role::Admin),
            other => Err(ValidationError::InvalidValue {
                field: "user_type".to_string(),
                reason: format!("unknown role '{}'", other),
            }),
        }
    }
}

// ============================================================================
// BOARD TEMPLATE / COLUMNS
// ============================================================================

/// Layout template of a retro board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    #[default]
    Agile,
    Kanban,
    Pacman,
}

impl Template {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Template::Agile => "agile",
            Template::Kanban => "kanban",
            Template::Pacman => "pacman",
        }
    }
}

impl FromStr for Template {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agile" => Ok(Template::Agile),
            "kanban" => Ok(Template::Kanban),
            "pacman" => Ok(Template::Pacman),
            other => Err(ValidationError::InvalidValue {
                field: "template".to_string(),
                reason: format!("unknown template '{}'", other),
            }),
        }
    }
}

/// Column kinds a board can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    GoodThing,
    Learned,
    ShoutOut,
    WentWell,
    ToImprove,
    Action,
}

impl ColumnType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ColumnType::GoodThing => "good_thing",
            ColumnType::Learned => "learned",
            ColumnType::ShoutOut => "shout_out",
            ColumnType::WentWell => "went_well",
            ColumnType::ToImprove => "to_improve",
            ColumnType::Action => "action",
        }
    }
}

impl FromStr for ColumnType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good_thing" => Ok(ColumnType::GoodThing),
            "learned" => Ok(ColumnType::Learned),
            "shout_out" => Ok(ColumnType::ShoutOut),
            "went_well" => Ok(ColumnType::WentWell),
            "to_improve" => Ok(ColumnType::ToImprove),
            "action" => Ok(ColumnType::Action),
            other => Err(ValidationError::InvalidValue {
                field: "columns".to_string(),
                reason: format!("unknown column '{}'", other),
            }),
        }
    }
}
