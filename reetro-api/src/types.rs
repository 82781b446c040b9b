//! Request and response bodies.
//!
//! Request fields default to empty so that missing fields reach domain
//! validation and come back as a 400 naming the field.

use reetro_core::{
    BoardPatch, ColumnType, EntityId, NewBoard, NewFeedback, NewUser, Pagination, Role, Template,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// QUERY PARAMETERS
// ============================================================================

/// `?page=&limit=` on list endpoints. Kept as raw strings so bad values fall
/// back to defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::from_query(self.page.as_deref(), self.limit.as_deref())
    }
}

// ============================================================================
// USERS AND CREDENTIALS
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl CreateUserRequest {
    /// Self-registration never grants more than the guest role.
    pub fn into_draft(self) -> NewUser {
        NewUser {
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
            email: self.email,
            role: Role::Guest,
            password: self.password,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub username: String,
    pub old_password: String,
    pub new_password: String,
}

// ============================================================================
// BOARDS
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateBoardRequest {
    pub name: String,
    pub template: Option<Template>,
    pub columns: Vec<ColumnType>,
}

impl From<CreateBoardRequest> for NewBoard {
    fn from(req: CreateBoardRequest) -> Self {
        NewBoard {
            name: req.name,
            template: req.template.unwrap_or_default(),
            columns: req.columns,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateBoardRequest {
    pub name: Option<String>,
    pub template: Option<Template>,
    pub columns: Option<Vec<ColumnType>>,
}

impl From<UpdateBoardRequest> for BoardPatch {
    fn from(req: UpdateBoardRequest) -> Self {
        BoardPatch {
            name: req.name,
            template: req.template,
            columns: req.columns,
        }
    }
}

// ============================================================================
// FEEDBACK
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateFeedbackRequest {
    pub message: String,
    pub board_id: Option<EntityId>,
}

impl CreateFeedbackRequest {
    pub fn into_draft(self) -> Option<NewFeedback> {
        let board_id = self.board_id?;
        Some(NewFeedback {
            message: self.message,
            board_id,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateFeedbackRequest {
    pub message: String,
}

// ============================================================================
// GENERIC RESPONSES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub detail: String,
}

impl MessageResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AboutResponse {
    pub name: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let req: CreateUserRequest = serde_json::from_str(r#"{"username": "kim"}"#).unwrap();
        assert_eq!(req.username, "kim");
        assert!(req.email.is_empty());
        assert_eq!(req.into_draft().role, Role::Guest);
    }

    #[test]
    fn test_requested_role_is_ignored() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"username": "kim", "user_type": "super_admin"}"#).unwrap();
        assert_eq!(req.into_draft().role, Role::Guest);
    }

    #[test]
    fn test_board_request_defaults_template() {
        let req: CreateBoardRequest =
            serde_json::from_str(r#"{"name": "S1", "columns": ["went_well"]}"#).unwrap();
        let draft = NewBoard::from(req);
        assert_eq!(draft.template, Template::Agile);
        assert_eq!(draft.columns, vec![ColumnType::WentWell]);
    }

    #[test]
    fn test_list_params_fall_back() {
        let params = ListParams {
            page: Some("x".to_string()),
            limit: Some("5".to_string()),
        };
        assert_eq!(params.pagination(), Pagination { limit: 5, offset: 0 });
    }
}
