//! Domain validation rules applied before a draft reaches the store.
//!
//! Every check returns the first failing field; callers collect them into a
//! single response.

use crate::{ColumnType, NewBoard, NewFeedback, NewUser, ValidationError};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Trait for validating non-empty strings.
pub trait ValidateNonEmpty {
    /// Fails with `RequiredFieldMissing` if the value is empty or whitespace-only.
    fn validate_non_empty(&self, field_name: &str) -> Result<(), ValidationError>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> Result<(), ValidationError> {
        if self.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: field_name.to_string(),
            });
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> Result<(), ValidationError> {
        self.as_str().validate_non_empty(field_name)
    }
}

impl<T: ValidateNonEmpty> ValidateNonEmpty for Option<T> {
    fn validate_non_empty(&self, field_name: &str) -> Result<(), ValidationError> {
        match self {
            Some(value) => value.validate_non_empty(field_name),
            None => Err(ValidationError::RequiredFieldMissing {
                field: field_name.to_string(),
            }),
        }
    }
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    email.validate_non_empty("email")?;
    let mut parts = email.split('@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty() || domain.is_empty() || parts.next().is_some() {
        return Err(ValidationError::InvalidValue {
            field: "email".to_string(),
            reason: "must look like name@domain".to_string(),
        });
    }
    Ok(())
}

pub fn validate_password(field: &str, password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!("must be at least {} characters", MIN_PASSWORD_LEN),
        });
    }
    Ok(())
}

pub fn validate_columns(columns: &[ColumnType]) -> Result<(), ValidationError> {
    if columns.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "columns".to_string(),
            reason: "at least one column is required".to_string(),
        });
    }
    Ok(())
}

pub fn validate_new_user(user: &NewUser) -> Vec<ValidationError> {
    collect([
        user.first_name.validate_non_empty("first_name"),
        user.last_name.validate_non_empty("last_name"),
        user.username.validate_non_empty("username"),
        validate_email(&user.email),
        validate_password("password", &user.password),
    ])
}

pub fn validate_new_board(board: &NewBoard) -> Vec<ValidationError> {
    collect([
        board.name.validate_non_empty("name"),
        validate_columns(&board.columns),
    ])
}

pub fn validate_new_feedback(feedback: &NewFeedback) -> Vec<ValidationError> {
    collect([feedback.message.validate_non_empty("message")])
}

fn collect<const N: usize>(checks: [Result<(), ValidationError>; N]) -> Vec<ValidationError> {
    checks.into_iter().filter_map(Result::err).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{new_entity_id, Role, Template};

    fn draft_user() -> NewUser {
        NewUser {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            username: "grace".to_string(),
            email: "grace@navy.mil".to_string(),
            role: Role::Guest,
            password: "cobol60".to_string(),
        }
    }

    #[test]
    fn test_valid_user_passes() {
        assert!(validate_new_user(&draft_user()).is_empty());
    }

    #[test]
    fn test_user_errors_are_collected() {
        let mut user = draft_user();
        user.username = "   ".to_string();
        user.email = "no-at-sign".to_string();
        user.password = "123".to_string();
        let errors = validate_new_user(&user);
        let fields: Vec<&str> = errors.iter().map(|e| e.field()).collect();
        assert_eq!(fields, vec!["username", "email", "password"]);
    }

    #[test]
    fn test_email_rejects_double_at() {
        assert!(validate_email("a@b@c").is_err());
        assert!(validate_email("@b").is_err());
        assert!(validate_email("a@").is_err());
        assert!(validate_email("a@b").is_ok());
    }

    #[test]
    fn test_board_requires_columns() {
        let board = NewBoard {
            name: "Retro".to_string(),
            template: Template::Kanban,
            columns: vec![],
        };
        let errors = validate_new_board(&board);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field(), "columns");
    }

    #[test]
    fn test_feedback_requires_message() {
        let fb = NewFeedback {
            message: String::new(),
            board_id: new_entity_id(),
        };
        assert_eq!(validate_new_feedback(&fb).len(), 1);
    }

    #[test]
    fn test_option_none_is_missing() {
        let value: Option<String> = None;
        assert!(matches!(
            value.validate_non_empty("name"),
            Err(ValidationError::RequiredFieldMissing { .. })
        ));
    }
}
