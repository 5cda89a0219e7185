use std::fmt;

use sqlx::error::ErrorKind;
use thiserror::Error;
use uuid::Uuid;

/// Author attribute a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    ActivationToken,
    AvatarUrl,
    Email,
    Username,
    PasswordHash,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Id => "id",
            Field::ActivationToken => "activation token",
            Field::AvatarUrl => "avatar url",
            Field::Email => "email",
            Field::Username => "username",
            Field::PasswordHash => "password hash",
        };
        f.write_str(name)
    }
}

/// Allowed length of a string attribute, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthRule {
    AtMost(usize),
    Exactly(usize),
}

impl fmt::Display for LengthRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthRule::AtMost(n) => write!(f, "at most {n}"),
            LengthRule::Exactly(n) => write!(f, "exactly {n}"),
        }
    }
}

/// Rejected input for one of the author attributes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid author id: {reason}")]
    Identifier { reason: String },

    #[error("{field} is invalid: {reason}")]
    Format { field: Field, reason: &'static str },

    #[error("{field} must be {rule} characters, got {len}")]
    Length {
        field: Field,
        len: usize,
        rule: LengthRule,
    },
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::Identifier { .. } => Field::Id,
            ValidationError::Format { field, .. } | ValidationError::Length { field, .. } => *field,
        }
    }
}

/// Failure reported by the backing store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("store error: {0}")]
    Store(#[source] sqlx::Error),
}

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => {
                    let detail = db_err
                        .constraint()
                        .map(str::to_string)
                        .unwrap_or_else(|| db_err.message().to_string());
                    return Self::Constraint(detail);
                }
                _ => {}
            }
        }
        Self::Store(err)
    }
}

/// Errors returned by author operations.
#[derive(Debug, Error)]
pub enum AuthorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("author {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<sqlx::Error> for AuthorError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_error_message_names_field_and_rule() {
        let err = ValidationError::Length {
            field: Field::Email,
            len: 129,
            rule: LengthRule::AtMost(128),
        };
        assert_eq!(err.to_string(), "email must be at most 128 characters, got 129");
        assert_eq!(err.field(), Field::Email);
    }

    #[test]
    fn identifier_error_refers_to_id() {
        let err = ValidationError::Identifier {
            reason: "bad".into(),
        };
        assert_eq!(err.field(), Field::Id);
    }

    #[test]
    fn non_database_sqlx_error_is_store_failure() {
        let err: AuthorError = sqlx::Error::RowNotFound.into();
        assert!(matches!(
            err,
            AuthorError::Persistence(PersistenceError::Store(_))
        ));
    }
}
