use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::Author;

/// Request body for author registration.
#[derive(Debug, Deserialize)]
pub struct CreateAuthorRequest {
    pub id: Option<String>,
    pub avatar_url: String,
    pub email: String,
    pub username: Option<String>,
    pub password: String,
}

/// Request body for replacing an author's mutable fields.
#[derive(Debug, Deserialize)]
pub struct UpdateAuthorRequest {
    pub avatar_url: String,
    pub email: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub token: String,
}

/// Public part of the author returned to the client.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicAuthor {
    pub id: Uuid,
    pub avatar_url: String,
    pub email: String,
    pub username: Option<String>,
    pub activated: bool,
}

impl From<&Author> for PublicAuthor {
    fn from(a: &Author) -> Self {
        Self {
            id: a.id(),
            avatar_url: a.avatar_url().to_string(),
            email: a.email().to_string(),
            username: a.username().map(str::to_string),
            activated: a.activation_token().is_none(),
        }
    }
}
