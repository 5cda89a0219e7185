use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::error::{Field, LengthRule, ValidationError};
use super::password::{is_argon2i, ACTIVATION_TOKEN_LEN, PASSWORD_HASH_LEN};

pub const AVATAR_URL_MAX_LEN: usize = 32;
pub const EMAIL_MAX_LEN: usize = 128;
pub const USERNAME_MAX_LEN: usize = 32;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        // dot-atom local part, dot-separated hostname labels without edge hyphens
        static ref EMAIL_RE: Regex = Regex::new(concat!(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
            r"@(?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?\.)+",
            r"[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?$",
        ))
        .expect("email regex compiles");
    }
    EMAIL_RE.is_match(email)
}

/// Account owner. Every field has passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    id: Uuid,
    activation_token: Option<String>,
    avatar_url: String,
    email: String,
    username: Option<String>,
    password_hash: String,
}

/// Raw `authors` row, not yet validated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuthorRow {
    pub id: Uuid,
    pub activation_token: Option<String>,
    pub avatar_url: String,
    pub email: String,
    pub username: Option<String>,
    pub password_hash: String,
}

/// Parse an author id from its textual form.
pub fn parse_id(raw: &str) -> Result<Uuid, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Identifier {
            reason: "id is empty".into(),
        });
    }
    Uuid::parse_str(raw).map_err(|e| ValidationError::Identifier {
        reason: e.to_string(),
    })
}

fn check_max_len(field: Field, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::Length {
            field,
            len,
            rule: LengthRule::AtMost(max),
        });
    }
    Ok(())
}

fn check_exact_len(field: Field, value: &str, exact: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len != exact {
        return Err(ValidationError::Length {
            field,
            len,
            rule: LengthRule::Exactly(exact),
        });
    }
    Ok(())
}

fn non_empty(field: Field, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Format {
            field,
            reason: "value is empty",
        });
    }
    Ok(value.to_string())
}

fn normalize_activation_token(token: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(token) = token else {
        return Ok(None);
    };
    let token = token.trim().to_lowercase();
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::Format {
            field: Field::ActivationToken,
            reason: "expected hexadecimal digits",
        });
    }
    check_exact_len(Field::ActivationToken, &token, ACTIVATION_TOKEN_LEN)?;
    Ok(Some(token))
}

fn normalize_avatar_url(url: &str) -> Result<String, ValidationError> {
    let url = non_empty(Field::AvatarUrl, url)?;
    check_max_len(Field::AvatarUrl, &url, AVATAR_URL_MAX_LEN)?;
    Ok(url)
}

fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let email = non_empty(Field::Email, email)?;
    if !is_valid_email(&email) {
        return Err(ValidationError::Format {
            field: Field::Email,
            reason: "not a valid email address",
        });
    }
    check_max_len(Field::Email, &email, EMAIL_MAX_LEN)?;
    Ok(email)
}

fn normalize_username(username: Option<&str>) -> Result<Option<String>, ValidationError> {
    username
        .map(|name| -> Result<String, ValidationError> {
            let name = non_empty(Field::Username, name)?;
            check_max_len(Field::Username, &name, USERNAME_MAX_LEN)?;
            Ok(name)
        })
        .transpose()
}

fn normalize_password_hash(hash: &str) -> Result<String, ValidationError> {
    let hash = non_empty(Field::PasswordHash, hash)?;
    if !is_argon2i(&hash) {
        return Err(ValidationError::Format {
            field: Field::PasswordHash,
            reason: "not an argon2i hash",
        });
    }
    check_exact_len(Field::PasswordHash, &hash, PASSWORD_HASH_LEN)?;
    Ok(hash)
}

impl Author {
    /// Validate every field and build the author, failing on the first bad one.
    pub fn new(
        id: &str,
        avatar_url: &str,
        activation_token: Option<&str>,
        email: &str,
        username: Option<&str>,
        password_hash: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: parse_id(id)?,
            activation_token: normalize_activation_token(activation_token)?,
            avatar_url: normalize_avatar_url(avatar_url)?,
            email: normalize_email(email)?,
            username: normalize_username(username)?,
            password_hash: normalize_password_hash(password_hash)?,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn activation_token(&self) -> Option<&str> {
        self.activation_token.as_deref()
    }

    pub fn avatar_url(&self) -> &str {
        &self.avatar_url
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Ids never change once assigned; re-setting the same id is accepted.
    pub fn set_id(&mut self, id: &str) -> Result<(), ValidationError> {
        let id = parse_id(id)?;
        if id != self.id {
            return Err(ValidationError::Identifier {
                reason: format!("id {} cannot be replaced", self.id),
            });
        }
        Ok(())
    }

    pub fn set_activation_token(&mut self, token: Option<&str>) -> Result<(), ValidationError> {
        self.activation_token = normalize_activation_token(token)?;
        Ok(())
    }

    pub fn set_avatar_url(&mut self, url: &str) -> Result<(), ValidationError> {
        self.avatar_url = normalize_avatar_url(url)?;
        Ok(())
    }

    pub fn set_email(&mut self, email: &str) -> Result<(), ValidationError> {
        self.email = normalize_email(email)?;
        Ok(())
    }

    pub fn set_username(&mut self, username: Option<&str>) -> Result<(), ValidationError> {
        self.username = normalize_username(username)?;
        Ok(())
    }

    pub fn set_password_hash(&mut self, hash: &str) -> Result<(), ValidationError> {
        self.password_hash = normalize_password_hash(hash)?;
        Ok(())
    }
}

impl TryFrom<AuthorRow> for Author {
    type Error = ValidationError;

    fn try_from(row: AuthorRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            activation_token: normalize_activation_token(row.activation_token.as_deref())?,
            avatar_url: normalize_avatar_url(&row.avatar_url)?,
            email: normalize_email(&row.email)?,
            username: normalize_username(row.username.as_deref())?,
            password_hash: normalize_password_hash(&row.password_hash)?,
        })
    }
}

impl From<&Author> for AuthorRow {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            activation_token: author.activation_token.clone(),
            avatar_url: author.avatar_url.clone(),
            email: author.email.clone(),
            username: author.username.clone(),
            password_hash: author.password_hash.clone(),
        }
    }
}
