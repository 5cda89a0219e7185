use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    authors::{
        dto::{ActivateRequest, CreateAuthorRequest, PublicAuthor, UpdateAuthorRequest},
        error::{AuthorError, PersistenceError},
        model::Author,
        password::{generate_activation_token, hash_password},
    },
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

pub fn author_routes() -> Router<AppState> {
    Router::new()
        .route("/authors", get(list_authors).post(create_author))
        .route(
            "/authors/:id",
            get(get_author).put(update_author).delete(delete_author),
        )
        .route("/authors/:id/activate", post(activate_author))
}

fn reject(e: AuthorError) -> (StatusCode, String) {
    let status = match &e {
        AuthorError::Validation(_) => StatusCode::BAD_REQUEST,
        AuthorError::NotFound(_) => StatusCode::NOT_FOUND,
        AuthorError::Persistence(PersistenceError::Constraint(_)) => StatusCode::CONFLICT,
        AuthorError::Persistence(PersistenceError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %e, "author request failed");
    } else {
        warn!(error = %e, %status, "author request rejected");
    }
    (status, e.to_string())
}

async fn hash_or_reject(password: String) -> Result<String, (StatusCode, String)> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }
    // argon2 is CPU bound; keep it off the async workers
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            error!(error = %e, "hash_password task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?
        .map_err(|e| {
            error!(error = %e, "hash_password failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
}

#[instrument(skip(state, payload))]
pub async fn create_author(
    State(state): State<AppState>,
    Json(payload): Json<CreateAuthorRequest>,
) -> Result<(StatusCode, Json<PublicAuthor>), (StatusCode, String)> {
    let id = payload
        .id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let hash = hash_or_reject(payload.password).await?;
    let token = generate_activation_token();

    let author = Author::new(
        &id,
        &payload.avatar_url,
        Some(&token),
        &payload.email,
        payload.username.as_deref(),
        &hash,
    )
    .map_err(|e| reject(e.into()))?;

    state.repo.insert(&author).await.map_err(reject)?;

    info!(author_id = %author.id(), email = %author.email(), "author registered");
    Ok((StatusCode::CREATED, Json(PublicAuthor::from(&author))))
}

#[instrument(skip(state))]
pub async fn list_authors(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicAuthor>>, (StatusCode, String)> {
    let authors = state.repo.find_all().await.map_err(reject)?;
    Ok(Json(authors.iter().map(PublicAuthor::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicAuthor>, (StatusCode, String)> {
    let author = state.repo.find_by_id(&id).await.map_err(reject)?;
    Ok(Json(PublicAuthor::from(&author)))
}

#[instrument(skip(state, payload))]
pub async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAuthorRequest>,
) -> Result<Json<PublicAuthor>, (StatusCode, String)> {
    let mut author = state.repo.find_by_id(&id).await.map_err(reject)?;

    author
        .set_avatar_url(&payload.avatar_url)
        .and_then(|_| author.set_email(&payload.email))
        .and_then(|_| author.set_username(payload.username.as_deref()))
        .map_err(|e| reject(e.into()))?;
    if let Some(password) = payload.password {
        let hash = hash_or_reject(password).await?;
        author
            .set_password_hash(&hash)
            .map_err(|e| reject(e.into()))?;
    }

    state.repo.update(&author).await.map_err(reject)?;

    info!(author_id = %author.id(), "author updated");
    Ok(Json(PublicAuthor::from(&author)))
}

#[instrument(skip(state))]
pub async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let id = crate::authors::model::parse_id(&id).map_err(|e| reject(e.into()))?;
    state.repo.delete(id).await.map_err(reject)?;
    info!(author_id = %id, "author deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn activate_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ActivateRequest>,
) -> Result<Json<PublicAuthor>, (StatusCode, String)> {
    let mut author = state.repo.find_by_id(&id).await.map_err(reject)?;

    let Some(expected) = author.activation_token() else {
        warn!(author_id = %author.id(), "author already activated");
        return Err((StatusCode::CONFLICT, "Author already activated".into()));
    };
    if payload.token.trim().to_lowercase() != expected {
        warn!(author_id = %author.id(), "activation token mismatch");
        return Err((StatusCode::BAD_REQUEST, "Invalid activation token".into()));
    }

    author
        .set_activation_token(None)
        .map_err(|e| reject(e.into()))?;
    state.repo.update(&author).await.map_err(reject)?;

    info!(author_id = %author.id(), "author activated");
    Ok(Json(PublicAuthor::from(&author)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_status_codes() {
        let id = Uuid::new_v4();
        assert_eq!(reject(AuthorError::NotFound(id)).0, StatusCode::NOT_FOUND);
        assert_eq!(
            reject(PersistenceError::Constraint("authors_email_key".into()).into()).0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            reject(sqlx::Error::PoolTimedOut.into()).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let err = crate::authors::model::parse_id("x").unwrap_err();
        assert_eq!(reject(err.into()).0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn short_password_is_rejected_before_hashing() {
        let (status, _) = hash_or_reject("short".into()).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn password_is_hashed_on_blocking_pool() {
        let hash = hash_or_reject("correct-horse-battery-staple".into())
            .await
            .expect("hashing should succeed");
        assert_eq!(hash.len(), crate::authors::password::PASSWORD_HASH_LEN);
        assert!(crate::authors::password::is_argon2i(&hash));
    }

    #[test]
    fn public_author_hides_secrets() {
        let author = crate::authors::model::fixtures::author();
        let json = serde_json::to_string(&PublicAuthor::from(&author)).unwrap();
        assert!(json.contains("kimura19@gmail.com"));
        assert!(!json.contains("argon2i"));
        assert!(!json.contains(crate::authors::model::fixtures::TOKEN));
        assert!(json.contains("\"activated\":false"));
    }
}
