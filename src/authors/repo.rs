use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error};
use uuid::Uuid;

use super::error::AuthorError;
use super::model::{parse_id, Author, AuthorRow};

/// Persistence operations for authors, keyed by id.
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Write the author as a new row.
    async fn insert(&self, author: &Author) -> Result<(), AuthorError>;

    /// Overwrite the row with the author's id.
    ///
    /// Returns [`AuthorError::NotFound`] when no row has that id.
    async fn update(&self, author: &Author) -> Result<(), AuthorError>;

    /// Remove the row with `id`.
    ///
    /// Returns [`AuthorError::NotFound`] when no row has that id.
    async fn delete(&self, id: Uuid) -> Result<(), AuthorError>;

    /// Load one author. The id is validated before the store is queried.
    async fn find_by_id(&self, id: &str) -> Result<Author, AuthorError>;

    /// Load every author. A single invalid row fails the whole call.
    async fn find_all(&self) -> Result<Vec<Author>, AuthorError>;
}

#[derive(Clone)]
pub struct PgAuthorRepository {
    db: PgPool,
}

impl PgAuthorRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthorRepository for PgAuthorRepository {
    async fn insert(&self, author: &Author) -> Result<(), AuthorError> {
        sqlx::query(
            r#"
            INSERT INTO authors (id, activation_token, avatar_url, email, username, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(author.id())
        .bind(author.activation_token())
        .bind(author.avatar_url())
        .bind(author.email())
        .bind(author.username())
        .bind(author.password_hash())
        .execute(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, author_id = %author.id(), "insert author failed");
            AuthorError::from(e)
        })?;
        debug!(author_id = %author.id(), "author inserted");
        Ok(())
    }

    async fn update(&self, author: &Author) -> Result<(), AuthorError> {
        let result = sqlx::query(
            r#"
            UPDATE authors
               SET activation_token = $2,
                   avatar_url = $3,
                   email = $4,
                   username = $5,
                   password_hash = $6
             WHERE id = $1
            "#,
        )
        .bind(author.id())
        .bind(author.activation_token())
        .bind(author.avatar_url())
        .bind(author.email())
        .bind(author.username())
        .bind(author.password_hash())
        .execute(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, author_id = %author.id(), "update author failed");
            AuthorError::from(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AuthorError::NotFound(author.id()));
        }
        debug!(author_id = %author.id(), "author updated");
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AuthorError> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| {
                error!(error = %e, author_id = %id, "delete author failed");
                AuthorError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AuthorError::NotFound(id));
        }
        debug!(author_id = %id, "author deleted");
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Author, AuthorError> {
        let id = parse_id(id)?;
        let row = sqlx::query_as::<_, AuthorRow>(
            r#"
            SELECT id, activation_token, avatar_url, email, username, password_hash
            FROM authors
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AuthorError::NotFound(id))?;
        Ok(Author::try_from(row)?)
    }

    async fn find_all(&self) -> Result<Vec<Author>, AuthorError> {
        let rows = sqlx::query_as::<_, AuthorRow>(
            r#"
            SELECT id, activation_token, avatar_url, email, username, password_hash
            FROM authors
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        authors_from_rows(rows)
    }
}

/// Validate every row; the first invalid one fails the whole batch.
fn authors_from_rows(rows: Vec<AuthorRow>) -> Result<Vec<Author>, AuthorError> {
    let authors = rows
        .into_iter()
        .map(Author::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            error!(error = %e, "stored author row failed validation");
            AuthorError::from(e)
        })?;
    Ok(authors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authors::error::{Field, ValidationError};
    use crate::authors::model::fixtures;

    #[test]
    fn valid_rows_convert_in_order() {
        let first = fixtures::author();
        let second =
            fixtures::author_with("4d8bd9e2-8f0b-4d0c-9a37-0f6a3a7d7c11", "else@gmail.com", None);
        let rows = vec![AuthorRow::from(&first), AuthorRow::from(&second)];
        assert_eq!(authors_from_rows(rows).unwrap(), vec![first, second]);
    }

    #[test]
    fn one_invalid_row_aborts_the_batch() {
        let good = AuthorRow::from(&fixtures::author());
        let mut bad = AuthorRow::from(&fixtures::author_with(
            "4d8bd9e2-8f0b-4d0c-9a37-0f6a3a7d7c11",
            "else@gmail.com",
            None,
        ));
        bad.avatar_url = "u".repeat(33);

        let err = authors_from_rows(vec![good.clone(), bad, good]).unwrap_err();
        assert!(matches!(
            err,
            AuthorError::Validation(ValidationError::Length {
                field: Field::AvatarUrl,
                ..
            })
        ));
    }
}
