use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::error::{AuthorError, PersistenceError};
use super::model::{parse_id, Author};
use super::repo::AuthorRepository;

/// Process-local store with the same key and uniqueness rules as the `authors` table.
#[derive(Default)]
pub struct InMemoryAuthorRepository {
    rows: RwLock<BTreeMap<Uuid, Author>>,
}

impl InMemoryAuthorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_unique(rows: &BTreeMap<Uuid, Author>, author: &Author) -> Result<(), PersistenceError> {
    for other in rows.values().filter(|o| o.id() != author.id()) {
        if other.email() == author.email() {
            return Err(PersistenceError::Constraint("authors_email_key".into()));
        }
        if other.username().is_some() && other.username() == author.username() {
            return Err(PersistenceError::Constraint("authors_username_key".into()));
        }
    }
    Ok(())
}

#[async_trait]
impl AuthorRepository for InMemoryAuthorRepository {
    async fn insert(&self, author: &Author) -> Result<(), AuthorError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&author.id()) {
            return Err(PersistenceError::Constraint("authors_pkey".into()).into());
        }
        check_unique(&rows, author)?;
        rows.insert(author.id(), author.clone());
        debug!(author_id = %author.id(), "author inserted");
        Ok(())
    }

    async fn update(&self, author: &Author) -> Result<(), AuthorError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&author.id()) {
            return Err(AuthorError::NotFound(author.id()));
        }
        check_unique(&rows, author)?;
        rows.insert(author.id(), author.clone());
        debug!(author_id = %author.id(), "author updated");
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AuthorError> {
        self.rows
            .write()
            .await
            .remove(&id)
            .ok_or(AuthorError::NotFound(id))?;
        debug!(author_id = %id, "author deleted");
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Author, AuthorError> {
        let id = parse_id(id)?;
        self.rows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AuthorError::NotFound(id))
    }

    async fn find_all(&self) -> Result<Vec<Author>, AuthorError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authors::error::ValidationError;
    use crate::authors::model::fixtures::{self, ID};

    const OTHER_ID: &str = "4d8bd9e2-8f0b-4d0c-9a37-0f6a3a7d7c11";

    #[tokio::test]
    async fn insert_then_find_returns_equal_author() {
        let repo = InMemoryAuthorRepository::new();
        let author = fixtures::author();
        repo.insert(&author).await.unwrap();
        assert_eq!(repo.find_by_id(ID).await.unwrap(), author);
    }

    #[tokio::test]
    async fn delete_twice_is_not_found() {
        let repo = InMemoryAuthorRepository::new();
        let author = fixtures::author();
        repo.insert(&author).await.unwrap();
        repo.delete(author.id()).await.unwrap();
        let err = repo.delete(author.id()).await.unwrap_err();
        assert!(matches!(err, AuthorError::NotFound(id) if id == author.id()));
    }

    #[tokio::test]
    async fn find_by_malformed_id_is_validation_error() {
        let repo = InMemoryAuthorRepository::new();
        let err = repo.find_by_id("12345").await.unwrap_err();
        assert!(matches!(
            err,
            AuthorError::Validation(ValidationError::Identifier { .. })
        ));
    }

    #[tokio::test]
    async fn find_missing_is_not_found() {
        let repo = InMemoryAuthorRepository::new();
        let err = repo.find_by_id(ID).await.unwrap_err();
        assert!(matches!(err, AuthorError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_requires_existing_row() {
        let repo = InMemoryAuthorRepository::new();
        let mut author = fixtures::author();
        assert!(matches!(
            repo.update(&author).await.unwrap_err(),
            AuthorError::NotFound(_)
        ));

        repo.insert(&author).await.unwrap();
        author.set_email("kimura20@gmail.com").unwrap();
        repo.update(&author).await.unwrap();
        assert_eq!(repo.find_by_id(ID).await.unwrap().email(), "kimura20@gmail.com");
    }

    #[tokio::test]
    async fn duplicate_keys_violate_constraints() {
        let repo = InMemoryAuthorRepository::new();
        repo.insert(&fixtures::author()).await.unwrap();

        let same_id = fixtures::author_with(ID, "else@gmail.com", None);
        let same_email = fixtures::author_with(OTHER_ID, "kimura19@gmail.com", None);
        let same_name = fixtures::author_with(OTHER_ID, "else@gmail.com", Some("erictinez"));
        for dup in [same_id, same_email, same_name] {
            let err = repo.insert(&dup).await.unwrap_err();
            assert!(matches!(
                err,
                AuthorError::Persistence(PersistenceError::Constraint(_))
            ));
        }
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn find_all_is_ordered_by_id() {
        let repo = InMemoryAuthorRepository::new();
        repo.insert(&fixtures::author()).await.unwrap();
        repo.insert(&fixtures::author_with(OTHER_ID, "else@gmail.com", None))
            .await
            .unwrap();
        let ids: Vec<String> = repo
            .find_all()
            .await
            .unwrap()
            .iter()
            .map(|a| a.id().to_string())
            .collect();
        assert_eq!(ids, vec![OTHER_ID.to_string(), ID.to_string()]);
    }
}
