use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod model;
pub mod password;
pub mod repo;

pub use error::{AuthorError, Field, LengthRule, PersistenceError, ValidationError};
pub use memory::InMemoryAuthorRepository;
pub use model::Author;
pub use repo::{AuthorRepository, PgAuthorRepository};

pub fn router() -> Router<AppState> {
    handlers::author_routes()
}
