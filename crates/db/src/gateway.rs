use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Book, BookId, NewBook};
use crate::query::BookQuery;

/// Storage or transport failure. Callers propagate it without interpretation.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("database error: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("invalid gateway configuration: {0}")]
    Configuration(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Record store for books.
#[async_trait]
pub trait BookGateway: Send + Sync {
    /// Primary-key lookup.
    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, GatewayError>;

    async fn query(&self, query: &BookQuery) -> Result<Vec<Book>, GatewayError>;

    /// Open a unit of work. Nothing is visible to other callers until commit.
    async fn begin(&self) -> Result<Box<dyn BookTransaction>, GatewayError>;
}

/// A pending set of writes. Dropping it without `commit` discards the writes.
#[async_trait]
pub trait BookTransaction: Send {
    /// Stage an insert and return the record with its assigned id.
    async fn insert(&mut self, book: NewBook) -> Result<Book, GatewayError>;

    async fn remove(&mut self, book: &Book) -> Result<(), GatewayError>;

    async fn commit(self: Box<Self>) -> Result<(), GatewayError>;
}
