//! Request handling core for the book catalog, free of HTTP types.

use std::sync::Arc;

use catalog_authz::{authorize, ClaimSet, Denied, RequiredClaim};
use catalog_db::{BookGateway, BookQuery, GatewayError, SortField, TextField};
use thiserror::Error;

use super::models::{Book, BookId, CreateBookRequest, ListBooksParams};

pub const ALL_PARAMETERS_REQUIRED: &str = "All parameters required.";
pub const BOOK_ALREADY_EXISTS: &str = "Book already exists.";
pub const INVALID_PAGINATION: &str = "Invalid pagination parameters.";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error(transparent)]
    Forbidden(#[from] Denied),

    #[error("book not found")]
    NotFound,

    #[error("{0}")]
    Conflict(&'static str),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Stateless handler over a shared gateway. Cloning is cheap.
#[derive(Clone)]
pub struct BookCatalog {
    gateway: Arc<dyn BookGateway>,
    admin: RequiredClaim,
}

impl BookCatalog {
    pub fn new(gateway: Arc<dyn BookGateway>, admin: RequiredClaim) -> Self {
        Self { gateway, admin }
    }

    /// Gate for mutating operations.
    pub fn authorize(&self, caller: &ClaimSet) -> Result<(), CatalogError> {
        authorize(caller, &self.admin)?;
        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<Book>, CatalogError> {
        Ok(self.gateway.query(&BookQuery::all()).await?)
    }

    /// Ids below 1 never match a stored record and skip the lookup.
    pub async fn get(&self, id: BookId) -> Result<Book, CatalogError> {
        if id <= 0 {
            return Err(CatalogError::NotFound);
        }

        self.gateway
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound)
    }

    pub async fn list(&self, params: &ListBooksParams) -> Result<Vec<Book>, CatalogError> {
        let query = page_query(params)?;
        Ok(self.gateway.query(&query).await?)
    }

    pub async fn create(
        &self,
        caller: &ClaimSet,
        request: CreateBookRequest,
    ) -> Result<Book, CatalogError> {
        self.authorize(caller)?;

        if request.has_blank_field() {
            return Err(CatalogError::BadRequest(ALL_PARAMETERS_REQUIRED));
        }

        // Advisory only: a concurrent create can slip between this check and the commit.
        let duplicate = BookQuery::all()
            .text_eq(TextField::Title, request.title.as_str())
            .text_eq(TextField::Author, request.author.as_str())
            .text_eq(TextField::Genre, request.genre.as_str())
            .take(1);
        if !self.gateway.query(&duplicate).await?.is_empty() {
            return Err(CatalogError::Conflict(BOOK_ALREADY_EXISTS));
        }

        let mut tx = self.gateway.begin().await?;
        let book = tx.insert(request.into()).await?;
        tx.commit().await?;

        tracing::info!(book_id = book.id, title = %book.title, "book created");
        Ok(book)
    }

    pub async fn delete(&self, caller: &ClaimSet, id: BookId) -> Result<(), CatalogError> {
        self.authorize(caller)?;

        if id <= 0 {
            return Err(CatalogError::NotFound);
        }

        let book = self
            .gateway
            .query(&BookQuery::by_id(id))
            .await?
            .into_iter()
            .next()
            .ok_or(CatalogError::NotFound)?;

        let mut tx = self.gateway.begin().await?;
        tx.remove(&book).await?;
        tx.commit().await?;

        tracing::info!(book_id = book.id, "book deleted");
        Ok(())
    }
}

/// Validate pagination, then filter by author and genre, sort by title, and window.
fn page_query(params: &ListBooksParams) -> Result<BookQuery, CatalogError> {
    if params.offset < 0 || params.limit <= 0 {
        return Err(CatalogError::BadRequest(INVALID_PAGINATION));
    }

    let mut query = BookQuery::all();
    if let Some(author) = params.author.as_deref().filter(|a| !a.trim().is_empty()) {
        query = query.text_eq_ignore_case(TextField::Author, author);
    }
    if let Some(genre) = params.genre.as_deref().filter(|g| !g.trim().is_empty()) {
        query = query.text_eq_ignore_case(TextField::Genre, genre);
    }

    // Both bounds were checked non-negative above.
    Ok(query
        .order_by(SortField::Title)
        .skip(params.offset.unsigned_abs())
        .take(params.limit.unsigned_abs()))
}
