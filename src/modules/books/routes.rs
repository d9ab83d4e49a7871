//! Axum handlers for the book endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use catalog_http::{auth::Caller, error::AppError};

use super::models::{Book, BookId, CreateBookRequest, ListBooksParams};
use super::service::{BookCatalog, CatalogError, ALL_PARAMETERS_REQUIRED, INVALID_PAGINATION};

impl From<CatalogError> for AppError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::BadRequest(message) => AppError::bad_request(message),
            CatalogError::Forbidden(_) => AppError::Forbidden,
            CatalogError::NotFound => AppError::NotFound,
            CatalogError::Conflict(message) => AppError::conflict(Vec::new(), message),
            CatalogError::Gateway(err) => AppError::Internal(err.into()),
        }
    }
}

pub fn router(catalog: BookCatalog) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/all", get(list_all_books))
        .route("/{id}", get(get_book).delete(delete_book))
        .with_state(catalog)
}

/// A non-integer id can never name a record.
fn book_id(path: Result<Path<BookId>, PathRejection>) -> Result<BookId, AppError> {
    path.map(|Path(id)| id).map_err(|_| AppError::NotFound)
}

async fn list_all_books(State(catalog): State<BookCatalog>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(catalog.list_all().await?))
}

async fn get_book(
    State(catalog): State<BookCatalog>,
    path: Result<Path<BookId>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let id = book_id(path)?;
    Ok(Json(catalog.get(id).await?))
}

async fn list_books(
    State(catalog): State<BookCatalog>,
    params: Result<Query<ListBooksParams>, QueryRejection>,
) -> Result<Json<Vec<Book>>, AppError> {
    let Query(params) = params.map_err(|_| AppError::bad_request(INVALID_PAGINATION))?;
    Ok(Json(catalog.list(&params).await?))
}

async fn create_book(
    State(catalog): State<BookCatalog>,
    Caller(claims): Caller,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    // Authorization precedes any look at the body.
    catalog.authorize(&claims)?;
    let Json(request) = body.map_err(|_| AppError::bad_request(ALL_PARAMETERS_REQUIRED))?;

    let book = catalog.create(&claims, request).await?;
    let location = format!("{}/{}", uri.path().trim_end_matches('/'), book.id);

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(book)))
}

async fn delete_book(
    State(catalog): State<BookCatalog>,
    Caller(claims): Caller,
    path: Result<Path<BookId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = book_id(path)?;
    catalog.delete(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
