//! PostgreSQL gateway over a `sqlx` pool.
//!
//! The table is expected to exist with columns `id` (integer identity),
//! `title`, `author`, `genre`.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder, Transaction};

use crate::gateway::{BookGateway, BookTransaction, GatewayError};
use crate::model::{Book, BookId, NewBook};
use crate::query::{BookQuery, Matching, Predicate};

const COLUMNS: &str = "id, title, author, genre";

#[derive(Debug, Clone)]
pub struct PgGateway {
    pool: PgPool,
    table: String,
}

impl PgGateway {
    pub async fn connect(url: &str, table: &str) -> Result<Self, GatewayError> {
        validate_table(table)?;
        let pool = PgPoolOptions::new().connect(url).await?;
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    pub fn new(pool: PgPool, table: &str) -> Result<Self, GatewayError> {
        validate_table(table)?;
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }
}

/// Accepts `table` or `schema.table` made of ASCII word characters only,
/// since the name is spliced into SQL text.
fn validate_table(table: &str) -> Result<(), GatewayError> {
    let valid_part = |part: &str| {
        !part.is_empty()
            && !part.starts_with(|c: char| c.is_ascii_digit())
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    let parts: Vec<&str> = table.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|part| valid_part(part)) {
        Ok(())
    } else {
        Err(GatewayError::Configuration(format!(
            "invalid table name '{table}'"
        )))
    }
}

fn select_query(table: &str, query: &BookQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {COLUMNS} FROM {table}"));

    for (index, predicate) in query.predicates.iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });
        match predicate {
            Predicate::IdEquals(id) => {
                builder.push("id = ").push_bind(*id);
            }
            Predicate::Text {
                field,
                value,
                matching: Matching::Exact,
            } => {
                builder
                    .push(field.column())
                    .push(" = ")
                    .push_bind(value.clone());
            }
            Predicate::Text {
                field,
                value,
                matching: Matching::IgnoreCase,
            } => {
                builder
                    .push("LOWER(")
                    .push(field.column())
                    .push(") = LOWER(")
                    .push_bind(value.clone())
                    .push(")");
            }
        }
    }

    builder.push(" ORDER BY ");
    if let Some(field) = query.order_by {
        builder.push(field.column()).push(" ASC, ");
    }
    builder.push("id ASC");

    if query.offset > 0 {
        builder
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset).unwrap_or(i64::MAX));
    }
    if let Some(limit) = query.limit {
        builder
            .push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }

    builder
}

#[async_trait]
impl BookGateway for PgGateway {
    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, GatewayError> {
        let sql = format!("SELECT {COLUMNS} FROM {} WHERE id = $1", self.table);
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn query(&self, query: &BookQuery) -> Result<Vec<Book>, GatewayError> {
        let mut builder = select_query(&self.table, query);
        let books = builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn begin(&self) -> Result<Box<dyn BookTransaction>, GatewayError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction {
            tx,
            table: self.table.clone(),
        }))
    }
}

struct PgTransaction {
    tx: Transaction<'static, Postgres>,
    table: String,
}

#[async_trait]
impl BookTransaction for PgTransaction {
    async fn insert(&mut self, book: NewBook) -> Result<Book, GatewayError> {
        let sql = format!(
            "INSERT INTO {} (title, author, genre) VALUES ($1, $2, $3) RETURNING id",
            self.table
        );
        let id: BookId = sqlx::query_scalar(&sql)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.genre)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(book.with_id(id))
    }

    async fn remove(&mut self, book: &Book) -> Result<(), GatewayError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);
        sqlx::query(&sql)
            .bind(book.id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), GatewayError> {
        let PgTransaction { tx, .. } = *self;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{SortField, TextField};

    #[test]
    fn table_names_are_restricted() {
        assert!(validate_table("books").is_ok());
        assert!(validate_table("bookservice.books").is_ok());
        assert!(validate_table("books; DROP TABLE books").is_err());
        assert!(validate_table("a.b.c").is_err());
        assert!(validate_table("").is_err());
        assert!(validate_table("1books").is_err());
    }

    #[test]
    fn unfiltered_query_orders_by_id() {
        let builder = select_query("bookservice.books", &BookQuery::all());
        assert_eq!(
            builder.sql(),
            "SELECT id, title, author, genre FROM bookservice.books ORDER BY id ASC"
        );
    }

    #[test]
    fn filtered_page_binds_every_value() {
        let query = BookQuery::all()
            .text_eq_ignore_case(TextField::Author, "author a")
            .text_eq_ignore_case(TextField::Genre, "fiction")
            .order_by(SortField::Title)
            .skip(5)
            .take(5);
        let builder = select_query("books", &query);
        assert_eq!(
            builder.sql(),
            "SELECT id, title, author, genre FROM books \
             WHERE LOWER(author) = LOWER($1) AND LOWER(genre) = LOWER($2) \
             ORDER BY title ASC, id ASC OFFSET $3 LIMIT $4"
        );
    }

    #[test]
    fn exact_match_and_id_predicates() {
        let query = BookQuery::by_id(3).text_eq(TextField::Title, "Book Three");
        let builder = select_query("books", &query);
        assert_eq!(
            builder.sql(),
            "SELECT id, title, author, genre FROM books \
             WHERE id = $1 AND title = $2 ORDER BY id ASC LIMIT $3"
        );
    }
}
