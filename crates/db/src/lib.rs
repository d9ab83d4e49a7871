//! Persistence gateways for the book table.
//!
//! The catalog handler talks to storage exclusively through [`BookGateway`],
//! expressing reads as a [`BookQuery`] value. Two gateways ship: an in-memory
//! one for tests and local runs, and a PostgreSQL one.

use std::sync::Arc;

use anyhow::Context;
use catalog_kernel::settings::{DatabaseBackend, DatabaseSettings};

pub mod gateway;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;

pub use gateway::{BookGateway, BookTransaction, GatewayError};
pub use memory::{demo_books, MemoryGateway};
pub use model::{Book, BookId, NewBook};
pub use postgres::PgGateway;
pub use query::{BookQuery, Matching, Predicate, SortField, TextField};

/// Build the gateway selected by configuration.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Arc<dyn BookGateway>> {
    match settings.backend {
        DatabaseBackend::Memory => {
            let gateway = if settings.seed_demo_data {
                MemoryGateway::seeded(demo_books())
            } else {
                MemoryGateway::new()
            };
            tracing::info!(
                target: "catalog-db",
                seeded = settings.seed_demo_data,
                "using in-memory book store"
            );
            Ok(Arc::new(gateway))
        }
        DatabaseBackend::Postgres => {
            if settings.seed_demo_data {
                tracing::warn!(
                    target: "catalog-db",
                    "seed_demo_data is ignored by the postgres backend"
                );
            }
            let gateway = PgGateway::connect(&settings.url, &settings.table)
                .await
                .context("failed to connect to postgres")?;
            tracing::info!(target: "catalog-db", table = %settings.table, "connected to postgres");
            Ok(Arc::new(gateway))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_honors_seed_flag() {
        let mut settings = DatabaseSettings::default();
        settings.seed_demo_data = true;

        let gateway = connect(&settings).await.unwrap();
        let books = gateway.query(&BookQuery::all()).await.unwrap();
        assert_eq!(books.len(), 5);

        settings.seed_demo_data = false;
        let gateway = connect(&settings).await.unwrap();
        assert!(gateway.query(&BookQuery::all()).await.unwrap().is_empty());
    }
}
