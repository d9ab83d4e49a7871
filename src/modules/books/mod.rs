pub mod models;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use catalog_authz::RequiredClaim;
use catalog_db::BookGateway;
use catalog_kernel::{InitCtx, Module};
use serde_json::json;

use service::BookCatalog;

/// Book catalog module: public reads, admin-gated create and delete
pub struct BooksModule {
    catalog: BookCatalog,
}

impl BooksModule {
    pub fn new(gateway: Arc<dyn BookGateway>, admin: RequiredClaim) -> Self {
        Self {
            catalog: BookCatalog::new(gateway, admin),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "book"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            backend = ?ctx.settings.database.backend,
            "book module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.catalog.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "book module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "book module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_list_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let id_param = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int32" }
    });
    let book_response = json!({
        "description": "Book exists.",
        "content": {
            "application/json": { "schema": { "$ref": "#/components/schemas/Book" } }
        }
    });

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books sorted by title, optionally filtered by author and genre",
                    "tags": ["Books"],
                    "parameters": [
                        { "name": "offset", "in": "query", "schema": { "type": "integer", "default": 0, "minimum": 0 } },
                        { "name": "limit", "in": "query", "schema": { "type": "integer", "default": 5, "minimum": 1 } },
                        { "name": "author", "in": "query", "schema": { "type": "string" } },
                        { "name": "genre", "in": "query", "schema": { "type": "string" } }
                    ],
                    "responses": {
                        "200": book_list_response("List of books."),
                        "400": error_response("Invalid pagination parameters.")
                    }
                },
                "post": {
                    "summary": "Create a book. Admin only.",
                    "tags": ["Books"],
                    "security": [{ "bearer": [] }],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/CreateBookRequest" }
                            }
                        }
                    },
                    "responses": {
                        "201": {
                            "description": "Book created.",
                            "headers": {
                                "Location": { "schema": { "type": "string" } }
                            },
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/Book" } }
                            }
                        },
                        "400": error_response("Missing parameters."),
                        "403": { "description": "Access denied." },
                        "409": error_response("Book already exists.")
                    }
                }
            },
            "/all": {
                "get": {
                    "summary": "List every book",
                    "tags": ["Books"],
                    "responses": {
                        "200": book_list_response("All books.")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book by id",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "responses": {
                        "200": book_response,
                        "404": { "description": "Book with given id doesn't exist." }
                    }
                },
                "delete": {
                    "summary": "Delete a book. Admin only.",
                    "tags": ["Books"],
                    "security": [{ "bearer": [] }],
                    "parameters": [id_param],
                    "responses": {
                        "204": { "description": "Book deleted." },
                        "403": { "description": "Access denied." },
                        "404": { "description": "Book with given id doesn't exist." }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int32" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "genre": { "type": "string" }
                    },
                    "required": ["id", "title", "author", "genre"]
                },
                "CreateBookRequest": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "genre": { "type": "string" }
                    },
                    "required": ["title", "author", "genre"]
                }
            }
        }
    })
}

/// Create the book module over the given gateway
pub fn create_module(gateway: Arc<dyn BookGateway>, admin: RequiredClaim) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(gateway, admin))
}
