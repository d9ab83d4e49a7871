use serde::{Deserialize, Serialize};

pub use catalog_db::{Book, BookId, NewBook};

pub const DEFAULT_OFFSET: i64 = 0;
pub const DEFAULT_LIMIT: i64 = 5;

/// Request body for creating a book. Missing fields arrive as empty strings
/// and are rejected by the blank-field check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    pub genre: String,
}

impl CreateBookRequest {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
        }
    }

    pub fn has_blank_field(&self) -> bool {
        [&self.title, &self.author, &self.genre]
            .iter()
            .any(|field| field.trim().is_empty())
    }
}

impl From<CreateBookRequest> for NewBook {
    fn from(request: CreateBookRequest) -> Self {
        NewBook::new(request.title, request.author, request.genre)
    }
}

/// Query parameters of the filtered listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListBooksParams {
    #[serde(default = "ListBooksParams::default_offset")]
    pub offset: i64,
    #[serde(default = "ListBooksParams::default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
}

impl ListBooksParams {
    fn default_offset() -> i64 {
        DEFAULT_OFFSET
    }

    fn default_limit() -> i64 {
        DEFAULT_LIMIT
    }

    pub fn page(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit,
            ..Self::default()
        }
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }
}

impl Default for ListBooksParams {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
            limit: DEFAULT_LIMIT,
            author: None,
            genre: None,
        }
    }
}
