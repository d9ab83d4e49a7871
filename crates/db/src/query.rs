//! Storage-neutral query specification interpreted by each gateway.

use crate::model::{Book, BookId};

/// Text columns that can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Author,
    Genre,
}

impl TextField {
    pub fn column(self) -> &'static str {
        match self {
            TextField::Title => "title",
            TextField::Author => "author",
            TextField::Genre => "genre",
        }
    }

    pub fn value_of(self, book: &Book) -> &str {
        match self {
            TextField::Title => &book.title,
            TextField::Author => &book.author,
            TextField::Genre => &book.genre,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matching {
    Exact,
    IgnoreCase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    IdEquals(BookId),
    Text {
        field: TextField,
        value: String,
        matching: Matching,
    },
}

impl Predicate {
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            Predicate::IdEquals(id) => book.id == *id,
            Predicate::Text {
                field,
                value,
                matching: Matching::Exact,
            } => field.value_of(book) == value,
            Predicate::Text {
                field,
                value,
                matching: Matching::IgnoreCase,
            } => field.value_of(book).to_lowercase() == value.to_lowercase(),
        }
    }
}

/// Sort keys, always ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Title,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Title => "title",
        }
    }
}

/// Conjunction of predicates, then sort, then a skip-then-take window.
///
/// Ties in the sort key, and unordered queries, fall back to ascending id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    pub predicates: Vec<Predicate>,
    pub order_by: Option<SortField>,
    pub offset: u64,
    pub limit: Option<u64>,
}

impl BookQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: BookId) -> Self {
        Self::all().filter(Predicate::IdEquals(id)).take(1)
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn text_eq(self, field: TextField, value: impl Into<String>) -> Self {
        self.filter(Predicate::Text {
            field,
            value: value.into(),
            matching: Matching::Exact,
        })
    }

    pub fn text_eq_ignore_case(self, field: TextField, value: impl Into<String>) -> Self {
        self.filter(Predicate::Text {
            field,
            value: value.into(),
            matching: Matching::IgnoreCase,
        })
    }

    pub fn order_by(mut self, field: SortField) -> Self {
        self.order_by = Some(field);
        self
    }

    pub fn skip(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn take(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, book: &Book) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(book))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> Book {
        Book {
            id: 7,
            title: "Book One".to_string(),
            author: "Author A".to_string(),
            genre: "Fiction".to_string(),
        }
    }

    #[test]
    fn predicates_are_conjunctive() {
        let query = BookQuery::all()
            .text_eq_ignore_case(TextField::Author, "author a")
            .text_eq_ignore_case(TextField::Genre, "FICTION");
        assert!(query.matches(&book()));

        let query = query.text_eq_ignore_case(TextField::Title, "book two");
        assert!(!query.matches(&book()));
    }

    #[test]
    fn exact_matching_is_case_sensitive() {
        assert!(BookQuery::all()
            .text_eq(TextField::Author, "Author A")
            .matches(&book()));
        assert!(!BookQuery::all()
            .text_eq(TextField::Author, "author a")
            .matches(&book()));
    }

    #[test]
    fn by_id_takes_a_single_record() {
        let query = BookQuery::by_id(7);
        assert_eq!(query.limit, Some(1));
        assert!(query.matches(&book()));
        assert!(!BookQuery::by_id(8).matches(&book()));
    }
}
