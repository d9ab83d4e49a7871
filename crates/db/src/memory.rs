//! In-process gateway backed by a locked ordered map.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::gateway::{BookGateway, BookTransaction, GatewayError};
use crate::model::{Book, BookId, NewBook};
use crate::query::{BookQuery, SortField};

#[derive(Debug)]
struct MemoryStore {
    books: RwLock<BTreeMap<BookId, Book>>,
    next_id: AtomicI32,
}

#[derive(Debug, Clone)]
pub struct MemoryGateway {
    store: Arc<MemoryStore>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::seeded(Vec::new())
    }

    /// Start with the given records, numbered from 1 in order.
    pub fn seeded(books: impl IntoIterator<Item = NewBook>) -> Self {
        let books: BTreeMap<BookId, Book> = books
            .into_iter()
            .zip(1..)
            .map(|(book, id)| (id, book.with_id(id)))
            .collect();
        let next_id = books.keys().next_back().copied().unwrap_or(0) + 1;

        Self {
            store: Arc::new(MemoryStore {
                books: RwLock::new(books),
                next_id: AtomicI32::new(next_id),
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.store.books.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.books.read().await.is_empty()
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

/// The five reference records used for demos and tests.
pub fn demo_books() -> Vec<NewBook> {
    vec![
        NewBook::new("Book One", "Author A", "Fiction"),
        NewBook::new("Book Two", "Author A", "Science"),
        NewBook::new("Book Three", "Author B", "Fiction"),
        NewBook::new("Book Four", "Author C", "Fantasy"),
        NewBook::new("Book Five", "Author D", "Science"),
    ]
}

fn compare(field: SortField, a: &Book, b: &Book) -> std::cmp::Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Title => a.title.cmp(&b.title),
    }
}

#[async_trait]
impl BookGateway for MemoryGateway {
    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, GatewayError> {
        Ok(self.store.books.read().await.get(&id).cloned())
    }

    async fn query(&self, query: &BookQuery) -> Result<Vec<Book>, GatewayError> {
        let mut books: Vec<Book> = {
            let books = self.store.books.read().await;
            books.values().filter(|b| query.matches(b)).cloned().collect()
        };

        // Map iteration is already id-ascending, so a stable sort keeps id as tie-breaker.
        if let Some(field) = query.order_by {
            books.sort_by(|a, b| compare(field, a, b));
        }

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(books.into_iter().skip(offset).take(limit).collect())
    }

    async fn begin(&self) -> Result<Box<dyn BookTransaction>, GatewayError> {
        Ok(Box::new(MemoryTransaction {
            store: Arc::clone(&self.store),
            staged: Vec::new(),
        }))
    }
}

#[derive(Debug)]
enum Change {
    Insert(Book),
    Remove(BookId),
}

struct MemoryTransaction {
    store: Arc<MemoryStore>,
    staged: Vec<Change>,
}

#[async_trait]
impl BookTransaction for MemoryTransaction {
    async fn insert(&mut self, book: NewBook) -> Result<Book, GatewayError> {
        // Saturates at BookId::MAX so an exhausted sequence keeps failing.
        let id = self
            .store
            .next_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |next| next.checked_add(1))
            .map_err(|_| GatewayError::Unavailable("id sequence exhausted".to_string()))?;
        let book = book.with_id(id);
        self.staged.push(Change::Insert(book.clone()));
        Ok(book)
    }

    async fn remove(&mut self, book: &Book) -> Result<(), GatewayError> {
        self.staged.push(Change::Remove(book.id));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), GatewayError> {
        let MemoryTransaction { store, staged } = *self;
        let mut books = store.books.write().await;
        for change in staged {
            match change {
                Change::Insert(book) => {
                    books.insert(book.id, book);
                }
                Change::Remove(id) => {
                    books.remove(&id);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::TextField;

    #[tokio::test]
    async fn seeded_records_are_numbered_from_one() {
        let gateway = MemoryGateway::seeded(demo_books());
        assert_eq!(gateway.len().await, 5);

        let book = gateway.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(book.title, "Book One");
        assert!(gateway.find_by_id(6).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn query_sorts_then_windows() {
        let gateway = MemoryGateway::seeded(demo_books());
        let query = BookQuery::all()
            .order_by(SortField::Title)
            .skip(1)
            .take(2);

        let titles: Vec<String> = gateway
            .query(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        // Five, Four, One, Three, Two
        assert_eq!(titles, vec!["Book Four", "Book One"]);
    }

    #[tokio::test]
    async fn ignore_case_filter_matches_author() {
        let gateway = MemoryGateway::seeded(demo_books());
        let query = BookQuery::all().text_eq_ignore_case(TextField::Author, "author a");
        assert_eq!(gateway.query(&query).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn writes_are_invisible_until_commit() {
        let gateway = MemoryGateway::new();
        let mut tx = gateway.begin().await.unwrap();
        let book = tx
            .insert(NewBook::new("Dune", "Frank Herbert", "Science Fiction"))
            .await
            .unwrap();
        assert_eq!(book.id, 1);
        assert!(gateway.find_by_id(book.id).await.unwrap().is_none());
        assert!(gateway.is_empty().await);

        tx.commit().await.unwrap();
        assert_eq!(gateway.find_by_id(book.id).await.unwrap(), Some(book));
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let gateway = MemoryGateway::seeded(demo_books());
        {
            let mut tx = gateway.begin().await.unwrap();
            let book = gateway.find_by_id(2).await.unwrap().unwrap();
            tx.remove(&book).await.unwrap();
        }
        assert_eq!(gateway.len().await, 5);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_removal() {
        let gateway = MemoryGateway::seeded(demo_books());
        let last = gateway.find_by_id(5).await.unwrap().unwrap();

        let mut tx = gateway.begin().await.unwrap();
        tx.remove(&last).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = gateway.begin().await.unwrap();
        let book = tx.insert(NewBook::new("New", "Author E", "Poetry")).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(book.id, 6);
    }

    #[tokio::test]
    async fn exhausted_id_sequence_keeps_failing() {
        let gateway = MemoryGateway::new();
        gateway.store.next_id.store(BookId::MAX - 1, Ordering::SeqCst);

        let mut tx = gateway.begin().await.unwrap();
        let book = tx.insert(NewBook::new("Last", "Author Z", "Drama")).await.unwrap();
        assert_eq!(book.id, BookId::MAX - 1);

        for _ in 0..3 {
            let err = tx
                .insert(NewBook::new("Overflow", "Author Z", "Drama"))
                .await
                .unwrap_err();
            assert!(matches!(err, GatewayError::Unavailable(_)));
        }
        assert_eq!(gateway.store.next_id.load(Ordering::SeqCst), BookId::MAX);

        tx.commit().await.unwrap();
        assert_eq!(gateway.len().await, 1);
    }
}
