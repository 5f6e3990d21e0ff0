//! Library records
//!
//! Three entities live in one database:
//! - `Book`: a cataloged title
//! - `Friend`: someone books can be lent to
//! - `Exchange`: a book currently lent to a friend

use serde::{Deserialize, Serialize};

/// Status written on every new loan.
///
/// Kept identical to the value stored by earlier versions so imported
/// libraries read back unchanged.
pub const DEFAULT_LOAN_STATUS: &str = "en prêt";

/// A cataloged book.
///
/// Optional text columns are read back as empty strings when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub cover_url: String,
    pub description: String,
}

/// Input for adding a book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub cover_url: Option<String>,
    pub description: Option<String>,
}

impl NewBook {
    /// Create a new book input with only the title set
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn with_cover_url(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = Some(cover_url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A friend who can borrow books. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub id: i64,
    pub name: String,
}

/// A loan of a book to a friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: i64,
    pub book_id: i64,
    pub friend_id: i64,
    /// Title snapshot taken when the loan was created
    pub book_title: String,
    pub status: String,
    /// Engine timestamp, `YYYY-MM-DD HH:MM:SS` in UTC
    pub created_at: String,
}

/// Who currently holds a book, and since when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanDetail {
    pub exchange_id: i64,
    pub friend_name: String,
    pub created_at: String,
}

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub books: usize,
    pub friends: usize,
    pub exchanges: usize,
}

impl std::fmt::Display for LibraryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Library Statistics:")?;
        writeln!(f, "  Books: {}", self.books)?;
        writeln!(f, "  Friends: {}", self.friends)?;
        writeln!(f, "  Loans: {}", self.exchanges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_book_builder() {
        let book = NewBook::new("Dune")
            .with_author("Frank Herbert")
            .with_isbn("9780441013593");

        assert_eq!(book.title, "Dune");
        assert_eq!(book.author.as_deref(), Some("Frank Herbert"));
        assert_eq!(book.isbn.as_deref(), Some("9780441013593"));
        assert!(book.cover_url.is_none());
        assert!(book.description.is_none());
    }

    #[test]
    fn test_stats_display() {
        let stats = LibraryStats { books: 3, friends: 2, exchanges: 1 };
        let text = stats.to_string();
        assert!(text.contains("Books: 3"));
        assert!(text.contains("Loans: 1"));
    }
}
