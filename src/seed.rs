//! Sample data for trying the tracker out

use serde::Serialize;
use tracing::debug;

use crate::library::Library;
use crate::model::NewBook;
use crate::storage::DurableStore;
use crate::Result;

/// What a seed run actually inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub books: usize,
    pub friends: usize,
}

fn sample_books() -> Vec<NewBook> {
    vec![
        NewBook::new("The Pragmatic Programmer")
            .with_author("Andrew Hunt; David Thomas")
            .with_isbn("9780201616224")
            .with_cover_url("https://covers.openlibrary.org/b/isbn/9780201616224-L.jpg")
            .with_description("Classic software craftsmanship book."),
        NewBook::new("Clean Code")
            .with_author("Robert C. Martin")
            .with_isbn("9780132350884")
            .with_cover_url("https://covers.openlibrary.org/b/isbn/9780132350884-L.jpg")
            .with_description("A Handbook of Agile Software Craftsmanship."),
        NewBook::new("Design Patterns")
            .with_author("Gang of Four")
            .with_isbn("9780201633610")
            .with_cover_url("https://covers.openlibrary.org/b/isbn/9780201633610-L.jpg")
            .with_description("Elements of Reusable Object-Oriented Software."),
    ]
}

const SAMPLE_FRIENDS: &[&str] = &["Alice", "Bob", "Charlie"];

/// Add the sample books and friends.
///
/// Books are always added; friends that already exist are skipped.
pub fn seed<S: DurableStore>(library: &mut Library<S>) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for book in sample_books() {
        if library.add_book(book)?.is_ok() {
            report.books += 1;
        }
    }

    for &name in SAMPLE_FRIENDS {
        match library.add_friend(name)? {
            Ok(_) => report.friends += 1,
            Err(rejection) => debug!(name, reason = %rejection, "skipping sample friend"),
        }
    }

    Ok(report)
}
