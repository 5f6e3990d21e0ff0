//! Library session - typed book, friend and loan operations
//!
//! A [`Library`] owns the engine handle and the durable store. Read
//! operations return plain values; mutating operations return an
//! [`Outcome`] and persist the full database image before reporting
//! success. A rejected call never touches the database or the store.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info, warn};

use crate::model::{Book, Exchange, Friend, LibraryStats, LoanDetail, NewBook, DEFAULT_LOAN_STATUS};
use crate::rejection::{Outcome, Rejection, RejectionCode};
use crate::storage::{DurableStore, Engine};
use crate::Result;

pub mod transfer;

pub use transfer::{has_sqlite_magic, EXPORT_FILE_NAME, EXPORT_MIME, SQLITE_MAGIC};

const BOOK_COLUMNS: &str = "id, title, author, isbn, cover_url, description";
const EXCHANGE_COLUMNS: &str = "id, book_id, friend_id, book_title, status, created_at";

fn cover_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^https?://").expect("cover url pattern is valid"))
}

/// A personal library backed by one SQLite database
pub struct Library<S: DurableStore> {
    engine: Engine,
    store: S,
    /// Image most recently confirmed by the store
    saved: Vec<u8>,
}

impl<S: DurableStore> Library<S> {
    /// Load the saved library from `store`, or start an empty one.
    ///
    /// The schema is bootstrapped and the resulting image saved before
    /// returning, so the store always holds a complete database.
    pub fn open(store: S) -> Result<Self> {
        let engine = match store.load()? {
            Some(image) => {
                info!(bytes = image.len(), "restoring saved library");
                Engine::from_image(&image)?
            }
            None => {
                info!("no saved library, starting a fresh one");
                Engine::open_in_memory()?
            }
        };

        engine.bootstrap()?;
        let saved = engine.image()?;
        store.save(&saved)?;
        debug!(bytes = saved.len(), "persisted bootstrapped library");

        Ok(Self { engine, store, saved })
    }

    /// Create missing tables and indexes; safe to call repeatedly
    pub fn bootstrap(&self) -> Result<()> {
        self.engine.bootstrap()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Save the current image through the store.
    ///
    /// When the save fails the engine is rebuilt from the last saved image,
    /// so a change is only visible once it is durable.
    fn persist(&mut self) -> Result<()> {
        let saved = self.engine.image().and_then(|image| {
            self.store.save(&image)?;
            Ok(image)
        });

        match saved {
            Ok(image) => {
                debug!(bytes = image.len(), "persisted library");
                self.saved = image;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "save failed, reverting to the last saved image");
                self.engine = Engine::from_image(&self.saved)?;
                Err(e)
            }
        }
    }

    /// Swap in a new engine once its image is durable; on failure the
    /// current engine stays in place.
    fn replace_engine(&mut self, engine: Engine) -> Result<()> {
        let image = engine.image()?;
        self.store.save(&image)?;
        self.engine = engine;
        self.saved = image;
        Ok(())
    }

    // ========== Book Operations ==========

    /// List books, newest first.
    ///
    /// A non-blank `query` keeps books whose title, author or ISBN contains
    /// it, using SQLite `LIKE` matching.
    pub fn list_books(&self, query: Option<&str>) -> Result<Vec<Book>> {
        match query.filter(|q| !q.trim().is_empty()) {
            Some(q) => {
                let pattern = format!("%{}%", q);
                self.engine.query_map(
                    &format!(
                        "SELECT {} FROM books WHERE title LIKE ?1 OR author LIKE ?1 OR isbn LIKE ?1 ORDER BY id DESC",
                        BOOK_COLUMNS
                    ),
                    [pattern],
                    row_to_book,
                )
            }
            None => self.engine.query_map(
                &format!("SELECT {} FROM books ORDER BY id DESC", BOOK_COLUMNS),
                [],
                row_to_book,
            ),
        }
    }

    /// Get a book by id
    pub fn get_book(&self, id: i64) -> Result<Option<Book>> {
        self.engine.query_opt(
            &format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLUMNS),
            [id],
            row_to_book,
        )
    }

    /// Add a book. The title is trimmed and must not be empty.
    pub fn add_book(&mut self, book: NewBook) -> Result<Outcome<Book>> {
        let title = book.title.trim();
        if title.is_empty() {
            return Ok(Err(Rejection::new(
                RejectionCode::MissingTitle,
                "A title is required.",
            )));
        }

        let created = Book {
            id: 0,
            title: title.to_string(),
            author: book.author.unwrap_or_default(),
            isbn: book.isbn.unwrap_or_default(),
            cover_url: book.cover_url.unwrap_or_default(),
            description: book.description.unwrap_or_default(),
        };

        let tx = self.engine.transaction()?;
        tx.execute(
            "INSERT INTO books (title, author, isbn, cover_url, description) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                created.title,
                created.author,
                created.isbn,
                created.cover_url,
                created.description,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        self.persist()?;

        info!(id, title = %created.title, "added book");
        Ok(Ok(Book { id, ..created }))
    }

    /// Replace a book's cover URL. Only http(s) URLs are accepted.
    pub fn update_book_cover(&mut self, id: i64, cover_url: &str) -> Result<Outcome<()>> {
        if !cover_url_pattern().is_match(cover_url) {
            return Ok(Err(Rejection::new(
                RejectionCode::InvalidCoverUrl,
                "Please provide a valid URL starting with http(s)://",
            )));
        }

        let tx = self.engine.transaction()?;
        tx.execute(
            "UPDATE books SET cover_url = ?1 WHERE id = ?2",
            params![cover_url, id],
        )?;
        tx.commit()?;
        self.persist()?;

        debug!(id, "updated book cover");
        Ok(Ok(()))
    }

    /// Delete a book unless it is lent out
    pub fn delete_book(&mut self, id: i64) -> Result<Outcome<()>> {
        let tx = self.engine.transaction()?;
        let on_loan = tx
            .query_row(
                "SELECT 1 FROM exchanges WHERE book_id = ?1 LIMIT 1",
                [id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if on_loan {
            return Ok(Err(Rejection::new(
                RejectionCode::BookOnLoan,
                "Cannot delete this book: it is currently on loan.",
            )));
        }

        tx.execute("DELETE FROM books WHERE id = ?1", [id])?;
        tx.commit()?;
        self.persist()?;

        info!(id, "deleted book");
        Ok(Ok(()))
    }

    // ========== Friend Operations ==========

    /// List friends, newest first
    pub fn list_friends(&self) -> Result<Vec<Friend>> {
        self.engine.query_map(
            "SELECT id, name FROM friends ORDER BY id DESC",
            [],
            row_to_friend,
        )
    }

    /// Add a friend. Names are trimmed, required and unique (exact match).
    pub fn add_friend(&mut self, name: &str) -> Result<Outcome<Friend>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Err(Rejection::new(
                RejectionCode::MissingName,
                "A name is required.",
            )));
        }

        let tx = self.engine.transaction()?;
        let duplicate = tx
            .query_row("SELECT id FROM friends WHERE name = ?1", [name], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?
            .is_some();
        if duplicate {
            return Ok(Err(Rejection::new(
                RejectionCode::DuplicateFriend,
                format!("A friend named \"{}\" already exists.", name),
            )));
        }

        tx.execute("INSERT INTO friends (name) VALUES (?1)", [name])?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        self.persist()?;

        info!(id, name, "added friend");
        Ok(Ok(Friend {
            id,
            name: name.to_string(),
        }))
    }

    /// Delete a friend unless they currently borrow something
    pub fn delete_friend(&mut self, id: i64) -> Result<Outcome<()>> {
        let tx = self.engine.transaction()?;
        let has_loans = tx
            .query_row(
                "SELECT 1 FROM exchanges WHERE friend_id = ?1 LIMIT 1",
                [id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if has_loans {
            return Ok(Err(Rejection::new(
                RejectionCode::FriendHasLoans,
                "Cannot delete this friend: a loan is in progress.",
            )));
        }

        tx.execute("DELETE FROM friends WHERE id = ?1", [id])?;
        tx.commit()?;
        self.persist()?;

        info!(id, "deleted friend");
        Ok(Ok(()))
    }

    // ========== Exchange Operations ==========

    /// List loans, newest first
    pub fn list_exchanges(&self) -> Result<Vec<Exchange>> {
        self.engine.query_map(
            &format!("SELECT {} FROM exchanges ORDER BY id DESC", EXCHANGE_COLUMNS),
            [],
            row_to_exchange,
        )
    }

    /// Lend a book to a friend.
    ///
    /// Both ids must be non-zero, and the exact (book, friend) pair must not
    /// already be on loan. The same book may be lent to several friends.
    pub fn create_exchange(
        &mut self,
        book_id: i64,
        friend_id: i64,
        book_title: &str,
    ) -> Result<Outcome<Exchange>> {
        if book_id == 0 || friend_id == 0 {
            return Ok(Err(Rejection::new(
                RejectionCode::MissingSelection,
                "Select a book and a friend.",
            )));
        }

        let tx = self.engine.transaction()?;
        let duplicate = tx
            .query_row(
                "SELECT id FROM exchanges WHERE book_id = ?1 AND friend_id = ?2 LIMIT 1",
                [book_id, friend_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if duplicate {
            return Ok(Err(Rejection::new(
                RejectionCode::DuplicateExchange,
                "This book is already on loan to this friend.",
            )));
        }

        tx.execute(
            "INSERT INTO exchanges (book_id, friend_id, book_title, status) VALUES (?1, ?2, ?3, ?4)",
            params![book_id, friend_id, book_title, DEFAULT_LOAN_STATUS],
        )?;
        let id = tx.last_insert_rowid();
        let exchange = tx.query_row(
            &format!("SELECT {} FROM exchanges WHERE id = ?1", EXCHANGE_COLUMNS),
            [id],
            row_to_exchange,
        )?;
        tx.commit()?;
        self.persist()?;

        info!(id, book_id, friend_id, "created loan");
        Ok(Ok(exchange))
    }

    /// Delete a loan. Always succeeds, even for unknown ids.
    pub fn delete_exchange(&mut self, id: i64) -> Result<Outcome<()>> {
        let tx = self.engine.transaction()?;
        tx.execute("DELETE FROM exchanges WHERE id = ?1", [id])?;
        tx.commit()?;
        self.persist()?;

        info!(id, "deleted loan");
        Ok(Ok(()))
    }

    /// Ids of books referenced by at least one loan
    pub fn exchange_book_ids(&self) -> Result<BTreeSet<i64>> {
        let ids = self.engine.query_map(
            "SELECT DISTINCT book_id FROM exchanges",
            [],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(ids.into_iter().collect())
    }

    /// Ids of friends referenced by at least one loan
    pub fn exchange_friend_ids(&self) -> Result<BTreeSet<i64>> {
        let ids = self.engine.query_map(
            "SELECT DISTINCT friend_id FROM exchanges",
            [],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(ids.into_iter().collect())
    }

    /// The oldest loan of a book, with the borrower's name
    pub fn get_exchange_for_book(&self, book_id: i64) -> Result<Option<LoanDetail>> {
        self.engine.query_opt(
            r#"
            SELECT e.id, e.created_at, f.name
            FROM exchanges e
            JOIN friends f ON f.id = e.friend_id
            WHERE e.book_id = ?1
            ORDER BY e.id
            LIMIT 1
            "#,
            [book_id],
            |row| {
                Ok(LoanDetail {
                    exchange_id: row.get(0)?,
                    created_at: text(row, 1)?,
                    friend_name: text(row, 2)?,
                })
            },
        )
    }

    /// Row counts per table
    pub fn stats(&self) -> Result<LibraryStats> {
        Ok(LibraryStats {
            books: self.engine.count("books")?,
            friends: self.engine.count("friends")?,
            exchanges: self.engine.count("exchanges")?,
        })
    }
}

/// Read a nullable text column, mapping NULL to ""
fn text(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: text(row, 1)?,
        author: text(row, 2)?,
        isbn: text(row, 3)?,
        cover_url: text(row, 4)?,
        description: text(row, 5)?,
    })
}

fn row_to_friend(row: &rusqlite::Row<'_>) -> rusqlite::Result<Friend> {
    Ok(Friend {
        id: row.get(0)?,
        name: text(row, 1)?,
    })
}

fn row_to_exchange(row: &rusqlite::Row<'_>) -> rusqlite::Result<Exchange> {
    Ok(Exchange {
        id: row.get(0)?,
        book_id: row.get(1)?,
        friend_id: row.get(2)?,
        book_title: text(row, 3)?,
        status: text(row, 4)?,
        created_at: text(row, 5)?,
    })
}
