//! Database schema definitions
//!
//! Every statement is `IF NOT EXISTS`, so running the full set against an
//! already-bootstrapped database is a no-op.

/// SQL to create the books table
pub const CREATE_BOOKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author TEXT,
    isbn TEXT,
    cover_url TEXT,
    description TEXT
)
"#;

/// SQL to create the friends table
pub const CREATE_FRIENDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS friends (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
)
"#;

/// SQL to create the exchanges table
/// `book_title` is a snapshot, not a join target
pub const CREATE_EXCHANGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS exchanges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id INTEGER NOT NULL,
    friend_id INTEGER NOT NULL,
    book_title TEXT,
    status TEXT NOT NULL DEFAULT 'en prêt',
    created_at TEXT DEFAULT (datetime('now'))
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_books_isbn ON books(isbn)",
    "CREATE INDEX IF NOT EXISTS idx_exchanges_book_id ON exchanges(book_id)",
    "CREATE INDEX IF NOT EXISTS idx_exchanges_friend_id ON exchanges(friend_id)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_BOOKS_TABLE,
        CREATE_FRIENDS_TABLE,
        CREATE_EXCHANGES_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_precede_indexes() {
        let stmts = all_schema_statements();
        assert_eq!(stmts.len(), 6);
        assert!(stmts[..3].iter().all(|s| s.contains("CREATE TABLE IF NOT EXISTS")));
        assert!(stmts[3..].iter().all(|s| s.starts_with("CREATE INDEX IF NOT EXISTS")));
    }
}
