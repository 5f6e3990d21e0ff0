//! Business-rule rejections
//!
//! Validation and referential-integrity failures are returned as values so
//! callers can inspect them without unwinding through `Error`.

use serde::{Deserialize, Serialize};

/// Result of a mutating library operation that passed infrastructure checks.
pub type Outcome<T> = std::result::Result<T, Rejection>;

/// Why an operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionCode {
    /// Book title empty after trimming
    MissingTitle,
    /// Cover URL does not start with http:// or https://
    InvalidCoverUrl,
    /// Book is referenced by at least one loan
    BookOnLoan,
    /// Friend name empty after trimming
    MissingName,
    /// A friend with the exact same name already exists
    DuplicateFriend,
    /// Friend is referenced by at least one loan
    FriendHasLoans,
    /// Book or friend id missing when creating a loan
    MissingSelection,
    /// A loan already exists for this book and friend
    DuplicateExchange,
    /// Imported bytes are not a usable SQLite database
    InvalidImage,
}

impl RejectionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionCode::MissingTitle => "missing_title",
            RejectionCode::InvalidCoverUrl => "invalid_cover_url",
            RejectionCode::BookOnLoan => "book_on_loan",
            RejectionCode::MissingName => "missing_name",
            RejectionCode::DuplicateFriend => "duplicate_friend",
            RejectionCode::FriendHasLoans => "friend_has_loans",
            RejectionCode::MissingSelection => "missing_selection",
            RejectionCode::DuplicateExchange => "duplicate_exchange",
            RejectionCode::InvalidImage => "invalid_image",
        }
    }
}

impl std::fmt::Display for RejectionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A refused operation: a machine-readable code plus a human message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct Rejection {
    pub code: RejectionCode,
    pub message: String,
}

impl Rejection {
    pub fn new(code: RejectionCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
