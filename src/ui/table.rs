use std::collections::BTreeSet;

use tabled::{settings::Style, Table, Tabled};

use crate::model::{Book, Exchange, Friend, LibraryStats};

#[derive(Tabled)]
struct BookRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "ISBN")]
    isbn: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

#[derive(Tabled)]
struct FriendRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Borrowing")]
    borrowing: &'static str,
}

#[derive(Tabled)]
struct LoanRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Book")]
    book: String,
    #[tabled(rename = "Friend")]
    friend: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Since")]
    since: String,
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: usize,
}

/// Books with an on-loan marker for ids in `lent`
pub fn books_table(books: &[Book], lent: &BTreeSet<i64>) -> String {
    let rows = books.iter().map(|book| BookRow {
        id: book.id,
        title: book.title.clone(),
        author: book.author.clone(),
        isbn: book.isbn.clone(),
        status: if lent.contains(&book.id) { "on loan" } else { "available" },
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn friends_table(friends: &[Friend], borrowing: &BTreeSet<i64>) -> String {
    let rows = friends.iter().map(|friend| FriendRow {
        id: friend.id,
        name: friend.name.clone(),
        borrowing: if borrowing.contains(&friend.id) { "yes" } else { "" },
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Loans, with friend names resolved from `friends` when known
pub fn loans_table(exchanges: &[Exchange], friends: &[Friend]) -> String {
    let rows = exchanges.iter().map(|exchange| LoanRow {
        id: exchange.id,
        book: exchange.book_title.clone(),
        friend: friends
            .iter()
            .find(|f| f.id == exchange.friend_id)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| format!("#{}", exchange.friend_id)),
        status: exchange.status.clone(),
        since: exchange.created_at.clone(),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn stats_table(stats: &LibraryStats) -> String {
    let rows = [
        MetricRow { metric: "Books", value: stats.books },
        MetricRow { metric: "Friends", value: stats.friends },
        MetricRow { metric: "Loans", value: stats.exchanges },
    ];
    Table::new(rows).with(Style::rounded()).to_string()
}
