pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    dim, empty, error, header, human_bytes, on_loan, status, success, summary_row, warn,
};
pub use table::{books_table, friends_table, loans_table, stats_table};
pub use theme::{theme, Theme};
