//! Biblipartage CLI - command-line front end for the personal library tracker

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use biblipartage::config::{self, BiblioConfig};
use biblipartage::library::{EXPORT_FILE_NAME, EXPORT_MIME};
use biblipartage::output::{emit_rejection, emit_success, OutputMode};
use biblipartage::seed::seed;
use biblipartage::ui::{self, Icons};
use biblipartage::{FileStore, IsbnLookup, Library, NewBook, Outcome};

#[derive(Parser)]
#[command(name = "biblipartage")]
#[command(version)]
#[command(about = "Personal library tracker - catalog books, record friends, track loans")]
#[command(long_about = r#"
Biblipartage keeps your books, your friends and what you lent to whom in a
single SQLite file that you can export, back up and import anywhere.

Example usage:
  biblipartage books add --title "Dune" --author "Frank Herbert"
  biblipartage friends add Alice
  biblipartage loans create --book 1 --friend 1
  biblipartage export --output library.sqlite3
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the library (overrides the config file)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with default settings
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Manage books
    Books {
        #[command(subcommand)]
        action: BookCommand,
    },

    /// Manage friends
    Friends {
        #[command(subcommand)]
        action: FriendCommand,
    },

    /// Manage loans
    Loans {
        #[command(subcommand)]
        action: LoanCommand,
    },

    /// Export the whole library as a SQLite file
    Export {
        /// Destination file
        #[arg(short, long, default_value = EXPORT_FILE_NAME)]
        output: PathBuf,
    },

    /// Replace the library with a previously exported SQLite file
    Import {
        /// File to import
        file: PathBuf,
    },

    /// Add sample books and friends
    Seed,

    /// Show row counts
    Stats,
}

#[derive(Subcommand)]
enum BookCommand {
    /// List books, newest first
    List {
        /// Only books whose title, author or ISBN contains this text
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Show one book and who has it
    Show { id: i64 },

    /// Add a book
    Add {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        author: Option<String>,
        #[arg(short, long)]
        isbn: Option<String>,
        #[arg(long)]
        cover_url: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Change a book's cover URL
    Cover { id: i64, url: String },

    /// Delete a book that is not on loan
    Delete { id: i64 },

    /// Look up metadata by ISBN
    Lookup {
        isbn: String,

        /// Add the found book to the library
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand)]
enum FriendCommand {
    /// List friends, newest first
    List,
    /// Add a friend
    Add { name: String },
    /// Delete a friend who borrows nothing
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum LoanCommand {
    /// List loans, newest first
    List,

    /// Lend a book to a friend
    Create {
        #[arg(short, long)]
        book: i64,
        #[arg(short, long)]
        friend: i64,
    },

    /// End a loan
    Delete { id: i64 },
}

/// Exit code for refused operations, distinct from infrastructure failures
const REJECTED_EXIT_CODE: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mode = OutputMode::from_json_flag(cli.json);
    match run(cli, mode).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(REJECTED_EXIT_CODE),
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            ui::error(&format!("Operation failed: {:#}", e));
            std::process::exit(1);
        }
    }
}

fn open_library(config: &BiblioConfig) -> anyhow::Result<Library<FileStore>> {
    config::ensure_data_dir(&config.data_dir)?;
    let library = Library::open(FileStore::new(&config.data_dir))
        .with_context(|| format!("opening library in {}", config.data_dir.display()))?;
    Ok(library)
}

/// Report an outcome. Returns whether the operation was accepted.
fn report<T: Serialize>(
    mode: OutputMode,
    command: &str,
    outcome: Outcome<T>,
    on_success: impl FnOnce(&T),
) -> anyhow::Result<bool> {
    match outcome {
        Ok(value) => {
            if mode.is_human() {
                on_success(&value);
            } else {
                emit_success(mode, command, &value)?;
            }
            Ok(true)
        }
        Err(rejection) => {
            if mode.is_human() {
                ui::error(&rejection.message);
            } else {
                emit_rejection(mode, command, &rejection)?;
            }
            Ok(false)
        }
    }
}

async fn run(cli: Cli, mode: OutputMode) -> anyhow::Result<bool> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut config = config::load_config(Some(&config_path))?.unwrap_or_default();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Commands::Init { force } => {
            config::write_config(&config_path, &config, force)?;
            config::ensure_data_dir(&config.data_dir)?;
            if mode.is_human() {
                ui::success(&format!("Wrote {}", config_path.display()));
            } else {
                emit_success(mode, "init", &config)?;
            }
            Ok(true)
        }
        Commands::Books { action } => run_books(action, &config, mode).await,
        Commands::Friends { action } => run_friends(action, &config, mode),
        Commands::Loans { action } => run_loans(action, &config, mode),
        Commands::Export { output } => run_export(&output, &config, mode),
        Commands::Import { file } => run_import(&file, &config, mode),
        Commands::Seed => {
            let mut library = open_library(&config)?;
            let report = seed(&mut library)?;
            if mode.is_human() {
                ui::success(&format!(
                    "{} Seeded {} books and {} friends",
                    Icons::SEED,
                    report.books,
                    report.friends
                ));
            } else {
                emit_success(mode, "seed", &report)?;
            }
            Ok(true)
        }
        Commands::Stats => {
            let library = open_library(&config)?;
            let stats = library.stats()?;
            if mode.is_human() {
                ui::header(Icons::STATS, &format!("Library ({})", config.data_dir.display()));
                println!("{}", ui::stats_table(&stats));
            } else {
                emit_success(mode, "stats", &stats)?;
            }
            Ok(true)
        }
    }
}

async fn run_books(action: BookCommand, config: &BiblioConfig, mode: OutputMode) -> anyhow::Result<bool> {
    match action {
        BookCommand::List { query } => {
            let library = open_library(config)?;
            let books = library.list_books(query.as_deref())?;
            let lent = library.exchange_book_ids()?;
            if mode.is_human() {
                if books.is_empty() {
                    ui::empty("No books found.");
                } else {
                    println!("{}", ui::books_table(&books, &lent));
                }
            } else {
                emit_success(mode, "books.list", &books)?;
            }
            Ok(true)
        }

        BookCommand::Show { id } => {
            let library = open_library(config)?;
            let Some(book) = library.get_book(id)? else {
                if mode.is_human() {
                    ui::empty(&format!("No book with id {}.", id));
                } else {
                    emit_success(mode, "books.show", &serde_json::Value::Null)?;
                }
                return Ok(true);
            };
            let loan = library.get_exchange_for_book(id)?;

            if mode.is_human() {
                ui::header(Icons::BOOK, &book.title);
                ui::summary_row("Author:", &book.author);
                ui::summary_row("ISBN:", &book.isbn);
                ui::summary_row("Cover:", &book.cover_url);
                if !book.description.is_empty() {
                    ui::summary_row("Description:", &book.description);
                }
                match &loan {
                    Some(loan) => ui::status(
                        Icons::LOAN,
                        "Lent to",
                        &ui::on_loan(&format!("{} since {}", loan.friend_name, loan.created_at)),
                    ),
                    None => ui::status(Icons::LOAN, "Lent to", &ui::dim("nobody")),
                }
            } else {
                emit_success(mode, "books.show", &serde_json::json!({ "book": book, "loan": loan }))?;
            }
            Ok(true)
        }

        BookCommand::Add { title, author, isbn, cover_url, description } => {
            let mut library = open_library(config)?;
            let outcome = library.add_book(NewBook {
                title,
                author,
                isbn,
                cover_url,
                description,
            })?;
            report(mode, "books.add", outcome, |book| {
                ui::success(&format!("Added \"{}\" (id {})", book.title, book.id));
            })
        }

        BookCommand::Cover { id, url } => {
            let mut library = open_library(config)?;
            let outcome = library.update_book_cover(id, &url)?;
            report(mode, "books.cover", outcome, |_| {
                ui::success(&format!("Cover updated for book {}", id));
            })
        }

        BookCommand::Delete { id } => {
            let mut library = open_library(config)?;
            let outcome = library.delete_book(id)?;
            report(mode, "books.delete", outcome, |_| {
                ui::success(&format!("{} Deleted book {}", Icons::DEL, id));
            })
        }

        BookCommand::Lookup { isbn, save } => {
            let lookup = IsbnLookup::from_config(config)?;
            if mode.is_human() {
                ui::status(Icons::SEARCH, "Looking up ISBN", &isbn);
            }
            let meta = lookup.fetch(&isbn).await;

            if !save {
                if mode.is_human() {
                    ui::header(Icons::BOOK, &meta.title);
                    ui::summary_row("Author:", &meta.author);
                    ui::summary_row("ISBN:", &meta.isbn);
                    ui::summary_row("Cover:", &meta.cover_url);
                } else {
                    emit_success(mode, "books.lookup", &meta)?;
                }
                return Ok(true);
            }

            let mut library = open_library(config)?;
            let outcome = library.add_book(meta.into())?;
            report(mode, "books.lookup", outcome, |book| {
                ui::success(&format!("Added \"{}\" (id {})", book.title, book.id));
            })
        }
    }
}

fn run_friends(action: FriendCommand, config: &BiblioConfig, mode: OutputMode) -> anyhow::Result<bool> {
    let mut library = open_library(config)?;
    match action {
        FriendCommand::List => {
            let friends = library.list_friends()?;
            let borrowing = library.exchange_friend_ids()?;
            if mode.is_human() {
                if friends.is_empty() {
                    ui::empty("No friends yet.");
                } else {
                    println!("{}", ui::friends_table(&friends, &borrowing));
                }
            } else {
                emit_success(mode, "friends.list", &friends)?;
            }
            Ok(true)
        }

        FriendCommand::Add { name } => {
            let outcome = library.add_friend(&name)?;
            report(mode, "friends.add", outcome, |friend| {
                ui::success(&format!("{} Added {} (id {})", Icons::PERSON, friend.name, friend.id));
            })
        }

        FriendCommand::Delete { id } => {
            let outcome = library.delete_friend(id)?;
            report(mode, "friends.delete", outcome, |_| {
                ui::success(&format!("{} Deleted friend {}", Icons::DEL, id));
            })
        }
    }
}

fn run_loans(action: LoanCommand, config: &BiblioConfig, mode: OutputMode) -> anyhow::Result<bool> {
    let mut library = open_library(config)?;
    match action {
        LoanCommand::List => {
            let exchanges = library.list_exchanges()?;
            if mode.is_human() {
                if exchanges.is_empty() {
                    ui::empty("Nothing is on loan.");
                } else {
                    let friends = library.list_friends()?;
                    println!("{}", ui::loans_table(&exchanges, &friends));
                }
            } else {
                emit_success(mode, "loans.list", &exchanges)?;
            }
            Ok(true)
        }

        LoanCommand::Create { book, friend } => {
            let title = library
                .get_book(book)?
                .map(|b| b.title)
                .unwrap_or_default();
            if mode.is_human() && library.exchange_book_ids()?.contains(&book) {
                ui::warn("This book is already lent to someone else.");
            }

            let outcome = library.create_exchange(book, friend, &title)?;
            report(mode, "loans.create", outcome, |exchange| {
                ui::success(&format!(
                    "{} Lent \"{}\" (loan {})",
                    Icons::LOAN,
                    exchange.book_title,
                    exchange.id
                ));
            })
        }

        LoanCommand::Delete { id } => {
            let outcome = library.delete_exchange(id)?;
            report(mode, "loans.delete", outcome, |_| {
                ui::success(&format!("Loan {} ended", id));
            })
        }
    }
}

fn run_export(output: &Path, config: &BiblioConfig, mode: OutputMode) -> anyhow::Result<bool> {
    let library = open_library(config)?;
    let image = library.export_image()?;
    std::fs::write(output, &image)
        .with_context(|| format!("writing {}", output.display()))?;

    if mode.is_human() {
        ui::success(&format!("{} Exported library to {}", Icons::EXPORT, output.display()));
        ui::summary_row("Size:", &ui::human_bytes(image.len()));
        ui::summary_row("Type:", EXPORT_MIME);
    } else {
        emit_success(
            mode,
            "export",
            &serde_json::json!({
                "path": output,
                "bytes": image.len(),
                "mime": EXPORT_MIME,
            }),
        )?;
    }
    Ok(true)
}

fn run_import(file: &Path, config: &BiblioConfig, mode: OutputMode) -> anyhow::Result<bool> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let mut library = open_library(config)?;
    let outcome = library.import_image(&bytes)?;
    let accepted = report(mode, "import", outcome, |_| {
        ui::success(&format!("{} Imported {}", Icons::IMPORT, file.display()));
    })?;

    if accepted && mode.is_human() {
        print!("{}", library.stats()?);
    }
    Ok(accepted)
}
