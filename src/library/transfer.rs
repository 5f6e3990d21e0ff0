//! Whole-library import and export
//!
//! The exchanged format is the SQLite file itself, identical to what the
//! durable store keeps.

use tracing::{info, warn};

use super::Library;
use crate::rejection::{Outcome, Rejection, RejectionCode};
use crate::storage::{DurableStore, Engine};
use crate::{Error, Result};

/// First 16 bytes of every SQLite 3 database file
pub const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// MIME type of exported files
pub const EXPORT_MIME: &str = "application/x-sqlite3";

/// Suggested file name for exports
pub const EXPORT_FILE_NAME: &str = "biblipartage.sqlite3";

/// Check the SQLite magic header
pub fn has_sqlite_magic(bytes: &[u8]) -> bool {
    bytes.len() >= SQLITE_MAGIC.len() && bytes[..SQLITE_MAGIC.len()] == SQLITE_MAGIC[..]
}

impl<S: DurableStore> Library<S> {
    /// Full image of the live database
    pub fn export_image(&self) -> Result<Vec<u8>> {
        let image = self.engine.image()?;
        info!(bytes = image.len(), "exported library");
        Ok(image)
    }

    /// Replace the live database with `image` and persist it.
    ///
    /// Bytes without the SQLite header, or that SQLite cannot read, are
    /// rejected and leave the current library untouched. So does a failed
    /// save of the imported image.
    pub fn import_image(&mut self, image: &[u8]) -> Result<Outcome<()>> {
        if !has_sqlite_magic(image) {
            warn!(bytes = image.len(), "import rejected: missing SQLite header");
            return Ok(Err(Rejection::new(
                RejectionCode::InvalidImage,
                "Invalid file: this is not a SQLite database.",
            )));
        }

        let engine = match Engine::from_image(image).and_then(|engine| {
            engine.bootstrap()?;
            Ok(engine)
        }) {
            Ok(engine) => engine,
            Err(Error::Storage(err)) => {
                warn!(error = %err, "import rejected: unreadable database");
                return Ok(Err(Rejection::new(
                    RejectionCode::InvalidImage,
                    format!("Import failed: {}", err),
                )));
            }
            Err(err) => return Err(err),
        };

        // The previous connection is closed once the new image is saved
        self.replace_engine(engine)?;

        info!(bytes = image.len(), "imported library");
        Ok(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewBook;
    use crate::storage::MemoryStore;

    fn populated() -> Library<MemoryStore> {
        let mut library = Library::open(MemoryStore::new()).unwrap();
        let book = library
            .add_book(NewBook::new("Dune").with_author("Frank Herbert"))
            .unwrap()
            .unwrap();
        let friend = library.add_friend("Alice").unwrap().unwrap();
        library
            .create_exchange(book.id, friend.id, &book.title)
            .unwrap()
            .unwrap();
        library
    }

    #[test]
    fn test_magic_header() {
        assert!(has_sqlite_magic(b"SQLite format 3\0rest of file"));
        assert!(!has_sqlite_magic(b"SQLite format 3"));
        assert!(!has_sqlite_magic(b"PK\x03\x04 zip archive......."));
        assert!(!has_sqlite_magic(b""));
    }

    #[test]
    fn test_export_then_import_keeps_lists() {
        let mut library = populated();
        let books = library.list_books(None).unwrap();
        let friends = library.list_friends().unwrap();
        let exchanges = library.list_exchanges().unwrap();

        let image = library.export_image().unwrap();
        assert!(has_sqlite_magic(&image));
        library.import_image(&image).unwrap().unwrap();

        assert_eq!(library.list_books(None).unwrap(), books);
        assert_eq!(library.list_friends().unwrap(), friends);
        assert_eq!(library.list_exchanges().unwrap(), exchanges);
    }

    #[test]
    fn test_import_into_another_session() {
        let source = populated();
        let image = source.export_image().unwrap();

        let store = MemoryStore::new();
        let mut target = Library::open(store.clone()).unwrap();
        target.import_image(&image).unwrap().unwrap();

        assert_eq!(target.list_books(None).unwrap(), source.list_books(None).unwrap());
        assert_eq!(store.saves(), 2);

        // The persisted image reopens to the imported data
        let reopened = Library::open(store).unwrap();
        assert_eq!(reopened.list_friends().unwrap()[0].name, "Alice");
    }

    #[test]
    fn test_import_without_header_changes_nothing() {
        let store = MemoryStore::new();
        let mut library = Library::open(store.clone()).unwrap();
        library.add_book(NewBook::new("Dune")).unwrap().unwrap();
        let books = library.list_books(None).unwrap();
        let saves = store.saves();

        let rejection = library
            .import_image(b"this is definitely not a database")
            .unwrap()
            .unwrap_err();

        assert_eq!(rejection.code, RejectionCode::InvalidImage);
        assert_eq!(library.list_books(None).unwrap(), books);
        assert_eq!(store.saves(), saves);
    }

    #[test]
    fn test_import_corrupt_body_changes_nothing() {
        let mut library = populated();
        let books = library.list_books(None).unwrap();

        let mut bytes = SQLITE_MAGIC.to_vec();
        bytes.extend(std::iter::repeat(0xFF).take(2048));

        let rejection = library.import_image(&bytes).unwrap().unwrap_err();
        assert_eq!(rejection.code, RejectionCode::InvalidImage);
        assert_eq!(library.list_books(None).unwrap(), books);
    }

    #[test]
    fn test_import_bootstraps_foreign_database() {
        let foreign = Engine::open_in_memory().unwrap();
        foreign
            .execute("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)", [])
            .unwrap();
        let image = foreign.image().unwrap();

        let mut library = populated();
        library.import_image(&image).unwrap().unwrap();

        assert!(library.list_books(None).unwrap().is_empty());
        let objects = library.engine().schema_objects().unwrap();
        assert!(objects.contains(&("table".to_string(), "exchanges".to_string())));
        assert!(objects.contains(&("table".to_string(), "notes".to_string())));
    }
}
