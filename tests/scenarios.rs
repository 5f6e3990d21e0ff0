//! End-to-end library scenarios against an on-disk store

use biblipartage::library::{has_sqlite_magic, EXPORT_FILE_NAME};
use biblipartage::{DurableStore, FileStore, Library, NewBook, RejectionCode};

fn dune() -> NewBook {
    NewBook {
        title: "Dune".to_string(),
        author: Some("Frank Herbert".to_string()),
        isbn: Some("9780441013593".to_string()),
        cover_url: Some(String::new()),
        description: Some(String::new()),
    }
}

#[test]
fn loan_blocks_book_deletion_until_returned() {
    let dir = tempfile::tempdir().unwrap();
    let mut library = Library::open(FileStore::new(dir.path())).unwrap();

    let book = library.add_book(dune()).unwrap().unwrap();
    assert_eq!(book.id, 1);
    let friend = library.add_friend("Alice").unwrap().unwrap();
    assert_eq!(friend.id, 1);

    let exchange = library.create_exchange(1, 1, "Dune").unwrap().unwrap();
    assert_eq!(exchange.id, 1);

    let rejection = library.delete_book(1).unwrap().unwrap_err();
    assert_eq!(rejection.code, RejectionCode::BookOnLoan);

    library.delete_exchange(1).unwrap().unwrap();
    library.delete_book(1).unwrap().unwrap();
    assert!(library.get_book(1).unwrap().is_none());
}

#[test]
fn cover_update_validates_scheme() {
    let dir = tempfile::tempdir().unwrap();
    let mut library = Library::open(FileStore::new(dir.path())).unwrap();
    library.add_book(dune()).unwrap().unwrap();

    let rejection = library.update_book_cover(1, "ftp://bad").unwrap().unwrap_err();
    assert_eq!(rejection.code, RejectionCode::InvalidCoverUrl);

    library
        .update_book_cover(1, "https://example.com/x.jpg")
        .unwrap()
        .unwrap();
    assert_eq!(
        library.get_book(1).unwrap().unwrap().cover_url,
        "https://example.com/x.jpg"
    );
}

#[test]
fn rejected_import_leaves_library_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let mut library = Library::open(store.clone()).unwrap();
    library.add_book(dune()).unwrap().unwrap();

    let books = library.list_books(None).unwrap();
    let stored = store.load().unwrap();

    let rejection = library
        .import_image(b"PK\x03\x04 definitely a zip archive")
        .unwrap()
        .unwrap_err();
    assert_eq!(rejection.code, RejectionCode::InvalidImage);

    assert_eq!(library.list_books(None).unwrap(), books);
    assert_eq!(store.load().unwrap(), stored);
}

#[test]
fn every_change_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut library = Library::open(FileStore::new(dir.path())).unwrap();
        let book = library.add_book(dune()).unwrap().unwrap();
        let friend = library.add_friend("Alice").unwrap().unwrap();
        library
            .create_exchange(book.id, friend.id, &book.title)
            .unwrap()
            .unwrap();
        library
            .update_book_cover(book.id, "https://example.com/dune.jpg")
            .unwrap()
            .unwrap();
    }

    let library = Library::open(FileStore::new(dir.path())).unwrap();
    let books = library.list_books(None).unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].cover_url, "https://example.com/dune.jpg");

    let loan = library.get_exchange_for_book(books[0].id).unwrap().unwrap();
    assert_eq!(loan.friend_name, "Alice");

    let stats = library.stats().unwrap();
    assert_eq!((stats.books, stats.friends, stats.exchanges), (1, 1, 1));
}

#[test]
fn export_file_moves_library_between_stores() {
    let home = tempfile::tempdir().unwrap();
    let away = tempfile::tempdir().unwrap();

    let mut source = Library::open(FileStore::new(home.path().join("data"))).unwrap();
    let book = source.add_book(dune()).unwrap().unwrap();
    let friend = source.add_friend("Alice").unwrap().unwrap();
    source.create_exchange(book.id, friend.id, "Dune").unwrap().unwrap();

    let export_path = home.path().join(EXPORT_FILE_NAME);
    std::fs::write(&export_path, source.export_image().unwrap()).unwrap();

    let bytes = std::fs::read(&export_path).unwrap();
    assert!(has_sqlite_magic(&bytes));

    let mut target = Library::open(FileStore::new(away.path())).unwrap();
    target.add_friend("Someone else").unwrap().unwrap();
    target.import_image(&bytes).unwrap().unwrap();

    assert_eq!(target.list_books(None).unwrap(), source.list_books(None).unwrap());
    assert_eq!(target.list_friends().unwrap(), source.list_friends().unwrap());
    assert_eq!(target.list_exchanges().unwrap(), source.list_exchanges().unwrap());

    // New rows continue after the imported ids
    let next = target.add_friend("Bob").unwrap().unwrap();
    assert_eq!(next.id, friend.id + 1);
}

#[test]
fn two_sessions_on_one_store_last_save_wins() {
    let dir = tempfile::tempdir().unwrap();
    let mut first = Library::open(FileStore::new(dir.path())).unwrap();
    let mut second = Library::open(FileStore::new(dir.path())).unwrap();

    first.add_friend("Alice").unwrap().unwrap();
    second.add_friend("Bob").unwrap().unwrap();

    let reopened = Library::open(FileStore::new(dir.path())).unwrap();
    let names: Vec<_> = reopened
        .list_friends()
        .unwrap()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, vec!["Bob".to_string()]);
}
