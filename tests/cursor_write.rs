use lsm_cursor::{Config, CursorOptions, Error, Store};
use test_log::test;

#[test]
fn cursor_insert_then_search() -> lsm_cursor::Result<()> {
    let store = Store::default();
    store.create("lsm:t", Config::default())?;

    let mut cursor = store.open_cursor("lsm:t")?;

    cursor.set_key("a");
    cursor.set_value("1");
    cursor.insert()?;

    cursor.set_key("a");
    cursor.search()?;
    assert_eq!(Some(&"a".into()), cursor.key());
    assert_eq!(Some(&"1".into()), cursor.value());

    Ok(())
}

#[test]
fn cursor_own_write_visible_immediately() -> lsm_cursor::Result<()> {
    let store = Store::default();
    store.create("lsm:t", Config::default())?;

    let mut cursor = store.open_cursor("lsm:t")?;

    cursor.set_key("a");
    cursor.set_value("1");
    cursor.insert()?;

    // The write positions the cursor, no lookup needed
    assert_eq!(Some(&"a".into()), cursor.key());
    assert_eq!(Some(&"1".into()), cursor.value());

    Ok(())
}

#[test]
fn cursor_remove_then_search() -> lsm_cursor::Result<()> {
    let store = Store::default();
    store.create("lsm:t", Config::default())?;

    let mut cursor = store.open_cursor("lsm:t")?;

    cursor.set_key("a");
    cursor.set_value("1");
    cursor.insert()?;

    cursor.set_key("a");
    cursor.remove()?;

    cursor.set_key("a");
    assert_eq!(Err(Error::NotFound), cursor.search());

    Ok(())
}

#[test]
fn cursor_last_writer_wins() -> lsm_cursor::Result<()> {
    let store = Store::default();
    store.create("lsm:t", Config::default())?;

    let mut cursor = store.open_cursor("lsm:t")?;

    for value in ["1", "2", "3"] {
        cursor.set_key("a");
        cursor.set_value(value);
        cursor.insert()?;
    }

    cursor.set_key("a");
    cursor.search()?;
    assert_eq!(Some(&"3".into()), cursor.value());

    // A deletion is the final word, too
    cursor.set_key("a");
    cursor.remove()?;

    cursor.set_key("a");
    cursor.set_value("4");
    cursor.insert()?;

    cursor.set_key("a");
    cursor.search()?;
    assert_eq!(Some(&"4".into()), cursor.value());

    Ok(())
}

#[test]
fn cursor_rejects_empty_value() -> lsm_cursor::Result<()> {
    let store = Store::default();
    store.create("lsm:t", Config::default())?;

    let mut cursor = store.open_cursor("lsm:t")?;

    // The empty value doubles as the tombstone marker
    cursor.set_key("a");
    cursor.set_value("");
    assert_eq!(Err(Error::ValueNotSet), cursor.insert());
    assert_eq!(Err(Error::ValueNotSet), cursor.update());

    Ok(())
}

#[test]
fn cursor_requires_key_and_value() -> lsm_cursor::Result<()> {
    let store = Store::default();
    store.create("lsm:t", Config::default())?;

    let mut cursor = store.open_cursor("lsm:t")?;

    assert!(matches!(cursor.insert(), Err(Error::InvalidArgument(_))));
    assert!(matches!(cursor.search(), Err(Error::InvalidArgument(_))));
    assert!(matches!(cursor.remove(), Err(Error::InvalidArgument(_))));

    cursor.set_key("a");
    assert!(matches!(cursor.insert(), Err(Error::InvalidArgument(_))));

    Ok(())
}

#[test]
fn cursor_no_overwrite_insert_duplicate() -> lsm_cursor::Result<()> {
    let store = Store::default();
    store.create("lsm:t", Config::default())?;

    let mut cursor = store.open_cursor_with("lsm:t", CursorOptions::new().overwrite(false))?;

    cursor.set_key("a");
    cursor.set_value("1");
    cursor.insert()?;

    cursor.set_key("a");
    cursor.set_value("2");
    assert_eq!(Err(Error::DuplicateKey), cursor.insert());

    // The value is untouched
    cursor.set_key("a");
    cursor.search()?;
    assert_eq!(Some(&"1".into()), cursor.value());

    Ok(())
}

#[test]
fn cursor_no_overwrite_update_missing() -> lsm_cursor::Result<()> {
    let store = Store::default();
    store.create("lsm:t", Config::default())?;

    let mut cursor = store.open_cursor_with("lsm:t", CursorOptions::new().overwrite(false))?;

    cursor.set_key("a");
    cursor.set_value("1");
    assert_eq!(Err(Error::NotFound), cursor.update());

    cursor.set_key("a");
    cursor.set_value("1");
    cursor.insert()?;

    cursor.set_key("a");
    cursor.set_value("2");
    cursor.update()?;

    cursor.set_key("a");
    cursor.search()?;
    assert_eq!(Some(&"2".into()), cursor.value());

    Ok(())
}

#[test]
fn cursor_no_overwrite_remove_missing() -> lsm_cursor::Result<()> {
    let store = Store::default();
    store.create("lsm:t", Config::default())?;

    let mut cursor = store.open_cursor_with("lsm:t", CursorOptions::new().overwrite(false))?;

    cursor.set_key("a");
    assert_eq!(Err(Error::NotFound), cursor.remove());

    cursor.set_key("a");
    cursor.set_value("1");
    cursor.insert()?;

    cursor.set_key("a");
    cursor.remove()?;

    cursor.set_key("a");
    assert_eq!(Err(Error::NotFound), cursor.search());

    Ok(())
}

#[test]
fn cursor_remove_masks_older_chunk_versions() -> lsm_cursor::Result<()> {
    let store = Store::default();
    store.create("lsm:t", Config::default())?;

    let mut cursor = store.open_cursor("lsm:t")?;

    cursor.set_key("k");
    cursor.set_value("old");
    cursor.insert()?;

    // Seal the chunk holding the old version; the tombstone lands in a
    // newer chunk and must still mask it
    store.switch("lsm:t")?;

    cursor.set_key("k");
    cursor.remove()?;

    cursor.set_key("k");
    assert_eq!(Err(Error::NotFound), cursor.search());

    Ok(())
}
