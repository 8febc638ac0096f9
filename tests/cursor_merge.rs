use lsm_cursor::{Config, Error, Store};
use test_log::test;

fn collect_keys(cursor: &mut lsm_cursor::Cursor) -> lsm_cursor::Result<Vec<Vec<u8>>> {
    let mut keys = vec![];

    cursor.reset()?;
    loop {
        match cursor.next() {
            Ok(()) => keys.push(cursor.key().expect("should be positioned").to_vec()),
            Err(Error::NotFound) => return Ok(keys),
            Err(e) => return Err(e),
        }
    }
}

#[test]
fn merge_cursor_sees_only_pinned_chunks() -> lsm_cursor::Result<()> {
    let store = Store::default();
    let tree = store.create("lsm:t", Config::default())?;

    let mut writer = store.open_cursor("lsm:t")?;

    writer.set_key("a");
    writer.set_value("1");
    writer.insert()?;
    store.switch("lsm:t")?;

    writer.set_key("b");
    writer.set_value("2");
    writer.insert()?;
    store.switch("lsm:t")?;

    writer.set_key("c");
    writer.set_value("3");
    writer.insert()?;

    // chunk 1 is the empty pre-write chunk; "a" and "b" are in sealed
    // chunks 2 and 3; "c" lives in the primary
    assert_eq!(4, tree.chunk_count());

    let mut merge = store.open_cursor("lsm:t")?;
    merge.init_merge(3)?;

    assert_eq!(vec![b"a".to_vec(), b"b".to_vec()], collect_keys(&mut merge)?);

    Ok(())
}

#[test]
fn merge_cursor_ignores_later_switches() -> lsm_cursor::Result<()> {
    let store = Store::default();
    store.create("lsm:t", Config::default())?;

    let mut writer = store.open_cursor("lsm:t")?;
    writer.set_key("a");
    writer.set_value("1");
    writer.insert()?;
    store.switch("lsm:t")?;

    let mut merge = store.open_cursor("lsm:t")?;
    merge.init_merge(2)?;

    // The tree moves on; the merge cursor's view is pinned
    writer.set_key("z");
    writer.set_value("26");
    writer.insert()?;
    store.switch("lsm:t")?;

    assert_eq!(vec![b"a".to_vec()], collect_keys(&mut merge)?);

    Ok(())
}

#[test]
fn merge_cursor_rejects_bad_counts() -> lsm_cursor::Result<()> {
    let store = Store::default();
    store.create("lsm:t", Config::default())?;

    let mut cursor = store.open_cursor("lsm:t")?;
    assert!(matches!(
        cursor.init_merge(0),
        Err(Error::InvalidArgument(_)),
    ));

    let mut cursor = store.open_cursor("lsm:t")?;
    assert!(matches!(cursor.init_merge(10), Err(Error::ChunkOpen(_))));

    Ok(())
}
