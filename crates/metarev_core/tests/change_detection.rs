use metarev_core::db::open_db_in_memory;
use metarev_core::{
    Document, EntityRepository, KeyPolicy, MetaChange, MetadataStore, RevisionError,
    RevisionMetaService, SqliteEntityRepository, SqliteMetadataStore,
};
use rusqlite::Connection;
use uuid::Uuid;

type Service<'conn> = RevisionMetaService<SqliteMetadataStore<'conn>, SqliteEntityRepository<'conn>>;

fn setup(conn: &Connection) -> (Service<'_>, Document, Uuid) {
    let service = RevisionMetaService::new(
        KeyPolicy::new(),
        SqliteMetadataStore::new(conn),
        SqliteEntityRepository::new(conn),
    );
    let entities = SqliteEntityRepository::new(conn);
    let doc = Document::new("title", "body");
    entities.create_document(&doc).unwrap();
    let revision_id = entities.create_revision(doc.id).unwrap().id;
    (service, doc, revision_id)
}

#[test]
fn only_excluded_key_differs_means_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let (service, doc, revision_id) = setup(&conn);
    let store = SqliteMetadataStore::new(&conn);

    store.set_metadata(doc.id, "color", "red").unwrap();
    store.set_metadata(doc.id, "_edit_lock", "123").unwrap();
    store.set_metadata(revision_id, "color", "red").unwrap();
    store.set_metadata(revision_id, "_edit_lock", "999").unwrap();

    assert!(!service
        .change_detector()
        .has_metadata_changed(doc.id, revision_id)
        .unwrap());
}

#[test]
fn added_removed_and_modified_keys_are_changes() {
    let conn = open_db_in_memory().unwrap();
    let (service, doc, revision_id) = setup(&conn);
    let store = SqliteMetadataStore::new(&conn);
    let detector = service.change_detector();

    store.set_metadata(doc.id, "color", "red").unwrap();
    assert!(detector.has_metadata_changed(doc.id, revision_id).unwrap());

    store.set_metadata(revision_id, "color", "red").unwrap();
    assert!(!detector.has_metadata_changed(doc.id, revision_id).unwrap());

    store.set_metadata(revision_id, "size", "xl").unwrap();
    assert!(detector.has_metadata_changed(doc.id, revision_id).unwrap());

    store.set_metadata(doc.id, "size", "m").unwrap();
    let diff = detector.diff(doc.id, revision_id).unwrap();
    assert_eq!(diff.changes().len(), 1);
    assert!(matches!(&diff.changes()[0], MetaChange::Modified { key, .. } if key == "size"));
}

#[test]
fn structured_values_compare_after_decoding() {
    let conn = open_db_in_memory().unwrap();
    let (service, doc, revision_id) = setup(&conn);
    let store = SqliteMetadataStore::new(&conn);

    store.set_metadata(doc.id, "layout", r#"{"a":1,"b":2}"#).unwrap();
    store.set_metadata(revision_id, "layout", r#"{ "b": 2, "a": 1 }"#).unwrap();

    assert!(!service
        .change_detector()
        .has_metadata_changed(doc.id, revision_id)
        .unwrap());
}

#[test]
fn scalar_versus_sequence_is_a_change() {
    let conn = open_db_in_memory().unwrap();
    let (service, doc, revision_id) = setup(&conn);
    let store = SqliteMetadataStore::new(&conn);

    store.add_metadata(doc.id, "tags", "a").unwrap();
    store.add_metadata(doc.id, "tags", "a").unwrap();
    store.set_metadata(revision_id, "tags", "a").unwrap();

    assert!(service
        .change_detector()
        .has_metadata_changed(doc.id, revision_id)
        .unwrap());
}

#[test]
fn content_check_only_upgrades_the_host_verdict() {
    let conn = open_db_in_memory().unwrap();
    let (service, doc, revision_id) = setup(&conn);
    let store = SqliteMetadataStore::new(&conn);

    assert!(service
        .on_content_changed_check(true, Some(revision_id), doc.id)
        .unwrap());
    assert!(!service
        .on_content_changed_check(false, Some(revision_id), doc.id)
        .unwrap());

    store.set_metadata(doc.id, "subtitle", "new").unwrap();
    assert!(service
        .on_content_changed_check(false, Some(revision_id), doc.id)
        .unwrap());
    assert!(!service.on_content_changed_check(false, None, doc.id).unwrap());
}

#[test]
fn host_changed_verdict_skips_storage_entirely() {
    let conn = open_db_in_memory().unwrap();
    let (service, doc, revision_id) = setup(&conn);
    conn.execute_batch("DROP TABLE entity_meta;").unwrap();

    assert!(service
        .on_content_changed_check(true, Some(revision_id), doc.id)
        .unwrap());
    let err = service
        .on_content_changed_check(false, Some(revision_id), doc.id)
        .unwrap_err();
    assert!(matches!(err, RevisionError::StorageUnavailable(_)));
}

#[test]
fn captured_floats_compare_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let (service, doc, _) = setup(&conn);
    let store = SqliteMetadataStore::new(&conn);
    store.set_metadata(doc.id, "weights", "[1.0715660391465826e-75]").unwrap();
    store.set_metadata(doc.id, "ratio", r#"{"v":0.30000000000000004}"#).unwrap();

    let revision_id = SqliteEntityRepository::new(&conn)
        .create_revision(doc.id)
        .unwrap()
        .id;
    service.on_revision_created(revision_id).unwrap();

    assert!(!service
        .change_detector()
        .has_metadata_changed(doc.id, revision_id)
        .unwrap());
    assert!(!service
        .on_content_changed_check(false, Some(revision_id), doc.id)
        .unwrap());
}
