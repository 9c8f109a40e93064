use metarev_core::db::open_db_in_memory;
use metarev_core::{
    Document, EntityRef, EntityRepository, FixedSignals, KeyPolicy, MetaLookup, MetaRead,
    MetadataStore, RequestContext, RevisionFieldSet, RevisionMetaService, Screen,
    SqliteEntityRepository, SqliteMetadataStore,
};
use rusqlite::Connection;
use std::collections::BTreeSet;
use uuid::Uuid;

type Service<'conn> = RevisionMetaService<SqliteMetadataStore<'conn>, SqliteEntityRepository<'conn>>;

fn setup(conn: &Connection) -> (Service<'_>, Document) {
    let service = RevisionMetaService::new(
        KeyPolicy::new(),
        SqliteMetadataStore::new(conn),
        SqliteEntityRepository::new(conn),
    );
    let doc = Document::new("title", "body");
    SqliteEntityRepository::new(conn)
        .create_document(&doc)
        .unwrap();
    (service, doc)
}

fn capture(conn: &Connection, service: &Service<'_>, doc: &Document) -> Uuid {
    let revision = SqliteEntityRepository::new(conn)
        .create_revision(doc.id)
        .unwrap();
    service.on_revision_created(revision.id).unwrap();
    revision.id
}

fn host_fields() -> RevisionFieldSet {
    RevisionFieldSet::from_host_fields([("title", "Title"), ("content", "Content")])
}

#[test]
fn editing_declares_document_metadata_keys() {
    let conn = open_db_in_memory().unwrap();
    let (service, doc) = setup(&conn);
    let store = SqliteMetadataStore::new(&conn);
    store.set_metadata(doc.id, "subtitle", "s").unwrap();
    store.set_metadata(doc.id, "_edit_lock", "1").unwrap();

    let ctx = RequestContext::new(FixedSignals::editing(doc.id));
    let keys = service.field_presenter().declare_fields(&ctx).unwrap();
    assert_eq!(keys, BTreeSet::from(["subtitle".to_string()]));

    let fields = service.on_declare_revision_fields(host_fields(), &ctx).unwrap();
    assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["content", "subtitle", "title"]);
    assert_eq!(fields.label("subtitle"), Some("subtitle"));
    assert!(fields.is_metadata_field("subtitle"));
    assert_eq!(fields.label("title"), Some("Title"));
}

#[test]
fn revision_view_declares_the_revisions_own_keys() {
    let conn = open_db_in_memory().unwrap();
    let (service, doc) = setup(&conn);
    let store = SqliteMetadataStore::new(&conn);
    store.set_metadata(doc.id, "old_key", "x").unwrap();
    let revision_id = capture(&conn, &service, &doc);

    store.delete_metadata(doc.id, "old_key").unwrap();
    store.set_metadata(doc.id, "new_key", "y").unwrap();

    let ctx = RequestContext::new(FixedSignals::viewing_revision(revision_id));
    let keys = service.field_presenter().declare_fields(&ctx).unwrap();
    assert_eq!(keys, BTreeSet::from(["old_key".to_string()]));
}

#[test]
fn inactive_modes_leave_host_fields_untouched() {
    let conn = open_db_in_memory().unwrap();
    let (service, doc) = setup(&conn);
    SqliteMetadataStore::new(&conn)
        .set_metadata(doc.id, "subtitle", "s")
        .unwrap();

    let idle = RequestContext::idle();
    assert_eq!(
        service.on_declare_revision_fields(host_fields(), &idle).unwrap(),
        host_fields()
    );

    let revision_screen_without_id = RequestContext::new(FixedSignals {
        screen: Screen::RevisionBrowser,
        ..FixedSignals::default()
    });
    assert!(service
        .field_presenter()
        .declare_fields(&revision_screen_without_id)
        .unwrap()
        .is_empty());
}

#[test]
fn multi_valued_field_renders_one_value_per_line() {
    let conn = open_db_in_memory().unwrap();
    let (service, doc) = setup(&conn);
    let store = SqliteMetadataStore::new(&conn);
    store.add_metadata(doc.id, "tags", "a").unwrap();
    store.add_metadata(doc.id, "tags", "b").unwrap();
    store.set_metadata(doc.id, "sizes", r#"["s","m"]"#).unwrap();

    let presenter = service.field_presenter();
    let entity = EntityRef::Document(doc.id);
    assert_eq!(presenter.field_value(&entity, "tags").unwrap().as_deref(), Some("a\nb"));
    assert_eq!(presenter.field_value(&entity, "sizes").unwrap().as_deref(), Some("s\nm"));
    assert_eq!(presenter.field_value(&entity, "missing").unwrap(), None);
}

#[test]
fn compare_lists_every_key_with_rendered_values() {
    let conn = open_db_in_memory().unwrap();
    let (service, doc) = setup(&conn);
    let store = SqliteMetadataStore::new(&conn);
    store.set_metadata(doc.id, "color", "red").unwrap();
    store.set_metadata(doc.id, "size", "xl").unwrap();
    let older = capture(&conn, &service, &doc);

    store.set_metadata(doc.id, "color", "blue").unwrap();
    store.delete_metadata(doc.id, "size").unwrap();
    store.set_metadata(doc.id, "tags", r#"["x","y"]"#).unwrap();
    let newer = capture(&conn, &service, &doc);

    let rows = service
        .field_presenter()
        .compare(&EntityRef::Revision(older), &EntityRef::Revision(newer))
        .unwrap();
    let summary: Vec<_> = rows
        .iter()
        .map(|row| (row.key.as_str(), row.from.as_deref(), row.to.as_deref(), row.changed))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("color", Some("red"), Some("blue"), true),
            ("size", Some("xl"), None, true),
            ("tags", None, Some("x\ny"), true),
        ]
    );
}

#[test]
fn read_path_substitutes_stored_rows_only_in_active_modes() {
    let conn = open_db_in_memory().unwrap();
    let (service, doc) = setup(&conn);
    let store = SqliteMetadataStore::new(&conn);
    store.set_metadata(doc.id, "subtitle", "draft v1").unwrap();
    let revision_id = capture(&conn, &service, &doc);

    let viewing = RequestContext::new(FixedSignals::viewing_revision(revision_id));
    let read = service
        .on_metadata_read(MetaRead::Single(None), &viewing, revision_id, "subtitle", true)
        .unwrap();
    assert_eq!(read, MetaRead::Single(Some("draft v1".to_string())));

    let many = service
        .on_metadata_read(MetaRead::Many(Vec::new()), &viewing, revision_id, "subtitle", false)
        .unwrap();
    assert_eq!(many, MetaRead::Many(vec!["draft v1".to_string()]));

    let idle = RequestContext::idle();
    let passthrough = service
        .on_metadata_read(MetaRead::Single(None), &idle, revision_id, "subtitle", true)
        .unwrap();
    assert_eq!(passthrough, MetaRead::Single(None));
}

#[test]
fn read_path_treats_empty_row_as_found_and_missing_row_as_passthrough() {
    let conn = open_db_in_memory().unwrap();
    let (service, doc) = setup(&conn);
    let store = SqliteMetadataStore::new(&conn);
    store.set_metadata(doc.id, "blank", "").unwrap();

    let editing = RequestContext::new(FixedSignals::editing(doc.id));
    let sync = service.snapshot_sync();
    assert_eq!(
        sync.read_metadata(&editing, doc.id, "blank", true).unwrap(),
        MetaLookup::Found(MetaRead::Single(Some(String::new())))
    );
    assert_eq!(
        sync.read_metadata(&editing, doc.id, "missing", true).unwrap(),
        MetaLookup::PassThrough
    );

    let default = MetaRead::Single(Some("host value".to_string()));
    assert_eq!(
        service
            .on_metadata_read(default.clone(), &editing, doc.id, "missing", true)
            .unwrap(),
        default
    );
}
