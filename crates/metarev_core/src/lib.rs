//! Core logic for metadata revisioning.
//! Metadata attached to a document is snapshotted, compared, persisted onto
//! revision records and restored the same way primary content is.

pub mod config;
pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod policy;
pub mod repo;
pub mod service;
pub mod snapshot;

pub use config::{ConfigError, MetarevConfig, PolicyConfig};
pub use context::{FixedSignals, RequestContext, RequestMode, RequestSignals, Screen};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity::{Document, EntityId, EntityRef, MetadataAddressable, Revision};
pub use model::meta_value::{MetaValue, SnapshotValue};
pub use policy::key_policy::{KeyPolicy, DEFAULT_EXCLUDED_KEYS};
pub use repo::entity_repo::{EntityRepository, SqliteEntityRepository};
pub use repo::meta_repo::{MetadataStore, RawMetadata, RevisionLookup, SqliteMetadataStore};
pub use repo::{RepoError, RepoResult};
pub use service::change_detector::ChangeDetector;
pub use service::field_presenter::{
    format_field_value, format_raw_field_value, FieldComparison, FieldPresenter, RevisionFieldSet,
};
pub use service::revision_meta_service::RevisionMetaService;
pub use service::snapshot_sync::{MetaLookup, MetaRead, SnapshotSync};
pub use service::{RevisionError, RevisionResult};
pub use snapshot::builder::SnapshotBuilder;
pub use snapshot::diff::{MetaChange, SnapshotDiff};
pub use snapshot::Snapshot;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
