//! Metadata keys as revision-comparable fields.
//!
//! # Responsibility
//! - Declare metadata keys as fields while the editor saves or a revision is shown.
//! - Render stored values into display strings for the comparison view.
//!
//! # Invariants
//! - Outside `Editing`/`ViewingRevision` the host field set is returned untouched.
//! - Every declared metadata field is labelled with its own key name.
//! - Rendering is idempotent for flat values: `render(render(x)) == render(x)`.

use crate::context::{RequestContext, RequestMode};
use crate::model::entity::{EntityRef, MetadataAddressable};
use crate::model::meta_value::{MetaValue, SnapshotValue};
use crate::policy::key_policy::KeyPolicy;
use crate::repo::meta_repo::MetadataStore;
use crate::service::RevisionResult;
use crate::snapshot::builder::SnapshotBuilder;
use log::debug;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

const LINE_SEPARATOR: &str = "\n";

/// Fields the host diffs and displays, with the metadata formatter registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionFieldSet {
    labels: BTreeMap<String, String>,
    metadata_keys: BTreeSet<String>,
}

impl RevisionFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field set seeded with the host's own `(field, label)` pairs.
    pub fn from_host_fields<K, L>(fields: impl IntoIterator<Item = (K, L)>) -> Self
    where
        K: Into<String>,
        L: Into<String>,
    {
        let mut set = Self::new();
        for (key, label) in fields {
            set.insert_host_field(key, label);
        }
        set
    }

    pub fn insert_host_field(&mut self, key: impl Into<String>, label: impl Into<String>) {
        let key = key.into();
        self.metadata_keys.remove(&key);
        self.labels.insert(key, label.into());
    }

    /// Declares `key` as a metadata field; overrides a host field of the same name.
    pub fn register_metadata_field(&mut self, key: impl Into<String>) {
        let key = key.into();
        self.labels.insert(key.clone(), key.clone());
        self.metadata_keys.insert(key);
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.labels.contains_key(key)
    }

    pub fn is_metadata_field(&self, key: &str) -> bool {
        self.metadata_keys.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Renders `raw` through the metadata formatter when `key` is a metadata field.
    pub fn render(&self, key: &str, raw: &str) -> String {
        if self.is_metadata_field(key) {
            format_raw_field_value(raw)
        } else {
            raw.to_string()
        }
    }
}

/// One metadata row of a revision comparison view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldComparison {
    pub key: String,
    pub label: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub changed: bool,
}

/// Exposes metadata keys of the active entity as individually comparable fields.
pub struct FieldPresenter<'a, S: MetadataStore + ?Sized> {
    snapshots: SnapshotBuilder<'a, S>,
}

impl<'a, S: MetadataStore + ?Sized> FieldPresenter<'a, S> {
    pub fn new(policy: &'a KeyPolicy, store: &'a S) -> Self {
        Self {
            snapshots: SnapshotBuilder::new(policy, store),
        }
    }

    /// Metadata keys of the request's target entity, or nothing when inactive.
    pub fn declare_fields(&self, ctx: &RequestContext) -> RevisionResult<BTreeSet<String>> {
        let target = match (ctx.mode(), ctx.target_id()) {
            (RequestMode::Editing, Some(id)) => EntityRef::Document(id),
            (RequestMode::ViewingRevision, Some(id)) => EntityRef::Revision(id),
            _ => return Ok(BTreeSet::new()),
        };

        let snapshot = self.snapshots.build(&target)?;
        Ok(snapshot.keys().map(str::to_string).collect())
    }

    /// Unions discovered metadata keys into the host's field set.
    pub fn on_declare_revision_fields(
        &self,
        mut fields: RevisionFieldSet,
        ctx: &RequestContext,
    ) -> RevisionResult<RevisionFieldSet> {
        let keys = self.declare_fields(ctx)?;
        debug!(
            "event=revision_fields module=service status=ok host_fields={} meta_fields={}",
            fields.len(),
            keys.len()
        );
        for key in keys {
            fields.register_metadata_field(key);
        }
        Ok(fields)
    }

    /// Current rendered value of one field, `None` when the key is absent.
    pub fn field_value(
        &self,
        entity: &impl MetadataAddressable,
        key: &str,
    ) -> RevisionResult<Option<String>> {
        let snapshot = self.snapshots.build(entity)?;
        Ok(snapshot.get(key).map(format_field_value))
    }

    /// Metadata rows for comparing `from` (older) with `to` (newer), sorted by key.
    pub fn compare(
        &self,
        from: &impl MetadataAddressable,
        to: &impl MetadataAddressable,
    ) -> RevisionResult<Vec<FieldComparison>> {
        let old = self.snapshots.build(from)?;
        let new = self.snapshots.build(to)?;
        let keys: BTreeSet<&str> = old.keys().chain(new.keys()).collect();

        Ok(keys
            .into_iter()
            .map(|key| {
                let before = old.get(key);
                let after = new.get(key);
                FieldComparison {
                    key: key.to_string(),
                    label: key.to_string(),
                    from: before.map(format_field_value),
                    to: after.map(format_field_value),
                    changed: before != after,
                }
            })
            .collect())
    }
}

/// Renders a normalized value for display. Sequences join with a line separator.
pub fn format_field_value(value: &SnapshotValue) -> String {
    match value {
        SnapshotValue::Single(value) => render_meta_value(value),
        SnapshotValue::Sequence(values) => values
            .iter()
            .map(render_meta_value)
            .collect::<Vec<_>>()
            .join(LINE_SEPARATOR),
    }
}

/// Decodes a raw stored value, then renders it like `format_field_value`.
pub fn format_raw_field_value(raw: &str) -> String {
    render_meta_value(&MetaValue::decode(raw))
}

/// Text is shown verbatim; only raw input goes through `MetaValue::decode`.
fn render_meta_value(value: &MetaValue) -> String {
    match value {
        MetaValue::Structured(structured) => render_structured(structured),
        MetaValue::Text(text) => text.clone(),
    }
}

fn render_structured(value: &Value) -> String {
    match value {
        Value::Array(items) => join_elements(items.iter()),
        Value::Object(map) => join_elements(map.values()),
        scalar => render_element(scalar),
    }
}

fn join_elements<'v>(elements: impl Iterator<Item = &'v Value>) -> String {
    elements
        .map(render_element)
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR)
}

fn render_element(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
