//! Domain model for revisionable documents and their metadata.
//!
//! # Responsibility
//! - Define documents, revisions and the id space they share.
//! - Define raw and normalized metadata value shapes.
//!
//! # Invariants
//! - Documents and revisions are addressed by the same `EntityId` type.
//! - A stored raw value always decodes to exactly one `MetaValue`.

pub mod entity;
pub mod meta_value;
