//! Revisioning key policy.

pub mod key_policy;
