//! # compass-shared
//!
//! Vocabulary shared by the store, the digest pipeline and the server:
//! shareable field identifiers, audit action tags and application constants.

pub mod constants;
pub mod types;

pub use types::{AuditAction, DigestKind, SharedField};
