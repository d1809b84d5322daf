//! # compass-store
//!
//! Relational storage for the partner digest pipeline, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for every table the
//! pipeline touches, plus a cloneable [`SharedDatabase`] that runs those
//! helpers on the blocking pool for async callers.

pub mod audit;
pub mod database;
pub mod digests;
pub mod logs;
pub mod migrations;
pub mod models;
pub mod shared;
pub mod shares;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
pub use shared::SharedDatabase;
pub use shares::{ShareRow, UnreadableShare};
