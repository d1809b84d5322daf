//! # compass-digest
//!
//! Consent-gated partner digests.
//!
//! A digest run checks the consent relationship for a (user, partner) pair,
//! aggregates the user's last week of logs into a [`Summary`], renders only
//! the approved fields into a [`MessageBody`], and, unless previewing, hands
//! it to the [`DeliveryRecorder`] which persists a digest record, sends it
//! through a [`MessageTransport`] and writes the matching audit entry.
//! [`DigestPipeline::run_sweep`] repeats that for every consenting
//! relationship with bounded concurrency.

pub mod composer;
pub mod config;
pub mod consent;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod recorder;
pub mod summary;
pub mod sweep;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use composer::{compose, MessageBody};
pub use config::DigestConfig;
pub use consent::check_consent;
pub use error::{DigestError, ErrorKind, Result, TransportError};
pub use history::HistoryEntry;
pub use pipeline::{DigestPipeline, DigestPreview};
pub use recorder::{Delivery, DeliveryRecorder};
pub use summary::{build_summary, Period, Summary};
pub use sweep::{SweepEntry, SweepOutcome, SweepReport};
pub use transport::{
    DeliveryReceipt, Envelope, HttpRelayTransport, LogTransport, MessageTransport, TransportConfig,
};
