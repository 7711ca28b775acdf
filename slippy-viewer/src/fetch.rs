//! # Fetch collaborator boundary
//!
//! The viewer never performs I/O itself. A scheduling pass emits the grid
//! points to fetch; the host performs the transfers however it likes and
//! routes each outcome back through
//! [`Viewer::fetch_completed`](crate::Viewer::fetch_completed), tagged with
//! the same [`GridPoint`](crate::grid::GridPoint). Responses may arrive in
//! any order, or never.

use thiserror::Error;

/// A failed tile transfer, as reported by the host.
///
/// The transport is opaque to the viewer; the error exists only to degrade
/// the owning tile to its error state. Errored tiles are not retried unless
/// they fall out of the cache and are rediscovered as missing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("tile transfer failed: {0}")]
    Transport(String),
    #[error("tile transfer aborted by the host")]
    Aborted,
}

/// Outcome of one tile fetch.
pub type FetchResult = Result<Vec<u8>, FetchError>;
