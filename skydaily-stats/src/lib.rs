//! The daily stats pipeline stages: fetch, archive, diff, summarise.
//!
//! Each stage is independently callable; sequencing them and deciding what a
//! failure means for the run is left to the binary.
pub mod archive;
pub mod delta;
pub mod fetch;
pub mod snapshot;
pub mod summary;

pub use archive::{ArchiveEntry, ArchiveOutcome, Archiver, latest_before};
pub use delta::{Delta, compute_delta};
pub use fetch::StatsFetcher;
pub use snapshot::{Snapshot, SnapshotError};
pub use summary::compose_summary;
