//! Cached catalog of publicly known runner releases.
//!
//! One catalog instance lives for the whole process and is shared by
//! reference; callers poll it freely since results are memoized with a
//! validity window and failures are absorbed into an exponential backoff.

pub mod catalog;
pub mod version;

pub use catalog::{FetchError, HttpReleaseFetcher, ReleaseCatalog, ReleaseEntry, ReleaseFetcher};
pub use version::{RunnerVersion, VersionParseError};
