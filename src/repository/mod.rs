//! Persistent crawl state.

mod manifest;

pub use manifest::{Manifest, ManifestEntry, ManifestError, VerifyIssue, VerifyProblem};
