//! Practicum certificate portal core.
//!
//! Looks students up in spreadsheet-backed rosters, reports pass and
//! lab-assistant status, and cuts personalised certificates out of combined
//! PDF documents.

pub mod certificate;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod fetch;
pub mod portal;
pub mod roster;

#[cfg(test)]
pub(crate) mod test_support;

pub use certificate::{certificate_filename, CertificateArtifact, CertificateResolver};
pub use config::{Period, PortalConfig, ProgramPeriodPaths, ProgramType, SourceConfig};
pub use eligibility::{EligibilityResolver, EligibilityResult, Role, StatusLabel};
pub use error::{PortalError, PortalResult};
pub use fetch::{CachingFetcher, DirFetcher, HttpFetcher, MemoryFetcher, ResourceFetcher};
pub use portal::Portal;
pub use roster::{find_student, load_table, parse_table, RosterRow};
