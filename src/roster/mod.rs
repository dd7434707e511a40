//! Canonical team roster: provider records, the indexed snapshot built from
//! them, and the providers that supply them.

pub mod provider;
pub mod snapshot;
pub mod types;

pub use provider::{parse_espn_teams, EspnRosterProvider, FileRosterProvider, RosterProvider};
pub use snapshot::RosterSnapshot;
pub use types::{CanonicalEntity, EntitySummary, ProviderRecord};
