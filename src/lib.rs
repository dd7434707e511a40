//! NCAA Team Name Normalizer
//!
//! Resolves free-form basketball team names ("UConn", "Kentuky", "Michigan State
//! University", "St. John's Red Storm") to one canonical roster identity.
//!
//! ## Pipeline
//!
//! - **normalize**: lowercase, punctuation, "University of" prefix, suffix and
//!   mascot stripping
//! - **exact** lookup of the normalized key in the roster snapshot
//! - **alias** lookup through a curated table (acronyms, disambiguations)
//! - **fuzzy** edit-distance / phonetic scoring against every roster key
//!
//! The roster comes from a [`roster::RosterProvider`] and lives in a shared
//! [`cache::RosterCache`] with a TTL and a retrying single-flight refresh.
//!
//! ```no_run
//! use std::sync::Arc;
//! use ncaa_team_normalizer::{EspnRosterProvider, RosterCache, TeamNormalizer};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let provider = Arc::new(EspnRosterProvider::from_env()?);
//! let cache = Arc::new(RosterCache::with_defaults(provider));
//! let matcher = TeamNormalizer::new(cache);
//!
//! if let Some(team) = matcher.resolve("UConn").await? {
//!     println!("{} ({})", team.canonical_name, team.match_method);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aliases;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod normalize;
pub mod retry;
pub mod roster;
pub mod similarity;

pub use aliases::AliasTable;
pub use cache::{CacheState, RosterCache, RosterCacheConfig};
pub use error::{NormalizerError, Result};
pub use matcher::{MatchMethod, MatchResult, NoMatchPolicy, ResolveOptions, TeamNormalizer};
pub use normalize::normalize;
pub use roster::{
    CanonicalEntity, EntitySummary, EspnRosterProvider, FileRosterProvider, ProviderRecord,
    RosterProvider, RosterSnapshot,
};
