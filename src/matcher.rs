//! Three-tier team name resolution: exact, then alias, then fuzzy.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::aliases::AliasTable;
use crate::cache::RosterCache;
use crate::config::{env_flag, env_var_parsed, DEFAULT_FUZZY_THRESHOLD};
use crate::error::{NormalizerError, Result};
use crate::normalize::normalize;
use crate::roster::{CanonicalEntity, EntitySummary, RosterSnapshot};
use crate::similarity::best_match;

/// Which tier produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Exact,
    Alias,
    Fuzzy,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMethod::Exact => write!(f, "exact"),
            MatchMethod::Alias => write!(f, "alias"),
            MatchMethod::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

/// A resolved team
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub canonical_name: String,
    pub entity_id: String,
    pub abbreviation: String,
    /// 100.0 for exact and alias hits, the similarity score for fuzzy hits
    pub confidence: f64,
    pub match_method: MatchMethod,
}

impl MatchResult {
    fn new(entity: &CanonicalEntity, confidence: f64, match_method: MatchMethod) -> Self {
        Self {
            canonical_name: entity.display_name.clone(),
            entity_id: entity.entity_id.clone(),
            abbreviation: entity.abbreviation.clone(),
            confidence,
            match_method,
        }
    }
}

/// What to do when no tier matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoMatchPolicy {
    /// Return `Ok(None)`
    #[default]
    ReturnEmpty,
    /// Return `Err(NormalizerError::UnknownTeam)`
    Fail,
}

/// Per-call matching options
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveOptions {
    /// Minimum fuzzy score, 0-100
    pub fuzzy_threshold: f64,
    pub on_no_match: NoMatchPolicy,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            on_no_match: NoMatchPolicy::ReturnEmpty,
        }
    }
}

impl ResolveOptions {
    /// TEAM_FUZZY_THRESHOLD and TEAM_STRICT over the defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let fuzzy_threshold = env_var_parsed::<f64>("TEAM_FUZZY_THRESHOLD")
            .filter(|t| (0.0..=100.0).contains(t))
            .unwrap_or(defaults.fuzzy_threshold);
        let on_no_match = match env_flag("TEAM_STRICT") {
            Some(true) => NoMatchPolicy::Fail,
            _ => defaults.on_no_match,
        };
        Self {
            fuzzy_threshold,
            on_no_match,
        }
    }

    pub fn with_threshold(mut self, fuzzy_threshold: f64) -> Self {
        self.fuzzy_threshold = fuzzy_threshold;
        self
    }

    pub fn strict(mut self) -> Self {
        self.on_no_match = NoMatchPolicy::Fail;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.fuzzy_threshold) {
            return Err(NormalizerError::invalid_input(format!(
                "fuzzy threshold must be within [0, 100], got {}",
                self.fuzzy_threshold
            )));
        }
        Ok(())
    }
}

/// Public entry point. Cheap to clone; clones share the same roster cache.
#[derive(Clone)]
pub struct TeamNormalizer {
    cache: Arc<RosterCache>,
    aliases: Arc<AliasTable>,
    options: ResolveOptions,
}

impl TeamNormalizer {
    /// Matcher over `cache` with the built-in aliases and default options
    pub fn new(cache: Arc<RosterCache>) -> Self {
        Self {
            cache,
            aliases: Arc::new(AliasTable::builtin()),
            options: ResolveOptions::default(),
        }
    }

    pub fn with_aliases(mut self, aliases: Arc<AliasTable>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn cache(&self) -> &Arc<RosterCache> {
        &self.cache
    }

    /// Resolve with this matcher's default options
    pub async fn resolve(&self, raw_name: &str) -> Result<Option<MatchResult>> {
        self.resolve_with(raw_name, &self.options).await
    }

    /// Resolve one name.
    ///
    /// Input is validated and normalized before the roster is touched, so
    /// `InvalidInput` never triggers a fetch. Roster unavailability surfaces
    /// as `DataUnavailable`.
    pub async fn resolve_with(
        &self,
        raw_name: &str,
        options: &ResolveOptions,
    ) -> Result<Option<MatchResult>> {
        options.validate()?;
        let key = normalize(raw_name)?;

        let snapshot = self.cache.snapshot().await?;

        if let Some(result) = self.match_key(&key, &snapshot, options.fuzzy_threshold) {
            return Ok(Some(result));
        }

        debug!("no match for '{}' (key='{}')", raw_name, key);
        match options.on_no_match {
            NoMatchPolicy::ReturnEmpty => Ok(None),
            NoMatchPolicy::Fail => Err(NormalizerError::UnknownTeam(raw_name.to_string())),
        }
    }

    fn match_key(&self, key: &str, snapshot: &RosterSnapshot, threshold: f64) -> Option<MatchResult> {
        if let Some(entity) = snapshot.get(key) {
            debug!("exact hit '{}' -> {}", key, entity.display_name);
            return Some(MatchResult::new(entity, 100.0, MatchMethod::Exact));
        }

        if let Some(canonical) = self.aliases.get(key) {
            let target = normalize(canonical).ok();
            match target.as_deref().and_then(|t| snapshot.get(t)) {
                Some(entity) => {
                    debug!("alias hit '{}' -> {}", key, entity.display_name);
                    return Some(MatchResult::new(entity, 100.0, MatchMethod::Alias));
                }
                None => debug!(
                    "alias '{}' -> '{}' not in current roster, falling through",
                    key, canonical
                ),
            }
        }

        if key.is_empty() {
            return None;
        }

        let hit = best_match(key, snapshot.candidates(), threshold)?;
        let entity = snapshot.get(hit.key)?;
        debug!(
            "fuzzy hit '{}' -> {} (score={:.1})",
            key, entity.display_name, hit.score
        );
        Some(MatchResult::new(entity, hit.score, MatchMethod::Fuzzy))
    }

    /// Resolve every name in order. Misses become `None`; `InvalidInput`,
    /// `DataUnavailable` and strict-mode `UnknownTeam` abort the batch.
    pub async fn resolve_many<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Option<MatchResult>>> {
        let mut results = Vec::with_capacity(names.len());
        for name in names {
            results.push(self.resolve(name.as_ref()).await?);
        }
        Ok(results)
    }

    /// Every canonical team in roster order
    pub async fn list_all_entities(&self) -> Result<Vec<EntitySummary>> {
        let snapshot = self.cache.snapshot().await?;
        Ok(snapshot.entities().map(|e| e.summary()).collect())
    }

    pub async fn find_by_id(&self, entity_id: &str) -> Result<Option<Arc<CanonicalEntity>>> {
        let snapshot = self.cache.snapshot().await?;
        Ok(snapshot.get_by_id(entity_id).cloned())
    }

    /// Case-insensitive abbreviation lookup ("duke", "DUKE")
    pub async fn find_by_abbreviation(
        &self,
        abbreviation: &str,
    ) -> Result<Option<Arc<CanonicalEntity>>> {
        let snapshot = self.cache.snapshot().await?;
        Ok(snapshot.get_by_abbreviation(abbreviation).cloned())
    }

    /// Force a roster refetch; returns the new team count
    pub async fn refresh(&self) -> Result<usize> {
        let snapshot = self.cache.ensure_fresh(true).await?;
        Ok(snapshot.len())
    }
}
