//! Immutable, fully indexed view of one roster fetch.

use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::types::{CanonicalEntity, ProviderRecord};
use crate::normalize::normalize;
use crate::similarity::Candidate;

/// One roster generation. Built once, never mutated; readers share it via `Arc`.
#[derive(Debug, Default)]
pub struct RosterSnapshot {
    by_key: FxHashMap<String, Arc<CanonicalEntity>>,
    by_abbreviation: FxHashMap<String, Arc<CanonicalEntity>>,
    by_id: FxHashMap<String, Arc<CanonicalEntity>>,
    /// Normalized keys in first-seen provider order (fuzzy tie-break order)
    candidates: Vec<Candidate>,
}

impl RosterSnapshot {
    /// Index provider records by normalized display name.
    ///
    /// Rows without a display name, or whose name normalizes to nothing, are
    /// skipped. When two rows share a key the later row replaces the earlier
    /// one but the key keeps its original position.
    pub fn build(records: Vec<ProviderRecord>) -> Self {
        let mut snapshot = Self::default();
        let total = records.len();
        let mut skipped = 0usize;

        for record in records {
            let Some(entity) = CanonicalEntity::from_record(record) else {
                skipped += 1;
                continue;
            };

            let key = match normalize(&entity.display_name) {
                Ok(key) if !key.is_empty() => key,
                _ => {
                    debug!(
                        "roster: skipping '{}' (empty matching key)",
                        entity.display_name
                    );
                    skipped += 1;
                    continue;
                }
            };

            let entity = Arc::new(entity);
            if let Some(previous) = snapshot.by_key.insert(key.clone(), entity.clone()) {
                warn!(
                    "roster: key '{}' collision, '{}' ({}) replaces '{}' ({})",
                    key,
                    entity.display_name,
                    entity.entity_id,
                    previous.display_name,
                    previous.entity_id
                );
            } else {
                snapshot.candidates.push(Candidate::new(key));
            }

            if !entity.abbreviation.is_empty() {
                snapshot
                    .by_abbreviation
                    .insert(entity.abbreviation.to_lowercase(), entity.clone());
            }
            if !entity.entity_id.is_empty() {
                snapshot.by_id.insert(entity.entity_id.clone(), entity);
            }
        }

        debug!(
            "roster: indexed {} teams from {} records ({} skipped)",
            snapshot.len(),
            total,
            skipped
        );
        snapshot
    }

    /// Exact lookup by normalized key
    pub fn get(&self, key: &str) -> Option<&Arc<CanonicalEntity>> {
        self.by_key.get(key)
    }

    /// Case-insensitive abbreviation lookup
    pub fn get_by_abbreviation(&self, abbreviation: &str) -> Option<&Arc<CanonicalEntity>> {
        self.by_abbreviation
            .get(&abbreviation.trim().to_lowercase())
    }

    pub fn get_by_id(&self, entity_id: &str) -> Option<&Arc<CanonicalEntity>> {
        self.by_id.get(entity_id.trim())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Keys in provider order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|c| c.key.as_str())
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Entities in provider order, one per key
    pub fn entities(&self) -> impl Iterator<Item = &Arc<CanonicalEntity>> {
        self.candidates
            .iter()
            .filter_map(|c| self.by_key.get(&c.key))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
