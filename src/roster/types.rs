//! Roster records as delivered by a provider and as held in a snapshot.

use serde::{Deserialize, Deserializer, Serialize};

/// One raw row from a roster provider. Every field except the identifier may
/// be missing. Rows with neither a display name nor a full name are dropped
/// at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    #[serde(default, alias = "displayName")]
    pub display_name: Option<String>,
    #[serde(
        default,
        alias = "id",
        alias = "team_id",
        deserialize_with = "deserialize_id"
    )]
    pub entity_id: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default, alias = "name")]
    pub full_name: Option<String>,
}

impl ProviderRecord {
    pub fn new(display_name: &str, entity_id: &str) -> Self {
        Self {
            display_name: Some(display_name.to_string()),
            entity_id: entity_id.to_string(),
            ..Self::default()
        }
    }

    pub fn with_abbreviation(mut self, abbreviation: &str) -> Self {
        self.abbreviation = Some(abbreviation.to_string());
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_nickname(mut self, nickname: &str) -> Self {
        self.nickname = Some(nickname.to_string());
        self
    }

    pub fn with_full_name(mut self, full_name: &str) -> Self {
        self.full_name = Some(full_name.to_string());
        self
    }
}

/// Providers disagree on whether ids are strings or numbers
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(s)) => s.trim().to_string(),
        Some(RawId::Integer(n)) => n.to_string(),
        Some(RawId::Float(f)) => f.to_string(),
        None => String::new(),
    })
}

/// One canonical team. Immutable once placed in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalEntity {
    /// Human-facing canonical name (non-empty)
    pub display_name: String,
    /// Stable provider identifier
    pub entity_id: String,
    /// Short code; empty when the provider has none
    pub abbreviation: String,
    pub location: String,
    pub nickname: String,
    /// Raw provider name; falls back to the display name
    pub full_name: String,
}

impl CanonicalEntity {
    /// Build from a provider row. The display name falls back to the full
    /// name and vice versa; `None` if the row has neither.
    pub fn from_record(record: ProviderRecord) -> Option<Self> {
        let display_name = non_blank(record.display_name);
        let full_name = non_blank(record.full_name);
        let display_name = display_name.or_else(|| full_name.clone())?;
        let full_name = full_name.unwrap_or_else(|| display_name.clone());

        Some(Self {
            entity_id: record.entity_id,
            abbreviation: record.abbreviation.unwrap_or_default().trim().to_string(),
            location: record.location.unwrap_or_default(),
            nickname: record.nickname.unwrap_or_default(),
            full_name,
            display_name,
        })
    }

    pub fn summary(&self) -> EntitySummary {
        EntitySummary {
            canonical_name: self.display_name.clone(),
            entity_id: self.entity_id.clone(),
            abbreviation: self.abbreviation.clone(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Enumeration projection of a canonical team
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySummary {
    pub canonical_name: String,
    pub entity_id: String,
    pub abbreviation: String,
}
