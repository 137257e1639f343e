use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Entity kinds ─────────────────────────────────────────────────────────

/// The five entity categories kept in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Character,
    Vehicle,
    Location,
    Storyline,
    Organization,
}

impl EntityKind {
    /// Search order used whenever no kind is specified.
    pub const ALL: [EntityKind; 5] = [
        Self::Character,
        Self::Vehicle,
        Self::Location,
        Self::Storyline,
        Self::Organization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Vehicle => "vehicle",
            Self::Location => "location",
            Self::Storyline => "storyline",
            Self::Organization => "organization",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            Self::Character => "characters",
            Self::Vehicle => "vehicles",
            Self::Location => "locations",
            Self::Storyline => "storylines",
            Self::Organization => "organizations",
        }
    }

    /// Table holding rows of this kind.
    pub fn table(&self) -> &'static str {
        self.plural()
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Character => 0,
            Self::Vehicle => 1,
            Self::Location => 2,
            Self::Storyline => 3,
            Self::Organization => 4,
        }
    }

    /// Tag used for a definitive answer about an entity of this kind.
    pub fn lookup_query_type(&self) -> QueryType {
        match self {
            Self::Character => QueryType::CharacterLookup,
            Self::Vehicle => QueryType::VehicleLookup,
            Self::Location => QueryType::LocationLookup,
            Self::Storyline | Self::Organization => QueryType::GeneralSearch,
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "character" | "characters" => Some(Self::Character),
            "vehicle" | "vehicles" => Some(Self::Vehicle),
            "location" | "locations" => Some(Self::Location),
            "storyline" | "storylines" => Some(Self::Storyline),
            "organization" | "organizations" => Some(Self::Organization),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Entity identifiers ───────────────────────────────────────────────────

/// `(kind, row id)` pair, rendered as `character:12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub kind: EntityKind,
    pub id: i64,
}

impl EntityId {
    pub fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEntityIdError(pub String);

impl fmt::Display for ParseEntityIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed entity id: {:?}", self.0)
    }
}

impl std::error::Error for ParseEntityIdError {}

impl FromStr for EntityId {
    type Err = ParseEntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseEntityIdError(s.to_string());
        let (kind, id) = s.split_once(':').ok_or_else(err)?;
        let kind = EntityKind::from_str_loose(kind).ok_or_else(err)?;
        let id = id.parse::<i64>().map_err(|_| err())?;
        Ok(Self { kind, id })
    }
}

impl Serialize for EntityId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── Match strategy ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
    Alias,
    Description,
    /// Scored by the character-to-vehicle formula rather than plain similarity.
    CharacterVehicle,
}

// ── Query-type tags ──────────────────────────────────────────────────────

/// Fixed tag vocabulary carried by every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    CharacterLookup,
    VehicleLookup,
    LocationLookup,
    RelationshipQuery,
    MultiEntityQuery,
    ComparativeAnalysis,
    GeneralSearch,
    OutOfScope,
    NotFound,
    Error,
    ClarificationNeeded,
    Weapons,
    Defenses,
    Features,
    Specifications,
    CharacterLocations,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CharacterLookup => "character_lookup",
            Self::VehicleLookup => "vehicle_lookup",
            Self::LocationLookup => "location_lookup",
            Self::RelationshipQuery => "relationship_query",
            Self::MultiEntityQuery => "multi_entity_query",
            Self::ComparativeAnalysis => "comparative_analysis",
            Self::GeneralSearch => "general_search",
            Self::OutOfScope => "out_of_scope",
            Self::NotFound => "not_found",
            Self::Error => "error",
            Self::ClarificationNeeded => "clarification_needed",
            Self::Weapons => "weapons",
            Self::Defenses => "defenses",
            Self::Features => "features",
            Self::Specifications => "specifications",
            Self::CharacterLocations => "character_locations",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Response ─────────────────────────────────────────────────────────────

/// What `process_query` hands back to the CLI or HTTP collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    /// Always within `[0.0, 1.0]`.
    pub confidence: f64,
    pub source_entities: Vec<EntityId>,
    pub query_type: QueryType,
    /// Present only on "did you mean" results; holds canonical names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    /// The entity behind each suggestion, same order. In-process only.
    #[serde(skip)]
    pub choices: Vec<EntityId>,
}

impl QueryResponse {
    pub fn new(
        answer: impl Into<String>,
        confidence: f64,
        source_entities: Vec<EntityId>,
        query_type: QueryType,
    ) -> Self {
        Self {
            answer: answer.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source_entities,
            query_type,
            suggestions: None,
            choices: Vec::new(),
        }
    }

    /// Suggestions that remember which entity each name stands for, so a
    /// numbered reply cannot land on a same-named entity of another kind.
    pub fn with_choices(mut self, choices: Vec<(String, EntityId)>) -> Self {
        let (names, ids) = choices.into_iter().unzip();
        self.suggestions = Some(names);
        self.choices = ids;
        self
    }

    pub fn has_suggestions(&self) -> bool {
        self.suggestions.as_ref().is_some_and(|s| !s.is_empty())
    }
}

// ── Store statistics ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub characters: usize,
    pub vehicles: usize,
    pub locations: usize,
    pub storylines: usize,
    pub organizations: usize,
    pub aliases: usize,
    pub relationships: usize,
}

impl Stats {
    pub fn total_entities(&self) -> usize {
        self.characters + self.vehicles + self.locations + self.storylines + self.organizations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_display_and_parse() {
        let id = EntityId::new(EntityKind::Vehicle, 42);
        assert_eq!(id.to_string(), "vehicle:42");
        assert_eq!("vehicle:42".parse::<EntityId>(), Ok(id));
        assert!("vehicle".parse::<EntityId>().is_err());
        assert!("spaceship:1".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_response_clamps_confidence() {
        let r = QueryResponse::new("x", 1.7, vec![], QueryType::GeneralSearch);
        assert_eq!(r.confidence, 1.0);
        let r = QueryResponse::new("x", -0.2, vec![], QueryType::GeneralSearch);
        assert_eq!(r.confidence, 0.0);
    }
}
