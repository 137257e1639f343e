//! Attribute, relationship, usage and listing answers.
//!
//! Every method takes an already-resolved [`Entity`] and answers from the
//! relation tables. `Ok(None)` means "nothing to say", letting the router
//! move on to the next route.

use gotham_types::{EntityId, EntityKind, QueryResponse, QueryType};

use crate::cache::{Entity, EntityCache};
use crate::compose::{Composer, clean_name, join_names};
use crate::error::Result;
use crate::knowledge::{DEFAULT_ENEMIES, FALLBACK_RELATIONS, FALLBACK_RELATION_LIMIT};
use crate::matcher::mentions;
use crate::store::{Store, VehicleList};

/// Description words suggesting a character is armed.
const WEAPON_WORDS: &[&str] = &["gun", "pistol", "rifle", "sword", "knife", "weapon", "armed", "carries"];

const MAX_OTHER_LOCATIONS: usize = 5;
const MAX_NAMED_RELATIONS: usize = 5;
const MAX_RELATED_SOURCES: usize = 3;
const LISTING_EXAMPLES: usize = 5;

// ── Attributes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Weapons,
    Defenses,
    Features,
    Specifications,
    Locations,
}

impl Attribute {
    pub fn query_type(self) -> QueryType {
        match self {
            Self::Weapons => QueryType::Weapons,
            Self::Defenses => QueryType::Defenses,
            Self::Features => QueryType::Features,
            Self::Specifications => QueryType::Specifications,
            Self::Locations => QueryType::CharacterLocations,
        }
    }

    fn header(self) -> &'static str {
        match self {
            Self::Weapons => "WEAPONS ANALYSIS",
            Self::Defenses => "DEFENSIVE SYSTEMS",
            Self::Features => "SPECIAL FEATURES",
            Self::Specifications => "TECHNICAL SPECIFICATIONS",
            Self::Locations => "LOCATION ANALYSIS",
        }
    }

    /// `(data label, what may be missing)` for the not-yet-catalogued reply.
    fn missing_labels(self) -> (&'static str, &'static str) {
        match self {
            Self::Weapons => ("weapon", "weapons"),
            Self::Defenses => ("defensive system", "defenses"),
            Self::Features => ("feature", "special capabilities"),
            Self::Specifications | Self::Locations => ("specification", "specifications"),
        }
    }
}

// ── Relation kinds ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Allies,
    Enemies,
    Family,
}

impl RelationKind {
    /// Detection order when a query names several kinds.
    pub const ALL: [RelationKind; 3] = [Self::Enemies, Self::Allies, Self::Family];

    fn synonyms(self) -> &'static [&'static str] {
        match self {
            Self::Allies => &[
                "ally", "allies", "partner", "partners", "friend", "friends", "teammate",
                "teammates",
            ],
            Self::Enemies => &[
                "enemy", "enemies", "villain", "villains", "foe", "foes", "rival", "rivals",
                "nemesis", "rogues",
            ],
            Self::Family => &[
                "family", "father", "mother", "son", "daughter", "parent", "parents", "child",
                "children", "sibling", "siblings", "ward", "brother", "sister", "relatives",
            ],
        }
    }

    /// The relation a query asks about, if any.
    pub fn detect(query: &str) -> Option<Self> {
        let lower = query.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.synonyms().iter().any(|w| mentions(&lower, w)))
    }

    /// Classify a stored `relationship_type` label.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.synonyms().contains(&label.as_str()))
    }

    fn singular(self) -> &'static str {
        match self {
            Self::Allies => "ally",
            Self::Enemies => "enemy",
            Self::Family => "family member",
        }
    }

    fn plural(self) -> &'static str {
        match self {
            Self::Allies => "allies",
            Self::Enemies => "enemies",
            Self::Family => "family members",
        }
    }
}

/// "X's ally is Y." / "X's allies include A, B and C." / five names plus
/// an overflow count.
pub fn relation_sentence(subject: &str, kind: RelationKind, names: &[String]) -> String {
    match names {
        [] => format!("No {} found for {subject} in the current database.", kind.plural()),
        [one] => format!("{subject}'s {} is {one}.", kind.singular()),
        _ if names.len() > MAX_NAMED_RELATIONS => format!(
            "{subject}'s {} include {}, and {} others.",
            kind.plural(),
            names[..MAX_NAMED_RELATIONS].join(", "),
            names.len() - MAX_NAMED_RELATIONS
        ),
        _ => format!("{subject}'s {} include {}.", kind.plural(), join_names(names)),
    }
}

// ── Resolver ─────────────────────────────────────────────────────────────

pub struct Resolver<'a> {
    store: &'a Store,
    cache: &'a EntityCache,
    composer: &'a Composer,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a Store, cache: &'a EntityCache, composer: &'a Composer) -> Self {
        Self {
            store,
            cache,
            composer,
        }
    }

    /// Answer "what weapons/defenses/features/specs does X have" and "where
    /// does X live".
    pub fn attribute(&self, entity: &Entity, attribute: Attribute) -> Result<Option<QueryResponse>> {
        let name = clean_name(&entity.canonical_name);
        let found = match (entity.id.kind, attribute) {
            (EntityKind::Vehicle, Attribute::Weapons) => {
                self.vehicle_list(entity, VehicleList::Weapons, attribute, |items| {
                    format!("{name} is equipped with: {items}")
                })?
            }
            (EntityKind::Vehicle, Attribute::Defenses) => {
                self.vehicle_list(entity, VehicleList::Defenses, attribute, |items| {
                    format!("{name} has defensive systems: {items}")
                })?
            }
            (EntityKind::Vehicle, Attribute::Features) => {
                self.vehicle_list(entity, VehicleList::Features, attribute, |items| {
                    format!("{name} has special features: {items}")
                })?
            }
            (EntityKind::Vehicle, Attribute::Specifications) => {
                let specs = self.store.vehicle_specs(entity.id.id)?.unwrap_or_default();
                let details: Vec<String> = specs
                    .present()
                    .into_iter()
                    .map(|(field, value)| format!("{}: {value}", field.replace('_', " ")))
                    .collect();
                if details.is_empty() {
                    Some((not_catalogued(&name, attribute), 0.6, Vec::new()))
                } else {
                    Some((format!("{name} specifications: {}", details.join("; ")), 1.0, Vec::new()))
                }
            }
            (EntityKind::Character, Attribute::Weapons) => {
                let description = entity.description.to_lowercase();
                let hits: Vec<String> = WEAPON_WORDS
                    .iter()
                    .filter(|w| description.contains(*w))
                    .map(|w| w.to_string())
                    .collect();
                (!hits.is_empty()).then(|| {
                    (
                        format!(
                            "Based on available information, {name} appears to be associated with weapons: {}",
                            hits.join(", ")
                        ),
                        0.7,
                        Vec::new(),
                    )
                })
            }
            (EntityKind::Character, Attribute::Features) => {
                let powers = self.store.character_powers(entity.id.id)?;
                (!powers.is_empty()).then(|| {
                    (
                        format!("{name} has special features: {}", powers.join(", ")),
                        1.0,
                        powers,
                    )
                })
            }
            (EntityKind::Character, Attribute::Locations) => {
                return self.character_locations(entity);
            }
            (EntityKind::Location, Attribute::Defenses) => Some((
                format!(
                    "Defense information for {name} is not yet available in the current database. As a Batman location, it likely has sophisticated security systems."
                ),
                0.5,
                Vec::new(),
            )),
            (EntityKind::Location, Attribute::Features) => Some((
                format!(
                    "Feature information for {name} is not yet available in the current database. As a Batman location, it likely has advanced technological features."
                ),
                0.5,
                Vec::new(),
            )),
            _ => None,
        };

        Ok(found.map(|(explanation, confidence, items)| {
            let answer = self.composer.report(
                attribute.header(),
                &entity.canonical_name,
                &explanation,
                &items,
                &entity.description,
            );
            QueryResponse::new(answer, confidence, vec![entity.id], attribute.query_type())
        }))
    }

    fn vehicle_list(
        &self,
        entity: &Entity,
        list: VehicleList,
        attribute: Attribute,
        explain: impl FnOnce(String) -> String,
    ) -> Result<Option<(String, f64, Vec<String>)>> {
        let items = self.store.vehicle_list(entity.id.id, list)?;
        if items.is_empty() {
            let name = clean_name(&entity.canonical_name);
            return Ok(Some((not_catalogued(&name, attribute), 0.6, Vec::new())));
        }
        Ok(Some((explain(items.join(", ")), 1.0, items)))
    }

    fn character_locations(&self, entity: &Entity) -> Result<Option<QueryResponse>> {
        let linked = self.store.character_locations(entity.id.id)?;
        let Some((primary, others)) = linked.split_first() else {
            return Ok(None);
        };
        let name = clean_name(&entity.canonical_name);
        let mut explanation = format!("{name}'s primary location is {}", clean_name(&primary.location.name));
        if !primary.association.is_empty() {
            explanation.push_str(&format!(" ({})", primary.association));
        }
        explanation.push('.');
        if !others.is_empty() {
            let shown: Vec<String> = others
                .iter()
                .take(MAX_OTHER_LOCATIONS)
                .map(|l| clean_name(&l.location.name))
                .collect();
            explanation.push_str(&format!(" {name} is also associated with {}", shown.join(", ")));
            if others.len() > MAX_OTHER_LOCATIONS {
                explanation.push_str(&format!(" and {} more", others.len() - MAX_OTHER_LOCATIONS));
            }
            explanation.push('.');
        }

        let answer = self.composer.report(
            Attribute::Locations.header(),
            &entity.canonical_name,
            &explanation,
            &[],
            &entity.description,
        );
        let mut sources = vec![entity.id];
        sources.extend(
            linked
                .iter()
                .take(1 + MAX_OTHER_LOCATIONS)
                .map(|l| EntityId::new(EntityKind::Location, l.location.id)),
        );
        Ok(Some(QueryResponse::new(answer, 1.0, sources, QueryType::CharacterLocations)))
    }

    /// Allies, enemies or family of a character. Stored rows are read in
    /// their stored direction; the fallback table is consulted only when
    /// none of the requested kind exist.
    pub fn relations(&self, entity: &Entity, kind: RelationKind) -> Result<Option<QueryResponse>> {
        if entity.id.kind != EntityKind::Character {
            return Ok(None);
        }
        let mut related: Vec<&Entity> = Vec::new();
        for row in self.store.character_relations(entity.id.id)? {
            if RelationKind::from_label(&row.relationship) != Some(kind) {
                continue;
            }
            if let Some(e) = self.cache.get(EntityId::new(EntityKind::Character, row.character.id)) {
                push_unique(&mut related, e, entity.id);
            }
        }
        if related.is_empty() {
            for name in fallback_relations(&entity.folded, kind).iter().take(FALLBACK_RELATION_LIMIT) {
                let hit = self
                    .cache
                    .find_exact_in(EntityKind::Character, name)
                    .or_else(|| self.cache.find_containing(EntityKind::Character, name));
                if let Some(e) = hit {
                    push_unique(&mut related, e, entity.id);
                }
            }
        }
        if related.is_empty() {
            return Ok(None);
        }

        let names: Vec<String> = related.iter().map(|e| clean_name(&e.canonical_name)).collect();
        let answer = relation_sentence(&clean_name(&entity.canonical_name), kind, &names);
        let mut sources = vec![entity.id];
        sources.extend(related.iter().take(MAX_RELATED_SOURCES).map(|e| e.id));
        Ok(Some(QueryResponse::new(answer, 0.8, sources, QueryType::RelationshipQuery)))
    }

    /// Who uses a vehicle.
    pub fn users(&self, vehicle: &Entity) -> Result<Option<QueryResponse>> {
        if vehicle.id.kind != EntityKind::Vehicle {
            return Ok(None);
        }
        let users = self.store.vehicle_users(vehicle.id.id)?;
        if users.is_empty() {
            return Ok(None);
        }
        let names: Vec<String> = users.iter().map(|u| clean_name(&u.name)).collect();
        let answer = format!(
            "The {} is used by {}.",
            clean_name(&vehicle.canonical_name),
            join_names(&names)
        );
        let mut sources = vec![vehicle.id];
        sources.extend(
            users
                .iter()
                .take(MAX_RELATED_SOURCES)
                .map(|u| EntityId::new(EntityKind::Character, u.id)),
        );
        Ok(Some(QueryResponse::new(answer, 0.8, sources, QueryType::RelationshipQuery)))
    }

    /// "All vehicles" or "Batman's vehicles": a count plus the first
    /// `limit` entities.
    pub fn listing(&self, kind: EntityKind, owner: Option<&Entity>, limit: usize) -> Result<Option<QueryResponse>> {
        let ids: Vec<EntityId> = match owner {
            None => self.cache.canonical(kind).map(|e| e.id).collect(),
            Some(owner) if owner.id.kind == EntityKind::Character => match kind {
                EntityKind::Vehicle => self
                    .store
                    .character_vehicles(owner.id.id)?
                    .into_iter()
                    .map(|v| EntityId::new(EntityKind::Vehicle, v.id))
                    .collect(),
                EntityKind::Location => self
                    .store
                    .character_locations(owner.id.id)?
                    .into_iter()
                    .map(|l| EntityId::new(EntityKind::Location, l.location.id))
                    .collect(),
                _ => return Ok(None),
            },
            Some(_) => return Ok(None),
        };
        if ids.is_empty() {
            return Ok(None);
        }

        let total = ids.len();
        let names: Vec<String> = ids
            .iter()
            .take(LISTING_EXAMPLES)
            .filter_map(|id| self.cache.get(*id))
            .map(|e| clean_name(&e.canonical_name))
            .collect();
        let examples = if total > names.len() {
            let rest = total - names.len();
            let others = if rest == 1 { "other" } else { "others" };
            format!("{}, and {rest} {others}", names.join(", "))
        } else {
            join_names(&names)
        };
        let answer = match owner {
            None => format!(
                "I found {total} {} in the Batman universe database. Here are some examples: {examples}.",
                kind.plural()
            ),
            Some(owner) => format!(
                "Here are {total} {} associated with {}: {examples}.",
                kind.plural(),
                clean_name(&owner.canonical_name)
            ),
        };
        let sources = ids.into_iter().take(limit).collect();
        Ok(Some(QueryResponse::new(answer, 0.8, sources, QueryType::MultiEntityQuery)))
    }
}

fn not_catalogued(name: &str, attribute: Attribute) -> String {
    let (label, missing) = attribute.missing_labels();
    format!(
        "No specific {label} data is available for {name} in the current database. The {name} may have {missing} not yet catalogued."
    )
}

fn push_unique<'e>(list: &mut Vec<&'e Entity>, entity: &'e Entity, subject: EntityId) {
    if entity.id != subject && !list.iter().any(|e| e.id == entity.id) {
        list.push(entity);
    }
}

/// Hand-authored relations for a folded character name.
fn fallback_relations(folded: &str, kind: RelationKind) -> &'static [&'static str] {
    let entry = FALLBACK_RELATIONS
        .iter()
        .find(|(fragments, _, _)| fragments.iter().any(|f| folded.contains(f)));
    match (entry, kind) {
        (Some((_, allies, _)), RelationKind::Allies) => allies,
        (Some((_, _, enemies)), RelationKind::Enemies) => enemies,
        (None, RelationKind::Enemies) => DEFAULT_ENEMIES,
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComposerConfig;
    use crate::testing::fixture_store;

    struct Fixture {
        store: Store,
        cache: EntityCache,
        composer: Composer,
    }

    impl Fixture {
        fn new() -> Self {
            let store = fixture_store();
            let cache = EntityCache::build(&store).unwrap();
            let composer = Composer::new(ComposerConfig::default(), Some(1));
            Self { store, cache, composer }
        }

        fn resolver(&self) -> Resolver<'_> {
            Resolver::new(&self.store, &self.cache, &self.composer)
        }

        fn entity(&self, name: &str) -> &Entity {
            self.cache.find_exact(name).unwrap()
        }
    }

    #[test]
    fn test_relation_kind_detection() {
        assert_eq!(RelationKind::detect("Who are Batman's allies?"), Some(RelationKind::Allies));
        assert_eq!(RelationKind::detect("Who are the Joker's enemies"), Some(RelationKind::Enemies));
        assert_eq!(RelationKind::detect("batman family"), Some(RelationKind::Family));
        assert_eq!(RelationKind::detect("Who is Robin's father?"), Some(RelationKind::Family));
        assert_eq!(RelationKind::detect("Tell me about Season"), None, "son inside season");
        assert_eq!(RelationKind::from_label("Enemy"), Some(RelationKind::Enemies));
    }

    #[test]
    fn test_relation_sentence_shapes() {
        let names: Vec<String> = (1..=7).map(|i| format!("N{i}")).collect();
        assert_eq!(relation_sentence("Batman", RelationKind::Allies, &names[..1]), "Batman's ally is N1.");
        assert_eq!(
            relation_sentence("Batman", RelationKind::Enemies, &names[..3]),
            "Batman's enemies include N1, N2 and N3."
        );
        assert_eq!(
            relation_sentence("Batman", RelationKind::Allies, &names),
            "Batman's allies include N1, N2, N3, N4, N5, and 2 others."
        );
    }

    #[test]
    fn test_vehicle_weapons_listed() {
        let fx = Fixture::new();
        let mobile = fx.entity("Batmobile");
        let r = fx.resolver().attribute(mobile, Attribute::Weapons).unwrap().unwrap();
        assert_eq!(r.query_type, QueryType::Weapons);
        assert_eq!(r.confidence, 1.0);
        assert_eq!(r.source_entities, vec![mobile.id]);
        for weapon in ["Machine guns", "Grappling hooks", "Missiles"] {
            assert!(r.answer.contains(&format!("• {weapon}")), "{weapon} missing: {}", r.answer);
        }
        assert!(r.answer.starts_with("WEAPONS ANALYSIS - Batmobile"));
    }

    #[test]
    fn test_empty_vehicle_list_is_soft() {
        let fx = Fixture::new();
        let boat = fx.entity("Batboat");
        let r = fx.resolver().attribute(boat, Attribute::Weapons).unwrap().unwrap();
        assert_eq!(r.confidence, 0.6);
        assert!(r.answer.contains("No specific weapon data is available for Batboat"), "{}", r.answer);

        let r = fx.resolver().attribute(fx.entity("Batcycle"), Attribute::Specifications).unwrap().unwrap();
        assert_eq!(r.confidence, 0.6);
        assert_eq!(r.query_type, QueryType::Specifications);
    }

    #[test]
    fn test_vehicle_specifications() {
        let fx = Fixture::new();
        let r = fx.resolver().attribute(fx.entity("Batmobile"), Attribute::Specifications).unwrap().unwrap();
        assert_eq!(r.confidence, 1.0);
        assert!(
            r.answer.contains("Batmobile specifications: length: 6 m; max speed: 200 mph; armor: Reinforced titanium plating; crew capacity: 2"),
            "{}",
            r.answer
        );
    }

    #[test]
    fn test_character_weapons_from_description() {
        let fx = Fixture::new();
        let r = fx.resolver().attribute(fx.entity("Joker"), Attribute::Weapons).unwrap().unwrap();
        assert_eq!(r.confidence, 0.7);
        assert!(r.answer.contains("associated with weapons: armed"), "{}", r.answer);

        let none = fx.resolver().attribute(fx.entity("Riddler"), Attribute::Weapons).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_character_features_from_powers() {
        let fx = Fixture::new();
        let r = fx.resolver().attribute(fx.entity("Batman"), Attribute::Features).unwrap().unwrap();
        assert_eq!(r.confidence, 1.0);
        assert!(r.answer.contains("• Detective skills"), "{}", r.answer);
    }

    #[test]
    fn test_location_defenses_soft() {
        let fx = Fixture::new();
        let r = fx.resolver().attribute(fx.entity("Batcave"), Attribute::Defenses).unwrap().unwrap();
        assert_eq!(r.confidence, 0.5);
        assert_eq!(r.query_type, QueryType::Defenses);
    }

    #[test]
    fn test_character_locations_primary_first() {
        let fx = Fixture::new();
        let batman = fx.entity("Batman");
        let r = fx.resolver().attribute(batman, Attribute::Locations).unwrap().unwrap();
        assert_eq!(r.query_type, QueryType::CharacterLocations);
        assert!(r.answer.contains("Batman's primary location is Wayne Manor (residence)."), "{}", r.answer);
        assert!(r.answer.contains("also associated with Batcave, Gotham City."), "{}", r.answer);
        assert_eq!(r.source_entities[0], batman.id);
        assert_eq!(r.source_entities.len(), 4);

        let none = fx.resolver().attribute(fx.entity("Bane"), Attribute::Locations).unwrap();
        assert!(none.is_none(), "no stored locations");
        let none = fx.resolver().attribute(fx.entity("Batmobile"), Attribute::Locations).unwrap();
        assert!(none.is_none(), "vehicles have no whereabouts");
    }

    #[test]
    fn test_stored_relations_directional() {
        let fx = Fixture::new();
        let r = fx.resolver().relations(fx.entity("Batman"), RelationKind::Enemies).unwrap().unwrap();
        assert_eq!(r.answer, "Batman's enemies include Joker and Bane.");
        assert_eq!(r.confidence, 0.8);
        assert_eq!(r.source_entities.len(), 3);

        let r = fx.resolver().relations(fx.entity("Harley_Quinn"), RelationKind::Allies).unwrap();
        assert!(r.is_none(), "Joker -> Harley is not read backwards");
    }

    #[test]
    fn test_fallback_relations_when_nothing_stored() {
        let fx = Fixture::new();
        let r = fx.resolver().relations(fx.entity("Batman"), RelationKind::Allies).unwrap().unwrap();
        assert_eq!(
            r.answer,
            "Batman's allies include Robin (Dick Grayson), Nightwing, Alfred Pennyworth, Commissioner Gordon and Catwoman."
        );
        assert_eq!(r.source_entities.len(), 4, "subject plus three related");

        let r = fx.resolver().relations(fx.entity("Riddler"), RelationKind::Enemies).unwrap().unwrap();
        assert_eq!(r.answer, "Riddler's enemy is Batman.");

        let r = fx.resolver().relations(fx.entity("Riddler"), RelationKind::Family).unwrap();
        assert!(r.is_none());
    }

    #[test]
    fn test_vehicle_users() {
        let fx = Fixture::new();
        let r = fx.resolver().users(fx.entity("Batmobile")).unwrap().unwrap();
        assert_eq!(r.answer, "The Batmobile is used by Batman and Robin (Dick Grayson).");
        assert!(fx.resolver().users(fx.entity("Batboat")).unwrap().is_none());
    }

    #[test]
    fn test_listing_all_and_owned() {
        let fx = Fixture::new();
        let r = fx.resolver().listing(EntityKind::Vehicle, None, 10).unwrap().unwrap();
        assert_eq!(r.query_type, QueryType::MultiEntityQuery);
        assert_eq!(r.source_entities.len(), 6);
        assert!(
            r.answer.starts_with("I found 6 vehicles in the Batman universe database. Here are some examples: Batmobile, Batwing, Batcycle, Batboat, Jokermobile, and 1 other."),
            "{}",
            r.answer
        );

        let r = fx.resolver().listing(EntityKind::Vehicle, None, 2).unwrap().unwrap();
        assert_eq!(r.source_entities.len(), 2);

        let batman = fx.entity("Batman");
        let r = fx.resolver().listing(EntityKind::Vehicle, Some(batman), 10).unwrap().unwrap();
        assert_eq!(r.answer, "Here are 3 vehicles associated with Batman: Batmobile, Batwing and Batcycle.");

        assert!(fx.resolver().listing(EntityKind::Storyline, Some(batman), 10).unwrap().is_none());
    }
}
