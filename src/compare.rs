//! Two-entity comparisons.
//!
//! Vehicles compare on stored numbers where the store has them and on the
//! heuristic spec tables otherwise. Characters compare on the hand-authored
//! rankings in [`crate::knowledge`].

use std::sync::LazyLock;

use gotham_types::{EntityId, EntityKind, QueryResponse, QueryType};
use regex::Regex;
use tracing::debug;

use crate::cache::Entity;
use crate::compose::clean_name;
use crate::error::Result;
use crate::knowledge::{
    COMBAT_RANKING, INTELLIGENCE_RANKING, NEUTRAL_RANK, RANK_HINTS, RANKING_ALIASES, SPEED_RANKING,
    STRENGTH_RANKING, VEHICLE_ESTIMATE_DEFAULT, VEHICLE_ESTIMATES, VEHICLE_NAME_ALIASES,
    VEHICLE_SPECS,
};
use crate::matcher::{fold, mentions};
use crate::store::{Store, VehicleList};

static RE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)").unwrap());

// ── Dimensions ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Strength,
    Intelligence,
    Speed,
    Combat,
    Armor,
    Weapons,
    Size,
    /// No dimension named: weigh everything.
    Overall,
}

/// Checked in order; the first dimension with a keyword in the query wins.
const DIMENSION_KEYWORDS: &[(Dimension, &[&str])] = &[
    (Dimension::Strength, &["stronger", "strength", "power", "tough", "muscle", "force"]),
    (Dimension::Intelligence, &["smarter", "intelligent", "clever", "genius", "iq", "brain"]),
    (Dimension::Speed, &["faster", "speed", "quick", "swift", "rapid"]),
    (Dimension::Combat, &["better fighter", "combat", "fighting", "martial arts", "skills"]),
    (Dimension::Armor, &["armored", "protected", "defensive", "armor", "defense"]),
    (Dimension::Weapons, &["armed", "weapons", "firepower", "arsenal"]),
    (Dimension::Size, &["bigger", "larger", "size", "massive"]),
];

impl Dimension {
    pub fn detect(query: &str) -> Self {
        let lower = query.to_lowercase();
        DIMENSION_KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| mentions(&lower, w)))
            .map(|(d, _)| *d)
            .unwrap_or(Self::Overall)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Intelligence => "intelligence",
            Self::Speed => "speed",
            Self::Combat => "combat",
            Self::Armor => "armor",
            Self::Weapons => "weapons",
            Self::Size => "size",
            Self::Overall => "overall",
        }
    }

    fn ranking(&self) -> &'static [(&'static str, u8)] {
        match self {
            Self::Strength => STRENGTH_RANKING,
            Self::Intelligence => INTELLIGENCE_RANKING,
            Self::Speed => SPEED_RANKING,
            Self::Combat => COMBAT_RANKING,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub winner: Option<EntityId>,
    pub explanation: String,
    pub confidence: f64,
}

impl Comparison {
    fn new(winner: Option<EntityId>, explanation: String, confidence: f64) -> Self {
        Self {
            winner,
            explanation,
            confidence,
        }
    }

    pub fn into_response(self, a: &Entity, b: &Entity) -> QueryResponse {
        QueryResponse::new(
            self.explanation,
            self.confidence,
            vec![a.id, b.id],
            QueryType::ComparativeAnalysis,
        )
    }
}

// ── Character rankings ───────────────────────────────────────────────────

/// Ranking for a character name: alias folding, exact key, containment
/// either way, then the category hints.
pub fn character_rank(dimension: Dimension, name: &str) -> u8 {
    let folded = fold(name);
    let key = RANKING_ALIASES
        .iter()
        .find(|(alias, _)| fold(alias) == folded)
        .map(|(_, target)| fold(target))
        .unwrap_or(folded);

    let table = dimension.ranking();
    let keyed: Vec<(String, u8)> = table.iter().map(|(k, v)| (fold(k), *v)).collect();
    if let Some((_, v)) = keyed.iter().find(|(k, _)| *k == key) {
        return *v;
    }
    if !key.is_empty() {
        if let Some((_, v)) = keyed.iter().find(|(k, _)| key.contains(k.as_str()) || k.contains(&key)) {
            return *v;
        }
    }
    RANK_HINTS
        .iter()
        .find(|(fragments, _)| fragments.iter().any(|f| key.contains(f)))
        .map(|(_, v)| *v)
        .unwrap_or(NEUTRAL_RANK)
}

fn reasoning(dimension: Dimension, a: &str, b: &str) -> String {
    let lines: &[(&str, &str)] = match dimension {
        Dimension::Strength => &[
            ("bane", " Bane's venom-enhanced strength gives him a significant physical advantage."),
            ("batman", " Batman relies more on skill and technology than raw physical strength."),
            ("joker", " Joker's strength lies in unpredictability rather than physical power."),
        ],
        Dimension::Intelligence => &[
            ("batman", " Batman is renowned as the World's Greatest Detective."),
            ("riddler", " Riddler's obsession with puzzles showcases his analytical mind."),
            ("joker", " Joker combines intelligence with complete unpredictability."),
        ],
        Dimension::Speed => &[
            ("nightwing", " Nightwing's acrobatic background gives him exceptional agility."),
            ("catwoman", " Catwoman's feline-inspired agility makes her extremely quick."),
            ("bane", " Bane's massive size limits his speed and agility."),
        ],
        _ => &[],
    };
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    lines
        .iter()
        .filter(|(who, _)| a.contains(who) || b.contains(who))
        .map(|(_, line)| *line)
        .collect()
}

// ── Vehicle profiles ─────────────────────────────────────────────────────

/// Comparable figures for one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleProfile {
    pub max_speed: String,
    pub armor: u32,
    pub weapons: u32,
    pub defenses: u32,
    pub length: Option<String>,
}

impl VehicleProfile {
    fn heuristic(max_speed: &str, armor: u32, weapons: u32) -> Self {
        Self {
            max_speed: max_speed.to_string(),
            armor,
            weapons,
            defenses: 0,
            length: None,
        }
    }

    fn speed(&self) -> Option<f64> {
        leading_number(&self.max_speed)
    }

    fn overall(&self) -> f64 {
        self.speed().unwrap_or(0.0) / 100.0 + f64::from(self.armor) + f64::from(self.weapons)
    }
}

/// First number in a free-text measurement ("200 mph" -> 200).
pub fn leading_number(text: &str) -> Option<f64> {
    RE_NUMBER.captures(text)?.get(1)?.as_str().parse().ok()
}

fn heuristic_profile(name: &str) -> VehicleProfile {
    let key: String = name
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .collect();
    let key = VEHICLE_NAME_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, target)| target.to_string())
        .unwrap_or(key);
    if let Some((_, speed, armor, weapons)) = VEHICLE_SPECS.iter().find(|(k, ..)| *k == key) {
        return VehicleProfile::heuristic(speed, *armor, *weapons);
    }
    let lower = name.to_lowercase();
    if let Some((_, speed, armor, weapons)) = VEHICLE_ESTIMATES
        .iter()
        .find(|(fragments, ..)| fragments.iter().any(|f| lower.contains(f)))
    {
        return VehicleProfile::heuristic(speed, *armor, *weapons);
    }
    let (speed, armor, weapons) = VEHICLE_ESTIMATE_DEFAULT;
    VehicleProfile::heuristic(speed, armor, weapons)
}

// ── Comparator ───────────────────────────────────────────────────────────

pub struct Comparator<'a> {
    store: &'a Store,
}

impl<'a> Comparator<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn compare(&self, a: &Entity, b: &Entity, dimension: Dimension) -> Result<Comparison> {
        debug!(a = %a.canonical_name, b = %b.canonical_name, dimension = dimension.as_str(), "comparing");
        match (a.id.kind, b.id.kind) {
            (EntityKind::Character, EntityKind::Character) => Ok(compare_characters(a, b, dimension)),
            (EntityKind::Vehicle, EntityKind::Vehicle) => {
                let pa = self.profile(a)?;
                let pb = self.profile(b)?;
                Ok(compare_vehicles(a, &pa, b, &pb, dimension))
            }
            (ka, kb) => Ok(Comparison::new(
                None,
                format!(
                    "Comparison of {} between {} ({ka}) and {} ({kb}) is not currently supported.",
                    dimension.as_str(),
                    clean_name(&a.canonical_name),
                    clean_name(&b.canonical_name)
                ),
                0.5,
            )),
        }
    }

    /// Stored figures when the vehicle has any, heuristic tables otherwise.
    pub fn profile(&self, vehicle: &Entity) -> Result<VehicleProfile> {
        let specs = self.store.vehicle_specs(vehicle.id.id)?;
        let weapons = self.store.vehicle_list(vehicle.id.id, VehicleList::Weapons)?.len() as u32;
        let defenses = self.store.vehicle_list(vehicle.id.id, VehicleList::Defenses)?.len() as u32;
        if specs.is_none() && weapons == 0 && defenses == 0 {
            return Ok(heuristic_profile(&vehicle.canonical_name));
        }
        let specs = specs.unwrap_or_default();
        let filled = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        Ok(VehicleProfile {
            max_speed: filled(&specs.max_speed).unwrap_or_else(|| "Unknown".to_string()),
            armor: if filled(&specs.armor).is_some() { 5 } else { 3 },
            weapons,
            defenses,
            length: filled(&specs.length),
        })
    }
}

fn compare_characters(a: &Entity, b: &Entity, dimension: Dimension) -> Comparison {
    let (na, nb) = (clean_name(&a.canonical_name), clean_name(&b.canonical_name));
    match dimension {
        Dimension::Size => Comparison::new(
            None,
            format!("There is no reliable size data to compare {na} and {nb}."),
            0.5,
        ),
        Dimension::Overall => {
            let total = |name: &str| -> u32 {
                [Dimension::Strength, Dimension::Intelligence, Dimension::Speed, Dimension::Combat]
                    .into_iter()
                    .map(|d| u32::from(character_rank(d, name)))
                    .sum()
            };
            let (sa, sb) = (total(&a.canonical_name), total(&b.canonical_name));
            let text = |w: &str, l: &str| {
                format!("Overall, {w} has the edge over {l} across strength, intelligence, speed and combat.")
            };
            if sa > sb {
                Comparison::new(Some(a.id), text(&na, &nb), 0.6)
            } else if sb > sa {
                Comparison::new(Some(b.id), text(&nb, &na), 0.6)
            } else {
                Comparison::new(None, format!("Overall, {na} and {nb} appear to be evenly matched."), 0.6)
            }
        }
        _ => {
            let sa = character_rank(dimension, &a.canonical_name);
            let sb = character_rank(dimension, &b.canonical_name);
            let dim = dimension.as_str();
            let mut result = if sa > sb {
                Comparison::new(
                    Some(a.id),
                    format!("Based on their abilities and background, {na} surpasses {nb} in {dim}."),
                    0.8,
                )
            } else if sb > sa {
                Comparison::new(
                    Some(b.id),
                    format!("Based on their abilities and background, {nb} surpasses {na} in {dim}."),
                    0.8,
                )
            } else {
                Comparison::new(None, format!("{na} and {nb} appear to be evenly matched in {dim}."), 0.6)
            };
            result.explanation.push_str(&reasoning(dimension, &na, &nb));
            result
        }
    }
}

fn compare_vehicles(a: &Entity, pa: &VehicleProfile, b: &Entity, pb: &VehicleProfile, dimension: Dimension) -> Comparison {
    let (na, nb) = (clean_name(&a.canonical_name), clean_name(&b.canonical_name));
    match dimension {
        Dimension::Speed => {
            let (Some(sa), Some(sb)) = (pa.speed(), pb.speed()) else {
                return Comparison::new(
                    None,
                    format!(
                        "The {na} lists a top speed of {} and the {nb} {}, but an exact comparison isn't possible.",
                        pa.max_speed, pb.max_speed
                    ),
                    0.5,
                );
            };
            if sa > sb {
                Comparison::new(
                    Some(a.id),
                    format!(
                        "The {na} is faster with a top speed of {} compared to the {nb}'s {}.",
                        pa.max_speed, pb.max_speed
                    ),
                    0.8,
                )
            } else if sb > sa {
                Comparison::new(
                    Some(b.id),
                    format!(
                        "The {nb} is faster with a top speed of {} compared to the {na}'s {}.",
                        pb.max_speed, pa.max_speed
                    ),
                    0.8,
                )
            } else {
                Comparison::new(
                    None,
                    format!(
                        "Both the {na} and {nb} have similar top speeds of {} and {} respectively.",
                        pa.max_speed, pb.max_speed
                    ),
                    0.6,
                )
            }
        }
        Dimension::Armor => {
            let (ta, tb) = (pa.armor + pa.defenses, pb.armor + pb.defenses);
            let text = |w: &str, l: &str| format!("The {w} has superior armor and defensive systems compared to the {l}.");
            if ta > tb {
                Comparison::new(Some(a.id), text(&na, &nb), 0.7)
            } else if tb > ta {
                Comparison::new(Some(b.id), text(&nb, &na), 0.7)
            } else {
                Comparison::new(
                    None,
                    format!("Both the {na} and {nb} have comparable armor and defensive capabilities."),
                    0.7,
                )
            }
        }
        Dimension::Weapons => {
            let (wa, wb) = (pa.weapons, pb.weapons);
            if wa > wb {
                Comparison::new(
                    Some(a.id),
                    format!("The {na} has more firepower with {wa} weapon systems compared to the {nb}'s {wb}."),
                    0.7,
                )
            } else if wb > wa {
                Comparison::new(
                    Some(b.id),
                    format!("The {nb} has more firepower with {wb} weapon systems compared to the {na}'s {wa}."),
                    0.7,
                )
            } else {
                Comparison::new(
                    None,
                    format!("Both vehicles have similar firepower with {wa} and {wb} weapon systems respectively."),
                    0.7,
                )
            }
        }
        Dimension::Size => {
            let la = pa.length.as_deref().and_then(|l| leading_number(l).map(|n| (l, n)));
            let lb = pb.length.as_deref().and_then(|l| leading_number(l).map(|n| (l, n)));
            let (Some((ta, va)), Some((tb, vb))) = (la, lb) else {
                return Comparison::new(
                    None,
                    format!("Size data for the {na} and {nb} is incomplete, so an exact comparison isn't possible."),
                    0.5,
                );
            };
            if va > vb {
                Comparison::new(Some(a.id), format!("The {na} is larger at {ta} compared to the {nb}'s {tb}."), 0.7)
            } else if vb > va {
                Comparison::new(Some(b.id), format!("The {nb} is larger at {tb} compared to the {na}'s {ta}."), 0.7)
            } else {
                Comparison::new(None, format!("Both the {na} and {nb} are of similar size ({ta} and {tb})."), 0.6)
            }
        }
        _ => {
            let (sa, sb) = (pa.overall(), pb.overall());
            let text = |w: &str| format!("Overall, the {w} appears to be the superior vehicle with better combined capabilities.");
            if sa > sb {
                Comparison::new(Some(a.id), text(&na), 0.6)
            } else if sb > sa {
                Comparison::new(Some(b.id), text(&nb), 0.6)
            } else {
                Comparison::new(
                    None,
                    format!("Both the {na} and {nb} are well-matched vehicles with similar overall capabilities."),
                    0.6,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EntityCache;
    use crate::testing::fixture_store;

    fn setup() -> (Store, EntityCache) {
        let store = fixture_store();
        let cache = EntityCache::build(&store).unwrap();
        (store, cache)
    }

    #[test]
    fn test_dimension_detection() {
        assert_eq!(Dimension::detect("Who is faster, Batmobile or Batwing?"), Dimension::Speed);
        assert_eq!(Dimension::detect("Who is stronger: Batman vs Bane"), Dimension::Strength);
        assert_eq!(Dimension::detect("Batmobile vs Batwing firepower"), Dimension::Weapons);
        assert_eq!(Dimension::detect("Batman vs Joker"), Dimension::Overall);
        assert_eq!(Dimension::detect("who is the better fighter"), Dimension::Combat);
    }

    #[test]
    fn test_character_rank_lookup_order() {
        assert_eq!(character_rank(Dimension::Strength, "Bane"), 9);
        assert_eq!(character_rank(Dimension::Strength, "Bruce Wayne"), 7, "alias folds to batman");
        assert_eq!(character_rank(Dimension::Intelligence, "Two-Face"), 7);
        assert_eq!(character_rank(Dimension::Strength, "Robin_(Tim_Drake)"), 5, "containment");
        assert_eq!(character_rank(Dimension::Armor, "Killer_Moth"), 8, "category hint");
        assert_eq!(character_rank(Dimension::Speed, "Alfred_Pennyworth"), NEUTRAL_RANK);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("200 mph"), Some(200.0));
        assert_eq!(leading_number("approx. 12.5 m"), Some(12.5));
        assert_eq!(leading_number("Unknown"), None);
    }

    #[test]
    fn test_character_strength_with_reasoning() {
        let (store, cache) = setup();
        let cmp = Comparator::new(&store);
        let batman = cache.find_exact("Batman").unwrap();
        let bane = cache.find_exact("Bane").unwrap();
        let r = cmp.compare(batman, bane, Dimension::Strength).unwrap();
        assert_eq!(r.winner, Some(bane.id));
        assert_eq!(r.confidence, 0.8);
        assert_eq!(
            r.explanation,
            "Based on their abilities and background, Bane surpasses Batman in strength. \
             Bane's venom-enhanced strength gives him a significant physical advantage. \
             Batman relies more on skill and technology than raw physical strength."
        );
    }

    #[test]
    fn test_character_tie() {
        let (store, cache) = setup();
        let cmp = Comparator::new(&store);
        let nightwing = cache.find_exact("Nightwing").unwrap();
        let catwoman = cache.find_exact("Catwoman").unwrap();
        let r = cmp.compare(nightwing, catwoman, Dimension::Speed).unwrap();
        assert_eq!(r.winner, None);
        assert_eq!(r.confidence, 0.6);
        assert!(r.explanation.starts_with("Nightwing and Catwoman appear to be evenly matched in speed."));
        assert!(r.explanation.contains("feline-inspired"));
    }

    #[test]
    fn test_character_overall() {
        let (store, cache) = setup();
        let cmp = Comparator::new(&store);
        let batman = cache.find_exact("Batman").unwrap();
        let joker = cache.find_exact("Joker").unwrap();
        let r = cmp.compare(batman, joker, Dimension::Overall).unwrap();
        assert_eq!(r.winner, Some(batman.id));
        assert_eq!(r.confidence, 0.6);

        let r = cmp.compare(batman, joker, Dimension::Size).unwrap();
        assert_eq!((r.winner, r.confidence), (None, 0.5));
    }

    #[test]
    fn test_vehicle_profiles() {
        let (store, cache) = setup();
        let cmp = Comparator::new(&store);
        let profile = |name: &str| cmp.profile(cache.find_exact(name).unwrap()).unwrap();

        let mobile = profile("Batmobile");
        assert_eq!((mobile.armor, mobile.weapons, mobile.defenses), (5, 3, 2));
        assert_eq!(mobile.length.as_deref(), Some("6 m"));

        let wing = profile("Batwing");
        assert_eq!((wing.max_speed.as_str(), wing.armor, wing.weapons), ("400 mph", 3, 1));

        assert_eq!(profile("Batcycle"), VehicleProfile::heuristic("180 mph", 4, 3));
        assert_eq!(profile("Jokermobile"), VehicleProfile::heuristic("150 mph", 6, 5));
        assert_eq!(profile("Penguin_Submarine"), VehicleProfile::heuristic("100 mph", 4, 3));
    }

    #[test]
    fn test_vehicle_dimensions() {
        let (store, cache) = setup();
        let cmp = Comparator::new(&store);
        let mobile = cache.find_exact("Batmobile").unwrap();
        let wing = cache.find_exact("Batwing").unwrap();
        let cycle = cache.find_exact("Batcycle").unwrap();

        let r = cmp.compare(mobile, wing, Dimension::Speed).unwrap();
        assert_eq!(r.winner, Some(wing.id));
        assert_eq!(
            r.explanation,
            "The Batwing is faster with a top speed of 400 mph compared to the Batmobile's 200 mph."
        );

        let r = cmp.compare(mobile, cycle, Dimension::Armor).unwrap();
        assert_eq!((r.winner, r.confidence), (Some(mobile.id), 0.7));

        let r = cmp.compare(mobile, wing, Dimension::Size).unwrap();
        assert_eq!(r.winner, Some(wing.id));
        assert_eq!(r.explanation, "The Batwing is larger at 12 m compared to the Batmobile's 6 m.");

        let r = cmp.compare(mobile, cycle, Dimension::Size).unwrap();
        assert_eq!(r.confidence, 0.5, "heuristic profiles carry no length");

        let r = cmp.compare(mobile, wing, Dimension::Overall).unwrap();
        assert_eq!(r.winner, Some(mobile.id));
    }

    #[test]
    fn test_mixed_kinds_unsupported() {
        let (store, cache) = setup();
        let cmp = Comparator::new(&store);
        let batman = cache.find_exact("Batman").unwrap();
        let mobile = cache.find_exact("Batmobile").unwrap();
        let r = cmp.compare(batman, mobile, Dimension::Speed).unwrap();
        assert_eq!(r.winner, None);
        assert_eq!(r.confidence, 0.5);
        assert!(r.explanation.contains("not currently supported"));

        let response = r.into_response(batman, mobile);
        assert_eq!(response.query_type, QueryType::ComparativeAnalysis);
        assert_eq!(response.source_entities, vec![batman.id, mobile.id]);
    }
}
