//! Query classification.
//!
//! A fixed, ordered list of [`Route`]s. Each route's detector either
//! recognises the query and returns an [`Intent`] or passes. The chatbot
//! dispatches the first intent that yields an answer, so order decides
//! which reading of an ambiguous question wins.

use std::sync::LazyLock;

use gotham_types::EntityKind;
use regex::Regex;

use crate::compare::Dimension;
use crate::knowledge::{
    CHARACTER_KEYWORDS, LOCATION_KEYWORDS, RELATIONSHIP_KEYWORDS, SIDEKICK_KEYWORDS,
    VEHICLE_KEYWORDS,
};
use crate::matcher::mentions;
use crate::relations::{Attribute, RelationKind};

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

static RE_ASK_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:what|which|who|where|how)\s+(?:are|is|does|do|were|was)\s+)?(?:the\s+)?").unwrap()
});

// ── Attribute patterns ───────────────────────────────────────────────────

static ATTRIBUTE_PATTERNS: LazyLock<Vec<(Attribute, Vec<Regex>)>> = LazyLock::new(|| {
    vec![
        (
            Attribute::Weapons,
            compile(&[
                r"what weapons does (?:the )?(.+?) have",
                r"what guns does (?:the )?(.+?) have",
                r"what arms does (?:the )?(.+?) have",
                r"what weapons are on (?:the )?(.+?)\s*\??$",
                r"what weapons are (?:in|inside|aboard) (?:the )?(.+?)\s*\??$",
                r"what are (?:the )?(.+?) weapons",
                r"what is (?:the )?(.+?) armed with",
                r"does (?:the )?(.+?) have weapons",
                r"weapons of (?:the )?(.+?)\s*\??$",
                r"weapons on (?:the )?(.+?)\s*\??$",
                r"the (.+?) weapons",
                r"(.+?) weapons",
            ]),
        ),
        (
            Attribute::Defenses,
            compile(&[
                r"what (?:defenses|defense|armor|protection) does (?:the )?(.+?) have",
                r"what (?:defensive systems|defenses) does (?:the )?(.+?) have",
                r"what (?:defenses|defense|armor|protection) are on (?:the )?(.+?)\s*\??$",
                r"what (?:defenses|defense|armor|protection) are (?:in|inside) (?:the )?(.+?)\s*\??$",
                r"(.+?) (?:defenses|defense|armor|protection)",
                r"(?:defenses|defense|armor|protection) of (?:the )?(.+?)\s*\??$",
                r"(?:defenses|defense|armor|protection) on (?:the )?(.+?)\s*\??$",
                r"how is (?:the )?(.+?) (?:protected|defended|armored)",
                r"does (?:the )?(.+?) have (?:defenses|armor|protection)",
            ]),
        ),
        (
            Attribute::Features,
            compile(&[
                r"what (?:features|abilities|systems|capabilities) does (?:the )?(.+?) have",
                r"what (?:special features|features) does (?:the )?(.+?) have",
                r"what (?:features|abilities|systems|capabilities) are on (?:the )?(.+?)\s*\??$",
                r"what (?:features|abilities|systems|capabilities) are (?:in|inside) (?:the )?(.+?)\s*\??$",
                r"(.+?) (?:features|abilities|systems|capabilities)",
                r"(?:features|abilities|systems) of (?:the )?(.+?)\s*\??$",
                r"(?:features|abilities|systems) on (?:the )?(.+?)\s*\??$",
                r"what can (?:the )?(.+?) do",
                r"does (?:the )?(.+?) have (?:features|abilities|systems)",
            ]),
        ),
        (
            Attribute::Specifications,
            compile(&[
                r"(?:specs|specifications|details) (?:of|for) (.+?)\s*\??$",
                r"(.+?) (?:specs|specifications|technical details)",
                r"what (?:are|is) (.+?) (?:specs|specifications)",
            ]),
        ),
        (
            Attribute::Locations,
            compile(&[
                r"where (?:does|do|is|are) (.+?) (?:live|stay|operate|hang out|work)",
                r"(?:location|locations) (?:of|for) (.+?)\s*\??$",
                r"(.+?) (?:location|base|hideout|lair)\b",
            ]),
        ),
    ]
});

/// Words that mark a multi-entity question rather than an attribute subject.
const COMPARISON_WORDS: &[&str] = &["vs", "versus", "against", "compare", "compared", "difference"];

// ── Comparison patterns ──────────────────────────────────────────────────

static COMPARISON_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^(?:please\s+)?compare\s+(?:the\s+)?(.+?)\s+(?:to|with|and|against|vs\.?|versus)\s+(?:the\s+)?(.+?)\s*\??$",
        r"difference between\s+(?:the\s+)?(.+?)\s+and\s+(?:the\s+)?(.+?)\s*\??$",
        r"(?:who|which)\s+is\s+(?:faster|stronger|smarter|bigger|larger|tougher|better(?:\s+fighter)?|more\s+\w+)\s*[:,]?\s*(?:the\s+)?(.+?)\s+or\s+(?:the\s+)?(.+?)\s*\??$",
        r"(.+?)\s+(?:vs\.?|versus|against)\s+(.+?)\s*\??$",
    ])
});

// ── Relationship patterns ────────────────────────────────────────────────

static RE_USERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"who\s+(?:uses|drives|pilots|flies|rides|operates)\s+(?:the\s+)?(.+?)\s*\??$").unwrap()
});
static RE_WHEREABOUTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"where\s+(?:is|are)\s+(?:the\s+)?(.+?)\s+(?:located|based)\s*\??$").unwrap()
});
static RELATION_SUBJECT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(.+?)'s\s+(?:\w+\s+)?\w+",
        r"\w+\s+(?:of|for|to)\s+(?:the\s+)?(.+?)\s*\??$",
        r"^(?:who\s+are\s+)?(?:the\s+)?(.+?)\s+(?:allies|enemies|family|villains|friends|foes|partners|rogues)\s*\??$",
    ])
});

// ── Listing patterns ─────────────────────────────────────────────────────

const LISTING_TRIGGERS: &[&str] = &["all", "list", "every", "show"];
const LISTING_KINDS: &[(EntityKind, &[&str])] = &[
    (EntityKind::Vehicle, &["vehicle", "vehicles", "car", "cars", "plane", "planes", "boat", "boats"]),
    (EntityKind::Location, &["location", "locations", "place", "places", "building", "buildings", "hideouts"]),
    (EntityKind::Character, &["character", "characters", "people", "person", "members"]),
    (EntityKind::Organization, &["organization", "organizations", "group", "groups", "team", "teams"]),
    (EntityKind::Storyline, &["storyline", "storylines", "story", "stories"]),
];
/// Leading words dropped from a listing owner span.
const LISTING_FILLER: &[&str] = &[
    "tell", "me", "about", "all", "of", "list", "show", "every", "the", "what", "are", "name",
];

static RE_OWNED_PLURAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(.+?)'s\s+(?:\w+\s+)?(?:vehicles|cars|rides|locations|places|hideouts)\b").unwrap()
});
static RE_OWNED_QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"what\s+(?:vehicles|cars|locations|places)\s+(?:does|do)\s+(?:the\s+)?(.+?)\s+(?:use|have|drive|own|visit|frequent)").unwrap()
});

// ── Character-vehicle patterns ───────────────────────────────────────────

static VEHICLE_OWNER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"what (?:does|do) (?:the )?(.+?) (?:drive|use|pilot|operate|ride)",
        r"what (?:car|vehicle|transportation) (?:does|do) (?:the )?(.+?) (?:drive|use|have)",
        r"(.+?)(?:'s|s) (?:car|vehicle|mobile)",
    ])
});

// ── Intents ──────────────────────────────────────────────────────────────

/// Keyword class chosen by the catch-all route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupClass {
    Vehicle,
    Location,
    Relationship,
    Sidekick,
    Character,
    General,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Attribute { attribute: Attribute, subject: String },
    Compare { first: String, second: String, dimension: Dimension },
    Relations { subject: String, kind: RelationKind },
    Users { vehicle: String },
    Listing { kind: EntityKind, owner: Option<String> },
    Lookup(LookupClass),
}

/// One step of the cascade.
#[derive(Clone, Copy)]
pub struct Route {
    pub name: &'static str,
    pub detect: fn(&str) -> Option<Intent>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route").field("name", &self.name).finish()
    }
}

pub fn default_routes() -> Vec<Route> {
    vec![
        Route { name: "attribute", detect: detect_attribute },
        Route { name: "comparison", detect: detect_comparison },
        Route { name: "relationship", detect: detect_relationship },
        Route { name: "listing", detect: detect_listing },
        Route { name: "fallback", detect: detect_fallback },
    ]
}

/// Lowercased, curly apostrophes straightened.
fn prepare(query: &str) -> String {
    query.trim().to_lowercase().replace('’', "'")
}

/// Strip question lead-ins, articles, possessives and punctuation from a
/// captured entity span.
pub fn clean_subject(span: &str) -> String {
    let trimmed = span.trim().trim_end_matches(['?', '.', '!', ',']).trim();
    let stripped = RE_ASK_PREFIX.replace(trimmed, "");
    let stripped = stripped.trim();
    let stripped = stripped.strip_suffix("'s").unwrap_or(stripped);
    stripped.trim().to_string()
}

fn has_comparison_word(text: &str) -> bool {
    COMPARISON_WORDS.iter().any(|w| mentions(text, w))
}

// ── Detectors ────────────────────────────────────────────────────────────

pub fn detect_attribute(query: &str) -> Option<Intent> {
    let lower = prepare(query);
    for (attribute, patterns) in ATTRIBUTE_PATTERNS.iter() {
        let Some(span) = patterns
            .iter()
            .find_map(|re| re.captures(&lower).and_then(|c| c.get(1)))
        else {
            continue;
        };
        let subject = clean_subject(span.as_str());
        if subject.is_empty() || has_comparison_word(&subject) {
            return None;
        }
        return Some(Intent::Attribute {
            attribute: *attribute,
            subject,
        });
    }
    None
}

pub fn detect_comparison(query: &str) -> Option<Intent> {
    let lower = prepare(query);
    let caps = COMPARISON_PATTERNS.iter().find_map(|re| re.captures(&lower))?;
    let side = |i: usize| {
        let raw = caps.get(i).map_or("", |m| m.as_str());
        let after_colon = raw.rsplit([':', ',']).next().unwrap_or(raw);
        let cleaned = clean_subject(after_colon);
        cleaned.strip_prefix("compare ").map(str::to_string).unwrap_or(cleaned)
    };
    let (first, second) = (side(1), side(2));
    if first.is_empty() || second.is_empty() {
        return None;
    }
    Some(Intent::Compare {
        first,
        second,
        dimension: Dimension::detect(&lower),
    })
}

pub fn detect_relationship(query: &str) -> Option<Intent> {
    let lower = prepare(query);
    if let Some(c) = RE_USERS.captures(&lower) {
        return Some(Intent::Users {
            vehicle: clean_subject(&c[1]),
        });
    }
    if let Some(c) = RE_WHEREABOUTS.captures(&lower) {
        return Some(Intent::Attribute {
            attribute: Attribute::Locations,
            subject: clean_subject(&c[1]),
        });
    }
    let kind = RelationKind::detect(&lower)?;
    let subject = RELATION_SUBJECT_PATTERNS
        .iter()
        .find_map(|re| re.captures(&lower).and_then(|c| c.get(1)))
        .map(|m| clean_subject(m.as_str()))
        .filter(|s| !s.is_empty())?;
    Some(Intent::Relations { subject, kind })
}

pub fn detect_listing(query: &str) -> Option<Intent> {
    let lower = prepare(query);
    let kind = LISTING_KINDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| mentions(&lower, w)))
        .map(|(k, _)| *k)?;

    let owner = RE_OWNED_QUESTION
        .captures(&lower)
        .or_else(|| RE_OWNED_PLURAL.captures(&lower))
        .and_then(|c| c.get(1))
        .map(|m| strip_filler(m.as_str()))
        .filter(|s| !s.is_empty());
    let triggered = LISTING_TRIGGERS.iter().any(|w| mentions(&lower, w));
    if owner.is_none() && !triggered {
        return None;
    }
    Some(Intent::Listing { kind, owner })
}

fn strip_filler(span: &str) -> String {
    let words: Vec<&str> = span.split_whitespace().collect();
    let start = words
        .iter()
        .position(|w| !LISTING_FILLER.contains(w))
        .unwrap_or(words.len());
    clean_subject(&words[start..].join(" "))
}

/// Always matches: classify by the first keyword set with a hit.
pub fn detect_fallback(query: &str) -> Option<Intent> {
    Some(Intent::Lookup(classify(query)))
}

pub fn classify(query: &str) -> LookupClass {
    let lower = prepare(query);
    let hit = |words: &[&str]| words.iter().any(|w| mentions(&lower, w));
    if hit(VEHICLE_KEYWORDS) {
        LookupClass::Vehicle
    } else if hit(LOCATION_KEYWORDS) {
        LookupClass::Location
    } else if hit(RELATIONSHIP_KEYWORDS) {
        LookupClass::Relationship
    } else if hit(SIDEKICK_KEYWORDS) {
        LookupClass::Sidekick
    } else if hit(CHARACTER_KEYWORDS) {
        LookupClass::Character
    } else {
        LookupClass::General
    }
}

/// Whether a vehicle question is really "what does X drive".
pub fn asks_for_owned_vehicle(query: &str) -> bool {
    let lower = prepare(query);
    lower.contains("what does") || lower.contains("what do") || lower.contains("drive") || mentions(&lower, "car")
}

/// The character named in a "what does X drive" question.
pub fn vehicle_owner(query: &str) -> Option<String> {
    let lower = prepare(query);
    VEHICLE_OWNER_PATTERNS
        .iter()
        .find_map(|re| re.captures(&lower).and_then(|c| c.get(1)))
        .map(|m| clean_subject(m.as_str()))
        .filter(|s| !s.is_empty())
}
