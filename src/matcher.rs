//! Fuzzy entity matching over the [`EntityCache`].

use std::collections::HashMap;
use std::sync::LazyLock;

use gotham_types::{EntityId, EntityKind, MatchKind};
use regex::Regex;

use crate::cache::{Entity, EntityCache};
use crate::knowledge::{
    ALIAS_PHRASES, CHARACTER_VEHICLE_RULES, KEYWORD_STOP_WORDS, MAIN_CHARACTER_BONUS,
    MAIN_CHARACTERS, MAIN_LOCATION_BONUS, MAIN_LOCATIONS, MAIN_VEHICLE_BONUS, MAIN_VEHICLES,
    SHORT_NAME_BONUS, STOP_WORDS,
};
use crate::similarity::{ratio, similarity};

static RE_POSSESSIVE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'s\b").unwrap());
static RE_NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{Alphabetic}\p{N}]+").unwrap());
static RE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());

// ── Normalization ────────────────────────────────────────────────────────

/// Comparison form of a name or query: URL-decoded, lowercased, possessives
/// and apostrophes dropped, every other separator collapsed to one space.
pub fn fold(text: &str) -> String {
    let decoded = urlencoding::decode(text)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| text.to_string());
    let lower = decoded.to_lowercase().replace('’', "'").replace('_', " ");
    let no_possessive = RE_POSSESSIVE.replace_all(&lower, "");
    let no_apostrophe = no_possessive.replace('\'', "");
    RE_NON_WORD
        .replace_all(&no_apostrophe, " ")
        .trim()
        .to_string()
}

/// Query form: the first matching idiom rewritten, folded, stop words removed.
pub fn normalize_query(query: &str) -> String {
    let mut lower = query.to_lowercase().replace('’', "'");
    if let Some((phrase, canonical)) = ALIAS_PHRASES.iter().find(|(p, _)| lower.contains(p)) {
        lower = lower.replace(phrase, canonical);
    }
    fold(&lower)
        .split_whitespace()
        .filter(|w| !STOP_WORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether `term` occurs in `haystack` on word boundaries. Both sides are
/// expected lowercase.
pub fn mentions(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    let is_word = |c: char| c.is_alphanumeric();
    haystack.match_indices(term).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + term.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}

/// Ranking bonus for well-known entities, keyed on the canonical name.
pub fn importance_bonus(kind: EntityKind, canonical_name: &str) -> f64 {
    let key = canonical_name.to_lowercase().replace(' ', "_");
    let listed = |names: &[&str]| names.iter().any(|n| key.contains(n));
    match kind {
        EntityKind::Character if listed(MAIN_CHARACTERS) => MAIN_CHARACTER_BONUS,
        EntityKind::Location if listed(MAIN_LOCATIONS) => MAIN_LOCATION_BONUS,
        EntityKind::Vehicle if listed(MAIN_VEHICLES) => MAIN_VEHICLE_BONUS,
        _ if key.split('_').filter(|p| !p.is_empty()).count() <= 2 => SHORT_NAME_BONUS,
        _ => 0.0,
    }
}

// ── Matches ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub entity: EntityId,
    pub canonical_name: String,
    /// Similarity scaled to `[0, 1]`.
    pub confidence: f64,
    pub match_kind: MatchKind,
    /// Ordering key: similarity plus importance bonus.
    pub rank: f64,
}

impl Match {
    pub fn kind(&self) -> EntityKind {
        self.entity.kind
    }

    /// Confidence back on the 0..100 scale.
    pub fn score(&self) -> f64 {
        self.confidence * 100.0
    }

    fn from_entity(entity: &Entity, sim: f64, exact: bool) -> Self {
        let match_kind = if entity.is_alias() {
            MatchKind::Alias
        } else if exact {
            MatchKind::Exact
        } else {
            MatchKind::Fuzzy
        };
        Self {
            entity: entity.id,
            canonical_name: entity.canonical_name.clone(),
            confidence: (sim / 100.0).clamp(0.0, 1.0),
            match_kind,
            rank: sim + importance_bonus(entity.id.kind, &entity.canonical_name),
        }
    }
}

pub struct Matcher<'a> {
    cache: &'a EntityCache,
}

impl<'a> Matcher<'a> {
    pub fn new(cache: &'a EntityCache) -> Self {
        Self { cache }
    }

    /// Every candidate at or above `threshold`, in cache order, with a flag
    /// for exact folded equality.
    fn candidates(
        &self,
        normalized: &str,
        threshold: f64,
        kinds: &[EntityKind],
    ) -> Vec<(Match, bool)> {
        let mut out = Vec::new();
        if normalized.is_empty() {
            return out;
        }
        for kind in kinds {
            for entity in self.cache.list(*kind) {
                let exact = entity.folded == normalized;
                let sim = if exact { 100.0 } else { similarity(normalized, &entity.folded) };
                if sim >= threshold {
                    out.push((Match::from_entity(entity, sim, exact), exact));
                }
            }
        }
        out
    }

    /// Single best entity for a query. An exact folded match wins outright;
    /// otherwise the highest rank, earliest candidate on ties.
    pub fn best_match(&self, query: &str, threshold: f64, kinds: &[EntityKind]) -> Option<Match> {
        let normalized = normalize_query(query);
        let candidates = self.candidates(&normalized, threshold, kinds);
        if let Some((m, _)) = candidates.iter().find(|(_, exact)| *exact) {
            return Some(m.clone());
        }
        let mut best: Option<Match> = None;
        for (m, _) in candidates {
            if best.as_ref().is_none_or(|b| m.rank > b.rank) {
                best = Some(m);
            }
        }
        best
    }

    /// Up to `limit` distinct entities, highest confidence first. Ties keep
    /// the higher rank, then cache order.
    pub fn multi_match(
        &self,
        query: &str,
        limit: usize,
        threshold: f64,
        kinds: &[EntityKind],
    ) -> Vec<Match> {
        let normalized = normalize_query(query);
        let mut seen: HashMap<EntityId, usize> = HashMap::new();
        let mut out: Vec<Match> = Vec::new();
        for (m, _) in self.candidates(&normalized, threshold, kinds) {
            match seen.get(&m.entity) {
                Some(&i) => {
                    if m.confidence > out[i].confidence {
                        out[i] = m;
                    }
                }
                None => {
                    seen.insert(m.entity, out.len());
                    out.push(m);
                }
            }
        }
        out.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(b.rank.total_cmp(&a.rank))
        });
        out.truncate(limit);
        out
    }

    /// Keyword search over descriptions for queries naming no entity.
    /// Hits in the name score 20, a description mention 10, plus 5 per
    /// further occurrence.
    pub fn description_search(&self, query: &str, kinds: &[EntityKind], limit: usize) -> Vec<Match> {
        let lower = query.to_lowercase();
        let keywords: Vec<&str> = RE_KEYWORD
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|w| w.chars().count() > 2 && !KEYWORD_STOP_WORDS.contains(w))
            .collect();
        if keywords.is_empty() {
            return Vec::new();
        }

        let mut out = Vec::new();
        for kind in kinds {
            for entity in self.cache.canonical(*kind) {
                let name = entity.name.to_lowercase();
                let description = entity.description.to_lowercase();
                let mut score = 0.0;
                for kw in &keywords {
                    if name.contains(kw) {
                        score += 20.0;
                    }
                    let hits = description.matches(kw).count();
                    if hits > 0 {
                        score += 10.0 + 5.0 * (hits - 1) as f64;
                    }
                }
                if score > 0.0 {
                    out.push(Match {
                        entity: entity.id,
                        canonical_name: entity.canonical_name.clone(),
                        confidence: (score / 100.0_f64).min(1.0),
                        match_kind: MatchKind::Description,
                        rank: score,
                    });
                }
            }
        }
        out.sort_by(|a, b| b.rank.total_cmp(&a.rank));
        out.truncate(limit);
        out
    }

    /// The vehicle a character most plausibly uses. `linked` are vehicles the
    /// store ties to the character; they compete alongside name matches.
    pub fn vehicle_for_character(
        &self,
        character: &str,
        query: &str,
        linked: &[EntityId],
        floor: f64,
    ) -> Option<Match> {
        let folded = fold(character);
        let who = folded.strip_prefix("the ").unwrap_or(&folded);
        if who.is_empty() {
            return None;
        }
        let wants_car = {
            let q = query.to_lowercase();
            q.contains("drive") || fold(&q).split_whitespace().any(|w| w == "car")
        };

        let mut best: Option<Match> = None;
        for vehicle in self.cache.canonical(EntityKind::Vehicle) {
            if !belongs_to(who, &vehicle.folded) && !linked.contains(&vehicle.id) {
                continue;
            }
            let score = character_vehicle_score(who, vehicle, wants_car);
            if score < floor {
                continue;
            }
            if best.as_ref().is_none_or(|b| score > b.rank) {
                best = Some(Match {
                    entity: vehicle.id,
                    canonical_name: vehicle.canonical_name.clone(),
                    confidence: (score / 100.0).clamp(0.0, 1.0),
                    match_kind: MatchKind::CharacterVehicle,
                    rank: score,
                });
            }
        }
        best
    }
}

// ── Character vehicles ───────────────────────────────────────────────────

fn belongs_to(character: &str, vehicle: &str) -> bool {
    if vehicle.contains(character) {
        return true;
    }
    CHARACTER_VEHICLE_RULES
        .iter()
        .filter(|(key, _)| *key == character)
        .any(|(_, fragments)| fragments.iter().any(|f| vehicle.contains(f)))
}

fn character_vehicle_score(character: &str, vehicle: &Entity, wants_car: bool) -> f64 {
    let raw = vehicle.name.to_lowercase();
    let name = &vehicle.folded;
    let has = |parts: &[&str]| parts.iter().any(|p| name.contains(p));
    let mut score = ratio(character, name);

    if wants_car {
        if has(&["mobile", "car", "vehicle"]) {
            score += 25.0;
        } else if has(&["cycle", "bike"]) {
            score += 15.0;
        } else if has(&["copter", "plane", "wing"]) {
            score += 5.0;
        } else if has(&["boat", "sub", "ship"]) {
            if character.contains("penguin") && name.contains("submarine") {
                score += 15.0;
            } else {
                score -= 10.0;
            }
        } else if has(&["train", "rail"]) {
            score -= 15.0;
        }
    }

    if character.contains("joker") {
        if name.contains("jokermobile") {
            score += if raw.contains("dozierverse") { 20.0 } else { 30.0 };
        } else if name.contains("goon") && name.contains("car") {
            score += 10.0;
        }
    } else if character.contains("batman") {
        if name.contains("batmobile") && raw.split('_').count() <= 2 {
            score += 30.0;
        }
    } else if character.contains("penguin") {
        if name.contains("submarine") {
            score += 30.0;
        } else if name.contains("penguin") {
            score += 20.0;
        }
    }

    if raw.contains('(') || raw.contains("verse") {
        score -= 5.0;
    }
    if raw.contains('%') {
        score -= 3.0;
    }
    score
}
