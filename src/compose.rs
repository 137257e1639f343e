//! Response text: templates, cleanup, hedging and enrichment.
//!
//! Only the wording is stochastic. Randomness comes from one seedable
//! ChaCha stream, so a fixed seed reproduces text exactly.

use std::sync::{LazyLock, Mutex};

use gotham_types::{EntityId, EntityKind};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use regex::Regex;
use tracing::warn;

use crate::config::ComposerConfig;
use crate::error::Result;
use crate::store::{EntityRow, Store, VehicleList};

static RE_VERSE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*verse[^)]*\)$").unwrap());
static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static RE_PERIOD_CAPITAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.([A-Z])").unwrap());
static RE_CASE_SEAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());

// ── Templates ────────────────────────────────────────────────────────────

const CHARACTER_INTROS: &[&str] = &[
    "Based on my extensive knowledge of the Batman universe, {name} is {description}",
    "Let me tell you about {name}. {description}",
    "From the depths of Gotham's history, {name} is {description}",
    "As a Batman expert, I can tell you that {name} is {description}",
    "In the shadows of Gotham, {name} is {description}",
];

const VEHICLE_INTROS: &[&str] = &[
    "The {name} is one of Batman's most impressive vehicles. {description}",
    "From the Batcave's vehicle bay, the {name} stands out. {description}",
    "Batman's arsenal includes the remarkable {name}. {description}",
    "Let me detail this incredible piece of Batman technology: the {name}. {description}",
    "In Batman's war on crime, the {name} plays a crucial role. {description}",
];

const LOCATION_INTROS: &[&str] = &[
    "In the sprawling metropolis of Gotham, {name} holds special significance. {description}",
    "Within Batman's domain, {name} is {description}",
    "Gotham City's geography includes the notable {name}. {description}",
    "From my knowledge of Batman's world, {name} is {description}",
    "The Dark Knight's territory encompasses {name}, which is {description}",
];

const ORGANIZATION_INTROS: &[&str] = &[
    "In the complex web of Gotham's power structures, {name} is {description}",
    "Batman has encountered {name}, which is {description}",
    "Among Gotham's many organizations, {name} stands out. {description}",
    "From Batman's extensive case files, {name} is {description}",
    "The {name} plays a role in Batman's world. {description}",
];

const STORYLINE_INTROS: &[&str] = &[
    "One of the most significant stories in Batman's history is {name}. {description}",
    "Batman enthusiasts know {name} as {description}",
    "In the pantheon of Batman stories, {name} is {description}",
    "From the comic archives, {name} represents {description}",
    "The storyline {name} is {description}",
];

const HIGH_HEDGES: &[&str] = &["I'm confident that", "Without a doubt", "Definitely", "Absolutely"];
const MEDIUM_HEDGES: &[&str] = &[
    "I believe",
    "Based on available information",
    "It appears that",
    "Most likely",
];
const LOW_HEDGES: &[&str] = &["I think", "It's possible that", "There's some indication that", "Perhaps"];

const ENHANCERS: &[&str] = &[
    "Here's what makes this fascinating:",
    "What's particularly interesting is that",
    "The remarkable thing about this is",
    "What really stands out is that",
    "You might find it intriguing that",
];

const CHARACTER_INSIGHTS: &[&str] = &[
    "this character has a rich history in Batman comics",
    "their relationship with Batman is complex and evolving",
    "they represent an important part of Gotham's ecosystem",
];
const VEHICLE_INSIGHTS: &[&str] = &[
    "this vehicle showcases Batman's technological prowess",
    "it represents Batman's strategic approach to crime fighting",
    "the engineering behind this is truly remarkable",
];
const LOCATION_INSIGHTS: &[&str] = &[
    "this location has witnessed many pivotal Batman moments",
    "it plays a crucial role in Gotham's geography",
    "the atmosphere here perfectly captures Gotham's essence",
];
const OTHER_INSIGHTS: &[&str] = &[
    "this adds depth to the Batman universe",
    "it showcases the complexity of Batman's world",
];

/// Known merged-word artifacts in scraped descriptions.
const CONCATENATION_FIXES: &[(&str, &str)] = &[
    ("theBatmobile", "the Batmobile"),
    ("theJoker", "the Joker"),
    ("theBatman", "the Batman"),
    ("theUnited", "the United"),
    ("asArkham", "as Arkham"),
    ("ofGotham", "of Gotham"),
    ("byBatman", "by Batman"),
    ("bythe", "by the"),
    ("ofthe", "of the"),
    ("inthe", "in the"),
    ("onthe", "on the"),
    ("atthe", "at the"),
    ("Joker s ", "Joker's "),
];

const NO_DESCRIPTION: &str = "No description available";

fn intros(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Character => CHARACTER_INTROS,
        EntityKind::Vehicle => VEHICLE_INTROS,
        EntityKind::Location => LOCATION_INTROS,
        EntityKind::Organization => ORGANIZATION_INTROS,
        EntityKind::Storyline => STORYLINE_INTROS,
    }
}

fn insights(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Character => CHARACTER_INSIGHTS,
        EntityKind::Vehicle => VEHICLE_INSIGHTS,
        EntityKind::Location => LOCATION_INSIGHTS,
        _ => OTHER_INSIGHTS,
    }
}

fn hedges(confidence: f64) -> &'static [&'static str] {
    if confidence > 0.8 {
        HIGH_HEDGES
    } else if confidence > 0.5 {
        MEDIUM_HEDGES
    } else {
        LOW_HEDGES
    }
}

// ── Cleanup ──────────────────────────────────────────────────────────────

/// Display form of a stored name: URL-decoded, underscores to spaces,
/// trailing "(...verse)" qualifier dropped.
pub fn clean_name(name: &str) -> String {
    if name.trim().is_empty() {
        return "Unknown".to_string();
    }
    let decoded = urlencoding::decode(name)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| name.to_string());
    let spaced = decoded.replace('_', " ");
    let untagged = RE_VERSE_TAG.replace(spaced.trim(), "");
    RE_SPACES.replace_all(untagged.trim(), " ").into_owned()
}

/// Repair scraped description text and make sure it ends a sentence.
pub fn clean_description(description: &str) -> String {
    let mut text = RE_SPACES.replace_all(description.trim(), " ").into_owned();
    if text.is_empty() {
        return NO_DESCRIPTION.to_string();
    }
    if !text.ends_with(['.', '!', '?']) {
        text.push('.');
    }
    let text = RE_PERIOD_CAPITAL.replace_all(&text, ". $1");
    let mut text = RE_CASE_SEAM.replace_all(&text, "$1 $2").into_owned();
    for (bad, good) in CONCATENATION_FIXES {
        text = text.replace(bad, good);
    }
    RE_SPACES.replace_all(&text, " ").into_owned()
}

/// Cut at `. ` boundaries so the result, closing period included, stays
/// within `max` characters.
/// Text already short enough, or whose first sentence alone is too long,
/// comes back unchanged.
pub fn trim_to_sentences(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut kept: Vec<&str> = Vec::new();
    let mut length = 0;
    for sentence in text.split(". ") {
        let n = sentence.chars().count();
        if length + n + 1 > max {
            break;
        }
        kept.push(sentence);
        length += n + 2;
    }
    if kept.is_empty() {
        return text.to_string();
    }
    let mut out = kept.join(". ");
    if !out.ends_with('.') {
        out.push('.');
    }
    out
}

/// Lower-case only the first character, keeping proper nouns intact.
fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// "a", "a and b", "a, b and c".
pub fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// One entry in a numbered "did you mean" list.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub name: String,
    pub kind: EntityKind,
    pub confidence: f64,
}

// ── Composer ─────────────────────────────────────────────────────────────

pub struct Composer {
    config: ComposerConfig,
    rng: Mutex<ChaCha8Rng>,
}

impl Composer {
    pub fn new(config: ComposerConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            config,
            rng: Mutex::new(rng),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut ChaCha8Rng) -> T) -> T {
        // A panic elsewhere cannot leave the stream in a bad state.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    fn roll(&self, chance: f64) -> bool {
        chance > 0.0 && self.with_rng(|rng| rng.r#gen::<f64>() < chance)
    }

    fn pick(&self, options: &'static [&'static str]) -> &'static str {
        self.with_rng(|rng| options.choose(rng).copied().unwrap_or_default())
    }

    /// Full answer for one entity. `enrichment` is appended before the
    /// length trim; see [`enrichment`].
    pub fn describe(&self, kind: EntityKind, row: &EntityRow, confidence: f64, enrichment: &str) -> String {
        let template = self.pick(intros(kind));
        let mut text = template
            .replace("{name}", &clean_name(&row.name))
            .replace("{description}", &clean_description(&row.description));

        if self.roll(self.config.hedge_chance) {
            let hedge = self.pick(hedges(confidence));
            text = format!("{hedge}, {}", lower_first(&text));
        }

        text.push_str(enrichment);
        let mut text = trim_to_sentences(&text, self.config.max_length);

        if self.roll(self.config.insight_chance) {
            let enhancer = self.pick(ENHANCERS);
            let insight = self.pick(insights(kind));
            text.push_str(&format!(" {enhancer} {insight}."));
        }
        text
    }

    /// Numbered selection list; the reply protocol is a bare integer.
    pub fn disambiguation(&self, query: &str, choices: &[Choice]) -> String {
        let lines: Vec<String> = choices
            .iter()
            .enumerate()
            .map(|(i, c)| {
                format!(
                    "{}. {} ({}) - {:.0}% match",
                    i + 1,
                    clean_name(&c.name),
                    c.kind,
                    c.confidence * 100.0
                )
            })
            .collect();
        format!(
            "I found multiple matches for '{query}'. Please select which one you'd like to learn about:\n\n{}\n\nType the number of your choice, or be more specific with your question.",
            lines.join("\n")
        )
    }

    pub fn sidekicks(&self, robins: &[String]) -> String {
        let lines: Vec<String> = robins
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{}. {}", i + 1, clean_name(name)))
            .collect();
        format!(
            "Batman's main sidekicks are the various Robins. Please select which one you'd like to learn about:\n\n{}\n\nType the number of your choice.",
            lines.join("\n")
        )
    }

    pub fn not_found(&self, query: &str) -> String {
        format!(
            "I don't have information about '{query}' in my Batman database. Could you be more specific or check the spelling?"
        )
    }

    /// Attribute answer: header, bullets, then a background excerpt.
    pub fn report(&self, header: &str, name: &str, explanation: &str, items: &[String], description: &str) -> String {
        let mut out = format!("{} - {}\n\n{}", header, clean_name(name), explanation);
        if !items.is_empty() {
            out.push('\n');
            for item in items {
                out.push_str(&format!("\n• {item}"));
            }
        }
        if !description.trim().is_empty() {
            let background: String = clean_description(description).chars().take(300).collect();
            out.push_str(&format!("\n\nBackground: {background}"));
        }
        out
    }
}

// ── Enrichment ───────────────────────────────────────────────────────────

/// Kind-specific detail sentences. Best effort: a failed lookup is logged
/// and contributes nothing.
pub fn enrichment(store: &Store, id: EntityId) -> String {
    match try_enrichment(store, id) {
        Ok(text) => text,
        Err(e) => {
            warn!(entity = %id, error = %e, "enrichment skipped");
            String::new()
        }
    }
}

fn try_enrichment(store: &Store, id: EntityId) -> Result<String> {
    let mut out = String::new();
    match id.kind {
        EntityKind::Character => {
            let aliases = store.character_aliases(id.id)?;
            if !aliases.is_empty() {
                out.push_str(&format!(" Also known as {}.", first_two(&aliases)));
            }
            let powers = store.character_powers(id.id)?;
            if !powers.is_empty() {
                out.push_str(&format!(" Notable abilities include {}.", first_two(&powers)));
            }
        }
        EntityKind::Vehicle => {
            if let Some(specs) = store.vehicle_specs(id.id)? {
                let mut details = Vec::new();
                if let Some(speed) = specs.max_speed.as_deref().filter(|s| !s.trim().is_empty()) {
                    details.push(format!("top speed of {speed}"));
                }
                if let Some(armor) = specs.armor.as_deref().filter(|s| !s.trim().is_empty()) {
                    details.push(format!("armor: {armor}"));
                }
                if let Some(crew) = specs.crew_capacity.as_deref().filter(|s| !s.trim().is_empty()) {
                    details.push(format!("crew capacity: {crew}"));
                }
                if !details.is_empty() {
                    out.push_str(&format!(" Key specifications: {}.", details.join(", ")));
                }
            }
            let weapons = store.vehicle_list(id.id, VehicleList::Weapons)?;
            if !weapons.is_empty() {
                out.push_str(&format!(" Armed with {}.", first_two(&weapons)));
            }
        }
        EntityKind::Location => {
            let people: Vec<String> = store
                .location_characters(id.id)?
                .into_iter()
                .map(|c| clean_name(&c.name))
                .collect();
            if !people.is_empty() {
                out.push_str(&format!(" Associated with {}.", first_two(&people)));
            }
        }
        EntityKind::Storyline | EntityKind::Organization => {}
    }
    Ok(out)
}

fn first_two(items: &[String]) -> String {
    items.iter().take(2).cloned().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture_store;

    fn quiet() -> Composer {
        Composer::new(
            ComposerConfig {
                hedge_chance: 0.0,
                insight_chance: 0.0,
                ..ComposerConfig::default()
            },
            Some(0),
        )
    }

    fn row(name: &str, description: &str) -> EntityRow {
        EntityRow {
            id: 1,
            name: name.into(),
            description: description.into(),
        }
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("Robin_(Tim_Drake)"), "Robin (Tim Drake)");
        assert_eq!(clean_name("Batmobile_(Nolanverse)"), "Batmobile");
        assert_eq!(clean_name("Ra%27s_al_Ghul"), "Ra's al Ghul");
        assert_eq!(clean_name("  "), "Unknown");
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(
            clean_description("Driven byBatman.It is fast"),
            "Driven by Batman. It is fast."
        );
        assert_eq!(clean_description("He stole theBatmobile!"), "He stole the Batmobile!");
        assert_eq!(clean_description(""), NO_DESCRIPTION);
    }

    #[test]
    fn test_trim_keeps_whole_sentences() {
        let text = "One two three. Four five six. Seven eight nine.";
        assert_eq!(trim_to_sentences(text, 30), "One two three. Four five six.");
        assert_eq!(trim_to_sentences(text, 100), text);
    }

    #[test]
    fn test_lower_first_only() {
        assert_eq!(lower_first("Batman is Bruce Wayne"), "batman is Bruce Wayne");
    }

    #[test]
    fn test_join_names() {
        let names: Vec<String> = ["Joker", "Bane", "Riddler"].map(String::from).to_vec();
        assert_eq!(join_names(&names), "Joker, Bane and Riddler");
        assert_eq!(join_names(&names[..1]), "Joker");
    }

    #[test]
    fn test_seeded_text_is_reproducible() {
        let cfg = ComposerConfig::default();
        let a = Composer::new(cfg.clone(), Some(42));
        let b = Composer::new(cfg, Some(42));
        let r = row("Batman", "A vigilante.");
        for _ in 0..5 {
            assert_eq!(a.describe(EntityKind::Character, &r, 0.9, ""), b.describe(EntityKind::Character, &r, 0.9, ""));
        }
    }

    #[test]
    fn test_describe_uses_kind_template() {
        let text = quiet().describe(EntityKind::Vehicle, &row("Batmobile", "Fast car."), 1.0, "");
        assert!(text.contains("Batmobile"), "{text}");
        assert!(text.contains("Fast car."), "{text}");
        assert!(VEHICLE_INTROS.iter().any(|t| text.starts_with(t.split("{name}").next().unwrap())));
    }

    #[test]
    fn test_hedge_always_when_forced() {
        let composer = Composer::new(
            ComposerConfig {
                hedge_chance: 1.0,
                insight_chance: 0.0,
                ..ComposerConfig::default()
            },
            Some(3),
        );
        let text = composer.describe(EntityKind::Character, &row("Joker", "A villain."), 0.3, "");
        assert!(LOW_HEDGES.iter().any(|h| text.starts_with(&format!("{h}, "))), "{text}");
        assert!(text.contains("Joker"), "proper noun keeps its capital: {text}");
    }

    #[test]
    fn test_describe_respects_length() {
        let long = "Gotham never sleeps. ".repeat(60);
        let text = quiet().describe(EntityKind::Location, &row("Gotham_City", &long), 1.0, "");
        assert!(text.chars().count() <= 600, "{} chars", text.chars().count());
        assert!(text.ends_with('.'));
    }

    #[test]
    fn test_disambiguation_layout() {
        let text = quiet().disambiguation(
            "robin",
            &[
                Choice { name: "Robin_(Dick_Grayson)".into(), kind: EntityKind::Character, confidence: 0.9 },
                Choice { name: "Robin_(Jason_Todd)".into(), kind: EntityKind::Character, confidence: 0.54 },
            ],
        );
        assert!(text.starts_with("I found multiple matches for 'robin'."));
        assert!(text.contains("1. Robin (Dick Grayson) (character) - 90% match"), "{text}");
        assert!(text.contains("2. Robin (Jason Todd) (character) - 54% match"), "{text}");
    }

    #[test]
    fn test_report_layout() {
        let items = vec!["Missiles".to_string()];
        let text = quiet().report("WEAPONS ANALYSIS", "Batmobile", "Batmobile is equipped with: Missiles", &items, "Fast.");
        assert!(text.starts_with("WEAPONS ANALYSIS - Batmobile\n\n"));
        assert!(text.contains("\n• Missiles"));
        assert!(text.ends_with("Background: Fast."));
    }

    #[test]
    fn test_enrichment_per_kind() {
        let store = fixture_store();
        let (_, batman) = store.find_by_name("Batman").unwrap().unwrap();
        let text = enrichment(&store, EntityId::new(EntityKind::Character, batman.id));
        assert_eq!(
            text,
            " Also known as Bruce Wayne, The Dark Knight. Notable abilities include Genius-level intellect, Master martial artist."
        );

        let (_, mobile) = store.find_by_name("Batmobile").unwrap().unwrap();
        let text = enrichment(&store, EntityId::new(EntityKind::Vehicle, mobile.id));
        assert!(text.contains("Key specifications: top speed of 200 mph, armor: Reinforced titanium plating, crew capacity: 2."), "{text}");
        assert!(text.contains("Armed with Machine guns, Grappling hooks."), "{text}");

        let (_, manor) = store.find_by_name("Wayne_Manor").unwrap().unwrap();
        let text = enrichment(&store, EntityId::new(EntityKind::Location, manor.id));
        assert_eq!(text, " Associated with Batman, Alfred Pennyworth.");
    }
}
