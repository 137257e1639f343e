//! Out-of-universe refusal.
//!
//! A query naming a hero or place from outside the Batman line is declined
//! unless it also carries a franchise anchor ("batman", "gotham", ...).
//! Terms match on word boundaries.

use crate::knowledge::{EQUIPMENT_PHRASES, FRANCHISE_ANCHORS, OTHER_UNIVERSE_HEROES, OTHER_UNIVERSE_PLACES};
use crate::matcher::mentions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refusal {
    /// The denylisted term that triggered the refusal.
    pub term: &'static str,
    pub message: String,
}

/// `Some` when the query should be declined.
pub fn check_scope(query: &str) -> Option<Refusal> {
    let lower = query.to_lowercase().replace('’', "'");
    let anchored = FRANCHISE_ANCHORS.iter().any(|a| mentions(&lower, a));

    let foreign = OTHER_UNIVERSE_HEROES
        .iter()
        .chain(OTHER_UNIVERSE_PLACES)
        .find(|term| mentions(&lower, term))
        .copied();
    if let (Some(term), false) = (foreign, anchored) {
        return Some(Refusal {
            term,
            message: format!(
                "I'm a Batman universe specialist. My expertise is focused on Batman, Gotham City, \
                 and the extended Bat-Family. For information about {}, you'd need a more general \
                 DC Comics database.",
                title_case(term)
            ),
        });
    }

    // Anchored, but still asking for another hero's kit.
    if EQUIPMENT_PHRASES.iter().any(|p| mentions(&lower, p)) {
        if let Some(hero) = OTHER_UNIVERSE_HEROES.iter().find(|h| mentions(&lower, h)).copied() {
            return Some(Refusal {
                term: hero,
                message: format!(
                    "I specialize in Batman's vehicles and technology. For information about {}'s \
                     vehicles or equipment, you'd need a broader DC Comics database.",
                    title_case(hero)
                ),
            });
        }
    }
    None
}

/// Capitalize every letter that follows a non-letter.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() && !prev_alpha {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        prev_alpha = c.is_alphabetic();
    }
    out
}
