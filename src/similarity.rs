//! String similarity on a 0..100 scale.
//!
//! Three sub-scores are computed and the maximum wins: whole-string ratio
//! (typos), best partial-window ratio (truncated phrasing) and token-sort
//! ratio (word order). The backing library is only touched in [`ratio`].

/// Sub-scores for one comparison, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    pub ratio: f64,
    /// Partial-window ratio after the length-disparity discount.
    pub partial: f64,
    pub token_sort: f64,
}

impl Scores {
    pub fn best(&self) -> f64 {
        self.ratio.max(self.partial).max(self.token_sort)
    }
}

/// Whole-string ratio, rounded to an integer score.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    (strsim::normalized_levenshtein(a, b) * 100.0).round()
}

/// Best ratio of the shorter string against every equally long window of
/// the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_len = short.chars().count();
    if short_len == 0 {
        return 0.0;
    }
    let long_chars: Vec<char> = long.chars().collect();
    if long_chars.len() == short_len {
        return ratio(short, long);
    }

    let mut best: f64 = 0.0;
    for start in 0..=(long_chars.len() - short_len) {
        let window: String = long_chars[start..start + short_len].iter().collect();
        best = best.max(ratio(short, &window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// Ratio after sorting whitespace-separated tokens.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Discount for partial matches between strings of very different length,
/// so a short name is not a perfect match for every query containing it.
fn partial_weight(a: &str, b: &str) -> f64 {
    let (la, lb) = (a.chars().count() as f64, b.chars().count() as f64);
    let shorter = la.min(lb);
    if shorter == 0.0 {
        return 0.0;
    }
    let length_ratio = la.max(lb) / shorter;
    if length_ratio >= 8.0 {
        0.6
    } else if length_ratio >= 1.5 {
        0.9
    } else {
        1.0
    }
}

pub fn scores(a: &str, b: &str) -> Scores {
    Scores {
        ratio: ratio(a, b),
        partial: (partial_ratio(a, b) * partial_weight(a, b)).round(),
        token_sort: token_sort_ratio(a, b),
    }
}

/// Combined similarity in `[0, 100]`. Inputs are expected to be folded
/// already (see `matcher::fold`).
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    scores(a, b).best()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical() {
        assert_eq!(similarity("batman", "batman"), 100.0);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(similarity("", "batman"), 0.0);
        assert_eq!(similarity("joker", ""), 0.0);
    }

    #[test]
    fn test_typo_ratio() {
        // one deletion out of nine characters
        assert_eq!(ratio("batmobil", "batmobile"), 89.0);
        assert_eq!(similarity("batmobil", "batmobile"), 100.0, "partial window covers the typo");
    }

    #[test]
    fn test_partial_discount() {
        let s = scores("robin", "robin dick grayson");
        assert_eq!(s.partial, 90.0, "length ratio above 1.5 costs ten points");
        assert_eq!(s.best(), 90.0);
    }

    #[test]
    fn test_partial_heavy_discount() {
        // a two-letter name inside a long question
        let s = scores("ox", "what is the history of the ox");
        assert_eq!(s.partial, 60.0);
    }

    #[test]
    fn test_token_order_insensitive() {
        assert_eq!(token_sort_ratio("wayne bruce", "bruce wayne"), 100.0);
        assert!(ratio("wayne bruce", "bruce wayne") < 60.0);
    }

    #[test]
    fn test_symmetric() {
        let a = "gotham city";
        let b = "city of gotham";
        assert_eq!(similarity(a, b), similarity(b, a));
    }

    #[test]
    fn test_bounds() {
        for (a, b) in [("a", "zzzz"), ("joker", "batcave"), ("x", "x")] {
            let s = similarity(a, b);
            assert!((0.0..=100.0).contains(&s), "{a} vs {b} = {s}");
        }
    }
}
