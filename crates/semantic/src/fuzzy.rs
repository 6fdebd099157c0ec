//! "Did you mean" suggestions for unresolved references (§4.5 phase 2):
//! for an unresolved name `x`, suggest any name `y` of the same kind within
//! Damerau-Levenshtein distance ≤ `min(2, floor(len(x)/3))`.

use strsim::damerau_levenshtein;

pub fn max_distance(name: &str) -> usize {
    (name.chars().count() / 3).min(2)
}

/// Returns the closest candidate within the allowed edit distance, if any.
/// Ties break on first occurrence (candidates are assumed already ordered
/// the way the caller wants, e.g. declaration order).
pub fn suggest<'a>(target: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let limit = max_distance(target);
    candidates
        .into_iter()
        .map(|c| (c, damerau_levenshtein(target, c)))
        .filter(|(_, dist)| *dist <= limit)
        .min_by_key(|(_, dist)| *dist)
        .map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_close_typo() {
        let candidates = ["search", "summarize"];
        assert_eq!(suggest("serch", candidates), Some("search"));
    }

    #[test]
    fn no_suggestion_when_too_far() {
        let candidates = ["search"];
        assert_eq!(suggest("completely-different-name", candidates), None);
    }

    #[test]
    fn max_distance_caps_at_two() {
        assert_eq!(max_distance("a"), 0);
        assert_eq!(max_distance("searching"), 2);
    }
}
