//! Fuzzy string similarity (§4.4 "Scoring").
//!
//! `strsim::normalized_levenshtein` supplies the base edit-distance ratio;
//! the other three scores are built on top of it the way `fuzzywuzzy`
//! (and the original's `thefuzz`-based resolver) composes them. Every
//! function returns a score in `[0, 100]`.

use std::collections::HashSet;

/// Lowercase, strip punctuation (keep spaces), collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let stripped: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c.to_ascii_lowercase() } else { ' ' })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Plain Levenshtein-ratio similarity over the two full strings.
pub fn full_ratio(a: &str, b: &str) -> f64 {
    ratio(a, b)
}

/// Best ratio between the shorter string and any equal-length window of
/// the longer one — catches a short query fully contained in a long name.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }
    let long_chars: Vec<char> = long.chars().collect();
    let short_len = short.chars().count();
    if long_chars.len() <= short_len {
        return ratio(short, long);
    }

    let mut best = 0.0_f64;
    for start in 0..=(long_chars.len() - short_len) {
        let window: String = long_chars[start..start + short_len].iter().collect();
        let score = ratio(short, &window);
        if score > best {
            best = score;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Ratio of the two strings with their whitespace-separated tokens sorted
/// alphabetically first — insensitive to word order.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Ratio over token sets: intersection plus each side's unique remainder,
/// taking the best of the three pairings — insensitive to word order and
/// to one side having extra boilerplate tokens.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: HashSet<&str> = a.split_whitespace().collect();
    let tokens_b: HashSet<&str> = b.split_whitespace().collect();

    let mut intersection: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    intersection.sort_unstable();
    let mut only_a: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    only_a.sort_unstable();
    let mut only_b: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();
    only_b.sort_unstable();

    let sorted_sect = intersection.join(" ");
    let combined_a = [intersection.clone(), only_a].concat().join(" ");
    let combined_b = [intersection, only_b].concat().join(" ");

    let r1 = ratio(&sorted_sect, &combined_a);
    let r2 = ratio(&sorted_sect, &combined_b);
    let r3 = ratio(&combined_a, &combined_b);

    r1.max(r2).max(r3)
}

/// The maximum of all four fuzzy scores between normalized `query` and
/// normalized `candidate`, as specified for `name_similarity`.
pub fn name_similarity(query: &str, candidate: &str) -> f64 {
    let a = normalize_text(query);
    let b = normalize_text(candidate);
    full_ratio(&a, &b)
        .max(partial_ratio(&a, &b))
        .max(token_sort_ratio(&a, &b))
        .max(token_set_ratio(&a, &b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_strips_punctuation_collapses_space() {
        assert_eq!(normalize_text("  Great  Clips, Inc.!  "), "great clips inc");
    }

    #[test]
    fn identical_strings_score_100() {
        assert!((name_similarity("Great Clips", "Great Clips") - 100.0).abs() < 1e-6);
    }

    #[test]
    fn empty_strings_score_100() {
        assert!((full_ratio("", "") - 100.0).abs() < 1e-6);
    }

    #[test]
    fn partial_ratio_finds_substring() {
        let score = partial_ratio("dmv", "austin dmv office");
        assert!(score > 90.0, "got {score}");
    }

    #[test]
    fn token_sort_ratio_ignores_word_order() {
        let score = token_sort_ratio("clips great", "great clips");
        assert!((score - 100.0).abs() < 1e-6);
    }

    #[test]
    fn token_set_ratio_ignores_extra_boilerplate_tokens() {
        let score = token_set_ratio("great clips hair salon", "great clips");
        assert!(score > 80.0, "got {score}");
    }

    #[test]
    fn dissimilar_strings_score_low() {
        let score = name_similarity("target", "zzqzzq nonexistent");
        assert!(score < 40.0, "got {score}");
    }
}
