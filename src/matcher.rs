use std::collections::{HashMap, HashSet};

use crate::domain::Match;

const SEGMENT_DELIMITERS: [char; 2] = [',', '\u{2014}'];

/// Scans `text` for lines or line segments resembling `target` and returns
/// those scoring at least `threshold`, best first.
///
/// Candidates with equal scores keep the order in which they first appeared
/// in the text. An empty or blank target never matches anything.
pub fn fuzzy_search(text: &str, target: &str, threshold: f64) -> Vec<Match> {
    if target.trim().is_empty() {
        return Vec::new();
    }

    let target = target.to_lowercase();
    let mut matches: Vec<Match> = candidates(text)
        .into_iter()
        .filter_map(|candidate| {
            let score = similarity(&target, &candidate.to_lowercase());
            (score >= threshold).then_some(Match { candidate, score })
        })
        .collect();

    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches
}

/// Every non-blank line of `text`, preceded by its comma / em-dash separated
/// segments, trimmed and deduplicated in first-seen order.
pub fn candidates(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for line in text.split(is_line_break).map(str::trim).filter(|l| !l.is_empty()) {
        let segments = line
            .split(SEGMENT_DELIMITERS)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        for candidate in segments.chain(std::iter::once(line)) {
            if seen.insert(candidate) {
                out.push(candidate.to_string());
            }
        }
    }
    out
}

/// Longest-matching-blocks ratio: `2 * M / T`, where `M` is the number of
/// characters covered by the matching blocks of `a` and `b` and `T` the sum
/// of their lengths. Comparison is exact; callers fold case beforehand.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_chars(&a, &b) as f64 / total as f64
}

fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, ch) in b.iter().enumerate() {
        b_index.entry(*ch).or_default().push(j);
    }

    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, &b_index, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }
    matched
}

/// Longest common run of `a[alo..ahi]` and `b[blo..bhi]`, returned as
/// `(start_in_a, start_in_b, len)`. Ties go to the run starting earliest in
/// `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    b_index: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    // run length of the match ending at b[j] for the previous row of `a`
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();

    for (i, ch) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next_runs = HashMap::new();
        if let Some(positions) = b_index.get(ch) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let size = j
                    .checked_sub(1)
                    .and_then(|prev| run_lengths.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next_runs.insert(j, size);
                if size > best_size {
                    best_i = i + 1 - size;
                    best_j = j + 1 - size;
                    best_size = size;
                }
            }
        }
        run_lengths = next_runs;
    }
    (best_i, best_j, best_size)
}

fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}'
            | '\u{2028}' | '\u{2029}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identical_strings_score_one() {
        for target in ["SWD-6.3A", "a", "Room 21 — Cancelled", "ünïcödé"] {
            assert!(approx(similarity(target, target), 1.0), "{target}");
        }
    }

    #[test]
    fn case_only_differences_score_one() {
        let hits = fuzzy_search("swd-6.3a", "SWD-6.3A", 0.8);
        assert_eq!(hits.len(), 1);
        assert!(approx(hits[0].score, 1.0));
        assert_eq!(hits[0].candidate, "swd-6.3a");
    }

    #[test]
    fn ratio_counts_matching_blocks() {
        // "abcd" vs "bcde": one block "bcd" -> 2 * 3 / 8
        assert!(approx(similarity("abcd", "bcde"), 0.75));
        // "swd-6.3a" vs "swd-6.3b": block "swd-6.3" -> 2 * 7 / 16
        assert!(approx(similarity("swd-6.3a", "swd-6.3b"), 0.875));
        assert!(approx(similarity("abc", "xyz"), 0.0));
        assert!(approx(similarity("", "abc"), 0.0));
    }

    #[test]
    fn recursion_collects_blocks_on_both_sides() {
        // longest block "cd", then "a" on the left and "f" on the right
        // of it: M = 4, T = 12
        assert!(approx(similarity("abcdef", "axcdyf"), 2.0 * 4.0 / 12.0));
    }

    #[test]
    fn ratio_is_not_symmetric_in_general() {
        // block search is greedy, so swapping sides can change the score
        let forward = similarity("tide", "diet");
        let backward = similarity("diet", "tide");
        assert!(approx(forward, 0.25));
        assert!(approx(backward, 0.5));
    }

    #[test]
    fn candidates_split_on_commas_and_em_dashes() {
        let got = candidates("SWD-6.3A, Room 21 \u{2014} Cancelled");
        assert_eq!(
            got,
            vec![
                "SWD-6.3A".to_string(),
                "Room 21".to_string(),
                "Cancelled".to_string(),
                "SWD-6.3A, Room 21 \u{2014} Cancelled".to_string(),
            ]
        );
    }

    #[test]
    fn candidates_skip_blank_lines_and_duplicates() {
        let text = "  Monday  \n\n   \r\nMonday\nSWD-6.3A,,Monday\n";
        assert_eq!(
            candidates(text),
            vec![
                "Monday".to_string(),
                "SWD-6.3A".to_string(),
                "SWD-6.3A,,Monday".to_string(),
            ]
        );
    }

    #[test]
    fn candidate_extraction_is_deterministic() {
        let text = "A, B \u{2014} C\nB\nD, A";
        assert_eq!(candidates(text), candidates(text));
    }

    #[test]
    fn scenario_exact_class_in_cancellation_line() {
        let hits = fuzzy_search("SWD-6.3A, Room 21 \u{2014} Cancelled", "SWD-6.3A", 0.8);
        assert_eq!(hits[0].candidate, "SWD-6.3A");
        assert!(approx(hits[0].score, 1.0));
        assert!(hits.iter().all(|m| m.score >= 0.8));
    }

    #[test]
    fn scenario_unrelated_text_has_no_matches() {
        assert!(fuzzy_search("Nothing relevant here", "SWD-6.3A", 0.8).is_empty());
    }

    #[test]
    fn empty_inputs_yield_no_matches() {
        assert!(fuzzy_search("", "SWD-6.3A", 0.8).is_empty());
        assert!(fuzzy_search("   \n\n", "SWD-6.3A", 0.8).is_empty());
        assert!(fuzzy_search("SWD-6.3A\nanything", "", 0.1).is_empty());
        assert!(fuzzy_search("SWD-6.3A\nanything", "   ", 0.1).is_empty());
    }

    #[test]
    fn matches_are_sorted_by_descending_score() {
        let text = "SWD-6.3B\nSWD-6.3A\nSWD-6.3";
        let hits = fuzzy_search(text, "SWD-6.3A", 0.8);
        let names: Vec<&str> = hits.iter().map(|m| m.candidate.as_str()).collect();
        assert_eq!(names, vec!["SWD-6.3A", "SWD-6.3", "SWD-6.3B"]);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn equal_scores_keep_first_seen_order() {
        let text = "SWD-6.3C\nSWD-6.3B\nSWD-6.3D";
        let hits = fuzzy_search(text, "SWD-6.3A", 0.8);
        let names: Vec<&str> = hits.iter().map(|m| m.candidate.as_str()).collect();
        assert_eq!(names, vec!["SWD-6.3C", "SWD-6.3B", "SWD-6.3D"]);
    }

    #[test]
    fn raising_threshold_never_adds_matches() {
        let text = "SWD-6.3A cancelled\nSWD-6.3B, Room 4\nswd 6.3a\nSWD-5.1A\nLibrary closed";
        let mut previous = usize::MAX;
        for step in 1..=20 {
            let threshold = f64::from(step) / 20.0;
            let count = fuzzy_search(text, "SWD-6.3A", threshold).len();
            assert!(count <= previous, "threshold {threshold} grew matches");
            previous = count;
        }
    }
}
