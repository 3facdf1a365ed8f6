use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A successful fuzzy match: relevance plus the matched `[start, end)` char ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub score: f64,
    pub offsets: Vec<(usize, usize)>,
}

impl SearchMatch {
    pub fn new(score: f64, offsets: Vec<(usize, usize)>) -> Self {
        Self { score, offsets }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedQuery {
    raw: String,
    chars: Vec<char>,
}

impl PreparedQuery {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }
}

/// The external fuzzy-match primitive. Implementations must report offsets in
/// chars, sorted ascending and non-overlapping.
pub trait FuzzyMatcher: Send + Sync {
    fn prepare_query(&self, text: &str) -> PreparedQuery {
        let raw = text.trim().to_lowercase();
        let chars = raw.chars().filter(|c| !c.is_whitespace()).collect();
        PreparedQuery { raw, chars }
    }

    fn fuzzy_match(&self, query: &PreparedQuery, candidate: &str) -> Option<SearchMatch>;
}

pub trait Scored {
    fn score(&self) -> Option<f64>;
}

/// Stable sort, best score first; unscored entries sink to the end.
pub fn sort_by_score_descending<T: Scored>(items: &mut [T]) {
    items.sort_by(|a, b| match (a.score(), b.score()) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Case-insensitive substring/subsequence matcher. Scores are `<= 0`, a
/// contiguous prefix hit on an equal-length candidate scoring exactly `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubsequenceMatcher;

impl FuzzyMatcher for SubsequenceMatcher {
    fn fuzzy_match(&self, query: &PreparedQuery, candidate: &str) -> Option<SearchMatch> {
        let needle = query.chars();
        if needle.is_empty() || candidate.is_empty() {
            return None;
        }

        let haystack: Vec<char> = candidate.chars().flat_map(|c| c.to_lowercase()).collect();
        if haystack.len() != candidate.chars().count() {
            // lowercasing changed the char count; offsets would not line up
            return None;
        }

        let extra_len = haystack.len().saturating_sub(needle.len()) as f64;

        if let Some(position) = find_contiguous(&haystack, needle) {
            let position_penalty = position as f64 * 0.1;
            let length_penalty = extra_len * 0.01;
            return Some(SearchMatch::new(
                -(position_penalty + length_penalty),
                vec![(position, position + needle.len())],
            ));
        }

        let positions = subsequence_positions(&haystack, needle)?;
        let start_penalty = positions[0] as f64 * 0.1;
        let gap_penalty: f64 = positions
            .windows(2)
            .map(|pair| pair[1].saturating_sub(pair[0] + 1) as f64)
            .sum();

        Some(SearchMatch::new(
            -(1.0 + gap_penalty * 0.5 + start_penalty + extra_len * 0.01),
            merge_positions(&positions),
        ))
    }
}

fn find_contiguous(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn subsequence_positions(haystack: &[char], needle: &[char]) -> Option<Vec<usize>> {
    let mut positions = Vec::with_capacity(needle.len());
    let mut next_start = 0;

    for needle_char in needle {
        let offset = haystack[next_start..]
            .iter()
            .position(|hay_char| hay_char == needle_char)?;
        let absolute = next_start + offset;
        positions.push(absolute);
        next_start = absolute + 1;
    }

    Some(positions)
}

fn merge_positions(positions: &[usize]) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for &position in positions {
        match ranges.last_mut() {
            Some(last) if last.1 == position => last.1 = position + 1,
            _ => ranges.push((position, position + 1)),
        }
    }
    ranges
}
