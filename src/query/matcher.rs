//! Approximate string matching of a query pattern against one field.
//!
//! Distances are normalized to `[0, ~1]`: `0.0` is an exact match at the
//! preferred location, larger is worse. Edit errors are divided by the
//! pattern length and the position penalty by the configured `distance`.

use crate::query::scorer::SearchConfig;

/// A lowercased, trimmed query ready for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    chars: Vec<char>,
}

impl Pattern {
    /// Returns `None` for an empty or whitespace-only query
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            chars: trimmed.to_lowercase().chars().collect(),
        })
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// Lowercase a field into the representation matchers work on
pub fn prepare_field(text: &str) -> Vec<char> {
    text.to_lowercase().chars().collect()
}

/// The best accepted alignment of a pattern inside a field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldMatch {
    pub distance: f64,
    /// Char offset of the matched span in the field
    pub start: usize,
    /// Length of the matched span in chars
    pub len: usize,
}

/// Scores a pattern against one prepared field.
///
/// Implementations return only matches they accept; a rejected field is
/// `None` and counts as the worst distance for the element.
pub trait FieldMatcher: Send + Sync {
    fn match_field(&self, pattern: &Pattern, field: &[char]) -> Option<FieldMatch>;
}

/// Substring search with a semi-global Levenshtein fallback
#[derive(Debug, Clone)]
pub struct ApproximateMatcher {
    threshold: f64,
    location: usize,
    distance: f64,
    min_match_char_length: usize,
}

impl ApproximateMatcher {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            threshold: config.threshold,
            location: config.location,
            // A zero distance would make every offset infinitely bad
            distance: if config.distance == 0 {
                1.0
            } else {
                config.distance as f64
            },
            min_match_char_length: config.min_match_char_length.max(1),
        }
    }

    fn position_penalty(&self, start: usize) -> f64 {
        start.abs_diff(self.location) as f64 / self.distance
    }

    fn accept(&self, candidate: FieldMatch) -> Option<FieldMatch> {
        (candidate.distance <= self.threshold && candidate.len >= self.min_match_char_length)
            .then_some(candidate)
    }

    fn exact(&self, pattern: &[char], field: &[char]) -> Option<FieldMatch> {
        if pattern.len() > field.len() {
            return None;
        }
        let start = field.windows(pattern.len()).position(|w| w == pattern)?;
        Some(FieldMatch {
            distance: self.position_penalty(start),
            start,
            len: pattern.len(),
        })
    }

    /// Sellers' algorithm: edit distance of the pattern against the best
    /// substring of the field, tracking where each alignment starts.
    fn approximate(&self, pattern: &[char], field: &[char]) -> Option<FieldMatch> {
        let m = pattern.len();

        // Column for text position 0: aligning i pattern chars against nothing
        let mut prev_cost: Vec<usize> = (0..=m).collect();
        let mut prev_start: Vec<usize> = vec![0; m + 1];
        let mut cost = vec![0usize; m + 1];
        let mut start = vec![0usize; m + 1];

        let mut best: Option<FieldMatch> = None;

        for (j, &tc) in field.iter().enumerate() {
            let end = j + 1;
            cost[0] = 0;
            start[0] = end;

            for i in 1..=m {
                let substitution = prev_cost[i - 1] + usize::from(pattern[i - 1] != tc);
                let skip_pattern = cost[i - 1] + 1;
                let skip_text = prev_cost[i] + 1;

                if substitution <= skip_pattern && substitution <= skip_text {
                    cost[i] = substitution;
                    start[i] = prev_start[i - 1];
                } else if skip_pattern <= skip_text {
                    cost[i] = skip_pattern;
                    start[i] = start[i - 1];
                } else {
                    cost[i] = skip_text;
                    start[i] = prev_start[i];
                }
            }

            let span_start = start[m];
            let candidate = FieldMatch {
                distance: cost[m] as f64 / m as f64 + self.position_penalty(span_start),
                start: span_start,
                len: end - span_start,
            };
            if best.is_none_or(|b| candidate.distance < b.distance) {
                best = Some(candidate);
            }

            std::mem::swap(&mut prev_cost, &mut cost);
            std::mem::swap(&mut prev_start, &mut start);
        }

        best
    }
}

impl FieldMatcher for ApproximateMatcher {
    fn match_field(&self, pattern: &Pattern, field: &[char]) -> Option<FieldMatch> {
        if pattern.is_empty() || field.is_empty() {
            return None;
        }
        let pattern = pattern.chars();
        let best = match self.exact(pattern, field) {
            // Nothing beats an exact hit at the preferred location
            Some(exact) if exact.distance == 0.0 => Some(exact),
            exact => {
                let fuzzy = self.approximate(pattern, field);
                match (exact, fuzzy) {
                    (Some(e), Some(f)) => Some(if f.distance < e.distance { f } else { e }),
                    (e, f) => e.or(f),
                }
            }
        };
        best.and_then(|candidate| self.accept(candidate))
    }
}
