//! Search configuration and the weighted combination of field distances

use serde::{Deserialize, Serialize};

/// Relative importance of each searchable field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub name: f64,
    pub searchable_text: f64,
    pub description: f64,
    pub parent_name: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            name: 0.4,
            searchable_text: 0.3,
            description: 0.2,
            parent_name: 0.1,
        }
    }
}

/// Fuzzy search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub weights: FieldWeights,
    /// Maximum accepted per-field distance (0 = exact only, 1 = anything)
    pub threshold: f64,
    /// Preferred match offset within a field
    pub location: usize,
    /// Offset distance that adds a full point of penalty
    pub distance: usize,
    pub min_match_char_length: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            weights: FieldWeights::default(),
            threshold: 0.8,
            location: 0,
            distance: 1000,
            min_match_char_length: 1,
        }
    }
}

/// Distance assigned to a present field that did not match
pub const UNMATCHED_DISTANCE: f64 = 1.0;

/// Combine `(weight, accepted distance)` pairs of the present fields into an
/// element score. Returns `None` when no field was accepted.
pub fn combine_fields(fields: &[(f64, Option<f64>)]) -> Option<f64> {
    if fields.iter().all(|(_, distance)| distance.is_none()) {
        return None;
    }

    let total_weight: f64 = fields.iter().map(|(weight, _)| weight).sum();
    if total_weight <= 0.0 {
        // All weights zero: fall back to the best accepted field
        return fields
            .iter()
            .filter_map(|(_, distance)| *distance)
            .min_by(f64::total_cmp);
    }

    let weighted: f64 = fields
        .iter()
        .map(|(weight, distance)| weight * distance.unwrap_or(UNMATCHED_DISTANCE))
        .sum();
    Some(weighted / total_weight)
}
