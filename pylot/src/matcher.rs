//! Approximate matching of recognized text against the catalog.

use crate::catalog::Catalog;
use crate::errors::PilotError;
use crate::types::Resolution;
use std::sync::Arc;
use tracing::trace;

/// Resolves noisy OCR output to the closest catalog entry.
#[derive(Debug, Clone)]
pub struct Matcher {
    catalog: Arc<Catalog>,
    min_score: f64,
}

impl Matcher {
    /// A matcher that accepts the best score however low it is.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            min_score: 0.0,
        }
    }

    /// Reject best matches scoring below `min_score`, which must lie in
    /// `[0, 1]`.
    pub fn with_min_score(mut self, min_score: f64) -> Result<Self, PilotError> {
        if !(0.0..=1.0).contains(&min_score) {
            return Err(PilotError::Config(format!(
                "Minimum match score must be between 0 and 1, got {min_score}"
            )));
        }
        self.min_score = min_score;
        Ok(self)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolve a single token to the best-scoring catalog entry.
    ///
    /// Ties keep the earliest entry in catalog order. A token that scores
    /// zero against every entry is never matched.
    pub fn resolve(&self, token: &str) -> Resolution {
        let mut best: Option<(usize, f64)> = None;
        let mut best_score = 0.0;

        for (index, name) in self.catalog.names().iter().enumerate() {
            let score = jaro_similarity(token, name);
            if score > best_score {
                best_score = score;
                best = Some((index, score));
            }
        }

        let resolution = match best {
            Some((index, confidence)) if confidence >= self.min_score => Resolution::Matched {
                name: self.catalog.names()[index].clone(),
                index,
                confidence,
            },
            _ => Resolution::Unmatched,
        };
        trace!(token, %resolution, "Resolved token");
        resolution
    }

    /// Resolve the text read from the position region.
    ///
    /// The region shows the location name followed by extra detail, so only
    /// the first word is matched.
    pub fn resolve_position(&self, text: &str) -> Resolution {
        let token = text.split_whitespace().next().unwrap_or("");
        self.resolve(token)
    }
}

/// Jaro similarity of two strings, compared by `char`.
///
/// Returns a value in `[0, 1]`; 1.0 only for identical non-empty strings and
/// 0.0 when either side is empty or nothing matches.
pub fn jaro_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, ca) in a.iter().enumerate() {
        let lo = i.saturating_sub(window);
        let hi = (i + window + 1).min(b.len());
        for j in lo..hi {
            if !b_matched[j] && b[j] == *ca {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }

    if matches == 0 {
        return 0.0;
    }

    // Count matched characters that appear in a different order.
    let mut half_transpositions = 0usize;
    let mut k = 0usize;
    for (i, ca) in a.iter().enumerate() {
        if !a_matched[i] {
            continue;
        }
        while !b_matched[k] {
            k += 1;
        }
        if *ca != b[k] {
            half_transpositions += 1;
        }
        k += 1;
    }

    let m = matches as f64;
    let t = (half_transpositions / 2) as f64;
    (m / a.len() as f64 + m / b.len() as f64 + (m - t) / m) / 3.0
}
