use std::collections::HashSet;

use assessrec_core::types::{Candidate, Recommendation};

/// Bring a caller's `top_n` into `[min_results, max_results]`.
pub fn clamp_requested(top_n: usize, min_results: usize, max_results: usize) -> usize {
    top_n.clamp(min_results, max_results)
}

/// Top `picked` up to `min_results` from `pool` (baseline order, unused urls
/// only), cut it to `requested` and convert to the response shape.
pub fn finalize(mut picked: Vec<Candidate<'_>>, pool: &[Candidate<'_>], min_results: usize, requested: usize) -> Vec<Recommendation> {
    if picked.len() < min_results {
        let mut used: HashSet<&str> = picked.iter().map(|c| c.item.url.as_str()).collect();
        for c in pool {
            if picked.len() >= min_results { break; }
            if used.insert(c.item.url.as_str()) {
                picked.push(*c);
            }
        }
    }
    picked.truncate(requested);
    picked.into_iter().map(Recommendation::from).collect()
}
