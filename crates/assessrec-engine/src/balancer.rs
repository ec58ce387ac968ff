//! Spreads a multi-topic query's results across the detected domains.
use std::collections::HashSet;

use assessrec_core::types::{Candidate, Domain};

/// Per-domain share of `n` slots.
pub fn quota(n: usize, domains: usize) -> usize {
    (n / domains.max(1)).max(1)
}

/// First detected domain (canonical order) the candidate's test types name.
pub fn bucket_of(candidate: &Candidate<'_>, domains: &[Domain]) -> Option<Domain> {
    domains.iter().copied().find(|d| candidate.item.matches_domain(*d))
}

/// Round one of balancing: up to `quota(n, domains.len())` candidates per
/// domain, domain by domain, each bucket in baseline order.
pub fn take_quotas<'a>(candidates: &[Candidate<'a>], domains: &[Domain], n: usize) -> Vec<Candidate<'a>> {
    let quota = quota(n, domains.len());
    let mut buckets: Vec<Vec<Candidate<'a>>> = vec![Vec::new(); domains.len()];
    for c in candidates {
        if let Some(pos) = domains.iter().position(|d| c.item.matches_domain(*d)) {
            buckets[pos].push(*c);
        }
    }
    buckets.into_iter().flat_map(|b| b.into_iter().take(quota)).collect()
}

/// Pick `n` candidates. With fewer than two domains this is the baseline
/// prefix; otherwise quotas first, then the best unused candidates.
pub fn balance<'a>(candidates: &[Candidate<'a>], domains: &[Domain], n: usize) -> Vec<Candidate<'a>> {
    if domains.len() <= 1 {
        return candidates.iter().take(n).copied().collect();
    }
    let mut picked = take_quotas(candidates, domains, n);
    let mut used: HashSet<&str> = picked.iter().map(|c| c.item.url.as_str()).collect();
    for c in candidates {
        if picked.len() >= n { break; }
        if used.insert(c.item.url.as_str()) {
            picked.push(*c);
        }
    }
    picked.truncate(n);
    picked
}
