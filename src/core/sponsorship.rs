use crate::core::filters::{is_listed, matches_region};
use crate::models::Company;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

/// Rejected carousel input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SponsorshipError {
    #[error("limit must be between 1 and {max}, got {requested}")]
    InvalidLimit { requested: usize, max: usize },
}

/// Picks the rotating set of sponsored companies for the carousel
///
/// Candidates must already be restricted to companies with a running
/// promotion. Output order is random on purpose; it shares nothing with the
/// distance-ordered search.
#[derive(Debug, Clone, Copy)]
pub struct SponsorshipSelector {
    default_limit: usize,
    max_limit: usize,
}

impl SponsorshipSelector {
    pub const DEFAULT_LIMIT: usize = 10;
    pub const MAX_LIMIT: usize = 50;

    pub fn new(default_limit: usize, max_limit: usize) -> Self {
        Self {
            default_limit,
            max_limit,
        }
    }

    /// Requested sample size, or the default when none was asked for
    ///
    /// Limits outside `1..=max_limit` are refused rather than cut down.
    pub fn resolve_limit(&self, requested: Option<usize>) -> Result<usize, SponsorshipError> {
        let limit = requested.unwrap_or(self.default_limit);
        if limit == 0 || limit > self.max_limit {
            return Err(SponsorshipError::InvalidLimit {
                requested: limit,
                max: self.max_limit,
            });
        }
        Ok(limit)
    }

    /// Uniform random sample of `min(limit, matches)` listed companies,
    /// optionally restricted to one region
    pub fn select<R: Rng + ?Sized>(
        &self,
        candidates: Vec<Company>,
        region: Option<&str>,
        limit: usize,
        rng: &mut R,
    ) -> Vec<Company> {
        let region = region.map(str::trim).filter(|r| !r.is_empty());

        let mut eligible: Vec<Company> = candidates
            .into_iter()
            .filter(|company| is_listed(company) && matches_region(company, region))
            .collect();

        // A full shuffle then truncate is a uniform sample in random order
        eligible.shuffle(rng);
        eligible.truncate(limit);
        eligible
    }
}

impl Default for SponsorshipSelector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, Self::MAX_LIMIT)
    }
}
