use crate::core::{
    distance::{calculate_bounding_box, distance_km},
    filters::matches_search_constraints,
};
use crate::models::{Company, Coordinate, SearchHit, SearchQuery};
use thiserror::Error;

/// Rejected search input
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SearchError {
    #[error("latitude and longitude are required")]
    MissingOrigin,

    #[error("radius must be a non-negative number of kilometers, got {0}")]
    InvalidRadius(f64),
}

/// Result of the search pipeline
#[derive(Debug)]
pub struct SearchResult {
    pub hits: Vec<SearchHit>,
    pub total_candidates: usize,
}

/// Proximity search orchestrator
///
/// # Pipeline Stages
/// 1. Validation: origin present, radius sane ([`SearchPipeline::prepare`])
/// 2. Coarse filter: listing flags, category, bounding box (usually in SQL)
/// 3. Exact filter: Haversine distance against the radius
/// 4. Stable ascending sort by distance
#[derive(Debug, Clone, Copy)]
pub struct SearchPipeline {
    default_radius_km: f64,
}

impl SearchPipeline {
    pub const DEFAULT_RADIUS_KM: f64 = 50.0;

    pub fn new(default_radius_km: f64) -> Self {
        Self { default_radius_km }
    }

    pub fn default_radius_km(&self) -> f64 {
        self.default_radius_km
    }

    /// Validate inputs and build the query handed to the store
    ///
    /// The origin is never defaulted here; callers that want a fallback
    /// location must supply it themselves. Any finite non-negative radius is
    /// honored as given, and an empty category means "any".
    pub fn prepare(
        &self,
        origin: Option<Coordinate>,
        category: Option<&str>,
        radius_km: Option<f64>,
    ) -> Result<SearchQuery, SearchError> {
        let origin = origin.ok_or(SearchError::MissingOrigin)?;

        let radius_km = radius_km.unwrap_or(self.default_radius_km);
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(SearchError::InvalidRadius(radius_km));
        }

        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(SearchQuery {
            origin,
            category,
            radius_km,
            bounding_box: calculate_bounding_box(&origin, radius_km),
        })
    }

    /// Run the exact stages over candidates fetched by the store
    ///
    /// Candidates should arrive in identity order; ties on distance keep
    /// that order so pages are reproducible.
    pub fn execute(&self, query: &SearchQuery, candidates: Vec<Company>) -> SearchResult {
        let total_candidates = candidates.len();

        // Single pass: coarse re-check, distance, radius filter
        let mut hits: Vec<SearchHit> = candidates
            .into_iter()
            .filter(|company| matches_search_constraints(company, query))
            .filter_map(|company| {
                let point = company.coordinate?;
                let distance = distance_km(&query.origin, &point);
                (distance <= query.radius_km).then_some(SearchHit {
                    company,
                    distance_km: distance,
                })
            })
            .collect();

        // sort_by is stable
        hits.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        SearchResult {
            hits,
            total_candidates,
        }
    }

    /// Validate and run in one call
    pub fn search(
        &self,
        origin: Option<Coordinate>,
        category: Option<&str>,
        radius_km: Option<f64>,
        candidates: Vec<Company>,
    ) -> Result<SearchResult, SearchError> {
        let query = self.prepare(origin, category, radius_km)?;
        Ok(self.execute(&query, candidates))
    }
}

impl Default for SearchPipeline {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RADIUS_KM)
    }
}

/// One page of an ordered result list
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
    pub total_pages: u32,
    pub has_next: bool,
}

/// Slice `items` into 1-based pages of `per_page`
///
/// Pages past the end come back empty rather than failing.
pub fn paginate<T>(items: Vec<T>, page: u32, per_page: u32) -> Page<T> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(per_page as usize) as u32;

    let start = (page as usize - 1).saturating_mul(per_page as usize);
    let items: Vec<T> = items
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect();

    Page {
        items,
        page,
        per_page,
        total,
        total_pages,
        has_next: page < total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_candidate(id: i64, lat: f64, lon: f64) -> Company {
        Company {
            id,
            user_id: id,
            company_name: format!("Company {}", id),
            cnpj: "11222333000181".to_string(),
            description: None,
            category: Some("plumber".to_string()),
            phone: None,
            whatsapp: None,
            address: None,
            city: None,
            state: None,
            postal_code: None,
            coordinate: Coordinate::new(lat, lon).ok(),
            region: Some("SP".to_string()),
            rating: 0.0,
            logo_url: None,
            is_verified: true,
            is_active: true,
            email: None,
            created_at: Utc::now(),
        }
    }

    fn origin() -> Option<Coordinate> {
        Coordinate::new(-23.5505, -46.6333).ok()
    }

    #[test]
    fn test_missing_origin_is_rejected() {
        let pipeline = SearchPipeline::default();
        let result = pipeline.search(None, None, None, vec![create_candidate(1, -23.55, -46.63)]);
        assert!(matches!(result, Err(SearchError::MissingOrigin)));
    }

    #[test]
    fn test_invalid_radius_is_rejected() {
        let pipeline = SearchPipeline::default();
        assert_eq!(
            pipeline.prepare(origin(), None, Some(-1.0)).unwrap_err(),
            SearchError::InvalidRadius(-1.0)
        );
        assert!(pipeline.prepare(origin(), None, Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_default_and_explicit_radius() {
        let pipeline = SearchPipeline::new(25.0);
        assert_eq!(pipeline.prepare(origin(), None, None).unwrap().radius_km, 25.0);
        assert_eq!(pipeline.prepare(origin(), None, Some(900.0)).unwrap().radius_km, 900.0);
    }

    #[test]
    fn test_large_radius_reaches_distant_company() {
        let pipeline = SearchPipeline::default();
        // Brasília, ~870km from São Paulo
        let candidates = vec![create_candidate(1, -15.7939, -47.8828)];

        let narrow = pipeline
            .search(origin(), None, Some(500.0), candidates.clone())
            .unwrap();
        assert!(narrow.hits.is_empty());

        let wide = pipeline.search(origin(), None, Some(1000.0), candidates).unwrap();
        assert_eq!(wide.hits.len(), 1);
        assert!(wide.hits[0].distance_km > 800.0 && wide.hits[0].distance_km < 1000.0);
    }

    #[test]
    fn test_blank_category_means_any() {
        let pipeline = SearchPipeline::default();
        let query = pipeline.prepare(origin(), Some("  "), None).unwrap();
        assert!(query.category.is_none());
    }

    #[test]
    fn test_results_sorted_and_within_radius() {
        let pipeline = SearchPipeline::default();
        let candidates = vec![
            create_candidate(1, -23.60, -46.70),   // ~9km
            create_candidate(2, -23.5505, -46.6333), // 0km
            create_candidate(3, -22.9068, -43.1729), // Rio, ~359km
            create_candidate(4, -23.56, -46.64),   // ~1km
        ];

        let result = pipeline.search(origin(), None, Some(50.0), candidates).unwrap();
        let ids: Vec<i64> = result.hits.iter().map(|h| h.company.id).collect();
        assert_eq!(ids, vec![2, 4, 1]);
        assert_eq!(result.total_candidates, 4);
        assert!(result.hits.iter().all(|h| h.distance_km <= 50.0));
    }

    #[test]
    fn test_ties_keep_identity_order() {
        let pipeline = SearchPipeline::default();
        let candidates = vec![
            create_candidate(7, -23.56, -46.64),
            create_candidate(3, -23.56, -46.64),
            create_candidate(5, -23.56, -46.64),
        ];

        let result = pipeline.search(origin(), None, None, candidates).unwrap();
        let ids: Vec<i64> = result.hits.iter().map(|h| h.company.id).collect();
        assert_eq!(ids, vec![7, 3, 5]);
    }

    #[test]
    fn test_unlisted_and_wrong_category_dropped() {
        let pipeline = SearchPipeline::default();
        let mut unverified = create_candidate(1, -23.55, -46.63);
        unverified.is_verified = false;
        let mut other = create_candidate(2, -23.55, -46.63);
        other.category = Some("electrician".to_string());
        let mut no_coordinate = create_candidate(3, -23.55, -46.63);
        no_coordinate.coordinate = None;
        let good = create_candidate(4, -23.55, -46.63);

        let result = pipeline
            .search(origin(), Some("plumber"), None, vec![unverified, other, no_coordinate, good])
            .unwrap();
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].company.id, 4);
    }

    #[test]
    fn test_zero_radius_exact_origin() {
        let pipeline = SearchPipeline::default();
        let candidates = vec![
            create_candidate(1, -23.5505, -46.6333),
            create_candidate(2, -23.5506, -46.6333),
        ];

        let result = pipeline.search(origin(), None, Some(0.0), candidates).unwrap();
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].distance_km, 0.0);
    }

    #[test]
    fn test_paginate() {
        let page = paginate((1..=25).collect::<Vec<_>>(), 2, 10);
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);

        let last = paginate((1..=25).collect::<Vec<_>>(), 3, 10);
        assert_eq!(last.items, vec![21, 22, 23, 24, 25]);
        assert!(!last.has_next);

        let beyond = paginate((1..=5).collect::<Vec<_>>(), 9, 10);
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.page, 9);

        let empty = paginate(Vec::<u8>::new(), 1, 10);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
    }
}
