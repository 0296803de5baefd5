use crate::models::{Company, SearchQuery};

/// Only active, verified companies are shown to consumers
#[inline]
pub fn is_listed(company: &Company) -> bool {
    company.is_active && company.is_verified
}

/// Exact category match; no category means any
#[inline]
pub fn matches_category(company: &Company, category: Option<&str>) -> bool {
    match category {
        Some(wanted) => company.category.as_deref() == Some(wanted),
        None => true,
    }
}

/// Exact region match; no region means any
#[inline]
pub fn matches_region(company: &Company, region: Option<&str>) -> bool {
    match region {
        Some(wanted) => company.region.as_deref() == Some(wanted),
        None => true,
    }
}

/// Coarse stage of a proximity search: listing flags, category and the
/// bounding box. Companies without a coordinate never pass.
#[inline]
pub fn matches_search_constraints(company: &Company, query: &SearchQuery) -> bool {
    if !is_listed(company) || !matches_category(company, query.category.as_deref()) {
        return false;
    }

    match &company.coordinate {
        Some(point) => super::distance::is_within_bounding_box(point, &query.bounding_box),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::calculate_bounding_box;
    use crate::models::Coordinate;
    use chrono::Utc;

    fn create_test_company(category: &str, region: &str) -> Company {
        Company {
            id: 1,
            user_id: 1,
            company_name: "Padaria Central".to_string(),
            cnpj: "11222333000181".to_string(),
            description: None,
            category: Some(category.to_string()),
            phone: None,
            whatsapp: None,
            address: None,
            city: Some("São Paulo".to_string()),
            state: Some("SP".to_string()),
            postal_code: None,
            coordinate: Coordinate::new(-23.5505, -46.6333).ok(),
            region: Some(region.to_string()),
            rating: 0.0,
            logo_url: None,
            is_verified: true,
            is_active: true,
            email: None,
            created_at: Utc::now(),
        }
    }

    fn create_test_query(category: Option<&str>) -> SearchQuery {
        let origin = Coordinate::new(-23.55, -46.63).unwrap();
        SearchQuery {
            origin,
            category: category.map(str::to_string),
            radius_km: 10.0,
            bounding_box: calculate_bounding_box(&origin, 10.0),
        }
    }

    #[test]
    fn test_listed_requires_both_flags() {
        let mut company = create_test_company("bakery", "SP");
        assert!(is_listed(&company));

        company.is_verified = false;
        assert!(!is_listed(&company));

        company.is_verified = true;
        company.is_active = false;
        assert!(!is_listed(&company));
    }

    #[test]
    fn test_category_and_region_matching() {
        let company = create_test_company("bakery", "SP");
        assert!(matches_category(&company, None));
        assert!(matches_category(&company, Some("bakery")));
        assert!(!matches_category(&company, Some("Bakery")));

        assert!(matches_region(&company, None));
        assert!(matches_region(&company, Some("SP")));
        assert!(!matches_region(&company, Some("RJ")));
    }

    #[test]
    fn test_search_constraints_drop_missing_coordinate() {
        let mut company = create_test_company("bakery", "SP");
        let query = create_test_query(Some("bakery"));
        assert!(matches_search_constraints(&company, &query));

        company.coordinate = None;
        assert!(!matches_search_constraints(&company, &query));
    }

    #[test]
    fn test_search_constraints_outside_box() {
        let mut company = create_test_company("bakery", "SP");
        company.coordinate = Coordinate::new(-22.9068, -43.1729).ok();
        assert!(!matches_search_constraints(&company, &create_test_query(None)));
    }
}
