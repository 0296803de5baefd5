// Unit tests for Guia Local

use chrono::{NaiveDate, Utc};
use guia_local::core::{
    click_through_rate,
    distance::{calculate_bounding_box, haversine_distance, is_within_bounding_box},
    is_valid_document, normalize_document, paginate, summarize, DocumentKind, SearchError,
    SearchPipeline, SponsorshipSelector,
};
use guia_local::models::{AnalyticsDay, Company, Coordinate, PaymentStatus};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn create_test_company(id: i64, lat: f64, lon: f64) -> Company {
    Company {
        id,
        user_id: id,
        company_name: format!("Empresa {}", id),
        cnpj: "11222333000181".to_string(),
        description: None,
        category: Some("restaurante".to_string()),
        phone: None,
        whatsapp: None,
        address: None,
        city: None,
        state: Some("SP".to_string()),
        postal_code: None,
        coordinate: Some(Coordinate::new(lat, lon).unwrap()),
        region: Some("SP".to_string()),
        rating: 0.0,
        logo_url: None,
        is_verified: true,
        is_active: true,
        email: None,
        created_at: Utc::now(),
    }
}

#[test]
fn test_haversine_distance_zero() {
    let distance = haversine_distance(-23.5505, -46.6333, -23.5505, -46.6333);
    assert_eq!(distance, 0.0);
}

#[test]
fn test_haversine_sao_paulo_to_rio() {
    let distance = haversine_distance(-23.5505, -46.6333, -22.9068, -43.1729);
    assert!((357.0..=361.0).contains(&distance), "got {}", distance);
}

#[test]
fn test_haversine_is_symmetric_and_non_negative() {
    let points = [
        (-23.5505, -46.6333),
        (-22.9068, -43.1729),
        (-3.7319, -38.5267),
        (89.9, 179.9),
        (-89.9, -179.9),
    ];

    for &(lat1, lon1) in &points {
        for &(lat2, lon2) in &points {
            let ab = haversine_distance(lat1, lon1, lat2, lon2);
            let ba = haversine_distance(lat2, lon2, lat1, lon1);
            assert!(ab >= 0.0);
            assert!((ab - ba).abs() < 1e-9);
        }
    }
}

#[test]
fn test_bounding_box_contains_circle() {
    let origin = Coordinate::new(-23.5505, -46.6333).unwrap();
    let bbox = calculate_bounding_box(&origin, 10.0);

    assert!(is_within_bounding_box(&origin, &bbox));

    // Roughly 0.18 degrees of latitude for 10 km
    let lat_span = bbox.max_lat - bbox.min_lat;
    assert!((lat_span - 0.18).abs() < 0.02);

    let far = Coordinate::new(-22.9068, -43.1729).unwrap();
    assert!(!is_within_bounding_box(&far, &bbox));
}

#[test]
fn test_cpf_fixtures() {
    assert!(is_valid_document("52998224725", DocumentKind::Pf));
    assert!(is_valid_document("529.982.247-25", DocumentKind::Pf));
    assert!(!is_valid_document("52998224726", DocumentKind::Pf));
    assert!(!is_valid_document("11111111111", DocumentKind::Pf));
    assert!(!is_valid_document("5299822472", DocumentKind::Pf));
}

#[test]
fn test_cnpj_fixtures() {
    assert!(is_valid_document("11222333000181", DocumentKind::Pj));
    assert!(is_valid_document("11.222.333/0001-81", DocumentKind::Pj));
    assert!(!is_valid_document("11222333000182", DocumentKind::Pj));
    assert!(!is_valid_document("00000000000000", DocumentKind::Pj));
    // A valid CPF is not a CNPJ
    assert!(!is_valid_document("52998224725", DocumentKind::Pj));
}

#[test]
fn test_normalize_document() {
    assert_eq!(normalize_document("11.222.333/0001-81"), "11222333000181");
}

#[test]
fn test_search_requires_origin() {
    let pipeline = SearchPipeline::default();
    let result = pipeline.search(None, None, Some(10.0), vec![]);
    assert!(matches!(result, Err(SearchError::MissingOrigin)));
}

#[test]
fn test_search_radius_and_order() {
    let pipeline = SearchPipeline::default();
    let origin = Coordinate::new(-23.5505, -46.6333).unwrap();

    let candidates = vec![
        create_test_company(1, -23.60, -46.70), // ~8 km
        create_test_company(2, -23.5505, -46.6333), // origin
        create_test_company(3, -22.9068, -43.1729), // Rio
        create_test_company(4, -23.56, -46.64), // ~1 km
    ];

    let result = pipeline
        .search(Some(origin), None, Some(20.0), candidates)
        .unwrap();

    let ids: Vec<i64> = result.hits.iter().map(|h| h.company.id).collect();
    assert_eq!(ids, vec![2, 4, 1]);
    assert!(result.hits.iter().all(|h| h.distance_km <= 20.0));
    assert_eq!(result.total_candidates, 4);
}

#[test]
fn test_search_zero_radius_keeps_exact_origin() {
    let pipeline = SearchPipeline::default();
    let origin = Coordinate::new(-23.5505, -46.6333).unwrap();

    let candidates = vec![
        create_test_company(1, -23.5505, -46.6333),
        create_test_company(2, -23.5506, -46.6333),
    ];

    let result = pipeline
        .search(Some(origin), None, Some(0.0), candidates)
        .unwrap();

    assert_eq!(result.hits.len(), 1);
    assert_eq!(result.hits[0].company.id, 1);
}

#[test]
fn test_pagination_bounds() {
    let page = paginate((1..=45).collect::<Vec<_>>(), 3, 20);
    assert_eq!(page.items, (41..=45).collect::<Vec<_>>());
    assert_eq!(page.total_pages, 3);
    assert!(!page.has_next);

    let beyond = paginate((1..=45).collect::<Vec<_>>(), 9, 20);
    assert!(beyond.items.is_empty());
}

#[test]
fn test_sponsored_sample_sizes() {
    let selector = SponsorshipSelector::default();
    let mut rng = StdRng::seed_from_u64(42);

    let three: Vec<Company> = (1..=3).map(|i| create_test_company(i, -23.5, -46.6)).collect();
    let limit = selector.resolve_limit(None).unwrap();
    assert_eq!(selector.select(three, None, limit, &mut rng).len(), 3);

    let fifteen: Vec<Company> = (1..=15).map(|i| create_test_company(i, -23.5, -46.6)).collect();
    let picked = selector.select(fifteen, None, limit, &mut rng);
    assert_eq!(picked.len(), 10);

    let mut ids: Vec<i64> = picked.iter().map(|c| c.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}

#[test]
fn test_payment_status_transitions() {
    assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Approved));
    assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));
    assert!(!PaymentStatus::Approved.can_transition_to(PaymentStatus::Failed));
    assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Approved));
    assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Pending));
}

#[test]
fn test_analytics_summary() {
    let day = |d: u32, views: i64, clicks: i64| AnalyticsDay {
        company_id: 1,
        date: NaiveDate::from_ymd_opt(2026, 5, d).unwrap(),
        profile_views: views,
        whatsapp_clicks: clicks,
    };

    let summary = summarize(&[day(1, 10, 1), day(2, 30, 3)], "last_7_days");
    assert_eq!(summary.total_views, 40);
    assert_eq!(summary.total_clicks, 4);
    assert_eq!(summary.click_through_rate, click_through_rate(40, 4));
    assert_eq!(summary.click_through_rate, 10.0);
}
