// Outbound HTTP adapters against a mock server

use guia_local::services::{
    CacheManager, GeocodingClient, GeocodingError, PaymentClient, PaymentError, PreferenceItem,
};
use mockito::Matcher;
use std::sync::Arc;
use std::time::Duration;

fn geocoder(url: &str) -> GeocodingClient {
    GeocodingClient::new(url.to_string(), Duration::from_secs(2)).unwrap()
}

fn payments(url: &str) -> PaymentClient {
    PaymentClient::new(
        url.to_string(),
        "test-token".to_string(),
        "https://guia.test".to_string(),
        Duration::from_secs(2),
    )
    .unwrap()
}

#[tokio::test]
async fn test_geocoding_found() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/20040020/json/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"cep": "20040-020", "logradouro": "Praça Pio X", "localidade": "Rio de Janeiro",
                "uf": "RJ", "lat": -22.9009, "lon": -43.1784}"#,
        )
        .create_async()
        .await;

    let location = geocoder(&server.url()).resolve("20040-020").await.unwrap();

    assert_eq!(location.postal_code, "20040-020");
    assert_eq!(location.city.as_deref(), Some("Rio de Janeiro"));
    assert_eq!(location.region.as_deref(), Some("RJ"));
    let point = location.coordinate.unwrap();
    assert_eq!(point.latitude(), -22.9009);
    assert_eq!(point.longitude(), -43.1784);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_geocoding_erro_flag_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/00000000/json/")
        .with_status(200)
        .with_body(r#"{"erro": "true"}"#)
        .create_async()
        .await;

    let result = geocoder(&server.url()).resolve("00000-000").await;
    assert!(matches!(result, Err(GeocodingError::NotFound(_))));
}

#[tokio::test]
async fn test_geocoding_server_error_is_unavailable() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/01001000/json/")
        .with_status(503)
        .create_async()
        .await;

    let result = geocoder(&server.url()).resolve("01001000").await;
    assert!(matches!(result, Err(GeocodingError::Unavailable(_))));
}

#[tokio::test]
async fn test_geocoding_undecodable_body_is_unavailable() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/01001000/json/")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let result = geocoder(&server.url()).resolve("01001000").await;
    assert!(matches!(result, Err(GeocodingError::Unavailable(_))));
}

#[tokio::test]
async fn test_geocoding_malformed_coordinates_give_no_point() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/01001000/json/")
        .with_status(200)
        .with_body(r#"{"cep": "01001-000", "localidade": "São Paulo", "uf": "SP", "lat": "", "lon": "x"}"#)
        .create_async()
        .await;

    let location = geocoder(&server.url()).resolve("01001000").await.unwrap();
    assert!(location.coordinate.is_none());
    assert_eq!(location.region.as_deref(), Some("SP"));
}

#[tokio::test]
async fn test_geocoding_invalid_input_skips_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let result = geocoder(&server.url()).resolve("12-34").await;
    assert!(matches!(result, Err(GeocodingError::InvalidPostalCode(_))));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_geocoding_second_lookup_served_from_cache() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/01001000/json/")
        .with_status(200)
        .with_body(r#"{"cep": "01001-000", "uf": "SP", "lat": "-23.55", "lon": "-46.63"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = geocoder(&server.url()).with_cache(Arc::new(CacheManager::in_memory(100, 60)));

    let first = client.resolve("01001-000").await.unwrap();
    let second = client.resolve("01001000").await.unwrap();
    assert_eq!(first, second);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_payment_preference_created() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/checkout/preferences")
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::PartialJsonString(
            r#"{"auto_return": "approved", "payer": {"email": "dono@example.com"}}"#
                .to_string(),
        ))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "pref-123", "init_point": "https://checkout.test/pref-123"}"#)
        .create_async()
        .await;

    let preference = payments(&server.url())
        .create_preference(&PreferenceItem {
            company_id: 7,
            company_name: "Padaria Central",
            payer_email: "dono@example.com",
            amount_cents: 4990,
            duration_days: 30,
        })
        .await
        .unwrap();

    assert_eq!(preference.id, "pref-123");
    assert_eq!(preference.init_point.as_deref(), Some("https://checkout.test/pref-123"));
    assert!(preference.external_reference.starts_with("promotion_7_"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_payment_preference_rejected_token() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/checkout/preferences")
        .with_status(401)
        .create_async()
        .await;

    let result = payments(&server.url())
        .create_preference(&PreferenceItem {
            company_id: 7,
            company_name: "Padaria Central",
            payer_email: "dono@example.com",
            amount_cents: 100,
            duration_days: 30,
        })
        .await;

    assert!(matches!(result, Err(PaymentError::Unauthorized)));
}

#[tokio::test]
async fn test_payment_lookup() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/payments/987654")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 987654, "status": "rejected", "external_reference": "promotion_7_abc"}"#)
        .create_async()
        .await;

    let payment = payments(&server.url()).get_payment("987654").await.unwrap();

    assert_eq!(payment.id, "987654");
    assert!(payment.is_rejected());
    assert_eq!(payment.external_reference.as_deref(), Some("promotion_7_abc"));
}

#[tokio::test]
async fn test_payment_lookup_missing() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/payments/1")
        .with_status(404)
        .create_async()
        .await;

    let result = payments(&server.url()).get_payment("1").await;
    assert!(matches!(result, Err(PaymentError::NotFound(_))));
}
