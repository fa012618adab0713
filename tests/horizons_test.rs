//! Tests for the Horizons HTTP client against a wiremock upstream.

use orrery::{BodyCategory, BodyDescriptor, EphemerisSource, FetchMode, HorizonsClient, OrreryError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VECTOR_PAYLOAD: &str = "\
*******************************************************************************
$$SOE
2460916.500000000 = A.D. 2025-Aug-29 00:00:00.0000 TDB
 X = 1.383898740586519E+00 Y =-2.380501019244869E-02 Z =-3.441598015041903E-02
 VX=  8.429987354577702E-04 VY=  1.513087004287741E-02 VZ=  2.920804545681785E-04
$$EOE
*******************************************************************************";

const OBSERVER_PAYLOAD: &str = "\
$$SOE
 2025-Aug-29 00:00, , , 1.20, 4.10, 96.2, 2.101, 11.40, 17.45, 44.0, /T, 25.3,
$$EOE";

fn mars() -> BodyDescriptor {
    BodyDescriptor {
        id: "mars".to_string(),
        horizons_id: "499".to_string(),
        display_name: "Mars".to_string(),
        category: BodyCategory::Planet,
    }
}

async fn client_for(server: &MockServer) -> HorizonsClient {
    HorizonsClient::with_base_url(format!("{}/api/horizons.api", server.uri())).unwrap()
}

#[tokio::test]
async fn vectors_fetch_parses_the_upstream_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/horizons.api"))
        .and(query_param("EPHEM_TYPE", "VECTORS"))
        .and(query_param("COMMAND", "'499'"))
        .respond_with(ResponseTemplate::new(200).set_body_string(VECTOR_PAYLOAD))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let vector = client.fetch(&mars(), FetchMode::Vectors).await.unwrap();
    assert_eq!(vector.name, "Mars");
    assert!((vector.x - 1.383898740586519).abs() < 1e-12);
    assert_eq!(vector.vz, Some(2.920804545681785e-4));
    assert!(vector.observer.is_none());
    assert_eq!(vector.epoch, "2025-08-29T00:00:00Z");
}

#[tokio::test]
async fn full_mode_merges_vector_and_observer_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/horizons.api"))
        .and(query_param("EPHEM_TYPE", "VECTORS"))
        .respond_with(ResponseTemplate::new(200).set_body_string(VECTOR_PAYLOAD))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/horizons.api"))
        .and(query_param("EPHEM_TYPE", "OBSERVER"))
        .and(query_param("CSV_FORMAT", "'YES'"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OBSERVER_PAYLOAD))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let vector = client.fetch(&mars(), FetchMode::Full).await.unwrap();
    let observer = vector.observer.expect("full mode carries observer geometry");
    assert!((observer.range_au - 2.101).abs() < 1e-9);
    assert!((observer.light_time_min - 17.45).abs() < 1e-9);
    assert_eq!(observer.apparent_magnitude, Some(1.20));
}

#[tokio::test]
async fn http_500_maps_to_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.fetch(&mars(), FetchMode::Vectors).await.unwrap_err();
    assert!(matches!(err, OrreryError::Api { status: 500, .. }));
}

#[tokio::test]
async fn http_429_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.fetch(&mars(), FetchMode::Vectors).await.unwrap_err();
    assert!(matches!(err, OrreryError::RateLimited { .. }));
}

#[tokio::test]
async fn garbage_payload_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("maintenance page"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.fetch(&mars(), FetchMode::Vectors).await.unwrap_err();
    assert!(matches!(err, OrreryError::Parse(_)));
}
