//! Integration tests for OpenWeatherClient using wiremock.

use std::time::Duration;

use weather_core::{ErrorKind, OpenWeatherClient, WeatherClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Trimmed-down real response of the current weather endpoint.
fn current_weather_body() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": -122.4194, "lat": 37.7749 },
        "weather": [
            { "id": 801, "main": "Clouds", "description": "few clouds", "icon": "02d" },
            { "id": 701, "main": "Mist", "description": "mist", "icon": "50d" }
        ],
        "base": "stations",
        "main": {
            "temp": 288.15,
            "feels_like": 287.4,
            "temp_min": 285.93,
            "temp_max": 290.37,
            "pressure": 1015,
            "humidity": 72
        },
        "visibility": 10000,
        "wind": { "speed": 4.63, "deg": 270 },
        "clouds": { "all": 20 },
        "dt": 1_700_000_000,
        "sys": { "type": 2, "id": 2007646, "country": "US", "sunrise": 1_699_972_000, "sunset": 1_700_009_000 },
        "timezone": -28800,
        "id": 5391959,
        "name": "San Francisco",
        "cod": 200
    })
}

fn client(server: &MockServer) -> OpenWeatherClient {
    OpenWeatherClient::builder("TEST_KEY")
        .base_url(&server.uri())
        .city_country(Some("us"))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_fetch_by_coordinates_parses_snapshot() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "37.7749"))
        .and(query_param("lon", "-122.4194"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let snapshot = client(&mock_server)
        .fetch_by_coordinates("37.7749", "-122.4194")
        .await
        .unwrap();

    assert_eq!(snapshot.location_name.as_deref(), Some("San Francisco"));
    assert_eq!(snapshot.coord.lat, Some(37.7749));
    assert_eq!(snapshot.coord.lon, Some(-122.4194));
    assert_eq!(snapshot.temperature_k, Some(288.15));
    assert_eq!(snapshot.feels_like_k, Some(287.4));
    assert_eq!(snapshot.temp_min_k, Some(285.93));
    assert_eq!(snapshot.temp_max_k, Some(290.37));
    assert_eq!(snapshot.humidity_pct, Some(72));
    assert_eq!(snapshot.visibility_m, Some(10000));
    assert_eq!(snapshot.wind_speed_mps, Some(4.63));
    assert_eq!(snapshot.cloud_cover_pct, Some(20));
    assert_eq!(snapshot.country.as_deref(), Some("US"));
    assert_eq!(snapshot.timezone_offset_secs, Some(-28800));
    assert_eq!(snapshot.sunrise, Some(1_699_972_000));
    assert_eq!(snapshot.sunset, Some(1_700_009_000));
    assert_eq!(snapshot.observed_at.map(|t| t.timestamp()), Some(1_700_000_000));

    let condition = snapshot.condition.as_ref().unwrap();
    assert_eq!(condition.code, 801);
    assert_eq!(condition.description, "few clouds");
    assert_eq!(
        snapshot.icon_url().as_deref(),
        Some("https://openweathermap.org/img/wn/02d@2x.png")
    );
    assert_eq!(snapshot.observed_local().as_deref(), Some("14:13:20 14-11-2023"));
}

#[tokio::test]
async fn test_fetch_by_city_scopes_query_to_country() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "San Francisco,us"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let snapshot = client(&mock_server)
        .fetch_by_city_name("San Francisco")
        .await
        .unwrap();

    assert_eq!(snapshot.country.as_deref(), Some("US"));
}

#[tokio::test]
async fn test_not_found_is_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .fetch_by_city_name("NonExistentCity")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.message().contains("city not found"));
}

#[tokio::test]
async fn test_server_error_is_other() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .fetch_by_coordinates("1", "2")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Other);
    assert!(err.message().contains("500"));
    assert!(err.message().contains("Internal Server Error"));
}

#[tokio::test]
async fn test_unauthorized_is_other() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key"
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .fetch_by_coordinates("1", "2")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Other);
    assert!(err.message().contains("401"));
}

#[tokio::test]
async fn test_malformed_json_is_other() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .fetch_by_coordinates("1", "2")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Other);
    assert!(err.message().contains("parse"));
}

#[tokio::test]
async fn test_slow_server_is_network_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_weather_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::builder("TEST_KEY")
        .base_url(&mock_server.uri())
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let err = client.fetch_by_coordinates("1", "2").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Nothing listens on port 9 locally.
    let client = OpenWeatherClient::builder("TEST_KEY")
        .base_url("http://127.0.0.1:9")
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let err = client.fetch_by_city_name("Boston").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}
