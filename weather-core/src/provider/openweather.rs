use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    config::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS},
    error::FetchError,
    model::{Condition, Coord, WeatherSnapshot},
};

use super::WeatherClient;

/// Client for the OpenWeather "current weather" endpoint.
///
/// Temperatures are requested in the provider's default unit, Kelvin.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    city_country: Option<String>,
    http: Client,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClientBuilder {
    api_key: String,
    base_url: String,
    city_country: Option<String>,
    timeout: Duration,
}

impl OpenWeatherClientBuilder {
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn city_country(mut self, country: Option<&str>) -> Self {
        self.city_country = country.map(str::to_string);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<OpenWeatherClient> {
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(OpenWeatherClient {
            api_key: self.api_key,
            base_url: self.base_url,
            city_country: self.city_country,
            http,
        })
    }
}

impl OpenWeatherClient {
    pub fn builder(api_key: &str) -> OpenWeatherClientBuilder {
        OpenWeatherClientBuilder {
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            city_country: None,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn city_country(&self) -> Option<&str> {
        self.city_country.as_deref()
    }

    /// City query as sent to the provider, e.g. `"Boston,us"`.
    fn city_query(&self, name: &str) -> String {
        match &self.city_country {
            Some(country) => format!("{name},{country}"),
            None => name.to_string(),
        }
    }

    async fn fetch(&self, query: &[(&str, &str)]) -> Result<WeatherSnapshot, FetchError> {
        let url = format!("{}/weather", self.base_url);
        tracing::debug!(%url, ?query, "requesting current weather");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("Failed to reach OpenWeather: {e}")))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            FetchError::Network(format!("Failed to read OpenWeather response body: {e}"))
        })?;

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(format!(
                "OpenWeather has no data for this location ({status}): {}",
                error_message(&body)
            )));
        }

        if !status.is_success() {
            return Err(FetchError::Other(format!(
                "OpenWeather request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: OwResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Other(format!("Failed to parse OpenWeather JSON: {e}")))?;

        Ok(parsed.into_snapshot())
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    async fn fetch_by_coordinates(
        &self,
        lat: &str,
        lon: &str,
    ) -> Result<WeatherSnapshot, FetchError> {
        self.fetch(&[("lat", lat), ("lon", lon)]).await
    }

    async fn fetch_by_city_name(&self, name: &str) -> Result<WeatherSnapshot, FetchError> {
        let q = self.city_query(name);
        self.fetch(&[("q", q.as_str())]).await
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCoord {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWeather {
    id: i64,
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    humidity: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwClouds {
    all: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwResponse {
    coord: Option<OwCoord>,
    weather: Vec<OwWeather>,
    main: Option<OwMain>,
    visibility: Option<u32>,
    wind: Option<OwWind>,
    clouds: Option<OwClouds>,
    dt: Option<i64>,
    sys: Option<OwSys>,
    timezone: Option<i32>,
    name: Option<String>,
}

impl OwResponse {
    fn into_snapshot(self) -> WeatherSnapshot {
        let coord = self
            .coord
            .map(|c| Coord { lat: c.lat, lon: c.lon })
            .unwrap_or_default();
        let main = self.main.unwrap_or_default();
        let sys = self.sys.unwrap_or_default();

        let condition = self.weather.into_iter().next().map(|w| Condition {
            code: w.id,
            main: w.main,
            description: w.description,
            icon: w.icon,
        });

        WeatherSnapshot {
            location_name: self.name,
            coord,
            temperature_k: main.temp,
            feels_like_k: main.feels_like,
            temp_min_k: main.temp_min,
            temp_max_k: main.temp_max,
            humidity_pct: main.humidity,
            visibility_m: self.visibility,
            wind_speed_mps: self.wind.and_then(|w| w.speed),
            cloud_cover_pct: self.clouds.and_then(|c| c.all),
            condition,
            country: sys.country,
            observed_at: self.dt.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            timezone_offset_secs: self.timezone,
            sunrise: sys.sunrise,
            sunset: sys.sunset,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: String,
}

/// Provider's own error text, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<OwErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| truncate_body(body))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_query_appends_country_scope() {
        let client = OpenWeatherClient::builder("KEY")
            .city_country(Some("us"))
            .build()
            .expect("client");
        assert_eq!(client.city_query("Boston"), "Boston,us");

        let unscoped = OpenWeatherClient::builder("KEY").build().expect("client");
        assert_eq!(unscoped.city_query("Boston"), "Boston");
    }

    #[test]
    fn sparse_payload_maps_to_empty_fields() {
        let parsed: OwResponse = serde_json::from_str(r#"{"name":"Nowhere"}"#).expect("parse");
        let snapshot = parsed.into_snapshot();

        assert_eq!(snapshot.location_name.as_deref(), Some("Nowhere"));
        assert_eq!(snapshot.coord, Coord::default());
        assert!(snapshot.temperature_k.is_none());
        assert!(snapshot.condition.is_none());
    }

    #[test]
    fn error_message_prefers_provider_text() {
        assert_eq!(error_message(r#"{"cod":"404","message":"city not found"}"#), "city not found");
        assert_eq!(error_message("gateway down"), "gateway down");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
    }
}
