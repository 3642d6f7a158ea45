use crate::{Config, FetchError, WeatherSnapshot, provider::openweather::OpenWeatherClient};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of current weather data.
///
/// Coordinates are passed as text exactly as they should appear in the request.
#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    async fn fetch_by_coordinates(
        &self,
        lat: &str,
        lon: &str,
    ) -> Result<WeatherSnapshot, FetchError>;

    async fn fetch_by_city_name(&self, name: &str) -> Result<WeatherSnapshot, FetchError>;
}

/// Construct the OpenWeather client from config.
pub fn client_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `weather configure` and enter your API key."
        )
    })?;

    OpenWeatherClient::builder(api_key)
        .base_url(&config.base_url)
        .city_country(config.city_country())
        .timeout(config.request_timeout())
        .build()
}
