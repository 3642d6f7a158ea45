use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";
const LOCAL_TIME_FORMAT: &str = "%H:%M:%S %d-%m-%Y";

/// A resolved geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Position as reported by the provider; either field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Coord {
    /// Resolve to coordinates, substituting `0.0` for each missing field.
    pub fn or_origin(&self) -> Coordinates {
        Coordinates::new(self.lat.unwrap_or(0.0), self.lon.unwrap_or(0.0))
    }
}

/// Primary weather condition of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub code: i64,
    pub main: String,
    pub description: String,
    pub icon: String,
}

/// One fetched weather payload. Temperatures are in Kelvin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: Option<String>,
    pub coord: Coord,
    pub temperature_k: Option<f64>,
    pub feels_like_k: Option<f64>,
    pub temp_min_k: Option<f64>,
    pub temp_max_k: Option<f64>,
    pub humidity_pct: Option<u8>,
    pub visibility_m: Option<u32>,
    pub wind_speed_mps: Option<f64>,
    pub cloud_cover_pct: Option<u8>,
    pub condition: Option<Condition>,
    pub country: Option<String>,
    pub observed_at: Option<DateTime<Utc>>,
    /// Shift of the location's local time from UTC, in seconds.
    pub timezone_offset_secs: Option<i32>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

impl WeatherSnapshot {
    pub fn observed_local(&self) -> Option<String> {
        let ts = self.observed_at?.timestamp();
        format_local_time(ts, self.timezone_offset_secs?)
    }

    pub fn sunrise_local(&self) -> Option<String> {
        format_local_time(self.sunrise?, self.timezone_offset_secs?)
    }

    pub fn sunset_local(&self) -> Option<String> {
        format_local_time(self.sunset?, self.timezone_offset_secs?)
    }

    /// URL of the provider's icon for the primary condition.
    pub fn icon_url(&self) -> Option<String> {
        let icon = &self.condition.as_ref()?.icon;
        if icon.is_empty() {
            return None;
        }
        Some(format!("{ICON_BASE_URL}/{icon}@2x.png"))
    }
}

/// Render epoch seconds as wall-clock time at the given UTC offset.
pub fn format_local_time(epoch_secs: i64, offset_secs: i32) -> Option<String> {
    let offset = FixedOffset::east_opt(offset_secs)?;
    let utc = DateTime::<Utc>::from_timestamp(epoch_secs, 0)?;
    Some(utc.with_timezone(&offset).format(LOCAL_TIME_FORMAT).to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitPreference {
    #[default]
    Celsius,
    Fahrenheit,
}

impl UnitPreference {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnitPreference::Celsius => "°C",
            UnitPreference::Fahrenheit => "°F",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            UnitPreference::Celsius => UnitPreference::Fahrenheit,
            UnitPreference::Fahrenheit => UnitPreference::Celsius,
        }
    }
}

impl std::fmt::Display for UnitPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitPreference::Celsius => f.write_str("Celsius"),
            UnitPreference::Fahrenheit => f.write_str("Fahrenheit"),
        }
    }
}

/// Snapshot temperatures converted to a display unit.
///
/// Always a pure function of a `WeatherSnapshot` and a `UnitPreference`,
/// see [`derive_temperatures`](crate::units::derive_temperatures).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedTemperatures {
    pub unit: UnitPreference,
    pub current: Option<f64>,
    pub feels_like: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Phase of the request lifecycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Success(Arc<WeatherSnapshot>),
    Error { kind: ErrorKind, message: String },
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn snapshot(&self) -> Option<&Arc<WeatherSnapshot>> {
        match self {
            FetchState::Success(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<(ErrorKind, &str)> {
        match self {
            FetchState::Error { kind, message } => Some((*kind, message.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_fallback_is_origin_per_field() {
        assert_eq!(Coord::default().or_origin(), Coordinates::new(0.0, 0.0));

        let partial = Coord { lat: Some(12.5), lon: None };
        assert_eq!(partial.or_origin(), Coordinates::new(12.5, 0.0));
    }

    #[test]
    fn local_time_applies_offset() {
        // 2023-11-14 22:13:20 UTC, shifted by -5h
        let s = format_local_time(1_700_000_000, -5 * 3600).expect("valid offset");
        assert_eq!(s, "17:13:20 14-11-2023");
    }

    #[test]
    fn local_time_rejects_out_of_range_offset() {
        assert!(format_local_time(0, 200_000).is_none());
    }

    #[test]
    fn sun_times_need_an_offset() {
        let mut snapshot = WeatherSnapshot {
            sunrise: Some(0),
            sunset: Some(3600),
            ..Default::default()
        };
        assert!(snapshot.sunrise_local().is_none());

        snapshot.timezone_offset_secs = Some(0);
        assert_eq!(snapshot.sunrise_local().as_deref(), Some("00:00:00 01-01-1970"));
        assert_eq!(snapshot.sunset_local().as_deref(), Some("01:00:00 01-01-1970"));
    }

    #[test]
    fn icon_url_uses_condition_icon() {
        let snapshot = WeatherSnapshot {
            condition: Some(Condition {
                code: 800,
                main: "Clear".into(),
                description: "clear sky".into(),
                icon: "01d".into(),
            }),
            ..Default::default()
        };
        assert_eq!(
            snapshot.icon_url().as_deref(),
            Some("https://openweathermap.org/img/wn/01d@2x.png")
        );
        assert!(WeatherSnapshot::default().icon_url().is_none());
    }

    #[test]
    fn unit_toggle_roundtrip() {
        let unit = UnitPreference::default();
        assert_eq!(unit, UnitPreference::Celsius);
        assert_eq!(unit.toggled(), UnitPreference::Fahrenheit);
        assert_eq!(unit.toggled().toggled(), unit);
        assert_eq!(UnitPreference::Fahrenheit.symbol(), "°F");
    }
}
