//! Temperature conversion and coordinate formatting.

use crate::model::{DerivedTemperatures, UnitPreference, WeatherSnapshot};

const KELVIN_OFFSET: f64 = 273.15;
const COORDINATE_DECIMALS: usize = 4;

pub fn kelvin_to_celsius(kelvin: Option<f64>) -> Option<f64> {
    kelvin.map(|k| k - KELVIN_OFFSET)
}

pub fn celsius_to_fahrenheit(celsius: Option<f64>) -> Option<f64> {
    celsius.map(|c| c * 9.0 / 5.0 + 32.0)
}

/// Format with at most four fractional digits, dropping trailing zeros.
///
/// `37.7749` renders as `"37.7749"`, `37.0` as `"37"`.
pub fn format_coordinate(value: f64) -> String {
    let fixed = format!("{:.*}", COORDINATE_DECIMALS, value);
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };

    // Values that round to zero from below would otherwise print as "-0".
    if trimmed == "-0" {
        return "0".to_string();
    }
    trimmed.to_string()
}

/// Convert the snapshot's Kelvin readings into `unit`.
///
/// Celsius is always derived first and Fahrenheit from that Celsius value.
pub fn derive_temperatures(snapshot: &WeatherSnapshot, unit: UnitPreference) -> DerivedTemperatures {
    let convert = |kelvin: Option<f64>| {
        let celsius = kelvin_to_celsius(kelvin);
        match unit {
            UnitPreference::Celsius => celsius,
            UnitPreference::Fahrenheit => celsius_to_fahrenheit(celsius),
        }
    };

    DerivedTemperatures {
        unit,
        current: convert(snapshot.temperature_k),
        feels_like: convert(snapshot.feels_like_k),
        min: convert(snapshot.temp_min_k),
        max: convert(snapshot.temp_max_k),
    }
}
