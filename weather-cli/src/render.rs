use std::fmt::Write;

use weather_core::{FetchState, WeatherView, units::format_coordinate};

/// Render the controller's view as human-readable text.
pub fn view(view: &WeatherView) -> String {
    let mut out = String::new();

    match &view.fetch_state {
        FetchState::Idle => out.push_str("No weather loaded yet.\n"),
        FetchState::Loading => out.push_str("Loading...\n"),
        FetchState::Error { message, .. } => {
            let _ = writeln!(out, "Error: {message}");
        }
        FetchState::Success(snapshot) => {
            let place = match (&snapshot.location_name, &snapshot.country) {
                (Some(name), Some(country)) => format!("{name}, {country}"),
                (Some(name), None) => name.clone(),
                _ => "Unknown location".to_string(),
            };
            let _ = writeln!(out, "{place}");

            if let Some(condition) = &snapshot.condition {
                let _ = writeln!(out, "  {}: {}", condition.main, condition.description);
            }

            if let Some(temps) = &view.temperatures {
                let unit = temps.unit.symbol();
                let _ = writeln!(out, "  Temperature: {}", temperature(temps.current, unit));
                let _ = writeln!(out, "  Feels like:  {}", temperature(temps.feels_like, unit));
                let _ = writeln!(
                    out,
                    "  Min / Max:   {} / {}",
                    temperature(temps.min, unit),
                    temperature(temps.max, unit)
                );
            }

            if let Some(humidity) = snapshot.humidity_pct {
                let _ = writeln!(out, "  Humidity:    {humidity}%");
            }
            if let Some(visibility) = snapshot.visibility_m {
                let _ = writeln!(out, "  Visibility:  {visibility} m");
            }
            if let Some(wind) = snapshot.wind_speed_mps {
                let _ = writeln!(out, "  Wind:        {wind:.1} m/s");
            }
            if let Some(clouds) = snapshot.cloud_cover_pct {
                let _ = writeln!(out, "  Clouds:      {clouds}%");
            }
            if let Some(observed) = snapshot.observed_local() {
                let _ = writeln!(out, "  Observed:    {observed}");
            }
            if let Some(sunrise) = snapshot.sunrise_local() {
                let _ = writeln!(out, "  Sunrise:     {sunrise}");
            }
            if let Some(sunset) = snapshot.sunset_local() {
                let _ = writeln!(out, "  Sunset:      {sunset}");
            }
            if let Some(icon) = snapshot.icon_url() {
                let _ = writeln!(out, "  Icon:        {icon}");
            }
        }
    }

    if let Some(coords) = view.coordinates {
        let _ = writeln!(
            out,
            "  Location:    {}, {}",
            format_coordinate(coords.latitude),
            format_coordinate(coords.longitude)
        );
    }

    out
}

fn temperature(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.1}{unit}"),
        None => "--".to_string(),
    }
}
