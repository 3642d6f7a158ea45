//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - The weather fetch state machine and its observable state
//! - Temperature conversion and coordinate formatting
//! - The weather provider and location store capabilities, with OpenWeather
//!   and file-backed implementations
//! - Configuration handling
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod provider;
pub mod publish;
pub mod store;
pub mod units;

pub use config::Config;
pub use controller::{
    CITY_NOT_FOUND_MESSAGE, ControllerOptions, INVALID_CITY_MESSAGE, WeatherFetchController,
};
pub use error::{ErrorKind, FetchError};
pub use model::{
    Condition, Coord, Coordinates, DerivedTemperatures, FetchState, UnitPreference,
    WeatherSnapshot,
};
pub use provider::{WeatherClient, client_from_config, openweather::OpenWeatherClient};
pub use publish::{Subscription, WeatherView};
pub use store::{FileLocationStore, LocationStore, MemoryLocationStore};
