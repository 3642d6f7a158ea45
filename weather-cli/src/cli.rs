use std::{fmt, sync::Arc};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, Password, PasswordDisplayMode, Select, Text};
use weather_core::{
    Config, ControllerOptions, FetchState, FileLocationStore, UnitPreference,
    WeatherFetchController, client_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather API key and defaults.
    Configure,

    /// Show weather for the last used location.
    Last {
        #[command(flatten)]
        units: UnitArgs,
    },

    /// Show weather for coordinates.
    Coords {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        #[command(flatten)]
        units: UnitArgs,
    },

    /// Show weather for a city.
    City {
        /// City name; multiple words are joined with spaces.
        #[arg(required = true)]
        name: Vec<String>,

        #[command(flatten)]
        units: UnitArgs,
    },

    /// Browse weather interactively.
    Interactive,
}

#[derive(Debug, Args)]
pub struct UnitArgs {
    /// Show temperatures in Fahrenheit.
    #[arg(long, short = 'f', conflicts_with = "celsius")]
    fahrenheit: bool,

    /// Show temperatures in Celsius.
    #[arg(long, short = 'c')]
    celsius: bool,
}

impl UnitArgs {
    fn preference(&self) -> Option<UnitPreference> {
        if self.fahrenheit {
            Some(UnitPreference::Fahrenheit)
        } else if self.celsius {
            Some(UnitPreference::Celsius)
        } else {
            None
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Last { units } => {
                let controller = controller_with_units(&units)?;
                controller.fetch_by_last_location().await;
                finish(&controller)
            }
            Command::Coords {
                latitude,
                longitude,
                units,
            } => {
                let controller = controller_with_units(&units)?;
                controller.fetch_by_coordinates(latitude, longitude).await;
                finish(&controller)
            }
            Command::City { name, units } => {
                let controller = controller_with_units(&units)?;
                controller.search_by_city(&name.join(" ")).await;
                finish(&controller)
            }
            Command::Interactive => interactive().await,
        }
    }
}

fn build_controller(config: &Config) -> anyhow::Result<WeatherFetchController> {
    let client = client_from_config(config)?;
    let store = FileLocationStore::new(Config::location_file_path()?);
    tracing::debug!(path = %store.path().display(), "using location store");

    Ok(WeatherFetchController::new(
        Arc::new(client),
        Arc::new(store),
        ControllerOptions::from(config),
    ))
}

fn controller_with_units(units: &UnitArgs) -> anyhow::Result<WeatherFetchController> {
    let config = Config::load()?;
    let controller = build_controller(&config)?;
    if let Some(unit) = units.preference() {
        controller.set_unit_preference(unit);
    }
    Ok(controller)
}

/// Print the outcome of a one-shot command.
fn finish(controller: &WeatherFetchController) -> anyhow::Result<()> {
    let view = controller.view();
    match &view.fetch_state {
        FetchState::Error { message, .. } => bail!("{message}"),
        FetchState::Idle => bail!(
            "No saved location yet.\n\
             Hint: run `weather city <NAME>` or `weather coords <LAT> <LON>` first."
        ),
        _ => {
            print!("{}", render::view(&view));
            Ok(())
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key (leave empty to keep current):")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key);
    } else if config.api_key().is_none() {
        bail!("An API key is required. Get one at https://openweathermap.org/api");
    }

    let country = Text::new("Country code for city searches (empty for worldwide):")
        .with_default(config.city_country().unwrap_or_default())
        .prompt()
        .context("Failed to read country code")?;
    config.city_country = Some(country.trim().to_string());

    let units = vec![UnitPreference::Celsius, UnitPreference::Fahrenheit];
    let start = units.iter().position(|u| *u == config.units).unwrap_or(0);
    config.units = Select::new("Default temperature unit:", units)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read unit")?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum MenuItem {
    SearchCity,
    Coordinates,
    ToggleUnit,
    RefreshLast,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuItem::SearchCity => "Search city",
            MenuItem::Coordinates => "Enter coordinates",
            MenuItem::ToggleUnit => "Toggle °C / °F",
            MenuItem::RefreshLast => "Refresh last location",
            MenuItem::Quit => "Quit",
        })
    }
}

async fn interactive() -> anyhow::Result<()> {
    let config = Config::load()?;
    let controller = build_controller(&config)?;

    controller.fetch_by_last_location().await;
    print!("{}", render::view(&controller.view()));

    let items = vec![
        MenuItem::SearchCity,
        MenuItem::Coordinates,
        MenuItem::ToggleUnit,
        MenuItem::RefreshLast,
        MenuItem::Quit,
    ];

    loop {
        let choice = Select::new("What next?", items.clone())
            .prompt()
            .context("Failed to read menu choice")?;

        match choice {
            MenuItem::SearchCity => {
                let name = Text::new("City:").prompt().context("Failed to read city")?;
                controller.search_by_city(&name).await;
            }
            MenuItem::Coordinates => {
                let latitude = CustomType::<f64>::new("Latitude:")
                    .prompt()
                    .context("Failed to read latitude")?;
                let longitude = CustomType::<f64>::new("Longitude:")
                    .prompt()
                    .context("Failed to read longitude")?;
                controller.fetch_by_coordinates(latitude, longitude).await;
            }
            MenuItem::ToggleUnit => {
                controller.toggle_unit();
            }
            MenuItem::RefreshLast => controller.fetch_by_last_location().await,
            MenuItem::Quit => return Ok(()),
        }

        print!("{}", render::view(&controller.view()));
    }
}
