//! Weather fetch state machine.
//!
//! The controller runs fetches against a [`WeatherClient`], keeps the last
//! successful snapshot and publishes every change through a [`WeatherView`].
//! Failures never escape as errors; they are published as [`FetchState::Error`].

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::sync::{broadcast, watch};

use crate::{
    config::{Config, DEFAULT_REQUEST_TIMEOUT_SECS},
    error::{ErrorKind, FetchError},
    model::{Coordinates, DerivedTemperatures, FetchState, UnitPreference, WeatherSnapshot},
    provider::WeatherClient,
    publish::{self, Subscription, WeatherView},
    store::LocationStore,
    units::derive_temperatures,
};

/// Published when a city search comes back empty.
pub const CITY_NOT_FOUND_MESSAGE: &str = "City not found. Please try another city.";
/// Published when a city search is blank.
pub const INVALID_CITY_MESSAGE: &str = "Invalid city name.";

const TRANSITION_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Upper bound for a single provider call; exceeding it is a network error.
    pub request_timeout: Duration,
    pub initial_unit: UnitPreference,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            initial_unit: UnitPreference::default(),
        }
    }
}

impl From<&Config> for ControllerOptions {
    fn from(config: &Config) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            initial_unit: config.units,
        }
    }
}

pub struct WeatherFetchController {
    client: Arc<dyn WeatherClient>,
    store: Arc<dyn LocationStore>,
    request_timeout: Duration,
    view: watch::Sender<WeatherView>,
    transitions: broadcast::Sender<FetchState>,
    /// Ticket of the newest request; results carrying an older ticket are dropped.
    generation: AtomicU64,
}

impl std::fmt::Debug for WeatherFetchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherFetchController")
            .field("client", &self.client)
            .field("store", &self.store)
            .field("request_timeout", &self.request_timeout)
            .field("view", &*self.view.borrow())
            .finish()
    }
}

impl WeatherFetchController {
    /// Create a controller seeded with the stored last location.
    pub fn new(
        client: Arc<dyn WeatherClient>,
        store: Arc<dyn LocationStore>,
        options: ControllerOptions,
    ) -> Self {
        let initial = WeatherView {
            coordinates: store.load_last_location(),
            unit: options.initial_unit,
            ..Default::default()
        };
        let (view, _) = watch::channel(initial);
        let (transitions, _) = broadcast::channel(TRANSITION_BUFFER);

        Self {
            client,
            store,
            request_timeout: options.request_timeout,
            view,
            transitions,
            generation: AtomicU64::new(0),
        }
    }

    /// Fetch weather for the stored location.
    ///
    /// Does nothing when no location has been stored yet. The stored location
    /// itself is left untouched.
    pub async fn fetch_by_last_location(&self) {
        let Some(coordinates) = self.store.load_last_location() else {
            tracing::debug!("no stored location, skipping fetch");
            return;
        };

        let ticket = self.begin(false, |view| view.coordinates = Some(coordinates));
        let (lat, lon) = (coordinates.latitude.to_string(), coordinates.longitude.to_string());

        match self.call(self.client.fetch_by_coordinates(&lat, &lon)).await {
            Ok(snapshot) => self.complete(ticket, snapshot, None),
            Err(err) => self.fail(ticket, err.kind(), err.message().to_string()),
        }
    }

    /// Fetch weather for explicit coordinates and remember them on success.
    pub async fn fetch_by_coordinates(&self, latitude: f64, longitude: f64) {
        let coordinates = Coordinates::new(latitude, longitude);
        let ticket = self.begin(true, |_| {});
        let (lat, lon) = (latitude.to_string(), longitude.to_string());

        match self.call(self.client.fetch_by_coordinates(&lat, &lon)).await {
            Ok(snapshot) => self.complete(ticket, snapshot, Some(coordinates)),
            // 404s keep the provider's message here; only city search remaps them.
            Err(err) => self.fail(ticket, err.kind(), err.message().to_string()),
        }
    }

    /// Fetch weather for a city and remember the coordinates the provider reports.
    pub async fn search_by_city(&self, name: &str) {
        let query = name.trim();
        if query.is_empty() {
            self.view.send_modify(|view| {
                self.generation.fetch_add(1, Ordering::SeqCst);
                self.transition(
                    view,
                    FetchState::Error {
                        kind: ErrorKind::InvalidInput,
                        message: INVALID_CITY_MESSAGE.to_string(),
                    },
                );
            });
            return;
        }

        let ticket = self.begin(true, |_| {});

        match self.call(self.client.fetch_by_city_name(query)).await {
            Ok(snapshot) => {
                // Missing coordinates resolve to 0.0, matching the long-standing behavior.
                let coordinates = snapshot.coord.or_origin();
                self.complete(ticket, snapshot, Some(coordinates));
            }
            Err(FetchError::NotFound(_)) => {
                self.fail(ticket, ErrorKind::NotFound, CITY_NOT_FOUND_MESSAGE.to_string())
            }
            Err(err) => self.fail(ticket, err.kind(), err.message().to_string()),
        }
    }

    /// Change the display unit, recomputing temperatures from the last snapshot.
    pub fn set_unit_preference(&self, unit: UnitPreference) {
        self.view.send_if_modified(|view| {
            if view.unit == unit {
                return false;
            }
            view.unit = unit;
            if let Some(snapshot) = &view.last_snapshot {
                view.temperatures = Some(derive_temperatures(snapshot, unit));
            }
            true
        });
    }

    pub fn toggle_unit(&self) -> UnitPreference {
        let next = self.unit().toggled();
        self.set_unit_preference(next);
        next
    }

    /// Set the current coordinates without fetching or persisting them.
    pub fn set_location(&self, latitude: f64, longitude: f64) {
        let coordinates = Some(Coordinates::new(latitude, longitude));
        self.view.send_if_modified(|view| {
            if view.coordinates == coordinates {
                return false;
            }
            view.coordinates = coordinates;
            true
        });
    }

    pub fn view(&self) -> WeatherView {
        self.view.borrow().clone()
    }

    pub fn fetch_state(&self) -> FetchState {
        self.view.borrow().fetch_state.clone()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.view.borrow().coordinates
    }

    pub fn unit(&self) -> UnitPreference {
        self.view.borrow().unit
    }

    pub fn temperatures(&self) -> Option<DerivedTemperatures> {
        self.view.borrow().temperatures
    }

    /// Receiver for the whole view, updated atomically.
    pub fn watch_view(&self) -> watch::Receiver<WeatherView> {
        self.view.subscribe()
    }

    pub fn subscribe_fetch_state(&self) -> Subscription<FetchState> {
        Subscription::new(self.view.subscribe(), publish::fetch_state)
    }

    pub fn subscribe_coordinates(&self) -> Subscription<Option<Coordinates>> {
        Subscription::new(self.view.subscribe(), publish::coordinates)
    }

    pub fn subscribe_unit(&self) -> Subscription<UnitPreference> {
        Subscription::new(self.view.subscribe(), publish::unit)
    }

    pub fn subscribe_temperatures(&self) -> Subscription<Option<DerivedTemperatures>> {
        Subscription::new(self.view.subscribe(), publish::temperatures)
    }

    /// Every published fetch state, in order, starting from the next transition.
    pub fn transitions(&self) -> broadcast::Receiver<FetchState> {
        self.transitions.subscribe()
    }

    /// Start a request: take a new ticket and publish `Loading`, optionally
    /// preceded by an `Idle` reset.
    fn begin(&self, reset: bool, prepare: impl FnOnce(&mut WeatherView)) -> u64 {
        let mut ticket = 0;
        self.view.send_modify(|view| {
            ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            prepare(view);
            if reset {
                self.transition(view, FetchState::Idle);
            }
            self.transition(view, FetchState::Loading);
        });
        ticket
    }

    async fn call<F>(&self, request: F) -> Result<WeatherSnapshot, FetchError>
    where
        F: Future<Output = Result<WeatherSnapshot, FetchError>>,
    {
        tokio::time::timeout(self.request_timeout, request)
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::Network(format!(
                    "Request timed out after {:?}",
                    self.request_timeout
                )))
            })
    }

    /// Publish a successful result, then persist `resolved` if given.
    fn complete(&self, ticket: u64, snapshot: WeatherSnapshot, resolved: Option<Coordinates>) {
        let snapshot = Arc::new(snapshot);
        let published = self.view.send_if_modified(|view| {
            if self.generation.load(Ordering::SeqCst) != ticket {
                return false;
            }
            if resolved.is_some() {
                view.coordinates = resolved;
            }
            view.temperatures = Some(derive_temperatures(&snapshot, view.unit));
            view.last_snapshot = Some(Arc::clone(&snapshot));
            self.transition(view, FetchState::Success(snapshot));
            true
        });

        if !published {
            tracing::debug!(ticket, "discarding result of superseded request");
            return;
        }
        if let Some(coordinates) = resolved {
            self.store.save_last_location(coordinates);
        }
    }

    fn fail(&self, ticket: u64, kind: ErrorKind, message: String) {
        let published = self.view.send_if_modified(|view| {
            if self.generation.load(Ordering::SeqCst) != ticket {
                return false;
            }
            tracing::warn!(%kind, %message, "weather fetch failed");
            self.transition(view, FetchState::Error { kind, message });
            true
        });

        if !published {
            tracing::debug!(ticket, "discarding failure of superseded request");
        }
    }

    fn transition(&self, view: &mut WeatherView, state: FetchState) {
        tracing::debug!(?state, "fetch state");
        // No subscribers is fine.
        let _ = self.transitions.send(state.clone());
        view.fetch_state = state;
    }
}
