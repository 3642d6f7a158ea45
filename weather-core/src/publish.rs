//! Observable controller state.
//!
//! All fields live in one [`WeatherView`] behind a single `watch` channel, so a
//! reader always sees a consistent combination of fetch state, coordinates,
//! unit and derived temperatures. Per-field streams are projections of it.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::{Coordinates, DerivedTemperatures, FetchState, UnitPreference, WeatherSnapshot};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherView {
    pub fetch_state: FetchState,
    pub coordinates: Option<Coordinates>,
    pub unit: UnitPreference,
    /// Derived from `last_snapshot` and `unit`; `None` until the first success.
    pub temperatures: Option<DerivedTemperatures>,
    /// Most recent successful snapshot, kept across later loading or error states.
    pub last_snapshot: Option<Arc<WeatherSnapshot>>,
}

/// Stream of one field of the [`WeatherView`].
///
/// Only yields when the projected value actually changes.
pub struct Subscription<T> {
    rx: watch::Receiver<WeatherView>,
    project: fn(&WeatherView) -> T,
    last: T,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("last", &self.last).finish()
    }
}

impl<T: Clone + PartialEq> Subscription<T> {
    pub(crate) fn new(mut rx: watch::Receiver<WeatherView>, project: fn(&WeatherView) -> T) -> Self {
        let last = project(&rx.borrow_and_update());
        Self { rx, project, last }
    }

    /// Value at this moment.
    pub fn current(&self) -> T {
        (self.project)(&self.rx.borrow())
    }

    /// Wait for the field to take a new value.
    ///
    /// Returns `None` once the controller has been dropped.
    pub async fn changed(&mut self) -> Option<T> {
        loop {
            self.rx.changed().await.ok()?;
            let next = (self.project)(&self.rx.borrow_and_update());
            if next != self.last {
                self.last = next.clone();
                return Some(next);
            }
        }
    }
}

pub(crate) fn fetch_state(view: &WeatherView) -> FetchState {
    view.fetch_state.clone()
}

pub(crate) fn coordinates(view: &WeatherView) -> Option<Coordinates> {
    view.coordinates
}

pub(crate) fn unit(view: &WeatherView) -> UnitPreference {
    view.unit
}

pub(crate) fn temperatures(view: &WeatherView) -> Option<DerivedTemperatures> {
    view.temperatures
}
