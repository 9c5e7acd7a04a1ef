//! Coordinate resolution for area pins.
//!
//! Pins that already carry numeric coordinates pass through untouched. For
//! the rest, a persistent cache is consulted first, then the external lookup
//! provider; a pin that cannot be resolved simply stays coordinate-less and
//! is excluded from rendering downstream. Nothing in this crate propagates a
//! per-pin failure to its caller.

mod cache;
mod lookup;

pub use cache::{cache_key, Coords, CoordCache, FileCoordCache, MemoryCoordCache};
pub use lookup::{GeoCandidate, GeoLookup, NominatimLookup};

use std::future::Future;
use std::pin::Pin;

use catalog::AreaPin;
use futures_util::future::join_all;
use tracing::debug;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug)]
pub enum GeocodeError {
    Request(String),
    Status(u16),
    Decode(String),
}

impl std::fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeocodeError::Request(msg) => write!(f, "geocode request failed: {msg}"),
            GeocodeError::Status(code) => write!(f, "geocode upstream returned HTTP {code}"),
            GeocodeError::Decode(msg) => write!(f, "geocode response malformed: {msg}"),
        }
    }
}

impl std::error::Error for GeocodeError {}

/// Resolves coordinates for every pin, concurrently and independently.
///
/// Input order is preserved in the output. A lookup or parse failure for one
/// pin degrades that pin to coordinate-less without affecting the others.
pub async fn resolve_pins(
    pins: Vec<AreaPin>,
    lookup: &dyn GeoLookup,
    cache: &dyn CoordCache,
) -> Vec<AreaPin> {
    join_all(
        pins.into_iter()
            .map(|pin| resolve_one(pin, lookup, cache)),
    )
    .await
}

async fn resolve_one(mut pin: AreaPin, lookup: &dyn GeoLookup, cache: &dyn CoordCache) -> AreaPin {
    if pin.has_coordinates() {
        return pin;
    }

    let key = cache_key(&pin.name);
    if let Some(coords) = cache.get(&key) {
        pin.lat = Some(coords.lat);
        pin.lng = Some(coords.lng);
        return pin;
    }

    let candidates = match lookup.lookup(&pin.name).await {
        Ok(candidates) => candidates,
        Err(err) => {
            debug!("geocode lookup failed for {}: {err}", pin.name);
            return pin;
        }
    };

    let Some(first) = candidates.first() else {
        debug!("geocode lookup returned no candidates for {}", pin.name);
        return pin;
    };

    let (Ok(lat), Ok(lng)) = (first.lat.parse::<f64>(), first.lon.parse::<f64>()) else {
        debug!("geocode candidate unparseable for {}", pin.name);
        return pin;
    };
    if !lat.is_finite() || !lng.is_finite() {
        return pin;
    }

    pin.lat = Some(lat);
    pin.lng = Some(lng);
    // Best-effort write-through; a failed cache write only costs a re-query.
    cache.put(&key, Coords { lat, lng });
    pin
}
