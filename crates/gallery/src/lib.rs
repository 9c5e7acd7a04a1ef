//! Client-side gallery state.
//!
//! The gallery is an explicit state machine rather than a reactive component:
//! per-area manifests move `unfetched -> loading -> loaded` (or back out on
//! error, with no tombstone), selection navigates a sorted photo sequence
//! circularly, and every transition is recorded as an event an observer can
//! drain. The async `GalleryClient` drives the machine against a manifest
//! source and fires neighbor prefetches.

pub mod binding;
pub mod client;
pub mod navigation;
pub mod state;

pub use binding::{pin_points, route_pin_event, PinEvent, PinPoint};
pub use client::{
    FetchError, GalleryClient, HttpManifestSource, HttpPrefetcher, ManifestSource, NoopPrefetcher,
    Prefetcher,
};
pub use state::{GalleryEvent, GalleryState, Key, KeyOutcome, OpenOutcome, Prefetch};

use std::future::Future;
use std::pin::Pin;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
