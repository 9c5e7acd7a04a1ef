use catalog::AreaPin;

use crate::state::{GalleryState, OpenOutcome};

/// Point primitive handed to the external globe widget. Only pins with both
/// coordinates resolved make it this far.
#[derive(Debug, Clone, PartialEq)]
pub struct PinPoint {
    pub id: Option<String>,
    pub label: String,
    pub lat: f64,
    pub lng: f64,
}

/// Pointer events the globe widget reports back for a pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinEvent {
    HoverEnter(String),
    HoverLeave,
    Click(String),
}

/// Translates resolved pins into widget points. Coordinate-less pins are
/// silently excluded; that is expected, not an error.
pub fn pin_points(pins: &[AreaPin]) -> Vec<PinPoint> {
    pins.iter()
        .filter(|pin| pin.has_coordinates())
        .map(|pin| PinPoint {
            id: pin.id.clone(),
            label: pin.name.clone(),
            // has_coordinates guarantees both are present.
            lat: pin.lat.unwrap_or_default(),
            lng: pin.lng.unwrap_or_default(),
        })
        .collect()
}

/// Routes a widget event into the gallery state. Holds no state of its own;
/// a click returns the open outcome so the caller can drive the fetch.
pub fn route_pin_event(state: &mut GalleryState, event: PinEvent) -> Option<OpenOutcome> {
    match event {
        PinEvent::HoverEnter(label) => {
            state.set_hover_label(Some(label));
            None
        }
        PinEvent::HoverLeave => {
            state.set_hover_label(None);
            None
        }
        PinEvent::Click(area) => {
            state.set_hover_label(None);
            Some(state.open_area(&area))
        }
    }
}
