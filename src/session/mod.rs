//! Per-install session context attached to outgoing requests.

pub mod device;
pub mod location;

pub use device::load_or_create_device_id;
pub use location::{FixedLocation, LocationSource};

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Request context that lives for the whole process.
///
/// Created at startup and only ever touched from the UI thread: location
/// fixes arrive over a channel and are applied there, and the fields are
/// read there when a request goes out.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Stable per-install identifier.
    pub device_id: String,

    /// Last known coordinates; absent until a fix arrives.
    pub coordinates: Option<Coordinates>,
}

impl SessionContext {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            coordinates: None,
        }
    }

    /// Apply a fresh location fix; the last known fix always wins.
    pub fn update_fix(&mut self, fix: Coordinates) {
        tracing::debug!("location fix: {:.4}, {:.4}", fix.lat, fix.lon);
        self.coordinates = Some(fix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_starts_without_coordinates() {
        let ctx = SessionContext::new("device-1");
        assert_eq!(ctx.device_id, "device-1");
        assert!(ctx.coordinates.is_none());
    }

    #[test]
    fn last_fix_wins() {
        let mut ctx = SessionContext::new("device-1");
        ctx.update_fix(Coordinates { lat: 1.0, lon: 2.0 });
        ctx.update_fix(Coordinates { lat: 3.0, lon: 4.0 });
        assert_eq!(ctx.coordinates, Some(Coordinates { lat: 3.0, lon: 4.0 }));
    }
}
