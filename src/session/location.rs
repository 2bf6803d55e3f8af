//! One-shot "last known location" lookup.
//!
//! Platform location services are callback-based; here they are modelled as
//! a collaborator that delivers at most one fix over a channel. Denial or
//! failure simply means no fix ever arrives and requests go out without
//! coordinates.

use super::Coordinates;
use crossbeam_channel::Sender;
use tracing::debug;

pub trait LocationSource: Send + Sync {
    /// Request the last known location; sends at most one fix on `tx`.
    fn request_fix(&self, tx: Sender<Coordinates>);
}

/// Location source backed by coordinates from the config file.
///
/// Stands in where no platform location service is wired up; delivers the
/// configured fix asynchronously like a real callback would.
pub struct FixedLocation {
    coordinates: Option<Coordinates>,
}

impl FixedLocation {
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        Self { coordinates }
    }
}

impl LocationSource for FixedLocation {
    fn request_fix(&self, tx: Sender<Coordinates>) {
        match self.coordinates {
            Some(fix) => {
                std::thread::spawn(move || {
                    let _ = tx.send(fix);
                });
            }
            None => debug!("no location configured, requests go out without coordinates"),
        }
    }
}
