use crate::error::GeolocationUnavailable;
use crate::types::Coords;

/// Where the user currently is, if that can be known.
pub trait GeolocationSource {
    fn current_position(&mut self) -> Result<Coords, GeolocationUnavailable>;
}

/// Reports a configured position, or fails when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(pub Option<Coords>);

impl GeolocationSource for FixedLocation {
    fn current_position(&mut self) -> Result<Coords, GeolocationUnavailable> {
        self.0.ok_or(GeolocationUnavailable)
    }
}
