//! Real Austin, TX locations for realistic end-to-end fixtures.
//!
//! Coordinates are approximate but plausible (sourced from public map data);
//! good enough for haversine/fallback-router based tests, which never hit a
//! live network.

/// A named location with coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lon: f64) -> Self {
        Self { name, lat, lon }
    }

    pub fn coord(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

pub const HOME: Location = Location::new("Home (Downtown Austin)", 30.5427, -97.5467);

pub const DMV: Location = Location::new("Texas DMV - North Austin", 30.3935, -97.7210);
pub const TARGET_NORTH: Location = Location::new("Target - North Lamar", 30.3472, -97.7210);
pub const TARGET_SOUTH: Location = Location::new("Target - South Congress", 30.2183, -97.7890);
pub const CARTERS_DOMAIN: Location = Location::new("Carter's - The Domain", 30.4023, -97.7265);
pub const GREAT_CLIPS_GEORGETOWN: Location = Location::new("Great Clips - Georgetown", 30.6328, -97.6780);
pub const GREAT_CLIPS_HUTTO: Location = Location::new("Great Clips - Hutto", 30.5427, -97.5467);
pub const POST_OFFICE: Location = Location::new("Post Office - Downtown", 30.2672, -97.7431);
pub const BANK: Location = Location::new("Bank - Congress Ave", 30.2500, -97.7500);
pub const PHARMACY: Location = Location::new("Pharmacy - South Lamar", 30.2400, -97.7800);
pub const DRY_CLEANER: Location = Location::new("Dry Cleaner - South Austin", 30.2200, -97.7700);
