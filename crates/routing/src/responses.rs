use core_types::Coordinate;
use serde::Deserialize;

/// Top-level shape of an OSRM `/route/v1` response.
#[derive(Debug, Deserialize)]
pub struct OsrmResponse {
    pub code: String,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmRoute {
    /// Total distance in meters.
    pub distance: f64,
    /// Total duration in seconds.
    pub duration: f64,
    pub geometry: OsrmGeometry,
}

/// GeoJSON LineString geometry as returned with `geometries=geojson`.
#[derive(Debug, Deserialize)]
pub struct OsrmGeometry {
    pub coordinates: Vec<Coordinate>,
}
