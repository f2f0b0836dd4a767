use crate::error::RoutingError;
use crate::responses::OsrmResponse;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use configuration::RoutingSettings;
use core_types::Coordinate;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

pub mod error;
pub mod responses;

/// Number of interpolation steps in a synthesized fallback path.
const FALLBACK_STEPS: usize = 20;
/// Assumed cruising speed for fallback duration estimates, in m/s (~72 km/h).
const FALLBACK_SPEED_MPS: f64 = 20.0;

/// The travel mode used to select a routing algorithm on the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Driving,
    Walking,
    Cycling,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Driving => "driving",
            Profile::Walking => "walking",
            Profile::Cycling => "cycling",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driving" => Ok(Profile::Driving),
            "walking" => Ok(Profile::Walking),
            "cycling" => Ok(Profile::Cycling),
            other => Err(format!("unknown travel profile: {other}")),
        }
    }
}

/// A computed path between two points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub coordinates: Vec<Coordinate>,
    /// Total distance in meters.
    pub distance: f64,
    /// Total duration in seconds.
    pub duration: f64,
}

/// Fetches routes from an OSRM-compatible service, memoizing results by
/// exact endpoint + profile key and degrading to a synthesized straight-line
/// path when the service cannot be reached.
///
/// Each provider owns its own cache, so tests (and embedders) can construct
/// an isolated instance instead of sharing process-wide state. Entries are
/// immutable once inserted and never expire within the process lifetime.
pub struct RouteProvider {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    cache: Mutex<HashMap<String, Route>>,
}

impl RouteProvider {
    pub fn new(settings: &RoutingSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(settings.timeout_ms),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the best path between `start` and `end`, from the cache when
    /// possible. This operation never fails outward: any service failure
    /// (timeout, bad status, empty result) yields a locally synthesized
    /// fallback path instead. Fallbacks are intentionally not cached, so a
    /// later call retries the real service.
    pub async fn fetch_route(&self, start: Coordinate, end: Coordinate, profile: Profile) -> Route {
        let key = cache_key(start, end, profile);

        if let Some(route) = self.cache.lock().unwrap().get(&key) {
            tracing::debug!(%key, "Route loaded from cache");
            return route.clone();
        }

        match self.request_best_route(start, end, profile).await {
            Ok(route) => {
                self.cache.lock().unwrap().insert(key, route.clone());
                route
            }
            Err(e) => {
                tracing::warn!(error = %e, "Routing service unavailable, synthesizing fallback path");
                fallback_route(start, end)
            }
        }
    }

    /// Fetches up to `count` alternative paths. No caching, no fallback
    /// synthesis: an empty `Ok` means the service genuinely found no
    /// alternatives, which callers must treat differently from an `Err`.
    pub async fn fetch_alternative_routes(
        &self,
        start: Coordinate,
        end: Coordinate,
        count: usize,
    ) -> Result<Vec<Route>, RoutingError> {
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson&alternatives={}",
            self.base_url, start.lon, start.lat, end.lon, end.lat, count
        );
        let response = self.request_osrm(&url).await?;

        Ok(response
            .routes
            .into_iter()
            .take(count)
            .map(|r| Route {
                coordinates: r.geometry.coordinates,
                distance: r.distance,
                duration: r.duration,
            })
            .collect())
    }

    /// Warms the cache for a set of point pairs. All fetches are issued
    /// concurrently and every one is allowed to settle; a failure in one
    /// pair never aborts or delays the others (each call degrades locally).
    pub async fn preload_routes(&self, pairs: &[(Coordinate, Coordinate)]) {
        tracing::info!(count = pairs.len(), "Preloading routes");
        let fetches = pairs
            .iter()
            .map(|(start, end)| self.fetch_route(*start, *end, Profile::Driving));
        join_all(fetches).await;
        tracing::info!("Routes preloaded");
    }

    /// Drops every cached entry.
    pub fn clear_cache(&self) {
        self.cache.lock().unwrap().clear();
        tracing::debug!("Route cache cleared");
    }

    /// Number of memoized routes currently held.
    pub fn cached_route_count(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    async fn request_best_route(
        &self,
        start: Coordinate,
        end: Coordinate,
        profile: Profile,
    ) -> Result<Route, RoutingError> {
        let url = format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, profile, start.lon, start.lat, end.lon, end.lat
        );
        let mut response = self.request_osrm(&url).await?;

        if response.routes.is_empty() {
            return Err(RoutingError::NoRoute);
        }
        let best = response.routes.remove(0);

        Ok(Route {
            coordinates: best.geometry.coordinates,
            distance: best.distance,
            duration: best.duration,
        })
    }

    async fn request_osrm(&self, url: &str) -> Result<OsrmResponse, RoutingError> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::BadStatus(status.as_u16()));
        }

        let body = response.json::<OsrmResponse>().await?;
        if body.code != "Ok" {
            return Err(RoutingError::ServiceCode(body.code));
        }

        Ok(body)
    }
}

/// Exact-match memoization key. No proximity matching: two queries hit the
/// same entry only when both endpoints and the profile are bit-identical.
fn cache_key(start: Coordinate, end: Coordinate, profile: Profile) -> String {
    format!(
        "{},{}-{},{}-{}",
        start.lon, start.lat, end.lon, end.lat, profile
    )
}

/// Synthesizes a degraded straight-line path by linear interpolation across
/// 20 equal steps, with distance estimated by great-circle arithmetic and
/// duration assuming a fixed cruising speed.
fn fallback_route(start: Coordinate, end: Coordinate) -> Route {
    let mut coordinates = Vec::with_capacity(FALLBACK_STEPS + 1);
    for i in 0..FALLBACK_STEPS {
        let t = i as f64 / FALLBACK_STEPS as f64;
        coordinates.push(Coordinate::new(
            start.lon + (end.lon - start.lon) * t,
            start.lat + (end.lat - start.lat) * t,
        ));
    }
    // Interpolation is not bit-exact at t = 1; pin the final point instead.
    coordinates.push(end);

    let distance = geodesy::haversine_distance(start, end);
    let duration = distance / FALLBACK_SPEED_MPS;

    Route { coordinates, distance, duration }
}

/// Estimates arrival time from remaining distance and current speed.
///
/// A stopped vehicle gets a fixed 30-minute estimate rather than an infinite
/// one. `traffic_factor` scales the travel time: 1.0 is free flow, 1.5 heavy
/// traffic.
pub fn calculate_eta(distance_m: f64, speed_kmh: f64, traffic_factor: f64) -> DateTime<Utc> {
    if speed_kmh == 0.0 {
        return Utc::now() + ChronoDuration::minutes(30);
    }

    let speed_mps = speed_kmh * 1000.0 / 3600.0;
    let adjusted_seconds = distance_m / speed_mps * traffic_factor;

    Utc::now() + ChronoDuration::milliseconds((adjusted_seconds * 1000.0) as i64)
}

/// Well-known city coordinates used by the CLI for named endpoints.
pub fn city_coordinate(name: &str) -> Option<Coordinate> {
    let coord = match name.to_ascii_uppercase().as_str() {
        "MUMBAI" => Coordinate::new(72.8777, 19.0760),
        "PUNE" => Coordinate::new(73.8567, 18.5204),
        "DELHI" => Coordinate::new(77.1025, 28.7041),
        "BANGALORE" => Coordinate::new(77.5946, 12.9716),
        "HYDERABAD" => Coordinate::new(78.4867, 17.3850),
        "CHENNAI" => Coordinate::new(80.2707, 13.0827),
        "KOLKATA" => Coordinate::new(88.3639, 22.5726),
        "AHMEDABAD" => Coordinate::new(72.5714, 23.0225),
        "JAIPUR" => Coordinate::new(75.7873, 26.9124),
        "LUCKNOW" => Coordinate::new(80.9462, 26.8467),
        _ => return None,
    };
    Some(coord)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const PUNE: Coordinate = Coordinate { lon: 73.8567, lat: 18.5204 };
    const MUMBAI: Coordinate = Coordinate { lon: 72.8777, lat: 19.0760 };

    fn provider(base_url: &str, timeout_ms: u64) -> RouteProvider {
        RouteProvider::new(&RoutingSettings {
            base_url: base_url.to_string(),
            timeout_ms,
        })
    }

    /// Serves one canned HTTP response on an ephemeral port, then stops
    /// listening. A second request to the same address is refused.
    async fn serve_once(body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{}", addr)
    }

    const OSRM_BODY: &str = r#"{
        "code": "Ok",
        "routes": [{
            "distance": 148000.0,
            "duration": 9360.0,
            "geometry": {"coordinates": [[73.8567, 18.5204], [73.4, 18.8], [72.8777, 19.076]]}
        }]
    }"#;

    #[tokio::test]
    async fn unreachable_service_yields_21_point_fallback() {
        let provider = provider("http://127.0.0.1:1", 200);
        let route = provider.fetch_route(PUNE, MUMBAI, Profile::Driving).await;

        assert_eq!(route.coordinates.len(), 21);
        assert_eq!(route.coordinates[0], PUNE);
        assert_eq!(route.coordinates[20], MUMBAI);
        assert!(route.distance > 0.0);
        assert!((route.duration - route.distance / 20.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn fallback_routes_are_not_cached() {
        let provider = provider("http://127.0.0.1:1", 200);
        provider.fetch_route(PUNE, MUMBAI, Profile::Driving).await;
        assert_eq!(provider.cached_route_count(), 0);
    }

    #[tokio::test]
    async fn second_identical_fetch_is_served_from_cache() {
        // The double only answers one request; a cache miss on the second
        // call would degrade to a 21-point fallback and fail the assertion.
        let base_url = serve_once(OSRM_BODY).await;
        let provider = provider(&base_url, 2000);

        let first = provider.fetch_route(PUNE, MUMBAI, Profile::Driving).await;
        assert_eq!(first.coordinates.len(), 3);
        assert_eq!(provider.cached_route_count(), 1);

        let second = provider.fetch_route(PUNE, MUMBAI, Profile::Driving).await;
        assert_eq!(second, first);
        assert_eq!(provider.cached_route_count(), 1);
    }

    #[tokio::test]
    async fn clear_cache_forces_a_refetch() {
        let base_url = serve_once(OSRM_BODY).await;
        let provider = provider(&base_url, 2000);

        provider.fetch_route(PUNE, MUMBAI, Profile::Driving).await;
        provider.clear_cache();
        assert_eq!(provider.cached_route_count(), 0);

        // The double is gone, so the refetch degrades to a fallback.
        let route = provider.fetch_route(PUNE, MUMBAI, Profile::Driving).await;
        assert_eq!(route.coordinates.len(), 21);
    }

    #[tokio::test]
    async fn alternatives_error_is_distinct_from_empty() {
        let provider = provider("http://127.0.0.1:1", 200);
        assert!(provider
            .fetch_alternative_routes(PUNE, MUMBAI, 3)
            .await
            .is_err());

        let base_url = serve_once(r#"{"code": "Ok", "routes": []}"#).await;
        let provider = super::RouteProvider::new(&RoutingSettings {
            base_url,
            timeout_ms: 2000,
        });
        let alternatives = provider
            .fetch_alternative_routes(PUNE, MUMBAI, 3)
            .await
            .unwrap();
        assert!(alternatives.is_empty());
    }

    #[tokio::test]
    async fn preload_settles_every_pair_despite_failures() {
        let provider = provider("http://127.0.0.1:1", 200);
        let pairs = vec![(PUNE, MUMBAI), (MUMBAI, PUNE)];
        // Must complete rather than hang or panic; nothing gets cached
        // because every fetch degraded.
        provider.preload_routes(&pairs).await;
        assert_eq!(provider.cached_route_count(), 0);
    }

    #[test]
    fn cache_keys_distinguish_profiles_and_directions() {
        let a = cache_key(PUNE, MUMBAI, Profile::Driving);
        let b = cache_key(PUNE, MUMBAI, Profile::Walking);
        let c = cache_key(MUMBAI, PUNE, Profile::Driving);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn stopped_vehicle_eta_is_thirty_minutes_out() {
        let before = Utc::now();
        let eta = calculate_eta(0.0, 0.0, 1.0);
        let offset = eta - before;
        assert!(offset >= ChronoDuration::minutes(29));
        assert!(offset <= ChronoDuration::minutes(31));
    }

    #[test]
    fn traffic_factor_scales_travel_time() {
        let before = Utc::now();
        // 72 km at 72 km/h is one hour; a 1.5 factor makes it ninety minutes.
        let eta = calculate_eta(72_000.0, 72.0, 1.5);
        let offset = eta - before;
        assert!(offset >= ChronoDuration::minutes(89));
        assert!(offset <= ChronoDuration::minutes(91));
    }

    #[test]
    fn city_lookup_is_case_insensitive() {
        assert_eq!(
            city_coordinate("pune"),
            Some(Coordinate::new(73.8567, 18.5204))
        );
        assert!(city_coordinate("ATLANTIS").is_none());
    }
}
