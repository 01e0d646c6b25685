use crate::datasources::ReverseGeocoder;
use crate::models::{Coordinate, GeocodeResponse};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const DEFAULT_GEOCODE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_KEY_PRECISION: u32 = 4;
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Macro-region boxes checked in order: (name, lat range, lon range).
/// The Pacific is handled separately because it wraps the antimeridian.
const CONTINENT_BOXES: [(&str, (f64, f64), (f64, f64)); 6] = [
    ("North America", (25.0, 50.0), (-125.0, -65.0)),
    ("South America", (-35.0, 12.0), (-80.0, -35.0)),
    ("Europe", (35.0, 70.0), (-10.0, 40.0)),
    ("Africa", (-35.0, 37.0), (-18.0, 52.0)),
    ("Asia", (-10.0, 55.0), (40.0, 145.0)),
    ("Australia/Oceania", (-45.0, -10.0), (110.0, 155.0)),
];

type CacheKey = (i64, i64);

/// Coordinate to place-label resolution with a process-lifetime cache.
///
/// `resolve` never fails: provider errors, timeouts and empty answers all
/// end in the offline macro-region label.
pub struct GeocodeResolver {
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
    cache: Mutex<LruCache<CacheKey, String>>,
    timeout: Duration,
    precision: u32,
}

impl GeocodeResolver {
    #[cfg(test)]
    pub fn new(geocoder: Option<Arc<dyn ReverseGeocoder>>) -> Self {
        Self::with_settings(
            geocoder,
            DEFAULT_GEOCODE_TIMEOUT,
            DEFAULT_KEY_PRECISION,
            DEFAULT_CACHE_CAPACITY,
        )
    }

    pub fn with_settings(
        geocoder: Option<Arc<dyn ReverseGeocoder>>,
        timeout: Duration,
        precision: u32,
        capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            geocoder,
            cache: Mutex::new(LruCache::new(capacity)),
            timeout,
            precision,
        }
    }

    pub async fn resolve(&self, coordinate: Coordinate) -> String {
        let key = self.cache_key(coordinate);

        if let Some(label) = self.cache.lock().await.get(&key) {
            tracing::debug!("Place name cache hit for {}", coordinate);
            return label.clone();
        }
        tracing::debug!("Place name cache miss for {}", coordinate);

        // Lock is not held across the network call
        let label = match self.lookup(coordinate).await {
            Some(label) => label,
            None => fallback_label(coordinate),
        };

        self.cache.lock().await.put(key, label.clone());
        label
    }

    async fn lookup(&self, coordinate: Coordinate) -> Option<String> {
        let geocoder = self.geocoder.as_ref()?;

        match tokio::time::timeout(self.timeout, geocoder.reverse(coordinate)).await {
            Ok(Ok(response)) => {
                let label = label_from_response(&response);
                if label.is_none() {
                    tracing::debug!("Geocoder returned no usable fields for {}", coordinate);
                }
                label
            }
            Ok(Err(e)) => {
                tracing::warn!("Reverse geocoding failed for {}: {}", coordinate, e);
                None
            }
            Err(_) => {
                tracing::warn!(
                    "Reverse geocoding timed out after {:?} for {}",
                    self.timeout,
                    coordinate
                );
                None
            }
        }
    }

    fn cache_key(&self, coordinate: Coordinate) -> CacheKey {
        let scale = 10f64.powi(self.precision as i32);
        (
            (coordinate.latitude() * scale).round() as i64,
            (coordinate.longitude() * scale).round() as i64,
        )
    }
}

/// Locality, then region, then country, joined by ", ". Without structured
/// fields, the first three segments of the display name.
pub fn label_from_response(response: &GeocodeResponse) -> Option<String> {
    fn first_of(fields: &[&Option<String>]) -> Option<String> {
        fields
            .iter()
            .filter_map(|f| f.as_deref())
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    if let Some(address) = &response.address {
        let parts: Vec<String> = [
            first_of(&[
                &address.city,
                &address.town,
                &address.village,
                &address.county,
            ]),
            first_of(&[&address.state, &address.region, &address.province]),
            first_of(&[&address.country]),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !parts.is_empty() {
            return Some(parts.join(", "));
        }
    }

    let display = response.display_name.as_deref()?.trim();
    if display.is_empty() {
        return None;
    }
    let segments: Vec<&str> = display
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(3)
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join(", "))
    }
}

pub fn macro_region(coordinate: Coordinate) -> &'static str {
    let lat = coordinate.latitude();
    let lon = coordinate.longitude();

    for (name, (lat_min, lat_max), (lon_min, lon_max)) in CONTINENT_BOXES {
        if (lat_min..=lat_max).contains(&lat) && (lon_min..=lon_max).contains(&lon) {
            return name;
        }
    }

    if (-50.0..=50.0).contains(&lat) && (lon <= -150.0 || lon >= 160.0) {
        return "Pacific Ocean";
    }
    if (-50.0..=55.0).contains(&lat) && (-70.0..=-20.0).contains(&lon) {
        return "Atlantic Ocean";
    }
    "Unknown Region"
}

/// Deterministic offline label, e.g. "Europe (48.85°N, 2.35°E)"
pub fn fallback_label(coordinate: Coordinate) -> String {
    let lat = coordinate.latitude();
    let lon = coordinate.longitude();
    format!(
        "{} ({:.2}°{}, {:.2}°{})",
        macro_region(coordinate),
        lat.abs(),
        if lat >= 0.0 { 'N' } else { 'S' },
        lon.abs(),
        if lon >= 0.0 { 'E' } else { 'W' }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasources::testing::Scripted;
    use crate::models::Address;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn paris() -> GeocodeResponse {
        GeocodeResponse {
            address: Some(Address {
                city: Some("Paris".into()),
                country: Some("France".into()),
                ..Address::default()
            }),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn resolves_city_and_country() {
        let provider = Scripted::ok(paris());
        let resolver = GeocodeResolver::new(Some(provider.clone()));
        assert_eq!(resolver.resolve(coord(48.85, 2.35)).await, "Paris, France");
    }

    #[tokio::test]
    async fn cache_hit_skips_the_provider() {
        let provider = Scripted::ok(paris());
        let resolver = GeocodeResolver::new(Some(provider.clone()));

        resolver.resolve(coord(48.85, 2.35)).await;
        // Same key at four decimals
        resolver.resolve(coord(48.850001, 2.350002)).await;

        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn unreachable_provider_falls_back_at_origin() {
        let provider = Scripted::<GeocodeResponse>::failing();
        let resolver = GeocodeResolver::new(Some(provider));
        assert_eq!(
            resolver.resolve(coord(0.0, 0.0)).await,
            "Africa (0.00°N, 0.00°E)"
        );
    }

    #[tokio::test]
    async fn fallback_label_is_cached() {
        let provider = Scripted::<GeocodeResponse>::failing();
        let resolver = GeocodeResolver::new(Some(provider.clone()));

        let first = resolver.resolve(coord(0.0, 0.0)).await;
        let second = resolver.resolve(coord(0.0, 0.0)).await;

        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_resolves_agree_and_fill_the_cache() {
        let provider = Scripted::delayed(paris(), Duration::from_millis(20));
        let resolver = GeocodeResolver::new(Some(provider.clone()));
        let here = coord(48.85, 2.35);

        let (a, b, c) = tokio::join!(
            resolver.resolve(here),
            resolver.resolve(here),
            resolver.resolve(here)
        );
        assert_eq!(a, "Paris, France");
        assert_eq!(a, b);
        assert_eq!(b, c);

        let during = provider.calls();
        assert!((1..=3).contains(&during));
        assert_eq!(resolver.resolve(here).await, "Paris, France");
        assert_eq!(provider.calls(), during);
    }

    #[tokio::test]
    async fn resolver_is_shared_across_tasks() {
        let provider = Scripted::<GeocodeResponse>::failing();
        let resolver = Arc::new(GeocodeResolver::new(Some(provider.clone())));

        let mut set = tokio::task::JoinSet::new();
        for lon in [2.35, 2.35, -100.0, -100.0] {
            let resolver = resolver.clone();
            set.spawn(async move { resolver.resolve(coord(40.0, lon)).await });
        }
        let mut labels = Vec::new();
        while let Some(label) = set.join_next().await {
            labels.push(label.unwrap());
        }
        labels.sort();

        assert_eq!(
            labels,
            vec![
                "Europe (40.00°N, 2.35°E)",
                "Europe (40.00°N, 2.35°E)",
                "North America (40.00°N, 100.00°W)",
                "North America (40.00°N, 100.00°W)",
            ]
        );
        let during = provider.calls();
        resolver.resolve(coord(40.0, 2.35)).await;
        resolver.resolve(coord(40.0, -100.0)).await;
        assert_eq!(provider.calls(), during);
    }

    #[tokio::test]
    async fn slow_provider_times_out_to_fallback() {
        let provider = Scripted::delayed(paris(), Duration::from_millis(500));
        let resolver = GeocodeResolver::with_settings(
            Some(provider),
            Duration::from_millis(20),
            DEFAULT_KEY_PRECISION,
            16,
        );
        assert_eq!(
            resolver.resolve(coord(48.85, 2.35)).await,
            "Europe (48.85°N, 2.35°E)"
        );
    }

    #[tokio::test]
    async fn no_provider_uses_fallback() {
        let resolver = GeocodeResolver::new(None);
        assert_eq!(
            resolver.resolve(coord(-33.87, 151.21)).await,
            "Australia/Oceania (33.87°S, 151.21°E)"
        );
    }

    #[test]
    fn region_fields_fill_the_middle() {
        let response = GeocodeResponse {
            address: Some(Address {
                village: Some("Giverny".into()),
                state: Some("Normandie".into()),
                country: Some("France".into()),
                ..Address::default()
            }),
            display_name: None,
        };
        assert_eq!(
            label_from_response(&response).as_deref(),
            Some("Giverny, Normandie, France")
        );
    }

    #[test]
    fn display_name_is_truncated_to_three_segments() {
        let response = GeocodeResponse {
            address: Some(Address::default()),
            display_name: Some("Route 9, Nowhere, Some County, Nevada, United States".into()),
        };
        assert_eq!(
            label_from_response(&response).as_deref(),
            Some("Route 9, Nowhere, Some County")
        );
    }

    #[test]
    fn empty_response_has_no_label() {
        assert!(label_from_response(&GeocodeResponse::default()).is_none());
    }

    #[test]
    fn macro_regions() {
        assert_eq!(macro_region(coord(40.0, -100.0)), "North America");
        assert_eq!(macro_region(coord(-15.0, -60.0)), "South America");
        assert_eq!(macro_region(coord(35.0, 105.0)), "Asia");
        assert_eq!(macro_region(coord(0.0, -170.0)), "Pacific Ocean");
        assert_eq!(macro_region(coord(20.0, 170.0)), "Pacific Ocean");
        assert_eq!(macro_region(coord(10.0, -30.0)), "Atlantic Ocean");
        assert_eq!(macro_region(coord(-80.0, 0.0)), "Unknown Region");
    }

    #[test]
    fn fallback_uses_hemisphere_letters() {
        assert_eq!(
            fallback_label(coord(-12.5, -45.25)),
            "South America (12.50°S, 45.25°W)"
        );
    }
}
