use super::{RegionQuery, ThumbnailProvider};
use crate::error::Result;
use async_trait::async_trait;

const GIBS_BASE_URL: &str = "https://gibs.earthdata.nasa.gov/wmts/epsg4326/best";
const GIBS_LAYER: &str = "MODIS_Terra_NDVI_8Day";
const TILE_ZOOM: u32 = 6;

/// Offline thumbnail source: the NASA GIBS NDVI tile covering the region
/// center on the last day of the range. No network call is made.
#[derive(Debug, Clone, Default)]
pub struct GibsThumbnail;

impl GibsThumbnail {
    pub fn tile_url(query: &RegionQuery) -> String {
        let n = 2f64.powi(TILE_ZOOM as i32);
        let lat = query.roi.center.latitude();
        let lon = query.roi.center.longitude();

        let max_index = n as i64 - 1;
        let x = (((lon + 180.0) / 360.0 * n) as i64).clamp(0, max_index);
        let y = (((90.0 - lat) / 180.0 * n) as i64).clamp(0, max_index);

        format!(
            "{}/{}/default/{}/GoogleMapsCompatible_Level{}/{}/{}/{}.png",
            GIBS_BASE_URL,
            GIBS_LAYER,
            query.date_range.end.format("%Y-%m-%d"),
            TILE_ZOOM,
            TILE_ZOOM,
            y,
            x
        )
    }
}

#[async_trait]
impl ThumbnailProvider for GibsThumbnail {
    async fn fetch_thumbnail(&self, query: &RegionQuery) -> Result<String> {
        Ok(Self::tile_url(query))
    }
}
