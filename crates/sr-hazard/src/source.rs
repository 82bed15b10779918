//! Hazard data collaborators.
//!
//! Live feeds (disaster APIs, weather grids) sit behind [`DisasterSource`]
//! and [`WeatherSource`].  Both calls are blocking; the engine runs them on
//! worker threads with a timeout.  The static implementations here serve
//! pre-materialized snapshots and back the tests and the demo.

use sr_core::{BoundingBox, GeoPoint, great_circle_km};

use crate::error::HazardResult;
use crate::record::{HazardKind, HazardRecord, clip_to_bbox};

// ── Traits ────────────────────────────────────────────────────────────────────

/// Disaster events near a point.
pub trait DisasterSource: Send + Sync {
    /// Events within `radius_km` of `center`.  An empty list is a valid
    /// answer.
    fn fetch(&self, center: GeoPoint, radius_km: f64) -> HazardResult<Vec<HazardRecord>>;

    /// Name used in log events.
    fn name(&self) -> &str {
        "disasters"
    }
}

/// Weather zones covering a box.
pub trait WeatherSource: Send + Sync {
    fn fetch(&self, bbox: &BoundingBox) -> HazardResult<Vec<HazardRecord>>;

    fn name(&self) -> &str {
        "weather"
    }
}

// ── Static sources ────────────────────────────────────────────────────────────

/// Serves a fixed list of disaster records.
#[derive(Clone, Debug, Default)]
pub struct StaticDisasters {
    records: Vec<HazardRecord>,
}

impl StaticDisasters {
    /// Non-disaster records are discarded.
    pub fn new(records: Vec<HazardRecord>) -> Self {
        let records = records
            .into_iter()
            .filter(|r| r.kind() == HazardKind::Disaster)
            .collect();
        Self { records }
    }
}

impl DisasterSource for StaticDisasters {
    fn fetch(&self, center: GeoPoint, radius_km: f64) -> HazardResult<Vec<HazardRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| great_circle_km(center, r.center) <= radius_km)
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "static-disasters"
    }
}

/// Serves a fixed list of weather zones.
#[derive(Clone, Debug, Default)]
pub struct StaticWeather {
    records: Vec<HazardRecord>,
}

impl StaticWeather {
    /// Non-weather records are discarded.
    pub fn new(records: Vec<HazardRecord>) -> Self {
        let records = records
            .into_iter()
            .filter(|r| r.kind() == HazardKind::Weather)
            .collect();
        Self { records }
    }
}

impl WeatherSource for StaticWeather {
    fn fetch(&self, bbox: &BoundingBox) -> HazardResult<Vec<HazardRecord>> {
        Ok(clip_to_bbox(&self.records, bbox))
    }

    fn name(&self) -> &str {
        "static-weather"
    }
}

// ── Crowd table ───────────────────────────────────────────────────────────────

/// Process-wide crowd hotspot table, loaded once and shared read-only.
#[derive(Clone, Debug, Default)]
pub struct CrowdTable {
    hotspots: Vec<HazardRecord>,
}

impl CrowdTable {
    /// Non-crowd records are discarded.
    pub fn new(records: Vec<HazardRecord>) -> Self {
        let hotspots = records
            .into_iter()
            .filter(|r| r.kind() == HazardKind::Crowd)
            .collect();
        Self { hotspots }
    }

    pub fn len(&self) -> usize {
        self.hotspots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }

    pub fn hotspots(&self) -> &[HazardRecord] {
        &self.hotspots
    }

    /// Hotspots whose zone overlaps `bbox`.
    pub fn within(&self, bbox: &BoundingBox) -> Vec<HazardRecord> {
        clip_to_bbox(&self.hotspots, bbox)
    }
}
