//! Bounding-box index over one hazard layer.
//!
//! Each record is stored as the rectangle enclosing its zone of influence.
//! A query returns every record whose rectangle intersects the query box:
//! a superset of the records that actually reach it, which callers then
//! confirm with an exact distance check.

use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

use sr_core::{BoundingBox, GeoPoint};

use crate::record::HazardRecord;

/// Slack on each envelope so that haversine-measured radii never fall
/// outside the degree-space rectangle.
const ENVELOPE_SLACK: f64 = 1.01;

type HazardEntry = GeomWithData<Rectangle<[f64; 2]>, usize>; // data = index into records

/// Read-only R-tree over a borrowed slice of hazard records.
pub struct HazardIndex<'a> {
    records: &'a [HazardRecord],
    tree: RTree<HazardEntry>,
}

impl<'a> HazardIndex<'a> {
    pub fn new(records: &'a [HazardRecord]) -> Self {
        let entries: Vec<HazardEntry> = records
            .iter()
            .enumerate()
            .map(|(i, rec)| {
                let bbox = BoundingBox::around(rec.center, rec.radius_km * ENVELOPE_SLACK);
                GeomWithData::new(
                    Rectangle::from_corners([bbox.south, bbox.west], [bbox.north, bbox.east]),
                    i,
                )
            })
            .collect();
        Self { records, tree: RTree::bulk_load(entries) }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &'a [HazardRecord] {
        self.records
    }

    /// Records whose envelope intersects `bbox`, in input order.
    pub fn candidates(&self, bbox: &BoundingBox) -> Vec<&'a HazardRecord> {
        if self.records.is_empty() {
            return Vec::new();
        }
        let query = AABB::from_corners([bbox.south, bbox.west], [bbox.north, bbox.east]);
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .map(|entry| entry.data)
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|i| &self.records[i]).collect()
    }

    /// Records whose envelope comes within roughly `tolerance_km` of `point`.
    pub fn candidates_near(&self, point: GeoPoint, tolerance_km: f64) -> Vec<&'a HazardRecord> {
        self.candidates(&BoundingBox::around(point, tolerance_km))
    }
}
