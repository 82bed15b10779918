//! Geographic coordinate types and distance utilities.
//!
//! `GeoPoint` uses `f64` latitude/longitude.  Hazard tests compare distances
//! against radii at the boundary (`distance == radius` is inside), so the
//! extra precision over `f32` is worth the memory.
//!
//! # Local planar approximation
//!
//! [`point_to_segment_km`] projects onto an equirectangular plane centred on
//! the segment: longitude is scaled by `cos(mean latitude)` to correct for
//! meridian convergence.  This is **city-scale only**.  Errors stay negligible
//! for segments under ~50 km away from the poles; it is not valid globally
//! (antimeridian crossings and polar segments break it).

/// Mean Earth radius, kilometres.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Kilometres per degree of latitude (equirectangular approximation).
pub const KM_PER_DEG_LAT: f64 = 110.57;

/// Kilometres per degree of longitude at the equator.
pub const KM_PER_DEG_LON_EQUATOR: f64 = 111.32;

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `true` if both components are finite and inside the WGS-84 range.
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Haversine great-circle distance in kilometres.
    #[inline]
    pub fn distance_km(self, other: GeoPoint) -> f64 {
        great_circle_km(self, other)
    }

    /// Arithmetic midpoint in degree space.  Adequate for a single street
    /// segment; do not use across long distances.
    #[inline]
    pub fn midpoint(self, other: GeoPoint) -> GeoPoint {
        GeoPoint::new((self.lat + other.lat) * 0.5, (self.lon + other.lon) * 0.5)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

// ── Distance functions ────────────────────────────────────────────────────────

/// Haversine great-circle distance between `a` and `b` in kilometres.
///
/// Symmetric, zero for identical points, and satisfies the triangle
/// inequality up to floating-point tolerance.
pub fn great_circle_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat * 0.5).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

    // Clamp guards against h drifting a hair above 1.0 for antipodal points.
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());
    EARTH_RADIUS_KM * c
}

/// Minimum distance in kilometres from `point` to the segment `[a, b]`.
///
/// Uses the local equirectangular plane described in the module docs, with
/// `a` as origin.  The projection parameter is clamped to `[0, 1]` so the
/// closest point always lies on the segment.  A degenerate segment
/// (`a == b`) yields the direct point-to-point distance in the same plane.
pub fn point_to_segment_km(point: GeoPoint, a: GeoPoint, b: GeoPoint) -> f64 {
    let mean_lat = ((a.lat + b.lat) * 0.5).to_radians();
    let kx = KM_PER_DEG_LON_EQUATOR * mean_lat.cos();
    let ky = KM_PER_DEG_LAT;

    let px = (point.lon - a.lon) * kx;
    let py = (point.lat - a.lat) * ky;
    let bx = (b.lon - a.lon) * kx;
    let by = (b.lat - a.lat) * ky;

    let len_sq = bx * bx + by * by;
    if len_sq == 0.0 {
        return (px * px + py * py).sqrt();
    }

    let t = ((px * bx + py * by) / len_sq).clamp(0.0, 1.0);
    let dx = px - t * bx;
    let dy = py - t * by;
    (dx * dx + dy * dy).sqrt()
}

/// Minimum distance from `point` to a polyline, evaluated per sub-segment.
///
/// A single-vertex polyline degenerates to a point distance; an empty one
/// returns `f64::INFINITY`.
pub fn point_to_polyline_km(point: GeoPoint, line: &[GeoPoint]) -> f64 {
    match line {
        [] => f64::INFINITY,
        [only] => point_to_segment_km(point, *only, *only),
        _ => line
            .windows(2)
            .map(|w| point_to_segment_km(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

// ── BoundingBox ───────────────────────────────────────────────────────────────

/// An axis-aligned latitude/longitude rectangle.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub south: f64,
    pub west:  f64,
    pub north: f64,
    pub east:  f64,
}

impl BoundingBox {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self { south, west, north, east }
    }

    /// Smallest box containing every point.  `None` for an empty iterator.
    pub fn from_points<I: IntoIterator<Item = GeoPoint>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = BoundingBox::new(first.lat, first.lon, first.lat, first.lon);
        for p in iter {
            bbox.south = bbox.south.min(p.lat);
            bbox.north = bbox.north.max(p.lat);
            bbox.west  = bbox.west.min(p.lon);
            bbox.east  = bbox.east.max(p.lon);
        }
        Some(bbox)
    }

    /// Box covering a circle of `radius_km` around `center`, using the same
    /// degree conversions as [`point_to_segment_km`].
    pub fn around(center: GeoPoint, radius_km: f64) -> Self {
        let radius_km = radius_km.max(0.0);
        let d_lat = radius_km / KM_PER_DEG_LAT;
        // Clamp the cosine so boxes stay finite near the poles.
        let cos_lat = center.lat.to_radians().cos().abs().max(0.01);
        let d_lon = radius_km / (KM_PER_DEG_LON_EQUATOR * cos_lat);
        BoundingBox::new(
            center.lat - d_lat,
            center.lon - d_lon,
            center.lat + d_lat,
            center.lon + d_lon,
        )
    }

    /// Grow every side by `deg` degrees.
    pub fn expand(self, deg: f64) -> Self {
        BoundingBox::new(self.south - deg, self.west - deg, self.north + deg, self.east + deg)
    }

    #[inline]
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    #[inline]
    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new((self.south + self.north) * 0.5, (self.west + self.east) * 0.5)
    }

    /// Inclusive containment.
    #[inline]
    pub fn contains(&self, p: GeoPoint) -> bool {
        self.south <= p.lat && p.lat <= self.north && self.west <= p.lon && p.lon <= self.east
    }

    /// Exclusive containment: points on the border are outside.
    #[inline]
    pub fn contains_strict(&self, p: GeoPoint) -> bool {
        self.south < p.lat && p.lat < self.north && self.west < p.lon && p.lon < self.east
    }

    /// `true` if the two boxes share any point (borders included).
    #[inline]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.south <= other.north
            && other.south <= self.north
            && self.west <= other.east
            && other.west <= self.east
    }

    /// Half the diagonal in kilometres, useful as a search radius that covers
    /// the whole box from its centre.
    pub fn half_diagonal_km(&self) -> f64 {
        great_circle_km(
            GeoPoint::new(self.south, self.west),
            GeoPoint::new(self.north, self.east),
        ) * 0.5
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[S {:.5}, W {:.5}, N {:.5}, E {:.5}]",
            self.south, self.west, self.north, self.east
        )
    }
}
