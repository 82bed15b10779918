//! CSV loaders for hazard tables.
//!
//! # Crowd hotspots
//!
//! ```csv
//! name,lat,lng,type,radius,weight
//! Ben Thanh Market,10.7725,106.6980,market,0.4,0.9
//! Bui Vien,10.7670,106.6930,nightlife,,
//! ```
//!
//! `radius` (km) defaults to 0.3 and `weight` (popularity) to 0.5 when empty.
//! A non-positive radius also falls back to 0.3, and a weight outside
//! `[0, 1]` is clamped; both are logged.  `type` is a venue tag; unknown tags
//! become `general`.
//!
//! # Disaster snapshot
//!
//! ```csv
//! id,name,lat,lng,radius,categories,date
//! EONET_1,Flooding in District 8,10.7400,106.6600,3.0,floods;severeStorms,2025-10-18T06:00:00Z
//! ```
//!
//! `categories` is `;`-separated.  `date` accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS`
//! (read as UTC), or `YYYY-MM-DD`; empty means "current".

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use sr_core::GeoPoint;

use crate::error::{HazardError, HazardResult};
use crate::record::{HazardRecord, VenueType};

const DEFAULT_CROWD_RADIUS_KM: f64 = 0.3;
const DEFAULT_CROWD_WEIGHT: f64 = 0.5;

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CrowdRow {
    name:   String,
    lat:    f64,
    lng:    f64,
    #[serde(rename = "type")]
    venue:  String,
    radius: Option<f64>,
    weight: Option<f64>,
}

#[derive(Deserialize)]
struct DisasterRow {
    id:         String,
    name:       String,
    lat:        f64,
    lng:        f64,
    radius:     f64,
    categories: String,
    date:       Option<String>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load the crowd hotspot table from a CSV file.
pub fn load_crowd_csv(path: &Path) -> HazardResult<Vec<HazardRecord>> {
    let file = std::fs::File::open(path)?;
    load_crowd_reader(file)
}

/// Like [`load_crowd_csv`] but accepts any `Read` source.
pub fn load_crowd_reader<R: Read>(reader: R) -> HazardResult<Vec<HazardRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut out = Vec::new();
    for result in csv_reader.deserialize::<CrowdRow>() {
        let row = result.map_err(|e| HazardError::Parse(e.to_string()))?;
        let center = checked_point(row.lat, row.lng, &row.name)?;
        let radius_km = match row.radius {
            None => DEFAULT_CROWD_RADIUS_KM,
            Some(r) if r.is_finite() && r > 0.0 => r,
            Some(r) => {
                warn!(hotspot = %row.name, radius = r, "non-positive crowd radius, using default");
                DEFAULT_CROWD_RADIUS_KM
            }
        };
        let weight = row.weight.unwrap_or(DEFAULT_CROWD_WEIGHT);
        let popularity = if weight.is_nan() { DEFAULT_CROWD_WEIGHT } else { weight.clamp(0.0, 1.0) };
        if popularity != weight {
            warn!(hotspot = %row.name, weight, popularity, "crowd weight out of range");
        }
        out.push(HazardRecord::crowd(
            row.name,
            center,
            radius_km,
            VenueType::from_tag(&row.venue),
            popularity,
        ));
    }
    debug!(rows = out.len(), "crowd table loaded");
    Ok(out)
}

/// Load a materialized disaster snapshot from a CSV file.
pub fn load_disasters_csv(path: &Path) -> HazardResult<Vec<HazardRecord>> {
    let file = std::fs::File::open(path)?;
    load_disasters_reader(file)
}

/// Like [`load_disasters_csv`] but accepts any `Read` source.
pub fn load_disasters_reader<R: Read>(reader: R) -> HazardResult<Vec<HazardRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut out = Vec::new();
    for result in csv_reader.deserialize::<DisasterRow>() {
        let row = result.map_err(|e| HazardError::Parse(e.to_string()))?;
        let center = checked_point(row.lat, row.lng, &row.name)?;
        let categories = row
            .categories
            .split(';')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();
        let event_time = match row.date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_event_time(raw)?),
        };
        out.push(HazardRecord::disaster(
            row.id,
            row.name,
            center,
            row.radius,
            categories,
            event_time,
        ));
    }
    debug!(rows = out.len(), "disaster snapshot loaded");
    Ok(out)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn checked_point(lat: f64, lon: f64, name: &str) -> HazardResult<GeoPoint> {
    let p = GeoPoint::new(lat, lon);
    if p.is_valid() {
        Ok(p)
    } else {
        Err(HazardError::Parse(format!("invalid coordinate ({lat}, {lon}) for {name:?}")))
    }
}

fn parse_event_time(raw: &str) -> HazardResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| HazardError::Parse(format!("invalid event date {raw:?}")))
}

