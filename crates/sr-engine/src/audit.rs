//! Route audit: aggregates a found path and assigns a safety label.
//!
//! Hazard hits are re-derived from geometry rather than read back from the
//! edge flags: each route node is checked against every disaster and
//! weather zone with a small radius tolerance, which recovers the hazard
//! *names* for the report.
//!
//! # Label priority
//!
//! | Label       | Condition                                                      |
//! |-------------|----------------------------------------------------------------|
//! | `Severe`    | a disaster was hit and the disaster preference is non-zero     |
//! | `Dangerous` | max segment penalty above `dangerous_penalty`                  |
//! | `Caution`   | weather hit, crowded share above threshold, or an ignored disaster |
//! | `Safe`      | none of the above                                              |

use std::collections::BTreeSet;

use sr_core::{GeoPoint, NodeId, TripTime, great_circle_km};
use sr_hazard::scoring::{disaster_severity, time_decay, weather_severity};
use sr_hazard::{HazardPayload, HazardRecord};
use sr_spatial::{RoadNetwork, Route};

use crate::scanner::HazardLayers;
use crate::weights::EdgeWeights;
use crate::{EngineConfig, Preferences};

// ── Result types ──────────────────────────────────────────────────────────────

/// Discrete safety verdict for a route.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SafetyLabel {
    Safe,
    Caution,
    Dangerous,
    Severe,
}

impl SafetyLabel {
    /// Display colour used by map front-ends.
    pub fn color(self) -> &'static str {
        match self {
            SafetyLabel::Safe                          => "green",
            SafetyLabel::Caution                       => "yellow",
            SafetyLabel::Dangerous | SafetyLabel::Severe => "red",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SafetyLabel::Safe      => "Safe",
            SafetyLabel::Caution   => "Caution",
            SafetyLabel::Dangerous => "Dangerous",
            SafetyLabel::Severe    => "Severe",
        }
    }
}

impl std::fmt::Display for SafetyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse three-step level for traffic and crowding summaries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Low    => "Low",
            Level::Medium => "Medium",
            Level::High   => "High",
        }
    }
}

/// One audited route.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RouteResult {
    /// `"Best Route"` or `"Alternative N"`.
    pub name: String,
    /// Sum of edge lengths.
    pub distance_km: f64,
    /// Buffered ETA: summed travel time × `eta_buffer`, in minutes.
    pub duration_min: f64,
    /// Unbuffered sum of edge travel times.
    pub travel_secs: f64,
    /// Path polyline from origin to destination.
    pub geometry: Vec<GeoPoint>,
    pub label: SafetyLabel,
    pub color: &'static str,
    /// Reasons for the label followed by the avoidance note.
    pub rationale: String,
    /// Hazards present in the trip box that this route stays clear of.
    pub avoidance: String,
    /// Length-weighted mean segment penalty.
    pub avg_risk: f64,
    /// Highest segment penalty.
    pub max_risk: f64,
    pub traffic_level: Level,
    pub crowd_level: Level,
    /// Names of disasters whose zone the route enters.
    pub disasters_hit: BTreeSet<String>,
    /// Names of weather zones the route enters.
    pub weather_hit: BTreeSet<String>,
    /// Edges flagged as crowded.
    pub crowded_edges: usize,
}

impl RouteResult {
    /// `true` if the route enters any disaster or weather zone.
    pub fn has_hazard_hits(&self) -> bool {
        !self.disasters_hit.is_empty() || !self.weather_hit.is_empty()
    }
}

// ── Auditor ───────────────────────────────────────────────────────────────────

/// Audit context shared by every route of one request.
pub struct RouteAuditor<'a> {
    pub config: &'a EngineConfig,
    pub preferences: Preferences,
    pub trip: &'a TripTime,
}

impl<'a> RouteAuditor<'a> {
    pub fn new(config: &'a EngineConfig, preferences: Preferences, trip: &'a TripTime) -> Self {
        Self { config, preferences: preferences.clamped(), trip }
    }

    pub fn audit(
        &self,
        name: impl Into<String>,
        network: &RoadNetwork,
        origin: NodeId,
        route: &Route,
        weights: &EdgeWeights,
        layers: &HazardLayers,
    ) -> RouteResult {
        // ── Edge aggregates ───────────────────────────────────────────────
        let mut length_m = 0.0;
        let mut travel_secs = 0.0;
        let mut risk_m = 0.0;
        let mut traffic_m = 0.0;
        let mut crowded_m = 0.0;
        let mut max_risk: f64 = 0.0;
        let mut crowded_edges = 0usize;

        for e in &route.edges {
            let ann = weights.annotation(*e);
            let len = network.edge_length_m[e.index()];
            length_m += len;
            travel_secs += ann.travel_secs;
            risk_m += ann.penalty * len;
            traffic_m += ann.traffic * len;
            max_risk = max_risk.max(ann.penalty);
            if ann.flags.crowd {
                crowded_edges += 1;
                crowded_m += len;
            }
        }
        let per_metre = |v: f64| if length_m > 0.0 { v / length_m } else { 0.0 };
        let avg_risk = per_metre(risk_m);
        let avg_traffic = per_metre(traffic_m);
        let crowded_share = per_metre(crowded_m);

        // ── Hazard re-check ───────────────────────────────────────────────
        let nodes = if route.is_trivial() { vec![origin] } else { route.nodes(network) };
        let positions: Vec<GeoPoint> = nodes.iter().map(|n| network.node_pos[n.index()]).collect();

        let active_disasters: Vec<&HazardRecord> = layers
            .disasters
            .iter()
            .filter(|rec| self.disaster_impact(rec) > 0.0)
            .collect();
        let disaster_hits: Vec<&HazardRecord> = active_disasters
            .iter()
            .copied()
            .filter(|rec| self.reaches(rec, &positions))
            .collect();
        let weather_hits: Vec<&HazardRecord> = layers
            .weather
            .iter()
            .filter(|rec| weather_impact(rec) > 0.0 && self.reaches(rec, &positions))
            .collect();

        let disasters_hit: BTreeSet<String> =
            disaster_hits.iter().map(|r| r.name.clone()).collect();
        let weather_hit: BTreeSet<String> = weather_hits.iter().map(|r| r.name.clone()).collect();

        // ── Label ─────────────────────────────────────────────────────────
        let crowded = crowded_share > self.config.crowd_fraction_threshold;
        let mut reasons: Vec<String> = Vec::new();
        let label = if !disasters_hit.is_empty() && self.preferences.disaster > 0.0 {
            reasons.push(format!(
                "passes through {} disaster zone(s): {}",
                disasters_hit.len(),
                join(&disasters_hit)
            ));
            SafetyLabel::Severe
        } else if max_risk > self.config.dangerous_penalty {
            reasons.push("contains a very high-risk segment".into());
            SafetyLabel::Dangerous
        } else if !disasters_hit.is_empty() || !weather_hit.is_empty() || crowded {
            if !disasters_hit.is_empty() {
                reasons.push(format!("crosses ignored disaster zone(s): {}", join(&disasters_hit)));
            }
            if !weather_hit.is_empty() {
                reasons.push(format!("weather: {}", join(&weather_hit)));
            }
            if crowded {
                reasons.push("crowded streets".into());
            }
            SafetyLabel::Caution
        } else {
            SafetyLabel::Safe
        };

        let avoidance =
            avoidance_note(&active_disasters, &layers.weather, &disaster_hits, &weather_hits);
        let base = if reasons.is_empty() { "clear route".to_string() } else { reasons.join(" | ") };
        let rationale = format!("{base} ({avoidance})");

        RouteResult {
            name: name.into(),
            distance_km: length_m / 1_000.0,
            duration_min: travel_secs * self.config.eta_buffer / 60.0,
            travel_secs,
            geometry: route_geometry(network, &positions, route),
            label,
            color: label.color(),
            rationale,
            avoidance,
            avg_risk,
            max_risk,
            traffic_level: traffic_level(avg_traffic),
            crowd_level: crowd_level(crowded_edges),
            disasters_hit,
            weather_hit,
            crowded_edges,
        }
    }

    fn disaster_impact(&self, rec: &HazardRecord) -> f64 {
        match &rec.payload {
            HazardPayload::Disaster { categories, event_time } => {
                disaster_severity(categories) * time_decay(*event_time, self.trip.now)
            }
            _ => 0.0,
        }
    }

    fn reaches(&self, rec: &HazardRecord, positions: &[GeoPoint]) -> bool {
        let limit = rec.radius_km + self.config.audit_tolerance_km;
        positions.iter().any(|p| great_circle_km(*p, rec.center) <= limit)
    }
}

fn weather_impact(rec: &HazardRecord) -> f64 {
    match rec.payload {
        HazardPayload::Weather { condition, wind_speed_ms } => {
            weather_severity(condition, wind_speed_ms)
        }
        _ => 0.0,
    }
}

fn is_storm(rec: &HazardRecord) -> bool {
    matches!(rec.payload, HazardPayload::Weather { condition, .. } if condition.is_precipitating_storm())
}

/// Count the still-active disasters and the storm zones in the box that the
/// route missed.
fn avoidance_note(
    active_disasters: &[&HazardRecord],
    weather: &[HazardRecord],
    disaster_hits: &[&HazardRecord],
    weather_hits: &[&HazardRecord],
) -> String {
    let hit = |hits: &[&HazardRecord], rec: &HazardRecord| hits.iter().any(|h| std::ptr::eq(*h, rec));

    let avoided_disasters = active_disasters.iter().filter(|r| !hit(disaster_hits, **r)).count();
    let avoided_storms = weather
        .iter()
        .filter(|r| is_storm(*r) && !hit(weather_hits, *r))
        .count();

    let mut parts = Vec::new();
    if avoided_disasters > 0 {
        parts.push(format!("avoided {avoided_disasters} disaster site(s)"));
    }
    if avoided_storms > 0 {
        parts.push(format!("avoided {avoided_storms} storm zone(s)"));
    }
    if parts.is_empty() {
        "no major hazards in the area".into()
    } else {
        parts.join(", ")
    }
}

/// Concatenated edge polylines; a trivial route is the origin alone.
fn route_geometry(network: &RoadNetwork, nodes: &[GeoPoint], route: &Route) -> Vec<GeoPoint> {
    if route.is_trivial() {
        return nodes.to_vec();
    }
    let mut out: Vec<GeoPoint> = Vec::with_capacity(nodes.len());
    for e in &route.edges {
        let points = network.edge_points(*e);
        let skip = usize::from(out.last().is_some_and(|last| Some(last) == points.first()));
        out.extend(points.iter().skip(skip).copied());
    }
    out
}

fn traffic_level(avg_traffic: f64) -> Level {
    if avg_traffic > 0.7 {
        Level::High
    } else if avg_traffic > 0.4 {
        Level::Medium
    } else {
        Level::Low
    }
}

fn crowd_level(crowded_edges: usize) -> Level {
    match crowded_edges {
        0     => Level::Low,
        1..=2 => Level::Medium,
        _     => Level::High,
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
