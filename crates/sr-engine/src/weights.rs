//! Per-edge hazard scoring and routing weights.
//!
//! The calculator never writes to the network.  It produces an
//! [`EdgeWeights`] overlay indexed by the working graph's `EdgeId`, owned by
//! the request and dropped with it.
//!
//! # Pipeline per edge
//!
//! 1. **Raw scores** (optionally parallel with the `parallel` feature):
//!    - disaster: max of `severity × time decay` over disasters whose radius
//!      reaches the edge polyline,
//!    - weather: max of `severity × distance decay` over weather zones whose
//!      radius reaches the edge polyline,
//!    - crowd: [`crowd_score`] at the edge midpoint.
//! 2. **Effective scores**: raw × preference multiplier, clamped to `[0, 1]`.
//! 3. **Penalty**: batched [`PenaltyModel`] call on the effective triples,
//!    with the small-road restriction added to the crowd feature.  A failed
//!    batch falls back to [`fallback_penalty`].
//! 4. **Travel time**: [`segment_speed`] under the *raw* weather score.
//! 5. **Weight**: perceived seconds × `(1 + penalty)`.

use std::collections::HashMap;

use tracing::{debug, warn};

use sr_core::{EdgeId, GeoPoint, TripTime, VehicleMode, point_to_polyline_km};
use sr_hazard::scoring::{
    crowd_score, disaster_severity, distance_decay, fallback_penalty, fallback_traffic,
    model_traffic, segment_speed, time_decay, travel_seconds, weather_severity,
};
use sr_hazard::{HazardIndex, HazardPayload, ModelError, PenaltyModel, TrafficModel};
use sr_spatial::RoadNetwork;

use crate::scanner::HazardLayers;
use crate::{EngineConfig, Preferences};

// ── Overlay types ─────────────────────────────────────────────────────────────

/// One score per hazard layer, each in `[0, 1]`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HazardScores {
    pub disaster: f64,
    pub weather: f64,
    pub crowd: f64,
}

impl HazardScores {
    /// Replace non-finite components with 0 and clamp the rest.
    fn sanitized(self) -> Self {
        Self {
            disaster: unit(self.disaster),
            weather:  unit(self.weather),
            crowd:    unit(self.crowd),
        }
    }

    fn weighted(self, prefs: &Preferences) -> Self {
        Self {
            disaster: unit(self.disaster * prefs.disaster),
            weather:  unit(self.weather * prefs.weather),
            crowd:    unit(self.crowd * prefs.crowd),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.disaster == 0.0 && self.weather == 0.0 && self.crowd == 0.0
    }
}

/// Boolean markers kept for the audit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskFlags {
    pub disaster: bool,
    pub weather: bool,
    /// Raw crowd score above [`EngineConfig::crowd_flag_threshold`].
    pub crowd: bool,
}

/// Everything the calculator derived for one edge.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EdgeAnnotation {
    pub raw: HazardScores,
    pub effective: HazardScores,
    /// Physical congestion estimate in `[0, 1]`.
    pub traffic: f64,
    /// Non-negative penalty multiplier.
    pub penalty: f64,
    /// Physical traversal time in seconds.
    pub travel_secs: f64,
    /// Routing weight: perceived seconds × `(1 + penalty)`.
    pub weight: f64,
    pub flags: RiskFlags,
}

/// Per-request overlay of derived edge fields.
#[derive(Clone, Debug, Default)]
pub struct EdgeWeights {
    annotations: Vec<EdgeAnnotation>,
    weights: Vec<f64>,
    /// Edges whose penalty came from the fallback formula.
    pub penalty_fallbacks: usize,
}

impl EdgeWeights {
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Routing weights indexed by `EdgeId`.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn annotation(&self, edge: EdgeId) -> &EdgeAnnotation {
        &self.annotations[edge.index()]
    }

    pub fn annotations(&self) -> &[EdgeAnnotation] {
        &self.annotations
    }
}

// ── Calculator ────────────────────────────────────────────────────────────────

/// Borrowed inputs for one weighting pass.
pub struct WeightCalculator<'a> {
    pub config: &'a EngineConfig,
    pub preferences: Preferences,
    pub mode: VehicleMode,
    pub trip: &'a TripTime,
    pub penalty_model: Option<&'a dyn PenaltyModel>,
    pub traffic_model: Option<&'a dyn TrafficModel>,
}

impl<'a> WeightCalculator<'a> {
    pub fn new(config: &'a EngineConfig, mode: VehicleMode, trip: &'a TripTime) -> Self {
        Self {
            config,
            preferences: Preferences::default(),
            mode,
            trip,
            penalty_model: None,
            traffic_model: None,
        }
    }

    pub fn preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences.clamped();
        self
    }

    pub fn penalty_model(mut self, model: Option<&'a dyn PenaltyModel>) -> Self {
        self.penalty_model = model;
        self
    }

    pub fn traffic_model(mut self, model: Option<&'a dyn TrafficModel>) -> Self {
        self.traffic_model = model;
        self
    }

    /// Score every edge of `network` against `layers`.
    pub fn compute(&self, network: &RoadNetwork, layers: &HazardLayers) -> EdgeWeights {
        let raw = self.raw_scores(network, layers);
        let prefs = self.preferences.clamped();

        let effective: Vec<HazardScores> = raw.iter().map(|s| s.weighted(&prefs)).collect();
        let features: Vec<[f64; 3]> = network
            .edges()
            .zip(&effective)
            .map(|(e, eff)| {
                let crowd = eff.crowd + self.restriction_penalty(network, e);
                [eff.disaster, eff.weather, crowd]
            })
            .collect();
        let (penalties, penalty_fallbacks) = self.penalties(&features);

        let mut traffic = TrafficCache::new(self.traffic_model, self.trip);
        let mut annotations = Vec::with_capacity(raw.len());
        let mut weights = Vec::with_capacity(raw.len());

        for (i, e) in network.edges().enumerate() {
            let (scores, eff, penalty) = (raw[i], effective[i], penalties[i]);
            let class = network.edge_class[i];
            let limit = network.edge_speed_limit_kmh[i];
            let length_m = network.edge_length_m[i];

            let jam = traffic.score(scores.weather);
            let perceived_jam = unit(jam * prefs.traffic);

            let travel_secs =
                travel_seconds(length_m, segment_speed(class, limit, self.mode, scores.weather, jam));
            let perceived_secs = travel_seconds(
                length_m,
                segment_speed(class, limit, self.mode, scores.weather, perceived_jam),
            );

            let mut weight = perceived_secs * (1.0 + penalty);
            if !weight.is_finite() || weight < 0.0 {
                weight = f64::INFINITY;
            }

            let flags = RiskFlags {
                disaster: scores.disaster > 0.0,
                weather: scores.weather > 0.0,
                crowd: scores.crowd > self.config.crowd_flag_threshold,
            };
            debug_assert_eq!(e.index(), i);
            annotations.push(EdgeAnnotation {
                raw: scores,
                effective: eff,
                traffic: jam,
                penalty,
                travel_secs,
                weight,
                flags,
            });
            weights.push(weight);
        }

        if traffic.failures > 0 {
            warn!(
                failures = traffic.failures,
                "traffic model failed; used the time-of-day table"
            );
        }
        debug!(
            edges = annotations.len(),
            penalty_fallbacks,
            hazardous = annotations.iter().filter(|a| !a.raw.is_zero()).count(),
            "edge weights computed"
        );

        EdgeWeights { annotations, weights, penalty_fallbacks }
    }

    /// Additive crowd-feature penalty for large vehicles on small roads.
    fn restriction_penalty(&self, network: &RoadNetwork, edge: EdgeId) -> f64 {
        if !self.mode.is_large() || !network.edge_class[edge.index()].is_small() {
            return 0.0;
        }
        match self.mode {
            VehicleMode::Bus => self.config.bus_small_road_penalty,
            _                => self.config.car_small_road_penalty,
        }
    }

    // ── Raw scoring ───────────────────────────────────────────────────────

    fn raw_scores(&self, network: &RoadNetwork, layers: &HazardLayers) -> Vec<HazardScores> {
        let scorer = RawScorer {
            disasters: HazardIndex::new(&layers.disasters),
            weather:   HazardIndex::new(&layers.weather),
            crowds:    HazardIndex::new(&layers.crowds),
            trip:      self.trip,
        };

        #[cfg(not(feature = "parallel"))]
        {
            network.edges().map(|e| scorer.score(network, e)).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            // Indexed collect keeps EdgeId order.
            network
                .edges()
                .collect::<Vec<_>>()
                .into_par_iter()
                .map(|e| scorer.score(network, e))
                .collect()
        }
    }

    // ── Penalty ───────────────────────────────────────────────────────────

    /// One penalty per feature row plus the number of rows that used the
    /// fallback formula.
    fn penalties(&self, features: &[[f64; 3]]) -> (Vec<f64>, usize) {
        let formula = |f: &[f64; 3]| fallback_penalty(f[0], f[1], f[2]);

        let Some(model) = self.penalty_model else {
            return (features.iter().map(formula).collect(), features.len());
        };

        let mut out = Vec::with_capacity(features.len());
        let mut fallbacks = 0usize;
        let mut failed_batches = 0usize;

        for batch in features.chunks(self.config.penalty_batch_size.max(1)) {
            match predict_batch(model, batch) {
                Ok(predicted) => {
                    for (p, f) in predicted.into_iter().zip(batch) {
                        if p.is_finite() {
                            out.push(p.max(0.0));
                        } else {
                            fallbacks += 1;
                            out.push(formula(f));
                        }
                    }
                }
                Err(err) => {
                    failed_batches += 1;
                    fallbacks += batch.len();
                    debug!(error = %err, rows = batch.len(), "penalty batch failed");
                    out.extend(batch.iter().map(formula));
                }
            }
        }

        if fallbacks > 0 {
            warn!(
                fallbacks,
                failed_batches,
                "penalty model unavailable for some edges; used the linear formula"
            );
        }
        (out, fallbacks)
    }
}

fn predict_batch(model: &dyn PenaltyModel, batch: &[[f64; 3]]) -> Result<Vec<f64>, ModelError> {
    let predicted = model.predict(batch)?;
    if predicted.len() != batch.len() {
        return Err(ModelError::ShapeMismatch { expected: batch.len(), got: predicted.len() });
    }
    Ok(predicted)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Clamp to `[0, 1]`; non-finite input scores 0.
fn unit(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

/// Spatial indices for the three layers, shared read-only by every edge.
struct RawScorer<'a> {
    disasters: HazardIndex<'a>,
    weather: HazardIndex<'a>,
    crowds: HazardIndex<'a>,
    trip: &'a TripTime,
}

impl RawScorer<'_> {
    fn score(&self, network: &RoadNetwork, edge: EdgeId) -> HazardScores {
        let points = network.edge_points(edge);
        let bbox = network.edge_bbox(edge);

        let disaster = self
            .disasters
            .candidates(&bbox)
            .into_iter()
            .filter_map(|rec| match &rec.payload {
                HazardPayload::Disaster { categories, event_time } => {
                    within(rec.center, rec.radius_km, &points).map(|_| {
                        disaster_severity(categories) * time_decay(*event_time, self.trip.now)
                    })
                }
                _ => None,
            })
            .fold(0.0, max_finite);

        let weather = self
            .weather
            .candidates(&bbox)
            .into_iter()
            .filter_map(|rec| match rec.payload {
                HazardPayload::Weather { condition, wind_speed_ms } => {
                    within(rec.center, rec.radius_km, &points).map(|d| {
                        weather_severity(condition, wind_speed_ms)
                            * distance_decay(d, rec.radius_km)
                    })
                }
                _ => None,
            })
            .fold(0.0, max_finite);

        let mid = network.edge_midpoint(edge);
        let crowd = crowd_score(mid, self.trip.hour, self.crowds.candidates_near(mid, 0.0));

        HazardScores { disaster, weather, crowd }.sanitized()
    }
}

/// Distance from `center` to the polyline, if it lies within `radius_km`.
fn within(center: GeoPoint, radius_km: f64, points: &[GeoPoint]) -> Option<f64> {
    let d = point_to_polyline_km(center, points);
    (d.is_finite() && d <= radius_km).then_some(d)
}

fn max_finite(acc: f64, v: f64) -> f64 {
    if v.is_finite() { acc.max(v) } else { acc }
}

/// Traffic scores keyed by the raw weather score, so the model is asked
/// once per distinct weather value rather than once per edge.
struct TrafficCache<'a> {
    model: Option<&'a dyn TrafficModel>,
    trip: &'a TripTime,
    cache: HashMap<u64, f64>,
    failures: usize,
}

impl<'a> TrafficCache<'a> {
    fn new(model: Option<&'a dyn TrafficModel>, trip: &'a TripTime) -> Self {
        Self { model, trip, cache: HashMap::new(), failures: 0 }
    }

    fn score(&mut self, weather: f64) -> f64 {
        if let Some(&hit) = self.cache.get(&weather.to_bits()) {
            return hit;
        }
        let (hour, weekend) = (self.trip.hour, self.trip.is_weekend);
        let score = match self.model {
            Some(model) => model_traffic(model, hour, weekend, weather).unwrap_or_else(|err| {
                self.failures += 1;
                debug!(error = %err, weather, "traffic model failed");
                fallback_traffic(hour, weekend)
            }),
            None => fallback_traffic(hour, weekend),
        };
        self.cache.insert(weather.to_bits(), score);
        score
    }
}
