//! Engine tunables and per-request user preferences.

use std::time::Duration;

use tracing::debug;

/// Every tunable of the routing pipeline.
///
/// Defaults reproduce the production behaviour.  With the `serde` feature
/// the struct deserializes from JSON with missing fields taking defaults.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    // ── Pruning ───────────────────────────────────────────────────────────
    /// Lower bound of the bounding-box buffer, in degrees (~300 m).
    pub min_buffer_deg: f64,
    /// Upper bound of the bounding-box buffer, in degrees (~3 km).
    pub max_buffer_deg: f64,

    // ── Hazard sources ────────────────────────────────────────────────────
    /// Per-source fetch timeout in milliseconds.
    pub source_timeout_ms: u64,
    /// Search radius for the live disaster query when the snapshot has
    /// nothing inside the box.
    pub disaster_search_radius_km: f64,

    // ── Weighting ─────────────────────────────────────────────────────────
    /// Edges per penalty-model call.
    pub penalty_batch_size: usize,
    /// Crowd score above which an edge is flagged as crowded.
    pub crowd_flag_threshold: f64,
    /// Added to the crowd feature for buses on residential/service roads.
    pub bus_small_road_penalty: f64,
    /// Added to the crowd feature for cars and trucks on the same roads.
    pub car_small_road_penalty: f64,

    // ── Diversification ───────────────────────────────────────────────────
    /// Number of search attempts; also the maximum number of routes.
    pub alternatives: usize,
    /// Multiplier applied to the weights of each found path's edges.
    pub inflation_factor: f64,

    // ── Audit ─────────────────────────────────────────────────────────────
    /// Max segment penalty above which a route is `Dangerous`.
    pub dangerous_penalty: f64,
    /// Length share of crowded edges above which a route needs `Caution`.
    pub crowd_fraction_threshold: f64,
    /// Multiplier on summed travel time for the reported ETA.
    pub eta_buffer: f64,
    /// Slack added to hazard radii when re-checking route nodes.
    pub audit_tolerance_km: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_buffer_deg:            0.003,
            max_buffer_deg:            0.03,
            source_timeout_ms:         5_000,
            disaster_search_radius_km: 200.0,
            penalty_batch_size:        4_096,
            crowd_flag_threshold:      0.7,
            bus_small_road_penalty:    50.0,
            car_small_road_penalty:    5.0,
            alternatives:              3,
            inflation_factor:          2.0,
            dangerous_penalty:         20.0,
            crowd_fraction_threshold:  0.3,
            eta_buffer:                1.15,
            audit_tolerance_km:        0.2,
        }
    }
}

impl EngineConfig {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        let ordered = self.min_buffer_deg >= 0.0 && self.min_buffer_deg <= self.max_buffer_deg;
        if !ordered {
            return Err(format!(
                "buffer bounds [{}, {}] are not an ordered non-negative range",
                self.min_buffer_deg, self.max_buffer_deg
            ));
        }
        if self.alternatives == 0 {
            return Err("alternatives must be at least 1".into());
        }
        if self.inflation_factor.is_nan() || self.inflation_factor < 1.0 {
            return Err(format!("inflation_factor {} must be >= 1", self.inflation_factor));
        }
        if self.penalty_batch_size == 0 {
            return Err("penalty_batch_size must be at least 1".into());
        }
        if self.eta_buffer.is_nan() || self.eta_buffer <= 0.0 {
            return Err(format!("eta_buffer {} must be positive", self.eta_buffer));
        }
        Ok(())
    }
}

// ── Preferences ───────────────────────────────────────────────────────────────

/// How strongly the traveller cares about each hazard layer.
///
/// Each multiplier defaults to 1.0 and is clamped to `[0, 2]`.  `0` ignores
/// a layer entirely; `2` doubles its weight.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Preferences {
    pub disaster: f64,
    pub weather: f64,
    pub crowd: f64,
    pub traffic: f64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self { disaster: 1.0, weather: 1.0, crowd: 1.0, traffic: 1.0 }
    }
}

impl Preferences {
    pub const MAX: f64 = 2.0;

    pub fn new(disaster: f64, weather: f64, crowd: f64, traffic: f64) -> Self {
        Self {
            disaster: clamp_multiplier(disaster),
            weather:  clamp_multiplier(weather),
            crowd:    clamp_multiplier(crowd),
            traffic:  clamp_multiplier(traffic),
        }
    }

    /// Build from string-keyed pairs (`"disaster"`, `"weather"`, `"crowd"`,
    /// `"traffic"`).  Unknown keys are ignored; missing keys stay at 1.0.
    pub fn from_map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut prefs = Self::default();
        for (key, value) in entries {
            let value = clamp_multiplier(value);
            match key.as_ref() {
                "disaster" => prefs.disaster = value,
                "weather"  => prefs.weather = value,
                "crowd"    => prefs.crowd = value,
                "traffic"  => prefs.traffic = value,
                other      => debug!(key = other, "ignoring unknown preference"),
            }
        }
        prefs
    }

    /// Copy with every multiplier forced into `[0, 2]`.
    pub fn clamped(self) -> Self {
        Self::new(self.disaster, self.weather, self.crowd, self.traffic)
    }
}

/// Non-finite multipliers fall back to the neutral 1.0.
fn clamp_multiplier(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, Preferences::MAX) } else { 1.0 }
}
