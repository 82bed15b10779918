//! Hazard severity and travel-speed scoring.
//!
//! Every function here is pure: inputs in, a score out, no clock reads and no
//! I/O.  All severity, decay, and activity outputs lie in `[0, 1]`.
//!
//! | Function              | Score                                              |
//! |-----------------------|----------------------------------------------------|
//! | [`disaster_severity`] | max category weight over an event's categories     |
//! | [`time_decay`]        | step decay by event age (12 h … 7 days)            |
//! | [`weather_severity`]  | condition weight with wind override                |
//! | [`distance_decay`]    | 20 %-band radial step decay                        |
//! | [`crowd_score`]       | activity × popularity × linear in-radius falloff   |
//! | [`traffic_score`]     | learned model, else weekday/weekend step table     |
//! | [`segment_speed`]     | vehicle profile × weather/traffic efficiency       |
//! | [`fallback_penalty`]  | `1000·d + 30·w + 5·c`                              |

use chrono::{DateTime, Utc};

use sr_core::{GeoPoint, VehicleMode, great_circle_km};
use sr_spatial::{RoadClass, SpeedTier};

use crate::error::{ModelError, ModelResult};
use crate::model::TrafficModel;
use crate::record::{HazardPayload, HazardRecord, VenueType, WeatherCondition};

// ── Disasters ─────────────────────────────────────────────────────────────────

/// Severity of a single disaster category.  Unknown categories score 0.3.
pub fn category_severity(category: &str) -> f64 {
    match category.trim() {
        "severeStorms" | "floods" | "landslides" | "volcanoes" => 1.0,
        "earthquakes" | "cyclones"                            => 0.9,
        "wildfires"                                           => 0.8,
        "tempExtremes"                                        => 0.5,
        "drought" | "manmade"                                 => 0.4,
        "dustHaze"                                            => 0.3,
        "waterColor"                                          => 0.2,
        "seaLakeIce" | "snow"                                 => 0.0,
        _                                                     => 0.3,
    }
}

/// Highest category severity present; `0.0` for no categories.
pub fn disaster_severity<I, S>(categories: I) -> f64
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    categories
        .into_iter()
        .map(|c| category_severity(c.as_ref()))
        .fold(0.0, f64::max)
}

/// Recency weight of an event observed at `now`.
///
/// A missing timestamp counts as current.  Events dated in the future also
/// count as current.
pub fn time_decay(event_time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(event_time) = event_time else {
        return 1.0;
    };
    let hours = (now - event_time).num_seconds() as f64 / 3_600.0;
    match hours {
        h if h < 12.0  => 1.0,
        h if h < 24.0  => 0.9,
        h if h < 48.0  => 0.7,
        h if h < 72.0  => 0.4,
        h if h < 168.0 => 0.2,
        _              => 0.0,
    }
}

// ── Weather ───────────────────────────────────────────────────────────────────

/// Weather severity including the wind override:
/// ≥ 25 m/s forces 1.0, ≥ 15 m/s floors at 0.8, ≥ 10 m/s adds 0.2.
pub fn weather_severity(condition: WeatherCondition, wind_speed_ms: f64) -> f64 {
    let mut score = condition.base_severity();
    if wind_speed_ms >= 25.0 {
        score = 1.0;
    } else if wind_speed_ms >= 15.0 {
        score = score.max(0.8);
    } else if wind_speed_ms >= 10.0 {
        score += 0.2;
    }
    score.clamp(0.0, 1.0)
}

/// Radial falloff in five 20 %-wide bands.  `distance == radius` is still
/// inside (0.2); anything beyond is 0.  A non-positive radius yields 0.
pub fn distance_decay(distance_km: f64, radius_km: f64) -> f64 {
    if radius_km <= 0.0 || !distance_km.is_finite() {
        return 0.0;
    }
    let ratio = distance_km.max(0.0) / radius_km;
    match ratio {
        r if r <= 0.2 => 1.0,
        r if r <= 0.4 => 0.8,
        r if r <= 0.6 => 0.6,
        r if r <= 0.8 => 0.4,
        r if r <= 1.0 => 0.2,
        _             => 0.0,
    }
}

// ── Crowds ────────────────────────────────────────────────────────────────────

/// How busy a venue type is at `hour` (fractional, local time).
pub fn activity_factor(venue: VenueType, hour: f64) -> f64 {
    let h = hour;
    match venue {
        VenueType::Market => {
            if (6.0..=11.0).contains(&h) {
                1.0
            } else if (16.0..=19.0).contains(&h) {
                0.8
            } else if h > 11.0 && h < 16.0 {
                0.4
            } else {
                0.1
            }
        }
        VenueType::School => {
            if (6.5..=7.5).contains(&h) || (16.5..=17.5).contains(&h) { 1.0 } else { 0.1 }
        }
        VenueType::Mall => {
            if (17.0..=21.0).contains(&h) {
                1.0
            } else if (10.0..17.0).contains(&h) {
                0.6
            } else {
                0.1
            }
        }
        VenueType::Tourism => {
            if (8.0..=17.0).contains(&h) { 0.8 } else { 0.0 }
        }
        VenueType::Nightlife => {
            if (18.0..=24.0).contains(&h) {
                1.0
            } else if (17.0..18.0).contains(&h) {
                0.5
            } else {
                0.1
            }
        }
        VenueType::Transport => {
            if (7.0..=9.0).contains(&h) || (16.0..=19.0).contains(&h) { 1.0 } else { 0.4 }
        }
        VenueType::General => 0.1,
    }
}

/// Crowd density at `point` and `hour`.
///
/// Among the crowd hotspots whose radius covers `point`, the **nearest** one
/// is scored as `activity × popularity × (1 − 0.5·d/r)`, clamped to `[0, 1]`
/// and rounded to two decimals.  Non-crowd records are ignored.
pub fn crowd_score<'a, I>(point: GeoPoint, hour: f64, hotspots: I) -> f64
where
    I: IntoIterator<Item = &'a HazardRecord>,
{
    let nearest = hotspots
        .into_iter()
        .filter_map(|rec| match rec.payload {
            HazardPayload::Crowd { venue, popularity } if rec.radius_km > 0.0 => {
                let d = great_circle_km(point, rec.center);
                (d <= rec.radius_km).then_some((d, rec.radius_km, venue, popularity))
            }
            _ => None,
        })
        .min_by(|a, b| a.0.total_cmp(&b.0));

    let Some((d, r, venue, popularity)) = nearest else {
        return 0.0;
    };
    let raw = activity_factor(venue, hour) * popularity * (1.0 - 0.5 * d / r);
    if !raw.is_finite() {
        return 0.0;
    }
    (raw.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

// ── Traffic ───────────────────────────────────────────────────────────────────

/// Rule-based congestion estimate used when no learned model is available.
pub fn fallback_traffic(hour: f64, is_weekend: bool) -> f64 {
    let h = hour;
    if is_weekend {
        if (9.0..12.0).contains(&h) {
            0.5
        } else if (16.0..21.0).contains(&h) {
            0.7
        } else {
            0.1
        }
    } else {
        match h {
            h if (6.5..9.0).contains(&h)   => 0.8,
            h if (9.0..11.0).contains(&h)  => 0.4,
            h if (11.0..13.5).contains(&h) => 0.5,
            h if (13.5..16.0).contains(&h) => 0.4,
            h if (16.0..19.5).contains(&h) => 1.0,
            h if (19.5..22.0).contains(&h) => 0.6,
            _                              => 0.1,
        }
    }
}

/// Ask a learned traffic model, validating and clamping its output.
pub fn model_traffic(
    model: &dyn TrafficModel,
    hour: f64,
    is_weekend: bool,
    weather: f64,
) -> ModelResult<f64> {
    let raw = model.predict([hour, if is_weekend { 1.0 } else { 0.0 }, weather])?;
    if !raw.is_finite() {
        return Err(ModelError::NonFinite(raw));
    }
    Ok(raw.clamp(0.0, 1.0))
}

/// Congestion in `[0, 1]`: the model's answer when present and healthy,
/// otherwise [`fallback_traffic`].
pub fn traffic_score(
    model: Option<&dyn TrafficModel>,
    hour: f64,
    is_weekend: bool,
    weather: f64,
) -> f64 {
    model
        .and_then(|m| model_traffic(m, hour, is_weekend, weather).ok())
        .unwrap_or_else(|| fallback_traffic(hour, is_weekend))
}

// ── Travel speed ──────────────────────────────────────────────────────────────

/// Free-flow speed (km/h) for a vehicle on a road tier.
pub fn profile_speed_kmh(mode: VehicleMode, tier: SpeedTier) -> f64 {
    // [primary, secondary, residential]
    let profile: [f64; 3] = match mode {
        VehicleMode::Motorbike               => [50.0, 40.0, 30.0],
        VehicleMode::Car | VehicleMode::Truck => [60.0, 35.0, 10.0],
        VehicleMode::Walking                 => [5.0, 5.0, 5.0],
        VehicleMode::Bus                     => [45.0, 30.0, 1.0],
        VehicleMode::Bicycle                 => [20.0, 15.0, 15.0],
    };
    match tier {
        SpeedTier::Primary     => profile[0],
        SpeedTier::Secondary   => profile[1],
        SpeedTier::Residential => profile[2],
    }
}

/// Lowest speed a vehicle is assumed to keep moving at.
fn crawl_speed_kmh(mode: VehicleMode) -> f64 {
    match mode {
        VehicleMode::Walking => 1.0,
        VehicleMode::Bicycle => 3.0,
        _                    => 5.0,
    }
}

/// Expected speed (km/h) on a segment under the given weather and traffic
/// scores.
///
/// Enclosed vehicles lose 40 % of the weather score and 90 % of the traffic
/// score as impact; two-wheelers and pedestrians lose 80 % and 60 %.  The
/// larger impact sets an efficiency of `1 − 0.8·impact`.
pub fn segment_speed(
    class: RoadClass,
    speed_limit_kmh: Option<f32>,
    mode: VehicleMode,
    weather: f64,
    traffic: f64,
) -> f64 {
    let mut max_speed = profile_speed_kmh(mode, class.speed_tier());
    if let Some(limit) = speed_limit_kmh.filter(|l| *l > 0.0) {
        max_speed = max_speed.min(limit as f64);
    }

    let (weather_w, traffic_w) = if mode.is_protected() { (0.4, 0.9) } else { (0.8, 0.6) };
    let impact = (weather.clamp(0.0, 1.0) * weather_w).max(traffic.clamp(0.0, 1.0) * traffic_w);
    let efficiency = 1.0 - impact * 0.8;

    let floor = crawl_speed_kmh(mode).min(max_speed);
    (max_speed * efficiency).max(floor)
}

/// Seconds to cover `length_m` at `speed_kmh`.
pub fn travel_seconds(length_m: f64, speed_kmh: f64) -> f64 {
    let mps = (speed_kmh / 3.6).max(0.1);
    length_m.max(0.0) / mps
}

// ── Penalty ───────────────────────────────────────────────────────────────────

/// Linear penalty used when no learned penalty model is available.
/// Disasters dominate weather by more than an order of magnitude.
pub fn fallback_penalty(disaster: f64, weather: f64, crowd: f64) -> f64 {
    (disaster * 1_000.0 + weather * 30.0 + crowd * 5.0).max(0.0)
}
