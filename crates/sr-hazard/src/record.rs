//! Hazard records: the three layers (disaster, weather, crowd) as one tagged
//! union sharing a common spatial shape.

use chrono::{DateTime, Utc};

use sr_core::{BoundingBox, GeoPoint};

// ── HazardKind ────────────────────────────────────────────────────────────────

/// Which layer a record belongs to.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HazardKind {
    Disaster,
    Weather,
    Crowd,
}

impl HazardKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HazardKind::Disaster => "disaster",
            HazardKind::Weather  => "weather",
            HazardKind::Crowd    => "crowd",
        }
    }
}

impl std::fmt::Display for HazardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── WeatherCondition ──────────────────────────────────────────────────────────

/// Dominant weather condition of a weather zone.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeatherCondition {
    Thunderstorm,
    Rain,
    Drizzle,
    Fog,
    Snow,
    Mist,
    Haze,
    Clouds,
    #[default]
    Clear,
    Other,
}

impl WeatherCondition {
    /// Map a WMO weather interpretation code (as used by Open-Meteo).
    pub fn from_wmo_code(code: u16) -> Self {
        match code {
            0                         => WeatherCondition::Clear,
            1..=3                     => WeatherCondition::Clouds,
            45 | 48                   => WeatherCondition::Fog,
            51..=57                   => WeatherCondition::Drizzle,
            61..=67 | 80..=82         => WeatherCondition::Rain,
            71..=77 | 85 | 86         => WeatherCondition::Snow,
            95..=99                   => WeatherCondition::Thunderstorm,
            _                         => WeatherCondition::Clear,
        }
    }

    /// Parse a condition keyword (`"Rain"`, `"thunderstorm"`, ...).
    /// Unrecognised keywords map to [`WeatherCondition::Other`].
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "thunderstorm" => WeatherCondition::Thunderstorm,
            "rain"         => WeatherCondition::Rain,
            "drizzle"      => WeatherCondition::Drizzle,
            "fog"          => WeatherCondition::Fog,
            "snow"         => WeatherCondition::Snow,
            "mist"         => WeatherCondition::Mist,
            "haze"         => WeatherCondition::Haze,
            "clouds"       => WeatherCondition::Clouds,
            "clear"        => WeatherCondition::Clear,
            _              => WeatherCondition::Other,
        }
    }

    /// Condition severity before any wind adjustment.
    pub fn base_severity(self) -> f64 {
        match self {
            WeatherCondition::Thunderstorm => 0.9,
            WeatherCondition::Rain         => 0.6,
            WeatherCondition::Snow         => 0.5,
            WeatherCondition::Drizzle      => 0.4,
            WeatherCondition::Fog          => 0.4,
            WeatherCondition::Mist         => 0.3,
            WeatherCondition::Haze         => 0.3,
            WeatherCondition::Other        => 0.2,
            WeatherCondition::Clouds       => 0.1,
            WeatherCondition::Clear        => 0.0,
        }
    }

    /// Zones that count toward the "storm areas avoided" tally.
    pub fn is_precipitating_storm(self) -> bool {
        matches!(self, WeatherCondition::Rain | WeatherCondition::Thunderstorm)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeatherCondition::Thunderstorm => "Thunderstorm",
            WeatherCondition::Rain         => "Rain",
            WeatherCondition::Drizzle      => "Drizzle",
            WeatherCondition::Fog          => "Fog",
            WeatherCondition::Snow         => "Snow",
            WeatherCondition::Mist         => "Mist",
            WeatherCondition::Haze         => "Haze",
            WeatherCondition::Clouds       => "Clouds",
            WeatherCondition::Clear        => "Clear",
            WeatherCondition::Other        => "Other",
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── VenueType ─────────────────────────────────────────────────────────────────

/// Category of a crowd hotspot; selects its hour-of-day activity window.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VenueType {
    Market,
    School,
    Mall,
    Tourism,
    Nightlife,
    Transport,
    #[default]
    General,
}

impl VenueType {
    /// Parse a venue tag.  Unknown tags map to [`VenueType::General`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "market" | "marketplace"    => VenueType::Market,
            "school"                    => VenueType::School,
            "mall"                      => VenueType::Mall,
            "tourism" | "tourist"       => VenueType::Tourism,
            "nightlife" | "pedestrian"  => VenueType::Nightlife,
            "transport"                 => VenueType::Transport,
            _                           => VenueType::General,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VenueType::Market    => "market",
            VenueType::School    => "school",
            VenueType::Mall      => "mall",
            VenueType::Tourism   => "tourism",
            VenueType::Nightlife => "nightlife",
            VenueType::Transport => "transport",
            VenueType::General   => "general",
        }
    }
}

impl std::fmt::Display for VenueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── HazardRecord ──────────────────────────────────────────────────────────────

/// Layer-specific severity inputs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HazardPayload {
    Disaster {
        /// Event categories, e.g. `["floods", "severeStorms"]`.
        categories: Vec<String>,
        /// When the event was reported; `None` is treated as current.
        event_time: Option<DateTime<Utc>>,
    },
    Weather {
        condition: WeatherCondition,
        wind_speed_ms: f64,
    },
    Crowd {
        venue: VenueType,
        /// Popularity weight in `[0, 1]`.
        popularity: f64,
    },
}

/// One hazard with a circular zone of influence.
///
/// Records are immutable snapshots: fetched per request for disasters and
/// weather, loaded once for the crowd table.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HazardRecord {
    /// Stable identifier from the upstream feed, if any.
    pub id: String,
    /// Display name used in route reports.
    pub name: String,
    pub center: GeoPoint,
    /// Influence radius in kilometres.
    pub radius_km: f64,
    pub payload: HazardPayload,
}

impl HazardRecord {
    pub fn disaster(
        id: impl Into<String>,
        name: impl Into<String>,
        center: GeoPoint,
        radius_km: f64,
        categories: Vec<String>,
        event_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            center,
            radius_km,
            payload: HazardPayload::Disaster { categories, event_time },
        }
    }

    pub fn weather(
        name: impl Into<String>,
        center: GeoPoint,
        radius_km: f64,
        condition: WeatherCondition,
        wind_speed_ms: f64,
    ) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            center,
            radius_km,
            payload: HazardPayload::Weather { condition, wind_speed_ms },
        }
    }

    pub fn crowd(
        name: impl Into<String>,
        center: GeoPoint,
        radius_km: f64,
        venue: VenueType,
        popularity: f64,
    ) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            center,
            radius_km,
            payload: HazardPayload::Crowd { venue, popularity },
        }
    }

    pub fn kind(&self) -> HazardKind {
        match self.payload {
            HazardPayload::Disaster { .. } => HazardKind::Disaster,
            HazardPayload::Weather { .. }  => HazardKind::Weather,
            HazardPayload::Crowd { .. }    => HazardKind::Crowd,
        }
    }

    /// Box enclosing the zone of influence.
    pub fn influence_bbox(&self) -> BoundingBox {
        BoundingBox::around(self.center, self.radius_km)
    }

    /// `true` if the zone of influence overlaps `bbox`.
    pub fn touches(&self, bbox: &BoundingBox) -> bool {
        self.influence_bbox().intersects(bbox)
    }
}

/// Keep the records whose zone of influence overlaps `bbox`, preserving
/// input order.  Applying the same box twice yields the same list.
pub fn clip_to_bbox(records: &[HazardRecord], bbox: &BoundingBox) -> Vec<HazardRecord> {
    records.iter().filter(|r| r.touches(bbox)).cloned().collect()
}
