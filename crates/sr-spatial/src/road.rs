//! Road classification and OSM tag helpers.

/// OSM `highway=*` classification of a street segment.
///
/// `_link` variants fold into their parent class.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoadClass {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    #[default]
    Residential,
    LivingStreet,
    Service,
    Unclassified,
    Pedestrian,
    Footway,
    Path,
    Steps,
    Cycleway,
    Track,
    Other,
}

/// Coarse speed tier used by the per-vehicle speed profiles.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SpeedTier {
    /// Arterials: motorway, trunk, primary.
    Primary,
    /// Collectors: secondary, tertiary.
    Secondary,
    /// Everything else.
    Residential,
}

impl RoadClass {
    /// Parse an OSM `highway` tag value.
    pub fn from_highway_tag(tag: &str) -> RoadClass {
        let base = tag.trim().strip_suffix("_link").unwrap_or(tag.trim());
        match base {
            "motorway"      => RoadClass::Motorway,
            "trunk"         => RoadClass::Trunk,
            "primary"       => RoadClass::Primary,
            "secondary"     => RoadClass::Secondary,
            "tertiary"      => RoadClass::Tertiary,
            "residential"   => RoadClass::Residential,
            "living_street" => RoadClass::LivingStreet,
            "service"       => RoadClass::Service,
            "unclassified"  => RoadClass::Unclassified,
            "pedestrian"    => RoadClass::Pedestrian,
            "footway"       => RoadClass::Footway,
            "path"          => RoadClass::Path,
            "steps"         => RoadClass::Steps,
            "cycleway"      => RoadClass::Cycleway,
            "track"         => RoadClass::Track,
            _               => RoadClass::Other,
        }
    }

    /// Narrow streets that large vehicles should avoid.
    #[inline]
    pub fn is_small(self) -> bool {
        matches!(self, RoadClass::Residential | RoadClass::LivingStreet | RoadClass::Service)
    }

    pub fn speed_tier(self) -> SpeedTier {
        match self {
            RoadClass::Motorway | RoadClass::Trunk | RoadClass::Primary => SpeedTier::Primary,
            RoadClass::Secondary | RoadClass::Tertiary                  => SpeedTier::Secondary,
            _                                                           => SpeedTier::Residential,
        }
    }

    /// `true` if motor vehicles may use this class.
    pub fn is_drivable(self) -> bool {
        !matches!(
            self,
            RoadClass::Pedestrian
                | RoadClass::Footway
                | RoadClass::Path
                | RoadClass::Steps
                | RoadClass::Cycleway
                | RoadClass::Track
        )
    }

    /// `true` if pedestrians may use this class without further tags.
    /// Arterials need an explicit `foot=*` or `sidewalk=*` tag.
    pub fn is_walkable(self) -> bool {
        !matches!(
            self,
            RoadClass::Motorway | RoadClass::Trunk | RoadClass::Primary | RoadClass::Secondary
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoadClass::Motorway     => "motorway",
            RoadClass::Trunk        => "trunk",
            RoadClass::Primary      => "primary",
            RoadClass::Secondary    => "secondary",
            RoadClass::Tertiary     => "tertiary",
            RoadClass::Residential  => "residential",
            RoadClass::LivingStreet => "living_street",
            RoadClass::Service      => "service",
            RoadClass::Unclassified => "unclassified",
            RoadClass::Pedestrian   => "pedestrian",
            RoadClass::Footway      => "footway",
            RoadClass::Path         => "path",
            RoadClass::Steps        => "steps",
            RoadClass::Cycleway     => "cycleway",
            RoadClass::Track        => "track",
            RoadClass::Other        => "other",
        }
    }
}

impl std::fmt::Display for RoadClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse an OSM `maxspeed` value into km/h.
///
/// Accepts `"50"`, `"50 km/h"`, `"30 mph"`, and semicolon lists (first value
/// wins).  Returns `None` for symbolic values such as `"walk"` or `"none"`.
pub fn parse_maxspeed_kmh(raw: &str) -> Option<f32> {
    let first = raw.split(';').next()?.trim();
    let (number, factor) = match first.strip_suffix("mph") {
        Some(n) => (n.trim(), 1.609_344),
        None => (first.trim_end_matches("km/h").trim_end_matches("kmh").trim(), 1.0),
    };
    let value: f32 = number.parse().ok()?;
    (value > 0.0 && value.is_finite()).then_some(value * factor)
}
