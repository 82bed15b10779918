//! Vehicle mode and road-network kind shared across the routing crates.

use std::str::FromStr;

use crate::CoreError;

/// The vehicle a traveller uses.  Drives the speed profile, the weather and
/// traffic sensitivity, and which base road graph is loaded.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VehicleMode {
    /// Two-wheeled motor vehicle; the default urban mode.
    #[default]
    Motorbike,
    /// Private car.
    Car,
    /// On foot.
    Walking,
    /// Public or private bus.
    Bus,
    /// Pedal bicycle.
    Bicycle,
    /// Goods vehicle.
    Truck,
}

impl VehicleMode {
    /// Cars and buses: penalised more by congestion, less by weather.
    /// Trucks keep the open-vehicle weighting.
    #[inline]
    pub fn is_protected(self) -> bool {
        matches!(self, VehicleMode::Car | VehicleMode::Bus)
    }

    /// Vehicles too large for residential lanes and service roads.
    #[inline]
    pub fn is_large(self) -> bool {
        matches!(self, VehicleMode::Car | VehicleMode::Bus | VehicleMode::Truck)
    }

    /// Which base road graph this mode routes on.
    #[inline]
    pub fn network_kind(self) -> NetworkKind {
        match self {
            VehicleMode::Walking => NetworkKind::Walk,
            _ => NetworkKind::Drive,
        }
    }

    /// Human-readable label, also the accepted parse form.
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleMode::Motorbike => "motorbike",
            VehicleMode::Car       => "car",
            VehicleMode::Walking   => "walking",
            VehicleMode::Bus       => "bus",
            VehicleMode::Bicycle   => "bicycle",
            VehicleMode::Truck     => "truck",
        }
    }
}

impl FromStr for VehicleMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "motorbike" | "motorcycle" | "scooter" => Ok(VehicleMode::Motorbike),
            "car"                                  => Ok(VehicleMode::Car),
            "walking" | "walk" | "foot"            => Ok(VehicleMode::Walking),
            "bus"                                  => Ok(VehicleMode::Bus),
            "bicycle" | "bike"                     => Ok(VehicleMode::Bicycle),
            "truck"                                => Ok(VehicleMode::Truck),
            other => Err(CoreError::UnknownVehicleMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for VehicleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two base road graphs a deployment keeps loaded.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetworkKind {
    /// Footways, paths, and any street a pedestrian may use.
    Walk,
    /// Streets open to motor vehicles and bicycles.
    Drive,
}

impl NetworkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NetworkKind::Walk  => "walk",
            NetworkKind::Drive => "drive",
        }
    }
}

impl std::fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
