//! Trip-time model.
//!
//! Every routing request is evaluated at one instant.  `TripTime` captures
//! the three facts the scoring functions need from that instant:
//!
//! - the fractional local hour of day (`7.5` = 07:30) for traffic and crowd
//!   activity windows,
//! - whether the local day is a weekend,
//! - the absolute UTC instant, against which disaster ages are measured.
//!
//! Holding these explicitly (rather than reading the clock inside scoring
//! functions) keeps every score reproducible in tests.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc, Weekday};

use crate::{CoreError, CoreResult};

/// The instant a route is requested for.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TripTime {
    /// Local hour of day in `[0, 24]`, fractional minutes included.
    pub hour: f64,
    /// Saturday or Sunday in local time.
    pub is_weekend: bool,
    /// Absolute reference instant.
    pub now: DateTime<Utc>,
}

impl TripTime {
    /// Build from explicit components.
    ///
    /// # Errors
    /// [`CoreError::InvalidHour`] if `hour` is not finite or outside `[0, 24]`.
    pub fn new(hour: f64, is_weekend: bool, now: DateTime<Utc>) -> CoreResult<Self> {
        if !hour.is_finite() || !(0.0..=24.0).contains(&hour) {
            return Err(CoreError::InvalidHour(hour));
        }
        Ok(Self { hour, is_weekend, now })
    }

    /// Derive hour and weekend flag from a zoned timestamp.
    pub fn at<Tz: TimeZone>(instant: DateTime<Tz>) -> Self {
        let hour = instant.hour() as f64 + instant.minute() as f64 / 60.0;
        let is_weekend = matches!(instant.weekday(), Weekday::Sat | Weekday::Sun);
        Self {
            hour,
            is_weekend,
            now: instant.with_timezone(&Utc),
        }
    }

    /// The current wall-clock instant in the host's local time zone.
    pub fn now() -> Self {
        Self::at(Local::now())
    }

    /// Hours elapsed from `event` to `self.now`.  Negative when the event
    /// lies in the future.
    pub fn hours_since(&self, event: DateTime<Utc>) -> f64 {
        (self.now - event).num_seconds() as f64 / 3_600.0
    }
}

impl std::fmt::Display for TripTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let h = self.hour.floor() as u32;
        let m = ((self.hour - self.hour.floor()) * 60.0).round() as u32;
        let day = if self.is_weekend { "weekend" } else { "weekday" };
        write!(f, "{h:02}:{m:02} {day}")
    }
}
