//! Environment scanner: collects the three hazard layers for a trip box.
//!
//! | Layer     | Source                                                        |
//! |-----------|---------------------------------------------------------------|
//! | disasters | snapshot clipped to the box, else a live [`DisasterSource`]   |
//! | weather   | live [`WeatherSource`] query for the box                      |
//! | crowds    | process-wide [`CrowdTable`] clipped to the box                |
//!
//! Live queries run on their own threads and are awaited with a per-source
//! deadline.  A late, failed, or panicked source contributes an empty layer
//! and a `warn!` event; the scan itself never fails.  Every layer is clipped
//! to the box with [`clip_to_bbox`], so scanning the same box against the
//! same upstream data yields the same lists.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use sr_core::BoundingBox;
use sr_hazard::{
    CrowdTable, DisasterSource, HazardError, HazardRecord, HazardResult, WeatherSource,
    clip_to_bbox,
};

/// The clipped hazard lists for one request.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HazardLayers {
    pub disasters: Vec<HazardRecord>,
    pub weather: Vec<HazardRecord>,
    pub crowds: Vec<HazardRecord>,
}

impl HazardLayers {
    pub fn is_empty(&self) -> bool {
        self.disasters.is_empty() && self.weather.is_empty() && self.crowds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.disasters.len() + self.weather.len() + self.crowds.len()
    }
}

/// Hazard collaborators plus the timing policy for live queries.
#[derive(Clone)]
pub struct EnvironmentScanner {
    pub(crate) disaster_snapshot: Arc<Vec<HazardRecord>>,
    pub(crate) disaster_source: Option<Arc<dyn DisasterSource>>,
    pub(crate) weather_source: Option<Arc<dyn WeatherSource>>,
    pub(crate) crowds: Arc<CrowdTable>,
    pub(crate) timeout: Duration,
    pub(crate) disaster_search_radius_km: f64,
}

impl EnvironmentScanner {
    /// Scanner with no sources: every scan returns empty layers.
    pub fn new(timeout: Duration, disaster_search_radius_km: f64) -> Self {
        Self {
            disaster_snapshot: Arc::new(Vec::new()),
            disaster_source: None,
            weather_source: None,
            crowds: Arc::new(CrowdTable::default()),
            timeout,
            disaster_search_radius_km,
        }
    }

    /// Collect and clip all three layers for `bbox`.
    pub fn scan(&self, bbox: &BoundingBox) -> HazardLayers {
        let started = Instant::now();

        // Spawn both live queries before waiting on either.
        let weather_rx = self.weather_source.as_ref().map(|src| {
            let src = Arc::clone(src);
            let bbox = *bbox;
            (src.name().to_string(), spawn_fetch(move || src.fetch(&bbox)))
        });

        let snapshot_hits = clip_to_bbox(&self.disaster_snapshot, bbox);
        let disaster_rx = match (&self.disaster_source, snapshot_hits.is_empty()) {
            (Some(src), true) => {
                let src = Arc::clone(src);
                let center = bbox.center();
                let radius = self.disaster_search_radius_km;
                Some((src.name().to_string(), spawn_fetch(move || src.fetch(center, radius))))
            }
            _ => None,
        };

        let disasters = match disaster_rx {
            Some((name, rx)) => {
                let fetched = await_fetch(rx, &name, started + self.timeout, self.timeout);
                clip_to_bbox(&or_empty(fetched, &name), bbox)
            }
            None => snapshot_hits,
        };

        let weather = match weather_rx {
            Some((name, rx)) => {
                let fetched = await_fetch(rx, &name, started + self.timeout, self.timeout);
                clip_to_bbox(&or_empty(fetched, &name), bbox)
            }
            None => Vec::new(),
        };

        let crowds = self.crowds.within(bbox);

        debug!(
            disasters = disasters.len(),
            weather = weather.len(),
            crowds = crowds.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "hazard scan complete"
        );
        HazardLayers { disasters, weather, crowds }
    }
}

// ── Worker plumbing ───────────────────────────────────────────────────────────

type FetchRx = mpsc::Receiver<HazardResult<Vec<HazardRecord>>>;

/// Run `fetch` on a detached thread.  A result that arrives after the
/// caller stopped waiting is dropped with the channel.
///
/// The thread is never joined or cancelled: a source that hangs keeps its
/// thread alive after the request has moved on, one per timed-out scan,
/// until the source call itself returns.
fn spawn_fetch<F>(fetch: F) -> FetchRx
where
    F: FnOnce() -> HazardResult<Vec<HazardRecord>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // The receiver may be gone after a timeout.
        let _ = tx.send(fetch());
    });
    rx
}

fn await_fetch(
    rx: FetchRx,
    provider: &str,
    deadline: Instant,
    timeout: Duration,
) -> HazardResult<Vec<HazardRecord>> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(remaining) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(HazardError::Timeout {
            provider: provider.to_string(),
            after: timeout,
        }),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(HazardError::Unavailable {
            provider: provider.to_string(),
            message: "worker exited without a result".into(),
        }),
    }
}

fn or_empty(result: HazardResult<Vec<HazardRecord>>, provider: &str) -> Vec<HazardRecord> {
    result.unwrap_or_else(|err| {
        warn!(provider, error = %err, "hazard source unavailable; continuing without it");
        Vec::new()
    })
}
