//! The request pipeline.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use sr_core::{BoundingBox, GeoPoint, TripTime, VehicleMode};
use sr_hazard::{PenaltyModel, TrafficModel};
use sr_spatial::{DijkstraRouter, Router, SpatialError};

use crate::audit::{RouteAuditor, RouteResult};
use crate::prepare::{GraphProvider, prepare_graph};
use crate::scanner::{EnvironmentScanner, HazardLayers};
use crate::search::diversify;
use crate::weights::WeightCalculator;
use crate::{EngineConfig, EngineError, EngineResult, Preferences};

/// Everything one `find_routes` call returns.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RoutePlan {
    pub primary: RouteResult,
    /// Distinct alternatives, best first.  May be empty.
    pub alternatives: Vec<RouteResult>,
    /// The clipped hazard layers the routes were weighted against.
    pub hazards: HazardLayers,
    /// Trip bounding box.
    pub bbox: BoundingBox,
    /// `false` when pruning fell back to the full base graph.
    pub pruned: bool,
}

impl RoutePlan {
    /// Primary followed by the alternatives.
    pub fn routes(&self) -> impl Iterator<Item = &RouteResult> {
        std::iter::once(&self.primary).chain(&self.alternatives)
    }
}

/// Risk-aware multi-route engine.
///
/// Holds only read-only shared state: base graphs, hazard sources, the crowd
/// table, and scoring models.  Every request builds its own working graph
/// and weight overlay, so one engine can serve concurrent requests from
/// several threads.
///
/// Create via [`EngineBuilder`][crate::EngineBuilder].
pub struct RoutingEngine<R: Router = DijkstraRouter> {
    pub(crate) config: EngineConfig,
    pub(crate) router: R,
    pub(crate) graphs: Arc<dyn GraphProvider>,
    pub(crate) scanner: EnvironmentScanner,
    pub(crate) penalty_model: Option<Arc<dyn PenaltyModel>>,
    pub(crate) traffic_model: Option<Arc<dyn TrafficModel>>,
}

impl<R: Router> RoutingEngine<R> {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scanner(&self) -> &EnvironmentScanner {
        &self.scanner
    }

    /// Routes for a trip starting now, in the host's local time.
    pub fn find_routes(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        mode: VehicleMode,
        preferences: &Preferences,
    ) -> EngineResult<RoutePlan> {
        self.find_routes_at(start, end, mode, preferences, &TripTime::now())
    }

    /// Routes for a trip at `trip`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::GraphUnavailable`] if the mode's graph is missing.
    /// - [`EngineError::EndpointSnapFailure`] if an endpoint cannot be snapped.
    /// - [`EngineError::NoPathFound`] if the endpoints are disconnected.
    ///
    /// Hazard-source and model failures are logged and never returned.
    pub fn find_routes_at(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        mode: VehicleMode,
        preferences: &Preferences,
        trip: &TripTime,
    ) -> EngineResult<RoutePlan> {
        let started = Instant::now();
        let prefs = preferences.clamped();
        info!(%start, %end, %mode, %trip, "route request");

        // ── ① Prepare ─────────────────────────────────────────────────────
        let prepared = prepare_graph(self.graphs.as_ref(), start, end, mode, &self.config)?;
        let network = prepared.graph.network();

        // ── ② Scan ────────────────────────────────────────────────────────
        let hazards = self.scanner.scan(&prepared.bbox);

        // ── ③ Weight ──────────────────────────────────────────────────────
        let overlay = WeightCalculator::new(&self.config, mode, trip)
            .preferences(prefs)
            .penalty_model(self.penalty_model.as_deref())
            .traffic_model(self.traffic_model.as_deref())
            .compute(network, &hazards);

        // ── ④ Search ──────────────────────────────────────────────────────
        let mut weights = overlay.weights().to_vec();
        let routes = diversify(
            &self.router,
            network,
            prepared.origin,
            prepared.destination,
            &mut weights,
            self.config.alternatives,
            self.config.inflation_factor,
        )
        .map_err(|err| match err {
            SpatialError::NoRoute { .. } => EngineError::NoPathFound { from: start, to: end },
            other => {
                warn!(error = %other, "search failed");
                EngineError::NoPathFound { from: start, to: end }
            }
        })?;
        debug!(found = routes.len(), "diversification finished");

        // ── ⑤ Audit ───────────────────────────────────────────────────────
        let auditor = RouteAuditor::new(&self.config, prefs, trip);
        let mut results = routes.iter().enumerate().map(|(i, route)| {
            let name = if i == 0 { "Best Route".to_string() } else { format!("Alternative {i}") };
            auditor.audit(name, network, prepared.origin, route, &overlay, &hazards)
        });
        let primary = results
            .next()
            .ok_or(EngineError::NoPathFound { from: start, to: end })?;
        let alternatives: Vec<RouteResult> = results.collect();

        info!(
            label = %primary.label,
            distance_km = primary.distance_km,
            duration_min = primary.duration_min,
            alternatives = alternatives.len(),
            pruned = prepared.graph.is_pruned(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "route request complete"
        );

        Ok(RoutePlan {
            primary,
            alternatives,
            hazards,
            bbox: prepared.bbox,
            pruned: prepared.graph.is_pruned(),
        })
    }
}
