//! Fluent builder for constructing a [`RoutingEngine`].

use std::sync::Arc;

use sr_core::NetworkKind;
use sr_hazard::{CrowdTable, DisasterSource, HazardRecord, PenaltyModel, TrafficModel, WeatherSource};
use sr_spatial::{RoadNetwork, Router};

use crate::prepare::{GraphProvider, StaticGraphs};
use crate::scanner::EnvironmentScanner;
use crate::{EngineConfig, EngineError, EngineResult, RoutingEngine};

/// Fluent builder for [`RoutingEngine<R>`].
///
/// # Required inputs
///
/// - `R: Router` — the shortest-path algorithm (e.g. [`sr_spatial::DijkstraRouter`])
///
/// # Optional inputs (have defaults)
///
/// | Method                   | Default                                   |
/// |--------------------------|-------------------------------------------|
/// | `.config(c)`             | `EngineConfig::default()`                 |
/// | `.graph(kind, g)`        | no graph: requests fail `GraphUnavailable`|
/// | `.graph_provider(p)`     | replaces any graphs set with `.graph`     |
/// | `.disaster_snapshot(v)`  | empty snapshot                            |
/// | `.disaster_source(s)`    | none                                      |
/// | `.weather_source(s)`     | none: no weather layer                    |
/// | `.crowd_table(t)`        | empty table                               |
/// | `.penalty_model(m)`      | linear fallback formula                   |
/// | `.traffic_model(m)`      | time-of-day table                         |
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new(DijkstraRouter)
///     .graph(NetworkKind::Drive, Arc::new(network))
///     .weather_source(Arc::new(StaticWeather::new(zones)))
///     .crowd_table(CrowdTable::new(hotspots))
///     .build()?;
/// let plan = engine.find_routes(start, end, VehicleMode::Motorbike, &Preferences::default())?;
/// ```
pub struct EngineBuilder<R: Router> {
    config:            EngineConfig,
    router:            R,
    graphs:            StaticGraphs,
    provider:          Option<Arc<dyn GraphProvider>>,
    disaster_snapshot: Vec<HazardRecord>,
    disaster_source:   Option<Arc<dyn DisasterSource>>,
    weather_source:    Option<Arc<dyn WeatherSource>>,
    crowds:            Option<Arc<CrowdTable>>,
    penalty_model:     Option<Arc<dyn PenaltyModel>>,
    traffic_model:     Option<Arc<dyn TrafficModel>>,
}

impl<R: Router> EngineBuilder<R> {
    pub fn new(router: R) -> Self {
        Self {
            config:            EngineConfig::default(),
            router,
            graphs:            StaticGraphs::new(),
            provider:          None,
            disaster_snapshot: Vec::new(),
            disaster_source:   None,
            weather_source:    None,
            crowds:            None,
            penalty_model:     None,
            traffic_model:     None,
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register the base graph for one network kind.
    pub fn graph(mut self, kind: NetworkKind, network: Arc<RoadNetwork>) -> Self {
        self.graphs = self.graphs.with(kind, network);
        self
    }

    /// Use a custom graph provider instead of the graphs given to `.graph`.
    pub fn graph_provider(mut self, provider: Arc<dyn GraphProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Materialized disaster records, preferred over the live source.
    pub fn disaster_snapshot(mut self, records: Vec<HazardRecord>) -> Self {
        self.disaster_snapshot = records;
        self
    }

    /// Queried only when the snapshot has nothing inside the trip box.
    pub fn disaster_source(mut self, source: Arc<dyn DisasterSource>) -> Self {
        self.disaster_source = Some(source);
        self
    }

    pub fn weather_source(mut self, source: Arc<dyn WeatherSource>) -> Self {
        self.weather_source = Some(source);
        self
    }

    /// Crowd hotspots loaded once and shared by every request.
    pub fn crowd_table(mut self, table: impl Into<Arc<CrowdTable>>) -> Self {
        self.crowds = Some(table.into());
        self
    }

    pub fn penalty_model(mut self, model: Arc<dyn PenaltyModel>) -> Self {
        self.penalty_model = Some(model);
        self
    }

    pub fn traffic_model(mut self, model: Arc<dyn TrafficModel>) -> Self {
        self.traffic_model = Some(model);
        self
    }

    /// Validate the configuration and assemble the engine.
    pub fn build(self) -> EngineResult<RoutingEngine<R>> {
        self.config.validate().map_err(EngineError::Config)?;

        let graphs: Arc<dyn GraphProvider> = match self.provider {
            Some(p) => p,
            None    => Arc::new(self.graphs),
        };

        let mut scanner = EnvironmentScanner::new(
            self.config.source_timeout(),
            self.config.disaster_search_radius_km,
        );
        scanner.disaster_snapshot = Arc::new(self.disaster_snapshot);
        scanner.disaster_source = self.disaster_source;
        scanner.weather_source = self.weather_source;
        if let Some(crowds) = self.crowds {
            scanner.crowds = crowds;
        }

        Ok(RoutingEngine {
            config:        self.config,
            router:        self.router,
            graphs,
            scanner,
            penalty_model: self.penalty_model,
            traffic_model: self.traffic_model,
        })
    }
}
