//! Unit tests for sr-engine.
//!
//! Networks are hand-built around central Saigon; hazard sources and
//! scoring models are in-memory doubles.

#[cfg(test)]
mod fixtures {
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};
    use sr_core::{GeoPoint, NetworkKind, NodeId, TripTime};
    use sr_hazard::{HazardRecord, WeatherCondition};
    use sr_spatial::{DijkstraRouter, RoadClass, RoadNetwork, RoadNetworkBuilder};

    use crate::{EngineBuilder, RoutingEngine};

    pub const A: GeoPoint = GeoPoint { lat: 10.770, lon: 106.690 };
    pub const N: GeoPoint = GeoPoint { lat: 10.774, lon: 106.695 };
    pub const S: GeoPoint = GeoPoint { lat: 10.7655, lon: 106.695 };
    pub const B: GeoPoint = GeoPoint { lat: 10.770, lon: 106.700 };

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 15, 20, 0, 0).unwrap()
    }

    /// 03:00 on a weekday: off-peak traffic, no crowd windows open.
    pub fn night() -> TripTime {
        TripTime::new(3.0, false, now()).unwrap()
    }

    /// Two disjoint two-edge routes from A to B.  The northern one via N is
    /// slightly shorter than the southern one via S.
    pub fn ladder() -> (RoadNetwork, [NodeId; 4]) {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(A);
        let n = b.add_node(N);
        let s = b.add_node(S);
        let e = b.add_node(B);
        b.add_street(a, n, RoadClass::Primary);
        b.add_street(n, e, RoadClass::Primary);
        b.add_street(a, s, RoadClass::Primary);
        b.add_street(s, e, RoadClass::Primary);
        (b.build(), [a, n, s, e])
    }

    /// One straight two-way street about 1 km long.
    pub fn kilometre(class: RoadClass) -> (RoadNetwork, NodeId, NodeId) {
        let mut b = RoadNetworkBuilder::new();
        let from = b.add_node(GeoPoint::new(10.770, 106.700));
        let to = b.add_node(GeoPoint::new(10.779, 106.700));
        b.add_street(from, to, class);
        (b.build(), from, to)
    }

    pub fn engine_on(
        network: RoadNetwork,
        tune: impl FnOnce(EngineBuilder<DijkstraRouter>) -> EngineBuilder<DijkstraRouter>,
    ) -> RoutingEngine {
        tune(EngineBuilder::new(DijkstraRouter).graph(NetworkKind::Drive, Arc::new(network)))
            .build()
            .unwrap()
    }

    pub fn flood(id: &str, center: GeoPoint, radius_km: f64) -> HazardRecord {
        HazardRecord::disaster(id, format!("Flood {id}"), center, radius_km, vec!["floods".into()], None)
    }

    pub fn zone(name: &str, condition: WeatherCondition, center: GeoPoint, radius_km: f64) -> HazardRecord {
        HazardRecord::weather(name, center, radius_km, condition, 3.0)
    }
}

#[cfg(test)]
mod doubles {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use sr_core::{BoundingBox, GeoPoint};
    use sr_hazard::{DisasterSource, HazardError, HazardRecord, HazardResult, WeatherSource};

    /// Answers correctly, but only after `delay`.
    pub struct SlowWeather {
        pub delay: Duration,
        pub records: Vec<HazardRecord>,
    }

    impl WeatherSource for SlowWeather {
        fn fetch(&self, _bbox: &BoundingBox) -> HazardResult<Vec<HazardRecord>> {
            thread::sleep(self.delay);
            Ok(self.records.clone())
        }
    }

    pub struct BrokenDisasters;

    impl DisasterSource for BrokenDisasters {
        fn fetch(&self, _center: GeoPoint, _radius_km: f64) -> HazardResult<Vec<HazardRecord>> {
            Err(HazardError::Unavailable { provider: "eonet".into(), message: "503".into() })
        }
    }

    /// Counts how often it is asked.
    #[derive(Default)]
    pub struct CountingDisasters {
        pub calls: AtomicUsize,
        pub records: Vec<HazardRecord>,
    }

    impl CountingDisasters {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DisasterSource for CountingDisasters {
        fn fetch(&self, _center: GeoPoint, _radius_km: f64) -> HazardResult<Vec<HazardRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.records.clone())
        }
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod config {
    use sr_spatial::DijkstraRouter;

    use crate::{EngineBuilder, EngineConfig, EngineError, Preferences};

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert_eq!(EngineConfig::default().source_timeout().as_millis(), 5_000);
    }

    #[test]
    fn rejects_zero_alternatives() {
        let cfg = EngineConfig { alternatives: 0, ..EngineConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_buffer() {
        let cfg = EngineConfig { min_buffer_deg: 0.05, max_buffer_deg: 0.01, ..EngineConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn builder_surfaces_config_errors() {
        let cfg = EngineConfig { inflation_factor: 0.5, ..EngineConfig::default() };
        let err = EngineBuilder::new(DijkstraRouter).config(cfg).build().err();
        assert!(matches!(err, Some(EngineError::Config(_))));
    }

    #[test]
    fn preferences_clamp_into_range() {
        let p = Preferences::new(5.0, -1.0, 0.5, f64::NAN);
        assert_eq!(p, Preferences { disaster: 2.0, weather: 0.0, crowd: 0.5, traffic: 1.0 });
    }

    #[test]
    fn preferences_from_map() {
        let p = Preferences::from_map([("disaster", 0.0), ("crowd", 3.0), ("noise", 2.0)]);
        assert_eq!(p.disaster, 0.0);
        assert_eq!(p.crowd, 2.0);
        assert_eq!(p.weather, 1.0);
        assert_eq!(p.traffic, 1.0);
    }
}

// ── Graph preparation ─────────────────────────────────────────────────────────

#[cfg(test)]
mod prepare {
    use std::sync::Arc;

    use sr_core::{GeoPoint, NetworkKind, VehicleMode};
    use sr_spatial::{RoadClass, RoadNetworkBuilder};

    use crate::prepare::dynamic_buffer_deg;
    use crate::{EngineConfig, EngineError, StaticGraphs, prepare_graph, trip_bbox};

    use super::fixtures::{A, B, ladder};

    #[test]
    fn buffer_is_clamped_both_ways() {
        let p = GeoPoint::new(10.0, 106.0);
        assert_eq!(dynamic_buffer_deg(p, GeoPoint::new(10.001, 106.0), 0.003, 0.03), 0.003);
        assert_eq!(dynamic_buffer_deg(p, GeoPoint::new(10.5, 106.0), 0.003, 0.03), 0.03);
        assert!((dynamic_buffer_deg(p, GeoPoint::new(10.0, 106.02), 0.003, 0.03) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn trip_box_spans_both_endpoints() {
        let bbox = trip_bbox(A, B, &EngineConfig::default());
        assert!(bbox.contains_strict(A));
        assert!(bbox.contains_strict(B));
        // lon span 0.01 → buffer 0.005
        assert!((bbox.west - (A.lon - 0.005)).abs() < 1e-12);
    }

    #[test]
    fn prunes_around_the_trip() {
        let (net, _) = ladder();
        let graphs = StaticGraphs::new().with(NetworkKind::Drive, Arc::new(net));
        let prepared =
            prepare_graph(&graphs, A, B, VehicleMode::Car, &EngineConfig::default()).unwrap();
        assert!(prepared.graph.is_pruned());
        assert_eq!(prepared.graph.network().node_count(), 4);
        assert_ne!(prepared.origin, prepared.destination);
        assert_eq!(prepared.graph.network().node_pos[prepared.origin.index()], A);
    }

    #[test]
    fn falls_back_to_full_graph_when_an_endpoint_is_clipped() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(10.770, 106.700));
        let e = b.add_node(GeoPoint::new(10.780, 106.700));
        let far = b.add_node(GeoPoint::new(10.900, 106.700));
        b.add_street(a, e, RoadClass::Primary);
        b.add_street(a, far, RoadClass::Primary);
        let graphs = StaticGraphs::new().with(NetworkKind::Drive, Arc::new(b.build()));

        // Snaps onto `far`, which lies outside the trip box.
        let start = GeoPoint::new(10.850, 106.700);
        let prepared =
            prepare_graph(&graphs, start, GeoPoint::new(10.780, 106.700), VehicleMode::Car, &EngineConfig::default())
                .unwrap();
        assert!(!prepared.graph.is_pruned());
        assert_eq!(prepared.origin, far);
        assert_eq!(prepared.destination, e);
    }

    #[test]
    fn missing_graph_is_unavailable() {
        let (net, _) = ladder();
        let graphs = StaticGraphs::new().with(NetworkKind::Drive, Arc::new(net));
        let err = prepare_graph(&graphs, A, B, VehicleMode::Walking, &EngineConfig::default()).err();
        assert!(matches!(err, Some(EngineError::GraphUnavailable { kind: NetworkKind::Walk })));
    }

    #[test]
    fn invalid_coordinate_fails_to_snap() {
        let (net, _) = ladder();
        let graphs = StaticGraphs::new().with(NetworkKind::Drive, Arc::new(net));
        let bad = GeoPoint::new(f64::NAN, 106.69);
        let err = prepare_graph(&graphs, A, bad, VehicleMode::Car, &EngineConfig::default()).err();
        assert!(matches!(err, Some(EngineError::EndpointSnapFailure { endpoint: "end", .. })));
    }
}

// ── Environment scanner ───────────────────────────────────────────────────────

#[cfg(test)]
mod scanner {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::thread;
    use std::time::{Duration, Instant};

    use sr_core::{BoundingBox, GeoPoint};
    use sr_hazard::{
        CrowdTable, HazardRecord, HazardResult, VenueType, WeatherCondition, WeatherSource,
    };

    use crate::EnvironmentScanner;

    use super::doubles::{BrokenDisasters, CountingDisasters, SlowWeather};
    use super::fixtures::{A, flood, zone};

    fn trip_box() -> BoundingBox {
        BoundingBox::new(10.76, 106.68, 10.78, 106.71)
    }

    fn scanner() -> EnvironmentScanner {
        EnvironmentScanner::new(Duration::from_millis(200), 200.0)
    }

    #[test]
    fn no_sources_yield_empty_layers() {
        let layers = scanner().scan(&trip_box());
        assert!(layers.is_empty());
        assert_eq!(layers.len(), 0);
    }

    #[test]
    fn scanning_twice_is_idempotent() {
        let mut s = scanner();
        s.disaster_snapshot = Arc::new(vec![flood("in", A, 1.0), flood("out", GeoPoint::new(11.5, 107.5), 1.0)]);
        s.crowds = Arc::new(CrowdTable::new(vec![HazardRecord::crowd(
            "Ben Thanh",
            GeoPoint::new(10.772, 106.698),
            0.3,
            VenueType::Market,
            0.9,
        )]));
        let first = s.scan(&trip_box());
        let second = s.scan(&trip_box());
        assert_eq!(first, second);
        assert_eq!(first.disasters.len(), 1);
        assert_eq!(first.disasters[0].id, "in");
        assert_eq!(first.crowds.len(), 1);
    }

    #[test]
    fn snapshot_is_preferred_over_live_source() {
        let live = Arc::new(CountingDisasters::default());
        let mut s = scanner();
        s.disaster_snapshot = Arc::new(vec![flood("snap", A, 1.0)]);
        s.disaster_source = Some(live.clone());
        let layers = s.scan(&trip_box());
        assert_eq!(layers.disasters[0].id, "snap");
        assert_eq!(live.calls(), 0);
    }

    #[test]
    fn live_source_fills_an_empty_snapshot_and_is_clipped() {
        let live = Arc::new(CountingDisasters {
            records: vec![flood("near", A, 1.0), flood("far", GeoPoint::new(11.5, 107.5), 1.0)],
            ..CountingDisasters::default()
        });
        let mut s = scanner();
        s.disaster_source = Some(live.clone());
        let layers = s.scan(&trip_box());
        assert_eq!(live.calls(), 1);
        assert_eq!(layers.disasters.len(), 1);
        assert_eq!(layers.disasters[0].id, "near");
    }

    #[test]
    fn failing_source_becomes_empty_layer() {
        let mut s = scanner();
        s.disaster_source = Some(Arc::new(BrokenDisasters));
        assert!(s.scan(&trip_box()).disasters.is_empty());
    }

    #[test]
    fn slow_source_times_out() {
        let mut s = EnvironmentScanner::new(Duration::from_millis(50), 200.0);
        s.weather_source = Some(Arc::new(SlowWeather {
            delay: Duration::from_secs(2),
            records: vec![zone("storm", WeatherCondition::Thunderstorm, A, 5.0)],
        }));
        let started = Instant::now();
        let layers = s.scan(&trip_box());
        assert!(layers.weather.is_empty());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn timed_out_worker_finishes_in_background() {
        struct Lingering(Arc<AtomicUsize>);

        impl WeatherSource for Lingering {
            fn fetch(&self, _bbox: &BoundingBox) -> HazardResult<Vec<HazardRecord>> {
                thread::sleep(Duration::from_millis(150));
                self.0.fetch_add(1, AtomicOrdering::SeqCst);
                Ok(Vec::new())
            }
        }

        let finished = Arc::new(AtomicUsize::new(0));
        let mut s = EnvironmentScanner::new(Duration::from_millis(20), 200.0);
        s.weather_source = Some(Arc::new(Lingering(Arc::clone(&finished))));

        assert!(s.scan(&trip_box()).weather.is_empty());
        assert_eq!(finished.load(AtomicOrdering::SeqCst), 0);
        thread::sleep(Duration::from_millis(800));
        assert_eq!(finished.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn prompt_source_is_kept() {
        let mut s = scanner();
        s.weather_source = Some(Arc::new(SlowWeather {
            delay: Duration::ZERO,
            records: vec![zone("storm", WeatherCondition::Thunderstorm, A, 5.0)],
        }));
        assert_eq!(s.scan(&trip_box()).weather.len(), 1);
    }
}

// ── Edge weights ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod weights {
    use sr_core::{EdgeId, GeoPoint, TripTime, VehicleMode};
    use sr_hazard::scoring::fallback_penalty;
    use sr_hazard::{HazardRecord, ModelError, ModelResult, PenaltyModel, VenueType, WeatherCondition};
    use sr_spatial::RoadClass;

    use crate::{EngineConfig, HazardLayers, Preferences, WeightCalculator};

    use super::fixtures::{flood, kilometre, night, now, zone};

    fn midpoint() -> GeoPoint {
        GeoPoint::new(10.7745, 106.700)
    }

    #[test]
    fn hazard_on_the_segment_registers() {
        let (net, ..) = kilometre(RoadClass::Primary);
        let layers = HazardLayers { disasters: vec![flood("mid", midpoint(), 5.0)], ..Default::default() };
        let cfg = EngineConfig::default();
        let trip = night();
        let w = WeightCalculator::new(&cfg, VehicleMode::Motorbike, &trip).compute(&net, &layers);
        for ann in w.annotations() {
            assert_eq!(ann.raw.disaster, 1.0);
            assert!(ann.flags.disaster);
            assert_eq!(ann.penalty, fallback_penalty(1.0, 0.0, 0.0));
        }
    }

    #[test]
    fn hazard_out_of_reach_scores_zero() {
        let (net, ..) = kilometre(RoadClass::Primary);
        let layers = HazardLayers {
            disasters: vec![flood("east", GeoPoint::new(10.7745, 106.730), 1.0)],
            ..Default::default()
        };
        let cfg = EngineConfig::default();
        let trip = night();
        let w = WeightCalculator::new(&cfg, VehicleMode::Motorbike, &trip).compute(&net, &layers);
        assert!(w.annotations().iter().all(|a| a.raw.is_zero() && a.penalty == 0.0));
    }

    #[test]
    fn disaster_preference_changes_weights() {
        let (net, ..) = kilometre(RoadClass::Primary);
        let layers = HazardLayers { disasters: vec![flood("mid", midpoint(), 5.0)], ..Default::default() };
        let cfg = EngineConfig::default();
        let trip = night();
        let calc = |disaster| {
            WeightCalculator::new(&cfg, VehicleMode::Motorbike, &trip)
                .preferences(Preferences { disaster, ..Preferences::default() })
                .compute(&net, &layers)
        };
        let cautious = calc(2.0);
        let ignoring = calc(0.0);
        let e = EdgeId(0);
        assert_eq!(cautious.annotation(e).effective.disaster, 1.0);
        assert_eq!(ignoring.annotation(e).effective.disaster, 0.0);
        assert_eq!(ignoring.annotation(e).raw.disaster, 1.0);
        assert!(cautious.weights()[0] > ignoring.weights()[0]);
    }

    #[test]
    fn failing_penalty_model_falls_back_per_batch() {
        let (net, ..) = kilometre(RoadClass::Primary);
        let layers = HazardLayers { disasters: vec![flood("mid", midpoint(), 5.0)], ..Default::default() };
        let cfg = EngineConfig::default();
        let trip = night();
        let broken = |_: &[[f64; 3]]| -> ModelResult<Vec<f64>> { Err(ModelError::Prediction("boom".into())) };
        let w = WeightCalculator::new(&cfg, VehicleMode::Motorbike, &trip)
            .penalty_model(Some(&broken as &dyn PenaltyModel))
            .compute(&net, &layers);
        assert_eq!(w.penalty_fallbacks, net.edge_count());
        assert!(w.annotations().iter().all(|a| a.penalty == fallback_penalty(1.0, 0.0, 0.0)));
    }

    #[test]
    fn short_model_answer_is_rejected() {
        let (net, ..) = kilometre(RoadClass::Primary);
        let cfg = EngineConfig::default();
        let trip = night();
        let short = |_: &[[f64; 3]]| -> ModelResult<Vec<f64>> { Ok(vec![7.0]) };
        let w = WeightCalculator::new(&cfg, VehicleMode::Motorbike, &trip)
            .penalty_model(Some(&short as &dyn PenaltyModel))
            .compute(&net, &HazardLayers::default());
        assert_eq!(w.penalty_fallbacks, 2);
        assert!(w.annotations().iter().all(|a| a.penalty == 0.0));
    }

    #[test]
    fn healthy_model_is_used_and_nan_rows_fall_back() {
        let (net, ..) = kilometre(RoadClass::Primary);
        let cfg = EngineConfig::default();
        let trip = night();
        let model = |rows: &[[f64; 3]]| -> ModelResult<Vec<f64>> {
            Ok(rows.iter().enumerate().map(|(i, _)| if i == 0 { 0.5 } else { f64::NAN }).collect())
        };
        let w = WeightCalculator::new(&cfg, VehicleMode::Motorbike, &trip)
            .penalty_model(Some(&model as &dyn PenaltyModel))
            .compute(&net, &HazardLayers::default());
        assert_eq!(w.annotation(EdgeId(0)).penalty, 0.5);
        assert_eq!(w.annotation(EdgeId(1)).penalty, 0.0);
        assert_eq!(w.penalty_fallbacks, 1);
        let a = w.annotation(EdgeId(0));
        assert!((a.weight - a.travel_secs * 1.5).abs() < 1e-9);
    }

    #[test]
    fn large_vehicles_are_penalised_on_small_roads() {
        let (net, ..) = kilometre(RoadClass::Residential);
        let cfg = EngineConfig::default();
        let trip = night();
        let penalty = |mode| {
            WeightCalculator::new(&cfg, mode, &trip)
                .compute(&net, &HazardLayers::default())
                .annotation(EdgeId(0))
                .penalty
        };
        assert_eq!(penalty(VehicleMode::Bus), fallback_penalty(0.0, 0.0, 50.0));
        assert_eq!(penalty(VehicleMode::Car), fallback_penalty(0.0, 0.0, 5.0));
        assert_eq!(penalty(VehicleMode::Truck), fallback_penalty(0.0, 0.0, 5.0));
        assert_eq!(penalty(VehicleMode::Motorbike), 0.0);
    }

    #[test]
    fn restriction_does_not_touch_reported_crowd_score() {
        let (net, ..) = kilometre(RoadClass::Service);
        let cfg = EngineConfig::default();
        let trip = night();
        let w = WeightCalculator::new(&cfg, VehicleMode::Bus, &trip).compute(&net, &HazardLayers::default());
        let a = w.annotation(EdgeId(0));
        assert_eq!(a.effective.crowd, 0.0);
        assert!(!a.flags.crowd);
    }

    #[test]
    fn travel_time_uses_raw_weather() {
        let (net, ..) = kilometre(RoadClass::Primary);
        let storm = HazardLayers {
            weather: vec![zone("storm", WeatherCondition::Thunderstorm, midpoint(), 10.0)],
            ..Default::default()
        };
        let cfg = EngineConfig::default();
        let trip = night();
        let secs = |layers: &HazardLayers| {
            WeightCalculator::new(&cfg, VehicleMode::Motorbike, &trip)
                .preferences(Preferences { weather: 0.0, ..Preferences::default() })
                .compute(&net, layers)
                .annotation(EdgeId(0))
                .travel_secs
        };
        assert!(secs(&storm) > secs(&HazardLayers::default()));
    }

    #[test]
    fn traffic_preference_only_moves_the_weight() {
        let (net, ..) = kilometre(RoadClass::Primary);
        let cfg = EngineConfig::default();
        let rush = TripTime::new(17.0, false, now()).unwrap();
        let run = |traffic| {
            *WeightCalculator::new(&cfg, VehicleMode::Motorbike, &rush)
                .preferences(Preferences { traffic, ..Preferences::default() })
                .compute(&net, &HazardLayers::default())
                .annotation(EdgeId(0))
        };
        let calm = run(0.0);
        let anxious = run(2.0);
        assert_eq!(calm.travel_secs, anxious.travel_secs);
        assert_eq!(calm.traffic, 1.0);
        assert!(anxious.weight > calm.weight);
    }

    #[test]
    fn busy_hotspot_flags_the_edge() {
        let (net, ..) = kilometre(RoadClass::Primary);
        let layers = HazardLayers {
            crowds: vec![HazardRecord::crowd("Cho", midpoint(), 1.0, VenueType::Market, 1.0)],
            ..Default::default()
        };
        let cfg = EngineConfig::default();
        let morning = TripTime::new(8.0, false, now()).unwrap();
        let w = WeightCalculator::new(&cfg, VehicleMode::Walking, &morning).compute(&net, &layers);
        let a = w.annotation(EdgeId(0));
        assert_eq!(a.raw.crowd, 1.0);
        assert!(a.flags.crowd);
        assert_eq!(a.penalty, fallback_penalty(0.0, 0.0, 1.0));
    }

    #[test]
    fn weights_are_non_negative_and_finite() {
        let (net, ..) = kilometre(RoadClass::Residential);
        let layers = HazardLayers {
            disasters: vec![flood("mid", midpoint(), 5.0)],
            weather: vec![zone("storm", WeatherCondition::Thunderstorm, midpoint(), 3.0)],
            ..Default::default()
        };
        let cfg = EngineConfig::default();
        let trip = night();
        for mode in [VehicleMode::Bus, VehicleMode::Walking, VehicleMode::Bicycle] {
            let w = WeightCalculator::new(&cfg, mode, &trip).compute(&net, &layers);
            assert_eq!(w.len(), net.edge_count());
            assert!(w.weights().iter().all(|x| x.is_finite() && *x >= 0.0));
        }
    }
}

// ── Diversification ───────────────────────────────────────────────────────────

#[cfg(test)]
mod search {
    use sr_core::GeoPoint;
    use sr_spatial::{DijkstraRouter, EdgeSpec, RoadClass, RoadNetworkBuilder, SpatialError};

    use crate::diversify;

    use super::fixtures::{kilometre, ladder};

    #[test]
    fn two_attempts_give_two_distinct_paths() {
        let (net, [a, n, s, e]) = ladder();
        let mut w = net.edge_length_m.clone();
        let routes = diversify(&DijkstraRouter, &net, a, e, &mut w, 2, 2.0).unwrap();
        assert_eq!(routes.len(), 2);
        assert_ne!(routes[0].edges, routes[1].edges);
        assert_eq!(routes[0].nodes(&net), vec![a, n, e]);
        assert_eq!(routes[1].nodes(&net), vec![a, s, e]);
    }

    #[test]
    fn long_detour_found_after_repeated_inflation() {
        // Direct street of 1 km; the only other way round is 3 km.
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(10.770, 106.700));
        let m = b.add_node(GeoPoint::new(10.775, 106.710));
        let e = b.add_node(GeoPoint::new(10.779, 106.700));
        b.add_road(a, e, EdgeSpec::new(1_000.0, RoadClass::Primary));
        b.add_road(a, m, EdgeSpec::new(1_500.0, RoadClass::Primary));
        b.add_road(m, e, EdgeSpec::new(1_500.0, RoadClass::Primary));
        let net = b.build();

        let mut w = net.edge_length_m.clone();
        let routes = diversify(&DijkstraRouter, &net, a, e, &mut w, 2, 2.0).unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].nodes(&net), vec![a, e]);
        assert_eq!(routes[1].nodes(&net), vec![a, m, e]);
    }

    #[test]
    fn found_paths_are_inflated() {
        let (net, [a, _, _, e]) = ladder();
        let base = net.edge_length_m.clone();
        let mut w = base.clone();
        let routes = diversify(&DijkstraRouter, &net, a, e, &mut w, 1, 3.0).unwrap();
        for edge in &routes[0].edges {
            assert_eq!(w[edge.index()], base[edge.index()] * 3.0);
        }
    }

    #[test]
    fn single_corridor_yields_one_route() {
        let (net, from, to) = kilometre(RoadClass::Primary);
        let mut w = net.edge_length_m.clone();
        let routes = diversify(&DijkstraRouter, &net, from, to, &mut w, 3, 2.0).unwrap();
        assert_eq!(routes.len(), 1);
    }

    #[test]
    fn first_failure_is_reported() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(10.77, 106.70));
        let c = b.add_node(GeoPoint::new(10.78, 106.70));
        let net = b.build();
        let mut w = Vec::new();
        let err = diversify(&DijkstraRouter, &net, a, c, &mut w, 3, 2.0).err();
        assert!(matches!(err, Some(SpatialError::NoRoute { .. })));
    }

    #[test]
    fn same_node_gives_trivial_route() {
        let (net, [a, ..]) = ladder();
        let mut w = net.edge_length_m.clone();
        let routes = diversify(&DijkstraRouter, &net, a, a, &mut w, 3, 2.0).unwrap();
        assert_eq!(routes.len(), 1);
        assert!(routes[0].is_trivial());
    }
}

// ── End-to-end requests and audit ─────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use std::sync::Arc;
    use std::time::Duration;

    use sr_core::{GeoPoint, VehicleMode};
    use sr_hazard::{
        HazardRecord, ModelError, ModelResult, StaticDisasters, StaticWeather, WeatherCondition,
    };
    use sr_spatial::{RoadClass, RoadNetworkBuilder};

    use crate::{EngineConfig, EngineError, Level, Preferences, SafetyLabel};

    use super::doubles::{BrokenDisasters, SlowWeather};
    use super::fixtures::{A, B, N, engine_on, flood, ladder, night, now, zone};

    #[test]
    fn quiet_network_is_safe() {
        let (net, _) = ladder();
        let engine = engine_on(net, |b| b);
        let plan = engine
            .find_routes_at(A, B, VehicleMode::Motorbike, &Preferences::default(), &night())
            .unwrap();
        let best = &plan.primary;
        assert_eq!(best.name, "Best Route");
        assert_eq!(best.label, SafetyLabel::Safe);
        assert_eq!(best.color, "green");
        assert!(best.disasters_hit.is_empty());
        assert!(best.weather_hit.is_empty());
        assert_eq!(best.crowded_edges, 0);
        assert_eq!(best.max_risk, 0.0);
        assert_eq!(best.traffic_level, Level::Low);
        assert!(plan.pruned);
        assert_eq!(best.geometry.first(), Some(&A));
        assert_eq!(best.geometry.last(), Some(&B));
        assert_eq!(best.geometry[1], N);
    }

    #[test]
    fn reported_totals_match_edge_sums() {
        let (net, _) = ladder();
        let expected_m = A.distance_km(N) * 1_000.0 + N.distance_km(B) * 1_000.0;
        let engine = engine_on(net, |b| b);
        let plan = engine
            .find_routes_at(A, B, VehicleMode::Motorbike, &Preferences::default(), &night())
            .unwrap();
        let best = &plan.primary;
        assert!((best.distance_km * 1_000.0 - expected_m).abs() < 1e-6);
        assert!((best.duration_min - best.travel_secs * 1.15 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn alternatives_are_named_and_distinct() {
        let (net, _) = ladder();
        let engine = engine_on(net, |b| b);
        let plan = engine
            .find_routes_at(A, B, VehicleMode::Motorbike, &Preferences::default(), &night())
            .unwrap();
        assert_eq!(plan.alternatives.len(), 1);
        assert_eq!(plan.alternatives[0].name, "Alternative 1");
        assert_ne!(plan.alternatives[0].geometry, plan.primary.geometry);
        assert_eq!(plan.routes().count(), 2);
    }

    #[test]
    fn disaster_hit_is_severe() {
        let (net, _) = ladder();
        let engine = engine_on(net, |b| b.disaster_snapshot(vec![flood("f1", A, 5.0)]));
        let plan = engine
            .find_routes_at(A, B, VehicleMode::Motorbike, &Preferences::default(), &night())
            .unwrap();
        assert_eq!(plan.primary.label, SafetyLabel::Severe);
        assert_eq!(plan.primary.color, "red");
        assert!(plan.primary.disasters_hit.contains("Flood f1"));
        assert_eq!(plan.hazards.disasters.len(), 1);
    }

    #[test]
    fn ignored_disaster_is_not_severe() {
        let (net, _) = ladder();
        let engine = engine_on(net, |b| b.disaster_snapshot(vec![flood("f1", A, 5.0)]));
        let prefs = Preferences::from_map([("disaster", 0.0)]);
        let plan = engine.find_routes_at(A, B, VehicleMode::Motorbike, &prefs, &night()).unwrap();
        assert_ne!(plan.primary.label, SafetyLabel::Severe);
        assert_eq!(plan.primary.label, SafetyLabel::Caution);
        assert_eq!(plan.primary.max_risk, 0.0);
        assert!(plan.primary.disasters_hit.contains("Flood f1"));
    }

    #[test]
    fn route_steers_around_a_small_disaster() {
        let (net, _) = ladder();
        let engine = engine_on(net, |b| b.disaster_snapshot(vec![flood("north", N, 0.2)]));
        let plan = engine
            .find_routes_at(A, B, VehicleMode::Motorbike, &Preferences::default(), &night())
            .unwrap();
        assert_eq!(plan.primary.label, SafetyLabel::Safe);
        assert!(!plan.primary.geometry.contains(&N));
        assert!(plan.primary.avoidance.contains("avoided 1 disaster site"));
    }

    #[test]
    fn expired_disaster_is_not_counted_as_avoided() {
        let (net, _) = ladder();
        let stale = HazardRecord::disaster(
            "old",
            "Flood old",
            N,
            0.2,
            vec!["floods".into()],
            Some(now() - chrono::Duration::days(10)),
        );
        let engine = engine_on(net, |b| b.disaster_snapshot(vec![stale]));
        let plan = engine
            .find_routes_at(A, B, VehicleMode::Motorbike, &Preferences::default(), &night())
            .unwrap();
        assert!(plan.routes().all(|r| r.disasters_hit.is_empty()));
        assert!(!plan.primary.avoidance.contains("disaster site"), "{}", plan.primary.avoidance);
    }

    #[test]
    fn thunderstorm_is_dangerous() {
        let (net, _) = ladder();
        let storm = zone("Cell 7", WeatherCondition::Thunderstorm, A, 10.0);
        let engine = engine_on(net, |b| b.weather_source(Arc::new(StaticWeather::new(vec![storm]))));
        let plan = engine
            .find_routes_at(A, B, VehicleMode::Motorbike, &Preferences::default(), &night())
            .unwrap();
        assert_eq!(plan.primary.label, SafetyLabel::Dangerous);
        assert!(plan.primary.max_risk > 20.0);
        assert!(plan.primary.weather_hit.contains("Cell 7"));
    }

    #[test]
    fn drizzle_needs_caution() {
        let (net, _) = ladder();
        let drizzle = zone("Drizzle band", WeatherCondition::Drizzle, A, 10.0);
        let engine = engine_on(net, |b| b.weather_source(Arc::new(StaticWeather::new(vec![drizzle]))));
        let plan = engine
            .find_routes_at(A, B, VehicleMode::Motorbike, &Preferences::default(), &night())
            .unwrap();
        assert_eq!(plan.primary.label, SafetyLabel::Caution);
        assert_eq!(plan.primary.color, "yellow");
        assert!(plan.primary.rationale.contains("Drizzle band"));
    }

    #[test]
    fn failing_sources_still_route() {
        let (net, _) = ladder();
        let cfg = EngineConfig { source_timeout_ms: 50, ..EngineConfig::default() };
        let storm = zone("late", WeatherCondition::Thunderstorm, A, 10.0);
        let engine = engine_on(net, |b| {
            b.config(cfg)
                .disaster_source(Arc::new(BrokenDisasters))
                .weather_source(Arc::new(SlowWeather { delay: Duration::from_secs(2), records: vec![storm] }))
        });
        let plan = engine
            .find_routes_at(A, B, VehicleMode::Motorbike, &Preferences::default(), &night())
            .unwrap();
        assert!(plan.hazards.is_empty());
        assert_eq!(plan.primary.label, SafetyLabel::Safe);
        assert_eq!(plan.primary.avg_risk, 0.0);
        assert_eq!(plan.primary.max_risk, 0.0);
        assert!(!plan.primary.has_hazard_hits());
    }

    #[test]
    fn failing_models_still_route() {
        let (net, _) = ladder();
        let engine = engine_on(net, |b| {
            b.disaster_source(Arc::new(StaticDisasters::new(vec![flood("f1", A, 5.0)])))
                .penalty_model(Arc::new(|_: &[[f64; 3]]| -> ModelResult<Vec<f64>> {
                    Err(ModelError::Unavailable)
                }))
                .traffic_model(Arc::new(|_: [f64; 3]| -> ModelResult<f64> { Err(ModelError::Unavailable) }))
        });
        let plan = engine
            .find_routes_at(A, B, VehicleMode::Motorbike, &Preferences::default(), &night())
            .unwrap();
        assert_eq!(plan.primary.label, SafetyLabel::Severe);
        assert!(plan.primary.max_risk >= 1_000.0);
    }

    #[test]
    fn same_start_and_end() {
        let (net, _) = ladder();
        let engine = engine_on(net, |b| b);
        let plan = engine
            .find_routes_at(A, A, VehicleMode::Motorbike, &Preferences::default(), &night())
            .unwrap();
        assert_eq!(plan.primary.geometry, vec![A]);
        assert_eq!(plan.primary.distance_km, 0.0);
        assert!(plan.alternatives.is_empty());
    }

    #[test]
    fn disconnected_endpoints_have_no_path() {
        let mut b = RoadNetworkBuilder::new();
        let west = b.add_node(A);
        let mid = b.add_node(N);
        let east = b.add_node(B);
        let island = b.add_node(GeoPoint::new(10.772, 106.706));
        b.add_street(west, mid, RoadClass::Primary);
        b.add_street(east, island, RoadClass::Primary);
        let engine = engine_on(b.build(), |b| b);
        let err = engine
            .find_routes_at(A, B, VehicleMode::Motorbike, &Preferences::default(), &night())
            .err();
        assert!(matches!(err, Some(EngineError::NoPathFound { .. })));
    }

    #[test]
    fn walking_without_walk_graph_is_unavailable() {
        let (net, _) = ladder();
        let engine = engine_on(net, |b| b);
        let err = engine
            .find_routes_at(A, B, VehicleMode::Walking, &Preferences::default(), &night())
            .err();
        assert!(matches!(err, Some(EngineError::GraphUnavailable { .. })));
    }
}
