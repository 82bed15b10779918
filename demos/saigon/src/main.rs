//! saigon — end-to-end demo of the saferoute engine.
//!
//! Routes a motorbike and a bus across a synthetic central Saigon network
//! while a flood sits on the back lanes, a thunderstorm cell drifts over the
//! river, and Ben Thanh market is at its morning peak.  Each plan is printed
//! as JSON.
//!
//! ```text
//! cargo run -p saigon [-- engine_config.json]
//! RUST_LOG=sr_engine=debug cargo run -p saigon
//! ```

mod network;

use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{FixedOffset, TimeZone};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sr_core::{GeoPoint, NetworkKind, TripTime, VehicleMode};
use sr_engine::{EngineBuilder, EngineConfig, Preferences, RoutePlan};
use sr_hazard::{
    CrowdTable, HazardRecord, StaticWeather, WeatherCondition, load_crowd_reader,
    load_disasters_reader,
};
use sr_spatial::DijkstraRouter;

use network::build_network;

// ── Embedded hazard tables ────────────────────────────────────────────────────

const CROWD_CSV: &str = "\
name,lat,lng,type,radius,weight\n\
Ben Thanh Market,10.7725,106.6980,market,0.4,0.95\n\
Bui Vien Walking Street,10.7670,106.6930,nightlife,0.3,0.9\n\
Turtle Lake,10.7826,106.6958,tourism,0.2,0.6\n\
Le Quy Don High School,10.7810,106.6920,school,0.25,0.7\n\
Saigon Centre,10.7735,106.7010,mall,0.2,0.8\n\
";

const DISASTER_CSV: &str = "\
id,name,lat,lng,radius,categories,date\n\
LOCAL_1,Tidal flooding on Bui Vien,10.7700,106.6925,0.35,floods,2025-10-20T05:30:00Z\n\
";

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("saigon=info,sr_engine=info")),
        )
        .init();

    // 1. Configuration: defaults, or a JSON file given as the first argument.
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading engine config {path}"))?;
            serde_json::from_str::<EngineConfig>(&raw)
                .with_context(|| format!("parsing engine config {path}"))?
        }
        None => EngineConfig::default(),
    };

    // 2. Road network and hazard tables.
    let (network, places) = build_network();
    info!(nodes = network.node_count(), edges = network.edge_count(), "road network built");

    let crowds = CrowdTable::new(load_crowd_reader(Cursor::new(CROWD_CSV))?);
    let disasters = load_disasters_reader(Cursor::new(DISASTER_CSV))?;
    let storms = vec![HazardRecord::weather(
        "Storm cell over Bach Dang",
        GeoPoint::new(10.7752, 106.7080),
        0.6,
        WeatherCondition::Thunderstorm,
        12.0,
    )];
    info!(crowds = crowds.len(), disasters = disasters.len(), "hazard tables loaded");

    // 3. Engine.
    let engine = EngineBuilder::new(DijkstraRouter)
        .config(config)
        .graph(NetworkKind::Drive, Arc::new(network))
        .disaster_snapshot(disasters)
        .weather_source(Arc::new(StaticWeather::new(storms)))
        .crowd_table(crowds)
        .build()?;

    // Monday 20 Oct 2025, 08:15 in Saigon.
    let ict = FixedOffset::east_opt(7 * 3_600).context("invalid UTC offset")?;
    let morning = ict
        .with_ymd_and_hms(2025, 10, 20, 8, 15, 0)
        .single()
        .context("ambiguous trip time")?;
    let trip = TripTime::at(morning);

    // 4. Requests.
    let requests = [
        ("motorbike, default preferences", places.tan_dinh, places.bach_dang, VehicleMode::Motorbike, Preferences::default()),
        ("bus, crowd-averse", places.turtle_lake, places.nguyen_hue, VehicleMode::Bus, Preferences::from_map([("crowd", 2.0)])),
        ("car, ignores weather", places.ben_thanh, places.bach_dang, VehicleMode::Car, Preferences::from_map([("weather", 0.0)])),
    ];

    for (label, start, end, mode, prefs) in requests {
        let t0 = Instant::now();
        match engine.find_routes_at(start, end, mode, &prefs, &trip) {
            Ok(plan) => {
                summarize(label, &plan, t0.elapsed().as_secs_f64());
                println!("{}", serde_json::to_string_pretty(&plan)?);
            }
            Err(err) => warn!(request = label, error = %err, "routing failed"),
        }
    }

    Ok(())
}

fn summarize(label: &str, plan: &RoutePlan, secs: f64) {
    println!();
    println!("=== {label} ({secs:.3} s) ===");
    println!("{:<14} {:>8} {:>8} {:<10} {}", "Route", "km", "min", "Label", "Rationale");
    println!("{}", "-".repeat(72));
    for route in plan.routes() {
        println!(
            "{:<14} {:>8.2} {:>8.1} {:<10} {}",
            route.name, route.distance_km, route.duration_min, route.label, route.rationale
        );
    }
    println!();
}
