//! Controller chains running against planets while they are reported

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use planet_weather::controller::{create_controller, Controller};
use planet_weather::core::config::WeatherConfig;
use planet_weather::core::error::{Result, WeatherError};
use planet_weather::core::types::{LatitudeBand, Metric, MetricRange, Season};
use planet_weather::data::{DataReader, DataSet, ZoneData};
use planet_weather::planet::Planet;
use planet_weather::simulation::WeatherSystem;

const PLANETS: &str = r#"{
    "planets": [
        {
            "name": "tessera",
            "base_weather": "periodic",
            "weather_decorators": ["rain"],
            "revolution_period": 2,
            "rain_zones": ["Middle"],
            "zones": {"North": [30, 90], "Middle": [-30, 30], "South": [-30, -90]},
            "zone_data": {
                "North": {
                    "summer": {"temperature": [10, 20], "pressure": [1000, 1010], "humidity": [10, 20]},
                    "winter": {"temperature": [-20, -10], "pressure": [1010, 1020], "humidity": [20, 30]}
                },
                "Middle": {
                    "summer": {"temperature": [20, 30], "pressure": [1000, 1010], "humidity": [30, 40]},
                    "winter": {"temperature": [0, 10], "pressure": [1010, 1020], "humidity": [40, 50]},
                    "rain": {"temperature": [5, 15], "pressure": [990, 1000], "humidity": [80, 90]}
                },
                "South": {
                    "summer": {"temperature": [10, 20], "pressure": [1000, 1010], "humidity": [10, 20]},
                    "winter": {"temperature": [-20, -10], "pressure": [1010, 1020], "humidity": [20, 30]}
                }
            },
            "locations": [
                {"name": "north", "latitude": 45.0, "longitude": 10.0, "timezone": "UTC+1"},
                {"name": "equator", "latitude": 0.0, "longitude": 0.0, "timezone": "UTC+0"},
                {"name": "south", "latitude": -45.0, "longitude": -10.0, "timezone": "UTC-1"}
            ]
        },
        {
            "name": "broken",
            "base_weather": "periodic",
            "weather_decorators": ["rain"],
            "revolution_period": 0,
            "zones": {"All": [-90, 90]},
            "zone_data": {
                "All": {
                    "summer": {"temperature": [1, 2], "pressure": [1, 2], "humidity": [1, 2]},
                    "winter": {"temperature": [1, 2], "pressure": [1, 2], "humidity": [1, 2]}
                }
            },
            "locations": [{"name": "anywhere", "latitude": 0.0, "longitude": 0.0}]
        }
    ]
}"#;

fn fast_config() -> WeatherConfig {
    WeatherConfig {
        season_tick_ms: 1,
        rain_tick_ms: 1,
        data_refresh_ms: 5,
        seed: Some(11),
        shutdown_timeout_ms: 2000,
        ..WeatherConfig::default()
    }
}

fn temp_dataset(tag: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("planet_weather_{}_{}.json", tag, std::process::id()));
    std::fs::write(&path, content).unwrap();
    path
}

fn tessera() -> (Planet, Arc<DataSet>) {
    let data = Arc::new(DataSet::from_json(PLANETS).unwrap());
    let planet = Planet::from_data(data.planet("tessera").unwrap());
    (planet, data)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reports_stay_consistent_while_seasons_flip() {
    let (mut planet, data) = tessera();
    let all_zones: BTreeSet<String> = ["North", "Middle", "South"].iter().map(|s| s.to_string()).collect();

    let mut controller = create_controller("periodic", ["rain"], &fast_config()).unwrap();
    controller.add_planet(planet.climate()).unwrap();
    controller.start(data.clone()).unwrap();

    for _ in 0..200 {
        let zones = planet.climate().season_zones().unwrap();
        assert!(zones.summer().is_disjoint(zones.winter()));
        assert_eq!(zones.all(), all_zones);

        let mut out = Vec::new();
        planet.report(data.as_ref(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let records: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(records.len(), 3);
        for record in records {
            let label = record.split('|').nth(3).unwrap();
            assert!(["Sunny", "Snow", "Rain"].contains(&label), "bad label in {}", record);
        }
        for location in planet.locations() {
            assert!(matches!(
                location.season,
                Some(Season::Summer) | Some(Season::Winter) | Some(Season::Rain)
            ));
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    controller.shutdown();
    controller.join(Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn test_rain_controller_publishes_inside_band() {
    let (planet, data) = tessera();
    let mut controller = create_controller("periodic", ["rain"], &fast_config()).unwrap();
    controller.add_planet(planet.climate()).unwrap();
    controller.start(data.clone()).unwrap();

    let Controller::Rain(rain) = &controller else {
        panic!("expected a rain layer on top");
    };
    let mut regions = Vec::new();
    for _ in 0..200 {
        regions = rain.overlay().planet_data("tessera").unwrap();
        if !regions.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!((1..=10).contains(&regions.len()));
    for region in &regions {
        assert!(region.lower_left.latitude >= -30.0);
        assert!(region.upper_right.latitude <= 30.0);
    }

    controller.shutdown();
    controller.join(Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn test_double_chain_rejected() {
    let (planet, _) = tessera();
    let mut first = create_controller("periodic", Vec::<&str>::new(), &fast_config()).unwrap();
    first.add_planet(planet.climate()).unwrap();

    let mut second = create_controller("periodic", ["rain"], &fast_config()).unwrap();
    let err = second.add_planet(planet.climate()).unwrap_err();
    assert!(err.is_configuration());
    // The rejected chain did not attach its overlay
    assert!(planet.climate().overlays().unwrap().is_empty());
}

/// Data source whose backing store is gone
struct DeadSource;

impl ZoneData for DeadSource {
    fn revolution_period(&self, _planet: &str) -> Result<u64> {
        Ok(4)
    }

    fn zones(&self, _planet: &str) -> Result<BTreeMap<String, LatitudeBand>> {
        Err(WeatherError::DataSource("store offline".into()))
    }

    fn rain_eligible_zones(&self, _planet: &str) -> Result<BTreeSet<String>> {
        Err(WeatherError::DataSource("store offline".into()))
    }

    fn zone_of(&self, _planet: &str, _latitude: f64) -> Result<String> {
        Err(WeatherError::DataSource("store offline".into()))
    }

    fn range(&self, _planet: &str, _zone: &str, _season: Season, _metric: Metric) -> Result<MetricRange> {
        Err(WeatherError::DataSource("store offline".into()))
    }
}

#[tokio::test]
async fn test_dead_source_stops_rain_worker_with_error() {
    let (planet, _) = tessera();
    let mut controller = create_controller("periodic", ["rain"], &fast_config()).unwrap();
    controller.add_planet(planet.climate()).unwrap();
    controller.start(Arc::new(DeadSource)).unwrap();

    // Let the rain worker hit the failure before asking everything to stop
    tokio::time::sleep(Duration::from_millis(50)).await;
    controller.shutdown();
    let outcome = controller.join(Duration::from_secs(2)).await;
    assert!(matches!(outcome, Err(WeatherError::DataSource(_))));
}

#[tokio::test]
async fn test_weather_system_lifecycle() {
    let path = temp_dataset("system", PLANETS);

    let reader = DataReader::open(&path).unwrap();
    let mut system = WeatherSystem::new(reader, fast_config()).unwrap();
    assert_eq!(system.planets().len(), 2);
    assert_eq!(system.controllers().len(), 2);

    let broken = system.planets()[1].climate().clone();
    assert_eq!(broken.name(), "broken");
    assert!(broken.is_controlled());
    assert_eq!(broken.overlays().unwrap().len(), 1);

    // "broken" has revolution_period 0, so only one chain starts
    system.start().unwrap();
    assert_eq!(system.controllers().len(), 1);
    assert!(system.start().is_err());

    // The dropped chain no longer holds its planet
    assert!(!broken.is_controlled());
    assert!(broken.overlays().unwrap().is_empty());

    for _ in 0..3 {
        let mut out = Vec::new();
        let failures = system.report_all(&mut out).unwrap();
        assert!(failures.is_empty());
        let text = String::from_utf8(out).unwrap();
        // Three tessera records, a blank line, one broken record, a blank line
        assert_eq!(text.lines().count(), 6);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    system.shutdown().await.unwrap();
    let _ = std::fs::remove_file(&path);
}

const GAPPED: &str = r#"{
    "planets": [
        {
            "name": "gap",
            "base_weather": "periodic",
            "revolution_period": 2,
            "zones": {"Low": [0, 30]},
            "zone_data": {
                "Low": {
                    "summer": {"temperature": [1, 2], "pressure": [1, 2], "humidity": [1, 2]},
                    "winter": {"temperature": [1, 2], "pressure": [1, 2], "humidity": [1, 2]}
                }
            },
            "locations": [{"name": "too-far-north", "latitude": 50.0, "longitude": 0.0}]
        },
        {
            "name": "calm",
            "base_weather": "periodic",
            "revolution_period": 2,
            "zones": {"All": [-90, 90]},
            "zone_data": {
                "All": {
                    "summer": {"temperature": [1, 2], "pressure": [1, 2], "humidity": [1, 2]},
                    "winter": {"temperature": [1, 2], "pressure": [1, 2], "humidity": [1, 2]}
                }
            },
            "locations": [{"name": "meadow", "latitude": 5.0, "longitude": 5.0}]
        }
    ]
}"#;

#[tokio::test]
async fn test_report_cycle_skips_failing_planet() {
    let reader = DataReader::from_data(DataSet::from_json(GAPPED).unwrap());
    let mut system = WeatherSystem::new(reader, fast_config()).unwrap();

    let mut out = Vec::new();
    let failures = system.report_all(&mut out).unwrap();

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "gap");
    assert!(matches!(failures[0].1, WeatherError::ZoneUnresolved { .. }));

    // "calm" comes after "gap" and is still reported
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("meadow|5.0,5.0,"));
    assert_eq!(lines[1], "");
}

#[tokio::test]
async fn test_report_cycle_aborts_when_source_dies() {
    let path = temp_dataset("dying", GAPPED);
    let reader = DataReader::open(&path).unwrap();
    let mut system = WeatherSystem::new(reader, fast_config()).unwrap();
    system.start().unwrap();
    std::fs::remove_file(&path).unwrap();

    for _ in 0..200 {
        if system.data().snapshot().is_err() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let outcome = system.report_all(&mut Vec::new());
    assert!(matches!(outcome, Err(WeatherError::DataSource(_))));
    assert!(matches!(system.shutdown().await, Err(WeatherError::DataSource(_))));
}

#[tokio::test]
async fn test_chain_join_shares_one_deadline() {
    let (planet, data) = tessera();
    let config = WeatherConfig {
        season_tick_ms: 60_000,
        rain_tick_ms: 60_000,
        ..fast_config()
    };
    let mut controller = create_controller("periodic", ["rain"], &config).unwrap();
    controller.add_planet(planet.climate()).unwrap();
    controller.start(data).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Both layers sleep a full minute before seeing the stop request
    controller.shutdown();
    let began = Instant::now();
    let outcome = controller.join(Duration::from_millis(200)).await;
    let elapsed = began.elapsed();

    assert!(matches!(outcome, Err(WeatherError::ShutdownTimeout(_))));
    assert!(elapsed < Duration::from_millis(390), "chain join took {:?}", elapsed);
}
