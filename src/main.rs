/// aqmon - air-quality monitoring daemon
///
/// Usage:
///   aqmon                              refresh every interval, print reports
///   aqmon once                         one refresh, print the report
///   aqmon search <keyword>             list matching stations
///   aqmon select here
///   aqmon select station <id> <name>
///   aqmon select geo <lat> <lng> <name>
///
/// The config file path comes from AQMON_CONFIG (default ./aqmon.toml).

use chrono::Utc;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::env;
use std::process;
use std::thread;

use aqmon_service::cache::MeasurementCache;
use aqmon_service::compare::RandomComparator;
use aqmon_service::config::Config;
use aqmon_service::engine::{DashboardReport, Monitor, RefreshOutcome};
use aqmon_service::ingest::waqi::WaqiClient;
use aqmon_service::location::LocationDescriptor;
use aqmon_service::logging::{self, Component};
use aqmon_service::store::{JsonFileStore, KeyValueStore, PostgresStore};

type DaemonMonitor = Monitor<WaqiClient, Box<dyn KeyValueStore>>;

fn main() {
    let config_path = env::var("AQMON_CONFIG").unwrap_or_else(|_| "aqmon.toml".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ {} ({})", e, config_path);
            process::exit(1);
        }
    };

    let level = config.log_level().unwrap_or(logging::LogLevel::Info);
    logging::init_logger(level, config.logging.file.as_deref(), config.logging.timestamps);

    let mut monitor = match build_monitor(&config) {
        Ok(monitor) => monitor,
        Err(e) => {
            logging::error(Component::System, None, &format!("Startup failed: {}", e));
            process::exit(1);
        }
    };

    let args: Vec<String> = env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let code = match args.as_slice() {
        [] => run_daemon(&mut monitor, &config),
        ["once"] => run_once(&mut monitor),
        ["search", keyword @ ..] => run_search(&monitor, &keyword.join(" ")),
        ["select", rest @ ..] => run_select(&mut monitor, rest),
        _ => {
            eprintln!("Usage: aqmon [once | search <keyword> | select here|station|geo ...]");
            2
        }
    };
    process::exit(code);
}

fn build_monitor(config: &Config) -> Result<DaemonMonitor, Box<dyn std::error::Error>> {
    let client = WaqiClient::new(
        &config.provider.base_url,
        &config.provider.token,
        config.provider_timeout(),
    )?;

    let store: Box<dyn KeyValueStore> = match &config.cache.database_url {
        Some(url) => {
            logging::info(Component::Store, None, "Using PostgreSQL state store");
            Box::new(PostgresStore::connect(url)?)
        }
        None => {
            logging::info(
                Component::Store,
                Some(&config.cache.state_path),
                "Using JSON file state store",
            );
            Box::new(JsonFileStore::new(&config.cache.state_path))
        }
    };

    let cache = MeasurementCache::with_ttl(store, config.cache_ttl());
    let comparator = RandomComparator::new(ChaCha8Rng::from_entropy());
    Ok(Monitor::new(client, cache, config.trend_config()).with_comparator(Box::new(comparator)))
}

fn print_report(report: &DashboardReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => logging::error(Component::System, None, &format!("Cannot encode report: {}", e)),
    }
}

/// Runs one cycle and prints whatever report results. Returns false only
/// when the selection itself cannot be resolved.
fn refresh_and_print(monitor: &mut DaemonMonitor) -> bool {
    let now = Utc::now();
    if let Some(provisional) = monitor.provisional(now) {
        logging::debug(Component::Engine, None, "Showing cached data while updating");
        print_report(&provisional);
    }

    match monitor.refresh(now) {
        Ok(RefreshOutcome::Refreshed { report, error }) => {
            if let Some(e) = error {
                logging::warn(
                    Component::Engine,
                    Some(&report.location.name),
                    &format!("Unable to fetch live data, showing {} data: {}", report.source, e),
                );
            }
            print_report(&report);
            true
        }
        Ok(RefreshOutcome::Discarded { .. }) => true,
        Err(e) => {
            logging::log_failure(
                Component::Engine,
                &monitor.selection().descriptor().display_name,
                "refresh",
                &e,
            );
            false
        }
    }
}

fn run_once(monitor: &mut DaemonMonitor) -> i32 {
    if refresh_and_print(monitor) { 0 } else { 1 }
}

fn run_daemon(monitor: &mut DaemonMonitor, config: &Config) -> i32 {
    logging::info(
        Component::System,
        None,
        &format!(
            "Refreshing every {}s for {}",
            config.refresh.interval_secs,
            monitor.selection().descriptor().display_name
        ),
    );
    loop {
        if !refresh_and_print(monitor) {
            return 1;
        }
        thread::sleep(config.refresh_interval());
    }
}

fn run_search(monitor: &DaemonMonitor, keyword: &str) -> i32 {
    match monitor.search_stations(keyword) {
        Ok(stations) if stations.is_empty() => {
            println!("No stations found for '{}'", keyword);
            0
        }
        Ok(stations) => {
            for station in stations {
                println!(
                    "{:>8}  {}  ({:.4}, {:.4})",
                    station.id, station.name, station.lat, station.lng
                );
            }
            0
        }
        Err(e) => {
            eprintln!("✗ Station search failed: {}", e);
            1
        }
    }
}

fn run_select(monitor: &mut DaemonMonitor, args: &[&str]) -> i32 {
    let descriptor = match args {
        ["here"] => LocationDescriptor::ambient(),
        ["station", id, name @ ..] if !name.is_empty() => {
            LocationDescriptor::station(id, &name.join(" "))
        }
        ["geo", lat, lng, name @ ..] if !name.is_empty() => {
            match (lat.parse::<f64>(), lng.parse::<f64>()) {
                (Ok(lat), Ok(lng)) => LocationDescriptor::coordinates(lat, lng, &name.join(" ")),
                _ => {
                    eprintln!("✗ Latitude and longitude must be numbers");
                    return 2;
                }
            }
        }
        _ => {
            eprintln!("Usage: aqmon select here | station <id> <name> | geo <lat> <lng> <name>");
            return 2;
        }
    };

    let name = descriptor.display_name.clone();
    if let Err(e) = monitor.select_location(descriptor) {
        eprintln!("✗ Cannot select {}: {}", name, e);
        return 2;
    }
    eprintln!("✓ Selected {}", name);
    run_once(monitor)
}
