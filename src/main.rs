//! ttlmap demo
//!
//! Walks through the life of two entries: one with a TTL and one without.
//! The first disappears once its TTL has passed, the second stays.

use anyhow::{bail, Context};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use ttlmap::{ExpiringMap, MapConfig, MapError};

/// Demo configuration
struct Config {
    /// TTL given to `key1`
    ttl: Duration,
    /// How long to wait before reading again
    wait: Duration,
    /// Reaper interval (zero disables it)
    sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5),
            wait: Duration::from_secs(6),
            sweep_interval: Duration::from_millis(1000),
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> anyhow::Result<Self> {
        let mut config = Config::default();
        let mut args = std::env::args().skip(1);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--ttl" => {
                    config.ttl = Duration::from_secs(parse_value(&arg, args.next())?);
                }
                "--wait" => {
                    config.wait = Duration::from_secs(parse_value(&arg, args.next())?);
                }
                "--sweep-ms" => {
                    config.sweep_interval = Duration::from_millis(parse_value(&arg, args.next())?);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("ttlmap-demo version {}", ttlmap::VERSION);
                    std::process::exit(0);
                }
                other => {
                    print_help();
                    bail!("unknown argument: {}", other);
                }
            }
        }

        Ok(config)
    }
}

fn parse_value(flag: &str, value: Option<String>) -> anyhow::Result<u64> {
    let Some(value) = value else {
        bail!("{} requires a value", flag);
    };
    value
        .parse()
        .with_context(|| format!("invalid value for {}: {}", flag, value))
}

fn print_help() {
    println!(
        r#"
ttlmap-demo - Expiring map walkthrough

USAGE:
    ttlmap-demo [OPTIONS]

OPTIONS:
        --ttl <SECS>        TTL given to key1 (default: 5)
        --wait <SECS>       Time to wait before reading again (default: 6)
        --sweep-ms <MS>     Reaper interval, 0 disables it (default: 1000)
    -v, --version           Print version information
    -h, --help              Print this help message

Set RUST_LOG=debug to watch the reaper work.
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_args()?;

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let map: ExpiringMap<String, String> = ExpiringMap::with_config(
        MapConfig::default().with_sweep_interval(config.sweep_interval),
    );

    let key1 = "key1".to_string();
    let key2 = "key2".to_string();

    // key1 expires, key2 never does
    map.set(key1.clone(), "value1".to_string(), Some(config.ttl));
    map.set(key2.clone(), "value2".to_string(), None);

    println!("{}", map.get(&key1)?);

    info!(wait_secs = config.wait.as_secs(), "Sleeping past the TTL of key1");
    tokio::time::sleep(config.wait).await;

    match map.get(&key1) {
        Ok(value) => println!("Key1 is still in the map: {}", value),
        Err(MapError::KeyNotFound) => println!("Key1 is not in the map"),
    }

    if map.contains(&key2) {
        println!("Key2 is in the map");
    }

    println!("{}", map.len());

    let stats = map.stats();
    info!(
        reaped = stats.reaped,
        lazily_expired = stats.lazily_expired,
        "Demo finished"
    );

    map.shutdown().await;
    Ok(())
}
