mod cli;
mod commands;

use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use prio_core::config::load_dotenv;
use prio_core::MapConfig;
use tracing::debug;

use crate::cli::CliArgs;
use crate::commands::{execute, ValueMap};

fn load_map(path: &Path, config: &MapConfig) -> Result<ValueMap> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(?path, "Map file not found, starting empty");
            return Ok(ValueMap::from_config(config));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read map: {}", path.display()));
        }
    };
    let map = ValueMap::from_json_with_order(&text, config.order.into())
        .with_context(|| format!("failed to parse map: {}", path.display()))?;
    Ok(map)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    load_dotenv();
    let config = MapConfig::from_env();
    config.log_summary();

    let map = load_map(&args.file, &config)?;
    for line in execute(&map, &args.command)? {
        println!("{line}");
    }

    if args.command.mutates() {
        let target = args.out.as_deref().unwrap_or(args.file.as_path());
        let json = map.to_json_pretty().context("failed to serialize map")?;
        std::fs::write(target, json)
            .with_context(|| format!("failed to write map: {}", target.display()))?;
        debug!(path = %target.display(), "Map written");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prio_core::OrderKind;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("prio-cli-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn missing_file_starts_empty() {
        let path = temp_path("missing");
        let _ = std::fs::remove_file(&path);
        let config = MapConfig { order: OrderKind::Descending, ..MapConfig::default() };
        let map = load_map(&path, &config).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.order().kind(), Some(OrderKind::Descending));
    }

    #[test]
    fn existing_file_is_parsed() {
        let path = temp_path("existing");
        std::fs::write(&path, r#"{"buckets":{"1":["a"],"4":["b","c"]}}"#).unwrap();
        let map = load_map(&path, &MapConfig::default());
        std::fs::remove_file(&path).unwrap();

        let map = map.unwrap();
        assert_eq!(map.count(), 3);
        assert_eq!(map.all_priorities().unwrap(), vec![1, 4]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = temp_path("malformed");
        std::fs::write(&path, "{\"buckets\":").unwrap();
        let result = load_map(&path, &MapConfig::default());
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("failed to parse map"));
    }

    #[test]
    fn unreadable_path_is_an_error() {
        // A directory exists but cannot be read as a file.
        let err = load_map(&std::env::temp_dir(), &MapConfig::default()).unwrap_err();
        assert!(err.to_string().starts_with("failed to read map"));
    }
}
