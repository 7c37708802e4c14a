use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use toml::value::{Table, Value};

use lnview_core::state::ROUTING_LOG_CAPACITY;
use lnview_core::{ModelsConfig, PubSubConfig};

pub const DEFAULT_DIR: &str = ".lnview";
pub const SNAPSHOT_FILE: &str = "snapshot.json";

// note that value_parser gives us clap 4 forward compatibility
#[derive(Parser, Debug)]
#[clap(about, long_about = None, args_override_self = true)]
pub struct Args {
    // only used for usage display, the file is expanded before parsing
    #[clap(
        short = 'f',
        long,
        value_parser,
        help = "configuration file - MUST be the first argument",
        value_name = "FILE"
    )]
    config: Option<String>,

    #[clap(short, long, value_parser, default_value = DEFAULT_DIR, help = "data directory", value_name = "DIR")]
    pub datadir: PathBuf,

    #[clap(
        long,
        help = "set the logging level",
        value_name = "LEVEL",
        default_value = "info",
        value_parser = ["off", "error", "warn", "info", "debug", "trace"],
    )]
    pub log_level: String,

    #[clap(long, value_parser, help = "node snapshot file, defaults to snapshot.json in the data directory", value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    #[clap(
        long,
        help = "seconds between two probe rounds",
        default_value_t = 3,
        value_parser = clap::value_parser!(u64).range(1..),
        value_name = "SECS"
    )]
    pub tick_secs: u64,

    #[clap(
        long,
        help = "seconds between two refreshes of the collections",
        default_value_t = 3,
        value_parser = clap::value_parser!(u64).range(1..),
        value_name = "SECS"
    )]
    pub refresh_secs: u64,

    #[clap(long, help = "also report wallet balance changes")]
    pub wallet_probe: bool,

    #[clap(
        long,
        value_parser,
        help = "ignore invoices settled before this time",
        value_name = "EPOCH_SECS"
    )]
    pub received_since: Option<i64>,

    #[clap(long, value_parser, default_value_t = ROUTING_LOG_CAPACITY, help = "routing events kept in the log")]
    pub routing_capacity: usize,

    #[clap(long, value_parser, default_value_t = 64, help = "capacity of the event queue")]
    pub event_queue: usize,
}

impl Args {
    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot.clone().unwrap_or_else(|| self.datadir.join(SNAPSHOT_FILE))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn models_config(&self) -> ModelsConfig {
        ModelsConfig {
            received_since: self.received_since,
            routing_capacity: self.routing_capacity,
        }
    }

    pub fn pubsub_config(&self) -> PubSubConfig {
        PubSubConfig {
            tick_interval: Duration::from_secs(self.tick_secs),
            wallet_probe: self.wallet_probe,
            queue_size: self.event_queue,
        }
    }
}

pub fn parse_args_and_config() -> Args {
    let env_args = std::env::args().collect::<Vec<_>>();
    parse_args_and_config_from(&env_args).unwrap_or_else(|e| e.exit())
}

/// Parse the command line, expanding `--config`/`-f` into the arguments
/// found in the TOML file.  Later arguments override earlier ones.
pub fn parse_args_and_config_from(env_args: &[String]) -> Result<Args, clap::Error> {
    let args = expand_config(env_args)?;
    Args::try_parse_from(args)
}

fn expand_config(env_args: &[String]) -> Result<Vec<String>, clap::Error> {
    let mut expanded = Vec::with_capacity(env_args.len());
    let mut iter = env_args.iter();
    while let Some(arg) = iter.next() {
        if let Some(path) = arg.strip_prefix("--config=") {
            expanded.extend(toml_to_configs(path)?);
        } else if arg == "--config" || arg == "-f" {
            match iter.next() {
                Some(path) => expanded.extend(toml_to_configs(path)?),
                // let clap handle the error
                None => expanded.push(arg.clone()),
            }
        } else {
            expanded.push(arg.clone());
        }
    }
    Ok(expanded)
}

fn toml_to_configs(path: &str) -> Result<Vec<String>, clap::Error> {
    let contents = fs::read_to_string(path)
        .map_err(|e| clap::Error::raw(ErrorKind::Io, format!("{}: {}\n", path, e)))?;
    let config: Table = toml::from_str(&contents)
        .map_err(|e| clap::Error::raw(ErrorKind::Format, format!("{}: {}\n", path, e)))?;
    Ok(config.into_iter().flat_map(|(k, value)| convert_toml_value(k, value)).collect())
}

fn convert_toml_value(key: String, value: Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![format!("--{}={}", key, s)],
        Value::Integer(v) => vec![format!("--{}={}", key, v)],
        Value::Float(v) => vec![format!("--{}={}", key, v)],
        // flags take no value
        Value::Boolean(true) => vec![format!("--{}", key)],
        Value::Boolean(false) => vec![],
        Value::Datetime(v) => vec![format!("--{}={}", key, v)],
        Value::Array(a) =>
            a.into_iter().flat_map(|v| convert_toml_value(key.clone(), v)).collect::<Vec<_>>(),
        Value::Table(_) => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn to_args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn clap_test() {
        let args: Args = parse_args_and_config_from(&to_args(&["lnview"])).unwrap();
        assert_eq!(args.datadir, PathBuf::from(DEFAULT_DIR));
        assert_eq!(args.snapshot_path(), PathBuf::from(DEFAULT_DIR).join(SNAPSHOT_FILE));
        assert_eq!(args.log_level, "info");
        assert_eq!(args.tick_secs, 3);
        assert_eq!(args.refresh_secs, 3);
        assert!(!args.wallet_probe);
        assert_eq!(args.received_since, None);
        assert_eq!(args.routing_capacity, 512);
        assert_eq!(args.event_queue, 64);

        let args: Args = parse_args_and_config_from(&to_args(&[
            "lnview",
            "--datadir=/tmp/lnview",
            "--snapshot",
            "/tmp/node.json",
            "--tick-secs=1",
            "--wallet-probe",
            "--received-since",
            "1700000000",
            "--event-queue=8",
        ]))
        .unwrap();
        assert_eq!(args.snapshot_path(), PathBuf::from("/tmp/node.json"));
        let pubsub = args.pubsub_config();
        assert_eq!(pubsub.tick_interval, Duration::from_secs(1));
        assert!(pubsub.wallet_probe);
        assert_eq!(pubsub.queue_size, 8);
        assert_eq!(args.models_config().received_since, Some(1_700_000_000));
    }

    #[test]
    fn clap_rejects_zero_interval_test() {
        assert!(parse_args_and_config_from(&to_args(&["lnview", "--tick-secs=0"])).is_err());
        assert!(parse_args_and_config_from(&to_args(&["lnview", "--log-level=loud"])).is_err());
    }

    #[test]
    fn clap_with_config_file_test() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "datadir = \"/tmp/lnview\"\n
            refresh-secs = 10\n
            wallet-probe = true\n
            log-level = \"debug\"\n"
        )
        .unwrap();
        let path = file.path().to_str().unwrap();
        let args: Args =
            parse_args_and_config_from(&to_args(&["lnview", "-f", path, "--log-level=warn"])).unwrap();
        assert_eq!(args.datadir, PathBuf::from("/tmp/lnview"));
        assert_eq!(args.refresh_interval(), Duration::from_secs(10));
        assert!(args.wallet_probe);
        assert_eq!(args.log_level, "warn");

        let config_arg = format!("--config={}", path);
        let args: Args = parse_args_and_config_from(&to_args(&["lnview", &config_arg])).unwrap();
        assert_eq!(args.log_level, "debug");
    }

    #[test]
    fn disabled_flag_in_config_file_test() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "wallet-probe = false").unwrap();
        let path = file.path().to_str().unwrap();
        let args: Args = parse_args_and_config_from(&to_args(&["lnview", "-f", path])).unwrap();
        assert!(!args.wallet_probe);
    }

    #[test]
    fn missing_config_file_test() {
        let err = parse_args_and_config_from(&to_args(&["lnview", "-f", "/nonexistent/lnview.toml"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
