//! Runner configuration, parsed from command-line flags.
//!
//! ```text
//! signal-bench [-n ITER] [-w WARMUP] [-t batched,sequential,publish]
//!              [--latency-us N] [--channel NAME] [--address ADDR]
//!              [--csv] [-q] [--save DIR]
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::driver::{AccessPattern, DEFAULT_CHANNEL};
use crate::error::ConfigError;
use crate::store::memory::DEFAULT_ADDRESS;

pub const DEFAULT_ITERATIONS: usize = 100;
pub const DEFAULT_WARMUP: usize = 10;
/// Roughly a loopback round trip to a local server.
pub const DEFAULT_LATENCY: Duration = Duration::from_micros(200);

/// Environment variable holding the `tracing` filter for the binaries.
pub const LOG_ENV: &str = "SIGNAL_BENCH_LOG";

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub iterations: usize,
    pub warmup: usize,
    pub patterns: Vec<AccessPattern>,
    pub latency: Duration,
    pub channel: String,
    pub address: String,
    pub csv: bool,
    pub quiet: bool,
    pub save_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            warmup: DEFAULT_WARMUP,
            patterns: AccessPattern::ALL.to_vec(),
            latency: DEFAULT_LATENCY,
            channel: DEFAULT_CHANNEL.to_string(),
            address: DEFAULT_ADDRESS.to_string(),
            csv: false,
            quiet: false,
            save_dir: None,
        }
    }
}

impl RunConfig {
    /// Parse flags, excluding the program name. Unknown flags are ignored.
    pub fn from_args<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = RunConfig::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(flag) = args.next() {
            match flag.as_str() {
                "-n" => config.iterations = parse_value(&flag, args.next())?,
                "-w" => config.warmup = parse_value(&flag, args.next())?,
                "-t" => {
                    let list = require(&flag, args.next())?;
                    config.patterns = list
                        .split(',')
                        .filter(|name| !name.trim().is_empty())
                        .map(AccessPattern::from_str)
                        .collect::<Result<_, _>>()?;
                }
                "--latency-us" => {
                    config.latency = Duration::from_micros(parse_value(&flag, args.next())?);
                }
                "--channel" => config.channel = require(&flag, args.next())?,
                "--address" => config.address = require(&flag, args.next())?,
                "--save" => config.save_dir = Some(require(&flag, args.next())?.into()),
                "--csv" => config.csv = true,
                "-q" => config.quiet = true,
                _ => {}
            }
        }

        if config.iterations == 0 {
            return Err(ConfigError::InvalidValue {
                flag: "-n".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(config)
    }
}

fn require(flag: &str, value: Option<String>) -> Result<String, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}

fn parse_value<T: FromStr>(flag: &str, value: Option<String>) -> Result<T, ConfigError> {
    let value = require(flag, value)?;
    value.parse().map_err(|_| ConfigError::InvalidValue {
        flag: flag.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_flags() {
        let config = RunConfig::from_args(Vec::<String>::new()).unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.patterns.len(), 3);
    }

    #[test]
    fn parses_all_flags() {
        let config = RunConfig::from_args([
            "-n", "5", "-w", "1", "-t", "publish,batched", "--latency-us", "0",
            "--channel", "c", "--address", "memory://x", "--csv", "-q", "--save", "out",
        ])
        .unwrap();
        assert_eq!(config.iterations, 5);
        assert_eq!(config.warmup, 1);
        assert_eq!(
            config.patterns,
            vec![AccessPattern::Publish, AccessPattern::Batched]
        );
        assert_eq!(config.latency, Duration::ZERO);
        assert_eq!(config.channel, "c");
        assert_eq!(config.address, "memory://x");
        assert!(config.csv && config.quiet);
        assert_eq!(config.save_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            RunConfig::from_args(["-t", "batched,bogus"]),
            Err(ConfigError::UnknownPattern(name)) if name == "bogus"
        ));
        assert!(matches!(
            RunConfig::from_args(["-n", "many"]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            RunConfig::from_args(["-n", "0"]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            RunConfig::from_args(["--channel"]),
            Err(ConfigError::MissingValue(flag)) if flag == "--channel"
        ));
    }
}
