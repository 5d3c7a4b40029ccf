use anyhow::bail;
use clap::Parser;
use std::time::Duration;

/// Runtime configuration for the `dataqueue-challenge` binary.
///
/// Every value is read from CLI arguments or environment variables (a `.env`
/// file is honored), with defaults that reproduce the classic run: four
/// producers per core racing to draw a number under the threshold within a
/// second and a half.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dataqueue-challenge",
    version,
    about = "Races producer workers to find a number under a threshold"
)]
pub struct CliArgs {
    /// Number of producer workers drawing random numbers concurrently.
    ///
    /// Environment variable: `NUM_PRODUCERS`
    #[arg(long, env = "NUM_PRODUCERS", default_value_t = num_cpus::get() * 4)]
    pub producers: usize,

    /// Number of consumer workers receiving draws.
    ///
    /// Environment variable: `NUM_CONSUMERS`
    #[arg(long, env = "NUM_CONSUMERS", default_value_t = 1)]
    pub consumers: usize,

    /// Upper bound (exclusive) of every draw.
    ///
    /// Environment variable: `DIFFICULTY`
    #[arg(long, env = "DIFFICULTY", default_value_t = 1 << 30)]
    pub difficulty: u64,

    /// A draw at or below this value is a hit and stops every producer.
    ///
    /// Environment variable: `THRESHOLD`
    #[arg(long, env = "THRESHOLD", default_value_t = 1000)]
    pub threshold: u64,

    /// Overall time budget in milliseconds. Reaching it cancels the run.
    ///
    /// Environment variable: `TIMEOUT_MS`
    #[arg(long, env = "TIMEOUT_MS", default_value_t = 1500)]
    pub timeout_ms: u64,

    /// Emit logs as JSON lines instead of human-readable text.
    ///
    /// Environment variable: `JSON_LOGS`
    #[arg(long, env = "JSON_LOGS", default_value_t = false)]
    pub json_logs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeConfig {
    pub producers: usize,
    pub consumers: usize,
    pub difficulty: u64,
    pub threshold: u64,
    pub timeout: Duration,
    pub json_logs: bool,
}

impl TryFrom<CliArgs> for ChallengeConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.producers == 0 {
            bail!("NUM_PRODUCERS must be greater than 0");
        }

        if args.consumers == 0 {
            bail!("NUM_CONSUMERS must be greater than 0");
        }

        if args.threshold >= args.difficulty {
            bail!(
                "THRESHOLD ({}) must be below DIFFICULTY ({})",
                args.threshold,
                args.difficulty
            );
        }

        if args.timeout_ms == 0 {
            bail!("TIMEOUT_MS must be greater than 0");
        }

        Ok(Self {
            producers: args.producers,
            consumers: args.consumers,
            difficulty: args.difficulty,
            threshold: args.threshold,
            timeout: Duration::from_millis(args.timeout_ms),
            json_logs: args.json_logs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CliArgs {
        CliArgs {
            producers: 8,
            consumers: 1,
            difficulty: 1 << 30,
            threshold: 1000,
            timeout_ms: 1500,
            json_logs: false,
        }
    }

    #[test]
    fn accepts_defaults() {
        let config = ChallengeConfig::try_from(args()).unwrap();
        assert_eq!(
            config,
            ChallengeConfig {
                producers: 8,
                consumers: 1,
                difficulty: 1 << 30,
                threshold: 1000,
                timeout: Duration::from_millis(1500),
                json_logs: false,
            }
        );
    }

    #[test]
    fn parses_flags() {
        let args = CliArgs::try_parse_from([
            "dataqueue-challenge",
            "--producers",
            "3",
            "--consumers",
            "2",
            "--difficulty",
            "100",
            "--threshold",
            "5",
            "--timeout-ms",
            "250",
            "--json-logs",
        ])
        .unwrap();
        let config = ChallengeConfig::try_from(args).unwrap();

        assert_eq!(config.producers, 3);
        assert_eq!(config.consumers, 2);
        assert_eq!(config.difficulty, 100);
        assert_eq!(config.threshold, 5);
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert!(config.json_logs);
    }

    #[test]
    fn rejects_invalid_combinations() {
        let cases = [
            CliArgs {
                producers: 0,
                ..args()
            },
            CliArgs {
                consumers: 0,
                ..args()
            },
            CliArgs {
                threshold: 1 << 30,
                ..args()
            },
            CliArgs {
                difficulty: 0,
                threshold: 0,
                ..args()
            },
            CliArgs {
                timeout_ms: 0,
                ..args()
            },
        ];

        for case in cases {
            let debug = format!("{case:?}");
            assert!(ChallengeConfig::try_from(case).is_err(), "accepted {debug}");
        }
    }
}
