//! Command-line interface for speakscore
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// IELTS-style speaking practice scorer
#[derive(Parser, Debug)]
#[command(
    name = "speakscore",
    version,
    about = "IELTS-style speaking practice scorer"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose logging (-v: debug, -vv: trace). RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Timeout for analyzer and model requests. Examples: 5s, 1500ms, 1m
    #[arg(long, global = true, value_name = "DURATION", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,
}

/// Parse a timeout string with `humantime`; bare numbers are seconds.
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let duration = match s.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => humantime::parse_duration(s).map_err(|e| e.to_string())?,
    };
    if duration.is_zero() {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(duration)
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a single spoken response
    Score {
        /// Transcript of the response
        #[arg(long, short = 'r', value_name = "TEXT")]
        response: String,

        /// Reference sentence the speaker was reading or paraphrasing
        #[arg(long, value_name = "TEXT")]
        original: Option<String>,

        /// Question the response answers
        #[arg(long, short = 'q', value_name = "TEXT")]
        question: Option<String>,

        /// Part identifier attached to the report
        #[arg(long, default_value = crate::defaults::PRACTICE_PART)]
        part: String,

        /// Recording duration in seconds
        #[arg(long, value_name = "SECONDS")]
        duration: Option<f64>,

        /// Total pause time in seconds (requires --duration)
        #[arg(long, value_name = "SECONDS", requires = "duration")]
        pause: Option<f64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score a whole test submission (JSON file, `-` for stdin)
    Test {
        /// Submission file: {"responses": {"part1": [...], ...}, "timingData": {...}}
        #[arg(long, short = 'i', value_name = "FILE")]
        input: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay recognition fragments through a live recording session
    ///
    /// Fragments are JSON lines {"text", "is_final", "offset_ms"} and are
    /// replayed in real time.
    Replay {
        /// Fragment file (`-` for stdin)
        #[arg(long, short = 'i', value_name = "FILE")]
        input: PathBuf,

        /// Score the assembled transcript
        #[arg(long)]
        score: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        /// Action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (file, defaults and env overrides)
    Show,
    /// Print the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score_command() {
        let cli = Cli::try_parse_from(["speakscore", "score", "-r", "I like tea"]).unwrap();
        match cli.command {
            Commands::Score {
                response,
                original,
                part,
                duration,
                json,
                ..
            } => {
                assert_eq!(response, "I like tea");
                assert!(original.is_none());
                assert_eq!(part, "practice");
                assert!(duration.is_none());
                assert!(!json);
            }
            other => panic!("Expected Score command, got {:?}", other),
        }
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
        assert!(cli.timeout.is_none());
    }

    #[test]
    fn test_parse_score_with_timing() {
        let cli = Cli::try_parse_from([
            "speakscore",
            "score",
            "--response",
            "hello",
            "--duration",
            "12.5",
            "--pause",
            "2",
            "--part",
            "part2",
        ])
        .unwrap();
        match cli.command {
            Commands::Score {
                duration,
                pause,
                part,
                ..
            } => {
                assert_eq!(duration, Some(12.5));
                assert_eq!(pause, Some(2.0));
                assert_eq!(part, "part2");
            }
            other => panic!("Expected Score command, got {:?}", other),
        }
    }

    #[test]
    fn test_pause_requires_duration() {
        let result = Cli::try_parse_from(["speakscore", "score", "-r", "hi", "--pause", "2"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_verbose_double() {
        let cli = Cli::try_parse_from(["speakscore", "-vv", "config", "path"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Path
            }
        ));
    }

    #[test]
    fn test_parse_global_timeout() {
        let cli = Cli::try_parse_from(["speakscore", "test", "-i", "t.json", "--timeout", "1500ms"])
            .unwrap();
        assert_eq!(cli.timeout, Some(Duration::from_millis(1500)));

        let cli =
            Cli::try_parse_from(["speakscore", "--timeout", "3", "config", "show"]).unwrap();
        assert_eq!(cli.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Cli::try_parse_from(["speakscore", "--timeout", "0s", "config", "show"]).is_err());
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn test_parse_replay_command() {
        let cli = Cli::try_parse_from(["speakscore", "replay", "-i", "-", "--score", "--json"])
            .unwrap();
        match cli.command {
            Commands::Replay { input, score, json } => {
                assert_eq!(input, PathBuf::from("-"));
                assert!(score);
                assert!(json);
            }
            other => panic!("Expected Replay command, got {:?}", other),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["speakscore"]).is_err());
    }
}
