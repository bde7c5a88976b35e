use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::Path;
use speakscore::app::{
    build_aggregator, load_config, offline_requested, parse_replay, read_input, replay,
};
use speakscore::cli::{Cli, Commands, ConfigAction};
use speakscore::config::Config;
use speakscore::defaults;
use speakscore::feedback::{ResponseRequest, TestSubmission};
use speakscore::output::{render_report, render_test_result, render_transcript};
use speakscore::scoring::TimingData;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Score {
            response,
            original,
            question,
            part,
            duration,
            pause,
            json,
        } => {
            let config = load_config(cli.config.as_deref(), cli.timeout)?;
            let aggregator = build_aggregator(&config, offline_requested())?;

            let mut request = ResponseRequest::new(part, response);
            request.original = original;
            request.question = question;
            request.timing = duration.map(|d| TimingData::new(d, pause.unwrap_or(0.0)));

            let report = aggregator.score_response(&request).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_report(&report, use_color()));
            }
        }
        Commands::Test { input, json } => {
            let config = load_config(cli.config.as_deref(), cli.timeout)?;
            let aggregator = build_aggregator(&config, offline_requested())?;

            let submission: TestSubmission = serde_json::from_str(&read_input(&input)?)
                .with_context(|| format!("invalid test submission in {}", input.display()))?;
            let result = aggregator.score_test(&submission).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render_test_result(&result, use_color()));
            }
        }
        Commands::Replay { input, score, json } => {
            let config = load_config(cli.config.as_deref(), cli.timeout)?;
            let fragments = parse_replay(&read_input(&input)?)?;
            let recorded = replay(&config.transcript, &fragments).await?;

            let report = if score {
                let aggregator = build_aggregator(&config, offline_requested())?;
                let request = ResponseRequest::new(defaults::PRACTICE_PART, recorded.text.clone())
                    .with_timing(recorded.timing);
                Some(aggregator.score_response(&request).await?)
            } else {
                None
            };

            if json {
                let value = serde_json::json!({
                    "transcript": recorded.text,
                    "timingData": recorded.timing,
                    "report": report,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                let color = use_color();
                print!("{}", render_transcript(&recorded, color));
                if let Some(report) = &report {
                    print!("\n{}", render_report(report, color));
                }
            }
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref(), cli.timeout)?;
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the verbosity flag.
fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "speakscore=info",
        1 => "speakscore=debug",
        _ => "speakscore=trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Handle configuration commands.
fn handle_config_command(
    action: ConfigAction,
    custom_path: Option<&Path>,
    timeout: Option<std::time::Duration>,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let mut config = load_config(custom_path, timeout)?;
            mask_key(&mut config.analyzer.api_key);
            mask_key(&mut config.feedback.api_key);
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            let path = match custom_path {
                Some(path) => path.to_path_buf(),
                None => Config::default_path()?,
            };
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn mask_key(key: &mut Option<String>) {
    if key.as_deref().is_some_and(|k| !k.is_empty()) {
        *key = Some("********".to_string());
    }
}
