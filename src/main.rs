//! Council CLI - demo councils on the command line

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::json;

mod demos;

use council::{CouncilConfig, CouncilError, FixSuggestion};

#[derive(Parser)]
#[command(name = "council")]
#[command(about = "Council - pluggable aggregation engine demos")]
#[command(version)]
struct Cli {
    /// Path to a council config file (YAML)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play FizzBuzz over a range of numbers
    Fizzbuzz {
        /// First number
        #[arg(long, default_value_t = 1)]
        from: u64,

        /// Last number (inclusive)
        #[arg(long, default_value_t = 15)]
        to: u64,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Include the call trace of every number (implies --json)
        #[arg(long)]
        trace: bool,
    },

    /// Play seven boom on the given numbers
    SevenBoom {
        #[arg(required = true, allow_negative_numbers = true)]
        numbers: Vec<i64>,
    },
}

fn main() {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fizzbuzz { from, to, json, trace } => {
            load_config(cli.config.as_deref(), "fizzbuzz")
                .and_then(|config| run_fizzbuzz(config, from, to, json || trace, trace))
        }
        Commands::SevenBoom { numbers } => load_config(cli.config.as_deref(), "seven-boom")
            .and_then(|config| run_seven_boom(config, &numbers)),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn load_config(path: Option<&str>, default_name: &str) -> Result<CouncilConfig, CouncilError> {
    match path {
        Some(path) => CouncilConfig::load(path),
        None => Ok(CouncilConfig::named(default_name)),
    }
}

fn run_fizzbuzz(
    config: CouncilConfig,
    from: u64,
    to: u64,
    as_json: bool,
    with_trace: bool,
) -> Result<(), CouncilError> {
    let council = demos::fizzbuzz(config);

    let mut rows = Vec::new();
    for n in from..=to {
        if with_trace {
            let (words, trace) = council.call_traced(n)?;
            rows.push(json!({ "n": n, "result": words, "trace": trace.to_json()? }));
        } else if as_json {
            let words = council.call(n)?;
            rows.push(json!({ "n": n, "result": words }));
        } else {
            println!("{}", council.call(n)?.concat());
        }
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }
    Ok(())
}

fn run_seven_boom(config: CouncilConfig, numbers: &[i64]) -> Result<(), CouncilError> {
    let council = demos::seven_boom(config);

    for &n in numbers {
        if council.call_then(n, |said| !said.is_empty())? {
            println!("{} {}", n, "boom".red().bold());
        } else {
            println!("{n}");
        }
    }
    Ok(())
}
