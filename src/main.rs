use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;
use tracing::Level;
use phrase_assert::{get_validation, parse_phrase, ValidationOptions};

/// Check a received value against an expected one using a phrase.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Validation phrase, e.g. "to not be above"
    phrase: String,
    /// Received value as JSON; anything that is not JSON is taken as a string
    #[arg(required_unless_present = "parse")]
    received: Option<String>,
    /// Expected value, same rules as RECEIVED
    #[arg(required_unless_present = "parse")]
    expected: Option<String>,
    /// Report failures as soft (exit code 2)
    #[arg(long)]
    soft: bool,
    /// Only resolve the phrase and print what it captured
    #[arg(long)]
    parse: bool,
    /// Log phrase resolution and dispatch to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn json_or_string(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    if args.parse {
        return match parse_phrase(&args.phrase) {
            Ok(found) => {
                println!(
                    "keyword: {}\nmatcher: {}\nreverse: {}\nsoft: {}",
                    found.keyword.literal(),
                    found.keyword.matcher_name(),
                    found.reverse,
                    found.soft
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{e}");
                ExitCode::FAILURE
            }
        };
    }

    let validation = match get_validation(&args.phrase, ValidationOptions { soft: args.soft }) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let received = json_or_string(args.received.as_deref().unwrap_or_default());
    let expected = json_or_string(args.expected.as_deref().unwrap_or_default());
    match validation.verify(received, expected) {
        Ok(()) => {
            println!("ok");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let label = e.failure().map(|f| f.name()).unwrap_or("Error");
            eprintln!("[{label}] {e}");
            if e.is_soft() { ExitCode::from(2) } else { ExitCode::FAILURE }
        }
    }
}
