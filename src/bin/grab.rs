//! Fetch an article and print the extraction result as JSON.
//!
//! Usage: `grab <url> [rules.json]`
//!
//! `rules.json` maps host keys to rule sets, e.g.
//! `{".example.com": {"body": ["//article"]}}`. Logging goes to stderr and
//! is controlled with `RUST_LOG`.

use rs_fulltext::{Grabber, Options, ReqwestFetcher, RuleRegistry};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rs_fulltext=info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        eprintln!("usage: grab <url> [rules.json]");
        std::process::exit(2);
    };

    let registry = match args.next() {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => match RuleRegistry::from_json(&json) {
                Ok(registry) => registry,
                Err(err) => {
                    eprintln!("{path}: {err}");
                    std::process::exit(2);
                }
            },
            Err(err) => {
                eprintln!("{path}: {err}");
                std::process::exit(2);
            }
        },
        None => RuleRegistry::new(),
    };

    let fetcher = match ReqwestFetcher::new() {
        Ok(fetcher) => fetcher,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let grabber = Grabber::new(fetcher, registry, Options::default());
    match grabber.grab(&url).await {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("failed to serialize result: {err}");
                std::process::exit(1);
            }
        },
        Err(err) => {
            eprintln!("{url}: {err}");
            std::process::exit(1);
        }
    }
}
