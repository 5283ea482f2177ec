//! Sprout — service entry point.
//!
//! Startup sequence:
//!   1. Parse CLI flags
//!   2. Init logger (RUST_LOG wins unless -v flags are given)
//!   3. Load the environment file into a config snapshot (file is optional)
//!   4. Build the container and bind the listener
//!   5. Print the startup confirmation
//!   6. Serve until Ctrl-C

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use sprout::config::{self, Config};
use sprout::error::AppError;
use sprout::logger;
use sprout::server::Server;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let args = parse_cli_args();

    let level = args.log_level.unwrap_or("info");
    logger::init(level, args.log_level.is_some())?;

    let env_file = args.env_file.as_deref().unwrap_or(config::DEFAULT_ENV_FILE);
    let config = Arc::new(Config::load(Path::new(env_file)));

    info!(
        env_file,
        keys = config.len(),
        port = config.port(),
        "configuration loaded"
    );

    // Shared shutdown token: Ctrl-C cancels it, the serve loop watches it.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    let server = Server::bind(config).await?;

    println!(
        "✓ Server running on http://localhost:{}",
        server.local_addr().port()
    );

    server.serve(shutdown).await
}

struct CliArgs {
    log_level: Option<&'static str>,
    env_file: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut env_file = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: sprout [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help               Print help");
                println!(
                    "  -f, --env-file <PATH>    Environment file to load (default: {})",
                    config::DEFAULT_ENV_FILE
                );
                println!("  -v, -vv, -vvv, -vvvv     Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--env-file" => {
                if let Some(path) = iter.next() {
                    env_file = Some(path);
                } else {
                    eprintln!("error: -f/--env-file requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    // Each -v raises verbosity one tier from the "info" default:
    //   -v      → warn   (suppress info noise, show warnings+errors only)
    //   -vv     → info   (normal operational output)
    //   -vvv    → debug  (flow-level diagnostics)
    //   -vvvv+  → trace  (full payload dumps, very verbose)
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs {
        log_level,
        env_file,
    }
}
