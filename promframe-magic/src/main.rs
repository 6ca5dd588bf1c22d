//! `promq` — run a Prometheus cell command from the shell.
//!
//! The argument line follows the command name; the expression is read from
//! stdin:
//!
//! ```text
//! echo 'rate(node_cpu_seconds_total[5m])' | promq prometheus_query_range_now http://localhost:9090 1h 1m
//! ```
//!
//! # Environment variables
//! | Var                           | Default |
//! |-------------------------------|---------|
//! | `PROMETHEUS_REQUEST_TIMEOUT`  | unset   |
//! | `PROMETHEUS_CONNECT_TIMEOUT`  | unset   |
//! | `RUST_LOG`                    | `promframe=info,promframe_magic=info` |

use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;
use promframe::ClientConfig;
use promframe_magic::{Command, HttpConnector, Magics};

#[derive(Parser)]
#[command(name = "promq", version, about = "Run Prometheus cell commands from the shell")]
struct Cli {
    /// prometheus_query, prometheus_query_range or prometheus_query_range_now
    command: Command,

    /// Argument line for the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    line: Vec<String>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("promframe=info".parse()?)
                .add_directive("promframe_magic=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut cell = String::new();
    std::io::stdin()
        .read_to_string(&mut cell)
        .context("failed to read the query expression from stdin")?;

    let config = ClientConfig::from_env().context("invalid PROMETHEUS_* configuration")?;
    let mut magics = Magics::new(HttpConnector::new(config));

    match magics.run(cli.command, &cli.line.join(" "), &cell)? {
        Some(result) => print!("{result}"),
        None => {
            for (name, result) in magics.namespace() {
                println!("{name} ({}):", result.result_type());
                print!("{result}");
            }
        }
    }

    Ok(())
}
