//! Cell commands bound to a session namespace.

use std::collections::HashMap;
use std::fmt;

use anyhow::{bail, Context, Result};
use promframe::{ClientConfig, HttpTransport, PrometheusClient, QueryResult, Transport};
use tracing::debug;

use crate::args::{
    duration_arg, parse_line, timestamp_arg, QueryArgs, QueryRangeArgs, QueryRangeNowArgs,
};

/// Variables bound by cell commands.
pub type Namespace = HashMap<String, QueryResult>;

// ------------------------------------------------------------------ //
//  Commands                                                           //
// ------------------------------------------------------------------ //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Query,
    QueryRange,
    QueryRangeNow,
}

impl Command {
    pub const ALL: [Command; 3] = [Command::Query, Command::QueryRange, Command::QueryRangeNow];

    pub fn as_str(self) -> &'static str {
        match self {
            Command::Query => "prometheus_query",
            Command::QueryRange => "prometheus_query_range",
            Command::QueryRangeNow => "prometheus_query_range_now",
        }
    }
}

impl std::str::FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match Command::ALL.into_iter().find(|c| c.as_str() == s) {
            Some(command) => Ok(command),
            None => bail!("unknown command '{s}'"),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ------------------------------------------------------------------ //
//  Connectors                                                         //
// ------------------------------------------------------------------ //

/// Opens a client for the URL named on a command line.
pub trait Connect {
    type Transport: Transport;

    fn connect(&self, url: &str) -> promframe::Result<PrometheusClient<Self::Transport>>;
}

/// Connects over HTTP, reusing every setting of `config` except the URL.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    pub config: ClientConfig,
}

impl HttpConnector {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl Connect for HttpConnector {
    type Transport = HttpTransport;

    fn connect(&self, url: &str) -> promframe::Result<PrometheusClient<HttpTransport>> {
        let config = ClientConfig {
            api_url: url.to_string(),
            ..self.config.clone()
        };
        PrometheusClient::with_config(&config)
    }
}

// ------------------------------------------------------------------ //
//  Session                                                            //
// ------------------------------------------------------------------ //

/// Runs cell commands and keeps the variables they bind.
pub struct Magics<C: Connect = HttpConnector> {
    connector: C,
    namespace: Namespace,
}

impl<C: Connect> Magics<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            namespace: Namespace::new(),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn namespace_mut(&mut self) -> &mut Namespace {
        &mut self.namespace
    }

    /// Run `command` with its argument `line` and the expression in `cell`.
    ///
    /// When the line names an output variable the result is bound there and
    /// `None` is returned; otherwise the result is returned.
    pub fn run(&mut self, command: Command, line: &str, cell: &str) -> Result<Option<QueryResult>> {
        let expr = cell.trim();
        debug!(%command, expr, "running cell command");

        let (output, result) = match command {
            Command::Query => {
                let args: QueryArgs = parse_line(command.as_str(), line)?;
                let client = self.client(&args.url)?;
                let result = client.query(
                    expr,
                    args.time.as_deref().map(timestamp_arg),
                    args.timeout.as_deref().map(duration_arg),
                );
                (args.output, result)
            }
            Command::QueryRange => {
                let args: QueryRangeArgs = parse_line(command.as_str(), line)?;
                let client = self.client(&args.url)?;
                let result = client.query_range(
                    expr,
                    timestamp_arg(&args.start),
                    timestamp_arg(&args.end),
                    duration_arg(&args.step),
                    args.timeout.as_deref().map(duration_arg),
                );
                (args.output, result)
            }
            Command::QueryRangeNow => {
                let args: QueryRangeNowArgs = parse_line(command.as_str(), line)?;
                let client = self.client(&args.url)?;
                let result = client.query_range_now(
                    expr,
                    duration_arg(&args.duration),
                    duration_arg(&args.step),
                    args.timeout.as_deref().map(duration_arg),
                );
                (args.output, result)
            }
        };

        let result = result.with_context(|| format!("{command} failed"))?;
        Ok(self.bind(output, result))
    }

    fn client(&self, url: &str) -> Result<PrometheusClient<C::Transport>> {
        self.connector
            .connect(url)
            .with_context(|| format!("cannot connect to {url}"))
    }

    fn bind(&mut self, output: Option<String>, result: QueryResult) -> Option<QueryResult> {
        match output {
            Some(name) => {
                debug!(name = %name, "binding query result");
                self.namespace.insert(name, result);
                None
            }
            None => Some(result),
        }
    }
}
