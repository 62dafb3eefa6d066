//! Sentier route table tool.
//!
//! Loads a route table and matches requests, generates links or dumps the
//! matching trees.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use http::Method;
use serde::Serialize;

use sentier_lib::config::RouteTableConfig;
use sentier_lib::table::RouteTable;
use sentier_router::RouteValues;
use sentier_telemetry::{log_routes_loaded, log_startup, LogFormat, Telemetry, TelemetryConfig};

/// Exit code when nothing matched or no link could be generated.
const NO_MATCH: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "sentier", about = "Sentier route table tool", version)]
struct Cli {
    /// Route table file (YAML or JSON).
    #[arg(short, long, env = "SENTIER_ROUTES")]
    routes: PathBuf,

    /// Log level.
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Log format (json or pretty).
    #[arg(long, default_value = "json", value_parser = parse_log_format)]
    log_format: LogFormat,

    /// Print Prometheus metrics after the command.
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Route a request path and print the endpoint that handled it.
    Match {
        /// Request path, e.g. /api/Products/5.
        path: String,

        /// Request method.
        #[arg(short, long, default_value = "GET", value_parser = parse_method)]
        method: Method,
    },

    /// Generate a link from route values.
    Link {
        /// Only try the route with this name.
        #[arg(short, long)]
        name: Option<String>,

        /// Explicit route value (key=value), repeatable.
        #[arg(long = "value", value_parser = parse_pair)]
        values: Vec<(String, String)>,

        /// Ambient route value of the current request (key=value), repeatable.
        #[arg(long = "ambient", value_parser = parse_pair)]
        ambient: Vec<(String, String)>,
    },

    /// Print the matching trees.
    Tree,
}

#[derive(Serialize)]
struct MatchOutput<'a> {
    endpoint: &'a str,
    template: &'a str,
    values: &'a RouteValues,
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    LogFormat::parse(s).ok_or_else(|| format!("unknown log format '{}' (json or pretty)", s))
}

fn parse_method(s: &str) -> Result<Method, String> {
    Method::from_bytes(s.to_ascii_uppercase().as_bytes())
        .map_err(|_| format!("invalid HTTP method '{}'", s))
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

fn to_values(pairs: &[(String, String)]) -> RouteValues {
    pairs
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}

/// Load the route table and build its router.
fn load_table(path: &Path, telemetry: &Telemetry) -> Result<RouteTable, String> {
    let config = RouteTableConfig::load(path).map_err(|e| e.to_string())?;

    log_routes_loaded!(
        path = %path.display(),
        version = config.version,
        routes = config.routes.len(),
        "Route table loaded"
    );

    RouteTable::build(&config, Some(telemetry.metrics_clone()))
        .map_err(|e| format!("failed to build router from {}: {}", path.display(), e))
}

/// Run the match command.
async fn run_match(table: &RouteTable, method: Method, path: &str) -> ExitCode {
    match table.route(method.clone(), path).await {
        Ok(Some(hit)) => {
            let output = MatchOutput {
                endpoint: &hit.endpoint,
                template: &hit.template,
                values: &hit.values,
            };
            match serde_json::to_string_pretty(&output) {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: failed to serialize match: {}", e);
                    ExitCode::from(1)
                }
            }
        }
        Ok(None) => {
            eprintln!("no route matched {} {}", method, path);
            ExitCode::from(NO_MATCH)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Run the link command.
fn run_link(
    table: &RouteTable,
    name: Option<&str>,
    values: &[(String, String)],
    ambient: &[(String, String)],
) -> ExitCode {
    match table.link(name, to_values(values), to_values(ambient)) {
        Some(data) => {
            println!("{}", data.path);
            ExitCode::SUCCESS
        }
        None => {
            match name {
                Some(name) => eprintln!("no link generated for route '{}'", name),
                None => eprintln!("no link generated"),
            }
            ExitCode::from(NO_MATCH)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = TelemetryConfig::new()
        .with_log_level(cli.log_level.as_str())
        .with_log_format(cli.log_format);
    let telemetry = match Telemetry::init(config) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    log_startup!(
        service = %telemetry.config().service_name,
        version = env!("CARGO_PKG_VERSION"),
        "Starting sentier"
    );

    let table = match load_table(&cli.routes, &telemetry) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let code = match cli.command {
        Commands::Match { path, method } => run_match(&table, method, &path).await,
        Commands::Link {
            name,
            values,
            ambient,
        } => run_link(&table, name.as_deref(), &values, &ambient),
        Commands::Tree => {
            print!("{}", table.render_trees());
            ExitCode::SUCCESS
        }
    };

    if cli.metrics {
        print!("{}", telemetry.render_prometheus());
    }

    code
}
