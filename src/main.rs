//! JSON File Server
//!
//! Serves JSON files in a RESTful manner.

use clap::{Arg, ArgAction, ArgGroup, Command};
use json_file_server::api::start_server;
use json_file_server::core::config::{parse_duration, RouteConfig};
use json_file_server::core::logging;
use json_file_server::{Config, Error, Result};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = command().get_matches();

    let mut config = Config::load(matches.get_one::<String>("config").map(String::as_str))?;
    apply_cli_overrides(&mut config, &matches)?;
    config.validate()?;

    logging::init(&config.logging);

    info!("Starting {} v{}", json_file_server::NAME, json_file_server::VERSION);
    if config.routes.is_empty() {
        warn!("No routes configured; every request will be answered with 404");
    }

    start_server(&config, shutdown_signal()).await?;

    info!("Shutdown complete");
    Ok(())
}

fn command() -> Command {
    Command::new("json-file-server")
        .version(json_file_server::VERSION)
        .about("Serves JSON files in a RESTful manner.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path (TOML)"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PORT_NUMBER")
                .help("Which port to serve on"),
        )
        .arg(
            Arg::new("route")
                .long("route")
                .num_args(2)
                .value_names(["PATH", "FILE"])
                .action(ArgAction::Append)
                .help("Add a route under PATH serving the json in FILE"),
        )
        .arg(
            Arg::new("raw-route")
                .long("raw-route")
                .num_args(2)
                .value_names(["PATH", "FILE"])
                .action(ArgAction::Append)
                .help("Add a route under PATH serving the json in FILE directly"),
        )
        .arg(
            Arg::new("id-field")
                .long("id-field")
                .value_name("NAME")
                .default_value("id")
                .help("Identity field for routes added with --route"),
        )
        .arg(
            Arg::new("base-path")
                .long("base-path")
                .value_name("PATH")
                .help("Prepend every route with PATH"),
        )
        .arg(
            Arg::new("paginated")
                .long("paginated")
                .action(ArgAction::SetTrue)
                .help("Paginate responses (default false)"),
        )
        .arg(
            Arg::new("page-one-indexed")
                .long("page-one-indexed")
                .action(ArgAction::SetTrue)
                .help("Pages start at 1 (default 0)"),
        )
        .arg(
            Arg::new("page-request-location")
                .long("page-request-location")
                .value_name("LOCATION")
                .help("Where to find page params 'page' and 'size', either 'query-param' or 'header'"),
        )
        .arg(
            Arg::new("page-response-location")
                .long("page-response-location")
                .value_name("LOCATION")
                .help("Where to send page attributes, either 'body' or 'header'"),
        )
        .arg(
            Arg::new("default-page-size")
                .long("default-page-size")
                .value_name("SIZE")
                .help("Default pagination size (default 20)"),
        )
        .arg(Arg::new("debug").long("debug").action(ArgAction::SetTrue).help("Log level debug"))
        .arg(Arg::new("info").long("info").action(ArgAction::SetTrue).help("Log level info"))
        .arg(Arg::new("error").long("error").action(ArgAction::SetTrue).help("Log level error"))
        .group(ArgGroup::new("log-level").args(["debug", "info", "error"]).multiple(false))
        .arg(
            Arg::new("fake-load")
                .long("fake-load")
                .value_name("DURATION")
                .help("Time to wait before returning each call, e.g. 500ms or 2s"),
        )
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &clap::ArgMatches) -> Result<()> {
    if let Some(port) = matches.get_one::<String>("port") {
        config.server.port = port
            .parse()
            .ok()
            .filter(|port| *port > 0)
            .ok_or_else(|| Error::config(format!("Invalid port: {}", port)))?;
    }

    let id_field = matches
        .get_one::<String>("id-field")
        .cloned()
        .unwrap_or_else(|| "id".to_string());
    for pair in route_pairs(matches, "route") {
        config.routes.push(RouteConfig::collection(pair.0, pair.1, id_field.as_str()));
    }
    for pair in route_pairs(matches, "raw-route") {
        config.routes.push(RouteConfig::raw(pair.0, pair.1));
    }

    if let Some(base_path) = matches.get_one::<String>("base-path") {
        config.server.base_path = base_path.clone();
    }

    if matches.get_flag("paginated") {
        config.pagination.enabled = true;
    }

    if matches.get_flag("page-one-indexed") {
        config.pagination.one_indexed = true;
    }

    if let Some(location) = matches.get_one::<String>("page-request-location") {
        config.pagination.request_location = location.parse()?;
    }

    if let Some(location) = matches.get_one::<String>("page-response-location") {
        config.pagination.response_location = location.parse()?;
    }

    if let Some(size) = matches.get_one::<String>("default-page-size") {
        config.pagination.default_page_size = size
            .parse()
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| Error::config(format!("Invalid default page size: {}", size)))?;
    }

    for level in ["debug", "info", "error"] {
        if matches.get_flag(level) {
            config.logging.level = level.to_string();
        }
    }

    if let Some(fake_load) = matches.get_one::<String>("fake-load") {
        config.server.fake_load = parse_duration(fake_load)
            .map_err(|e| Error::config(format!("Invalid fake load: {}", e)))?;
    }

    Ok(())
}

/// `(PATH, FILE)` pairs given to a two-value repeatable flag
fn route_pairs(matches: &clap::ArgMatches, name: &str) -> Vec<(String, String)> {
    let values: Vec<String> = matches
        .get_many::<String>(name)
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    values
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
