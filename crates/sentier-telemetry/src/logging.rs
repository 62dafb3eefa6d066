//! Structured logging with JSON or pretty output.
//!
//! Logs go to stderr so command output on stdout stays machine readable.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// Sets up tracing-subscriber with either JSON or pretty format,
/// respecting the configured log level.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter),
    }
}

fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

fn init_pretty_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .pretty()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Standard log event names.
pub mod events {
    /// Process is starting up.
    pub const STARTUP: &str = "startup";

    /// Route table has been loaded from disk.
    pub const ROUTES_LOADED: &str = "routes_loaded";

    /// A tree router has been built.
    pub const ROUTER_BUILT: &str = "router_built";

    /// A request matched an entry and was handled.
    pub const ROUTE_MATCHED: &str = "route_matched";

    /// No entry handled the request.
    pub const ROUTE_NOT_FOUND: &str = "route_not_found";

    /// A constraint rejected a route value.
    pub const CONSTRAINT_REJECTED: &str = "constraint_rejected";

    /// A virtual path was generated.
    pub const LINK_GENERATED: &str = "link_generated";

    /// No entry could generate a virtual path.
    pub const LINK_GENERATION_FAILED: &str = "link_generation_failed";

    /// A target router returned an error.
    pub const HANDLER_ERROR: &str = "handler_error";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_startup {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::STARTUP,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_routes_loaded {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::ROUTES_LOADED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_router_built {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::ROUTER_BUILT,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_route_matched {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::ROUTE_MATCHED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_route_not_found {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::ROUTE_NOT_FOUND,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_constraint_rejected {
    ($($field:tt)*) => {
        tracing::trace!(
            event = $crate::logging::events::CONSTRAINT_REJECTED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_link_generated {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::LINK_GENERATED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_link_generation_failed {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::LINK_GENERATION_FAILED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_handler_error {
    ($($field:tt)*) => {
        tracing::warn!(
            event = $crate::logging::events::HANDLER_ERROR,
            $($field)*
        )
    };
}
