use sentier_template::TemplateError;
use thiserror::Error;

use crate::context::HandlerError;

/// Errors raised while compiling route definitions or building a router.
#[derive(Debug, Error)]
pub enum RouterBuildError {
    #[error("invalid route template '{template}': {source}")]
    Template {
        template: String,
        #[source]
        source: TemplateError,
    },

    #[error("unknown route constraint '{0}'")]
    UnknownConstraint(String),

    #[error("invalid argument for constraint '{name}': {reason}")]
    InvalidConstraintArgument { name: String, reason: String },

    /// Two link generation entries share a name but not a template.
    #[error("route name '{name}' is used by both '{first}' and '{second}'")]
    DuplicateRouteName {
        name: String,
        first: String,
        second: String,
    },

    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),
}

/// Errors surfaced while routing a request.
///
/// Failing to match is not an error; the context is simply left unhandled.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The target router of a matched entry failed.
    #[error("route handler failed: {0}")]
    Handler(#[source] HandlerError),
}
