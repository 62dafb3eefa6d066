//! Request and link generation contexts passed through the router chain.

use std::fmt;
use std::sync::Arc;

use http::Method;
use sentier_template::RouteValues;

use crate::router::Router;

/// Error type returned by target routers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Route value key carrying the route group of the entry that generated a link.
pub const ROUTE_GROUP_KEY: &str = "!__route_group";

/// The parts of an incoming request the router looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub method: Method,
    pub path: String,
}

impl RouteRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    /// A `GET` request for `path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }
}

/// Values and routers accumulated while a request is routed.
#[derive(Clone, Default)]
pub struct RouteData {
    pub values: RouteValues,
    /// Routers the request passed through, outermost first.
    pub routers: Vec<Arc<dyn Router>>,
}

impl RouteData {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for RouteData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteData")
            .field("values", &self.values)
            .field("routers", &self.routers.len())
            .finish()
    }
}

/// Per-request routing state.
#[derive(Debug)]
pub struct RouteContext {
    request: RouteRequest,
    pub route_data: RouteData,
    /// Set by a target router that accepted the request.
    pub is_handled: bool,
}

impl RouteContext {
    pub fn new(request: RouteRequest) -> Self {
        Self {
            request,
            route_data: RouteData::new(),
            is_handled: false,
        }
    }

    pub fn request(&self) -> &RouteRequest {
        &self.request
    }
}

/// Input and output of a link generation call.
#[derive(Debug, Clone)]
pub struct VirtualPathContext {
    request: RouteRequest,
    ambient_values: RouteValues,
    values: RouteValues,
    route_name: Option<String>,
    /// Values handed to a downstream router by the entry being generated.
    pub provided_values: Option<RouteValues>,
    /// Set when the values were accepted for generation.
    pub is_bound: bool,
}

impl VirtualPathContext {
    pub fn new(request: RouteRequest, ambient_values: RouteValues, values: RouteValues) -> Self {
        Self {
            request,
            ambient_values,
            values,
            route_name: None,
            provided_values: None,
            is_bound: false,
        }
    }

    pub fn with_route_name(mut self, name: impl Into<String>) -> Self {
        self.route_name = Some(name.into());
        self
    }

    pub fn request(&self) -> &RouteRequest {
        &self.request
    }

    /// Values of the current request.
    pub fn ambient_values(&self) -> &RouteValues {
        &self.ambient_values
    }

    /// Values supplied explicitly by the caller.
    pub fn values(&self) -> &RouteValues {
        &self.values
    }

    pub fn route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }

    /// A context for a downstream router, carrying `provided` values.
    pub(crate) fn child(&self, values: RouteValues, provided: RouteValues) -> Self {
        Self {
            request: self.request.clone(),
            ambient_values: self.ambient_values.clone(),
            values,
            route_name: self.route_name.clone(),
            provided_values: Some(provided),
            is_bound: false,
        }
    }
}

/// A generated path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualPathData {
    pub path: String,
    /// Template text of the entry that produced the path, when known.
    pub template: Option<String>,
}

impl VirtualPathData {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            template: None,
        }
    }
}
