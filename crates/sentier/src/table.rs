//! A router built from a route table.

use std::fmt::Write as _;
use std::sync::Arc;

use http::Method;
use sentier_router::{
    RouteContext, RouteRequest, RouteValues, RouterBuildError, RoutingError, TreeRouteBuilder,
    TreeRouter, VirtualPathContext, VirtualPathData,
};
use sentier_telemetry::MetricsRegistry;

use crate::config::RouteTableConfig;
use crate::endpoint::{AcceptLinks, Endpoint, EndpointHit};

/// A built router whose targets are recording [`Endpoint`]s.
#[derive(Debug)]
pub struct RouteTable {
    router: TreeRouter,
    endpoints: Vec<Arc<Endpoint>>,
}

impl RouteTable {
    /// Build a router with one endpoint per route definition.
    ///
    /// Endpoints are named after the route name, or the template for
    /// unnamed routes.
    pub fn build(
        config: &RouteTableConfig,
        metrics: Option<Arc<MetricsRegistry>>,
    ) -> Result<Self, RouterBuildError> {
        let mut endpoints = Vec::with_capacity(config.routes.len());
        let mut builder = TreeRouteBuilder::new(Arc::new(AcceptLinks));
        if let Some(metrics) = metrics {
            builder = builder.with_metrics(metrics);
        }

        for definition in &config.routes {
            let name = definition
                .name
                .clone()
                .unwrap_or_else(|| definition.template.clone());
            let endpoint = Arc::new(Endpoint::new(name, definition.template.clone()));
            builder.add_definition(definition, endpoint.clone())?;
            endpoints.push(endpoint);
        }

        Ok(Self {
            router: builder.build(config.version)?,
            endpoints,
        })
    }

    pub fn router(&self) -> &TreeRouter {
        &self.router
    }

    /// Route one request and report the endpoint that handled it.
    ///
    /// The endpoint is the innermost router recorded in the handled
    /// request's route data.
    pub async fn route(
        &self,
        method: Method,
        path: &str,
    ) -> Result<Option<EndpointHit>, RoutingError> {
        let mut context = RouteContext::new(RouteRequest::new(method, path));
        self.router.route(&mut context).await?;

        if !context.is_handled {
            return Ok(None);
        }
        let route_data = &context.route_data;
        Ok(route_data.routers.iter().rev().find_map(|router| {
            self.endpoints
                .iter()
                .find(|endpoint| endpoint.is(router))
                .map(|endpoint| endpoint.hit(route_data))
        }))
    }

    /// Generate a link, by route name when `name` is given.
    pub fn link(
        &self,
        name: Option<&str>,
        values: RouteValues,
        ambient: RouteValues,
    ) -> Option<VirtualPathData> {
        let mut context = VirtualPathContext::new(RouteRequest::get("/"), ambient, values);
        if let Some(name) = name {
            context = context.with_route_name(name);
        }
        self.router.get_virtual_path(&mut context)
    }

    /// Text dump of every matching tree, lowest order first.
    pub fn render_trees(&self) -> String {
        let mut out = String::new();
        for tree in self.router.trees() {
            let _ = write!(out, "{tree}");
        }
        out
    }
}
