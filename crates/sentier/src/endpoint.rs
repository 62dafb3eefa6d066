//! Targets used by the route table tool.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use sentier_router::{
    HandlerError, RouteContext, RouteData, RouteValues, Router, VirtualPathContext,
    VirtualPathData,
};

/// What an [`Endpoint`] saw when it handled a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointHit {
    pub endpoint: String,
    pub template: String,
    pub values: RouteValues,
}

/// Terminal route target: handles every request it receives.
///
/// Endpoints keep no per-request state; the handling endpoint is recovered
/// from the request's route data.
#[derive(Debug)]
pub struct Endpoint {
    name: String,
    template: String,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }

    /// Whether `router` is this endpoint.
    pub fn is(&self, router: &Arc<dyn Router>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(router), self as *const Self)
    }

    /// The hit for a request that reached this endpoint with `route_data`.
    pub fn hit(&self, route_data: &RouteData) -> EndpointHit {
        EndpointHit {
            endpoint: self.name.clone(),
            template: self.template.clone(),
            values: route_data.values.clone(),
        }
    }
}

impl Router for Endpoint {
    fn route_async<'a>(
        &'a self,
        context: &'a mut RouteContext,
    ) -> BoxFuture<'a, Result<(), HandlerError>> {
        async move {
            context.is_handled = true;
            Ok(())
        }
        .boxed()
    }

    fn virtual_path(&self, _context: &mut VirtualPathContext) -> Option<VirtualPathData> {
        None
    }
}

/// Link generation receiver that accepts every binding.
#[derive(Debug, Default)]
pub struct AcceptLinks;

impl Router for AcceptLinks {
    fn route_async<'a>(
        &'a self,
        _context: &'a mut RouteContext,
    ) -> BoxFuture<'a, Result<(), HandlerError>> {
        async { Ok(()) }.boxed()
    }

    fn virtual_path(&self, context: &mut VirtualPathContext) -> Option<VirtualPathData> {
        context.is_bound = true;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentier_router::RouteRequest;

    #[tokio::test]
    async fn endpoint_handles_and_reports_hit() {
        let endpoint = Arc::new(Endpoint::new("product", "api/Products/{id}"));
        let other: Arc<dyn Router> = Arc::new(Endpoint::new("other", "other"));

        let mut context = RouteContext::new(RouteRequest::get("/api/Products/5"));
        context.route_data.values.insert("id", "5");
        endpoint.route_async(&mut context).await.unwrap();
        assert!(context.is_handled);

        let as_router: Arc<dyn Router> = endpoint.clone();
        assert!(endpoint.is(&as_router));
        assert!(!endpoint.is(&other));

        let hit = endpoint.hit(&context.route_data);
        assert_eq!(hit.endpoint, "product");
        assert_eq!(hit.template, "api/Products/{id}");
        assert_eq!(hit.values.get("id"), Some("5"));
    }

    #[test]
    fn accept_links_binds() {
        let mut context = VirtualPathContext::new(
            RouteRequest::get("/"),
            RouteValues::new(),
            RouteValues::new(),
        );
        assert!(AcceptLinks.virtual_path(&mut context).is_none());
        assert!(context.is_bound);
    }
}
