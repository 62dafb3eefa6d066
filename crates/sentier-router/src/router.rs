use futures_util::future::BoxFuture;

use crate::context::{HandlerError, RouteContext, VirtualPathContext, VirtualPathData};

/// A node in the routing chain.
///
/// Target routers receive a request after its values were bound and mark
/// `context.is_handled` when they accept it. Link generation asks the same
/// routers to confirm or produce a path.
pub trait Router: Send + Sync {
    fn route_async<'a>(
        &'a self,
        context: &'a mut RouteContext,
    ) -> BoxFuture<'a, Result<(), HandlerError>>;

    /// Generate a path, or return `None` and leave `context.is_bound` to say
    /// whether the provided values are acceptable.
    fn virtual_path(&self, context: &mut VirtualPathContext) -> Option<VirtualPathData>;
}
