//! Helpers for unit tests.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use sentier_template::RouteTemplate;

use crate::context::{HandlerError, RouteContext, VirtualPathContext, VirtualPathData};
use crate::entry::{LinkGenerationEntry, MatchingEntry};
use crate::router::Router;

/// Accepts every request and every set of link values.
#[derive(Debug, Default)]
pub(crate) struct AcceptAll;

impl Router for AcceptAll {
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

    fn virtual_path(&self, context: &mut VirtualPathContext) -> Option<VirtualPathData> {
        context.is_bound = true;
        None
    }
}

pub(crate) fn target() -> Arc<dyn Router> {
    Arc::new(AcceptAll)
}

pub(crate) fn template(text: &str) -> Arc<RouteTemplate> {
    Arc::new(RouteTemplate::parse(text).unwrap())
}

pub(crate) fn matching(text: &str, order: i32) -> MatchingEntry {
    MatchingEntry::new(template(text), target(), order)
}

pub(crate) fn generating(text: &str) -> LinkGenerationEntry {
    LinkGenerationEntry::new(template(text), target())
}
