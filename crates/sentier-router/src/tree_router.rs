//! The route group coordinator.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::{BoxFuture, FutureExt};
use sentier_telemetry::{
    log_handler_error, log_link_generated, log_link_generation_failed, log_route_matched,
    log_route_not_found, MetricsRegistry,
};
use sentier_template::{eq_ignore_case, fold_case, PathTokens, RouteValues};

use crate::constraints::{matches_all, RouteDirection};
use crate::context::{
    HandlerError, RouteContext, RouteData, VirtualPathContext, VirtualPathData, ROUTE_GROUP_KEY,
};
use crate::decision_tree::LinkGenerationDecisionTree;
use crate::entry::{LinkGenerationEntry, MatchingEntry};
use crate::error::{RouterBuildError, RoutingError};
use crate::router::Router;
use crate::tree::UrlMatchingTree;

/// Routes requests through a forest of matching trees and generates links
/// from a decision tree. Immutable once built.
pub struct TreeRouter {
    next: Arc<dyn Router>,
    trees: Vec<UrlMatchingTree>,
    link_generation_tree: LinkGenerationDecisionTree,
    named_entries: HashMap<String, Arc<LinkGenerationEntry>>,
    version: i32,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl TreeRouter {
    /// Create a router over `trees` and `link_entries`.
    ///
    /// Named link entries are indexed case-insensitively. A second entry with
    /// the same name and the same template is ignored; a different template
    /// is an error.
    pub fn new(
        next: Arc<dyn Router>,
        mut trees: Vec<UrlMatchingTree>,
        link_entries: Vec<LinkGenerationEntry>,
        version: i32,
    ) -> Result<Self, RouterBuildError> {
        trees.sort_by_key(UrlMatchingTree::order);

        let link_entries: Vec<_> = link_entries.into_iter().map(Arc::new).collect();

        let mut named_entries: HashMap<String, Arc<LinkGenerationEntry>> = HashMap::new();
        for entry in &link_entries {
            let Some(name) = &entry.route_name else {
                continue;
            };
            match named_entries.get(&fold_case(name)) {
                Some(existing)
                    if !eq_ignore_case(existing.template_text(), entry.template_text()) =>
                {
                    return Err(RouterBuildError::DuplicateRouteName {
                        name: name.clone(),
                        first: existing.template_text().to_string(),
                        second: entry.template_text().to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    named_entries.insert(fold_case(name), Arc::clone(entry));
                }
            }
        }

        Ok(Self {
            next,
            trees,
            link_generation_tree: LinkGenerationDecisionTree::new(&link_entries),
            named_entries,
            version,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Version stamp given at construction.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Matching trees in ascending order.
    pub fn trees(&self) -> &[UrlMatchingTree] {
        &self.trees
    }

    /// Route a request.
    ///
    /// Trees are tried in ascending order and candidates within a tree in
    /// precedence order. A candidate whose constraints reject its values is
    /// skipped and the walk continues. The first candidate whose target marks
    /// the context handled wins; otherwise the context is left unhandled.
    /// Route data is restored after every candidate that does not handle the
    /// request, including when its target fails.
    pub async fn route(&self, context: &mut RouteContext) -> Result<(), RoutingError> {
        let started = Instant::now();
        let tokens = PathTokens::new(&context.request().path);
        let mut candidates = 0usize;

        for tree in &self.trees {
            for entry in tree.matches(&tokens) {
                candidates += 1;

                let Some(values) = entry.matcher.match_tokens(&tokens) else {
                    continue;
                };

                let mut route_data = context.route_data.clone();
                route_data.routers.push(Arc::clone(&entry.target));
                route_data.values.merge(&values);

                if !matches_all(
                    &entry.constraints,
                    context.request(),
                    &route_data.values,
                    RouteDirection::IncomingRequest,
                    self.metrics.as_deref(),
                ) {
                    continue;
                }

                match dispatch(context, entry, route_data).await {
                    Ok(true) => {
                        log_route_matched!(
                            path = %context.request().path,
                            template = entry.template_text(),
                            order = tree.order(),
                            route_name = entry.route_name.as_deref().unwrap_or_default(),
                            candidates,
                            "Request matched route"
                        );
                        self.record_route("matched", candidates, started);
                        return Ok(());
                    }
                    Ok(false) => {}
                    Err(e) => {
                        log_handler_error!(
                            path = %context.request().path,
                            template = entry.template_text(),
                            error = %e,
                            "Route target failed"
                        );
                        self.record_route("error", candidates, started);
                        return Err(RoutingError::Handler(e));
                    }
                }
            }
        }

        log_route_not_found!(
            path = %context.request().path,
            candidates,
            "No route handled the request"
        );
        self.record_route("not_found", candidates, started);
        Ok(())
    }

    fn record_route(&self, outcome: &str, candidates: usize, started: Instant) {
        if let Some(metrics) = &self.metrics {
            metrics.record_route(outcome, candidates, started.elapsed().as_secs_f64());
        }
    }

    /// Generate a path.
    ///
    /// With a route name only the entry of that name is tried; there is no
    /// fallback to unnamed entries. Without one, decision tree candidates are
    /// tried in order and the first that generates wins. Marks the context
    /// bound on success.
    pub fn get_virtual_path(&self, context: &mut VirtualPathContext) -> Option<VirtualPathData> {
        let named = context.route_name().is_some();

        let generated = {
            let context: &VirtualPathContext = context;
            match context.route_name() {
                Some(name) => self
                    .named_entries
                    .get(&fold_case(name))
                    .and_then(|entry| self.generate_virtual_path(context, entry)),
                None => self
                    .link_generation_tree
                    .get_matches(context)
                    .iter()
                    .find_map(|candidate| self.generate_virtual_path(context, &candidate.entry)),
            }
        };

        match &generated {
            Some(data) => {
                context.is_bound = true;
                log_link_generated!(
                    path = %data.path,
                    template = data.template.as_deref().unwrap_or_default(),
                    route_name = context.route_name().unwrap_or_default(),
                    "Link generated"
                );
            }
            None => {
                log_link_generation_failed!(
                    route_name = context.route_name().unwrap_or_default(),
                    values = ?context.values(),
                    "No route could generate a link"
                );
            }
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_link_generation(named, generated.is_some());
        }

        generated
    }

    fn generate_virtual_path(
        &self,
        context: &VirtualPathContext,
        entry: &LinkGenerationEntry,
    ) -> Option<VirtualPathData> {
        // Required link values select the entry; only those that are also
        // template parameters are data for the path.
        let input: RouteValues = context
            .values()
            .iter()
            .filter(|(key, _)| {
                !entry.required_link_values.contains_key(key)
                    || entry.template.parameter(key).is_some()
            })
            .collect();

        let result = entry.binder.get_values(context.ambient_values(), &input)?;

        if !matches_all(
            &entry.constraints,
            context.request(),
            &result.combined_values,
            RouteDirection::UrlGeneration,
            self.metrics.as_deref(),
        ) {
            return None;
        }

        let mut provided = result.accepted_values.clone();
        if let Some(group) = &entry.route_group {
            provided.insert(ROUTE_GROUP_KEY, group.as_str());
        }

        let mut child = context.child(context.values().clone(), provided);
        if let Some(data) = self.next.virtual_path(&mut child) {
            return Some(data);
        }
        if !child.is_bound {
            return None;
        }

        let path = entry.binder.bind_values(&result.accepted_values)?;
        Some(VirtualPathData {
            path,
            template: Some(entry.template_text().to_string()),
        })
    }
}

impl Router for TreeRouter {
    fn route_async<'a>(
        &'a self,
        context: &'a mut RouteContext,
    ) -> BoxFuture<'a, Result<(), HandlerError>> {
        async move { self.route(context).await.map_err(HandlerError::from) }.boxed()
    }

    fn virtual_path(&self, context: &mut VirtualPathContext) -> Option<VirtualPathData> {
        self.get_virtual_path(context)
    }
}

/// Install `route_data`, run the entry's target and report whether it
/// handled the request.
async fn dispatch(
    context: &mut RouteContext,
    entry: &MatchingEntry,
    route_data: RouteData,
) -> Result<bool, HandlerError> {
    let mut scope = RouteDataScope::enter(context, route_data);
    entry.target.route_async(scope.context()).await?;
    Ok(scope.context().is_handled)
}

/// Puts the previous route data back on drop unless the request was handled.
///
/// Covers every exit from a dispatch: declined, failed, panicked, or the
/// future dropped while awaiting the target.
struct RouteDataScope<'a> {
    context: &'a mut RouteContext,
    saved: Option<RouteData>,
}

impl<'a> RouteDataScope<'a> {
    fn enter(context: &'a mut RouteContext, route_data: RouteData) -> Self {
        let saved = std::mem::replace(&mut context.route_data, route_data);
        Self {
            context,
            saved: Some(saved),
        }
    }

    fn context(&mut self) -> &mut RouteContext {
        self.context
    }
}

impl Drop for RouteDataScope<'_> {
    fn drop(&mut self) {
        if self.context.is_handled {
            return;
        }
        if let Some(saved) = self.saved.take() {
            self.context.route_data = saved;
        }
    }
}

impl std::fmt::Debug for TreeRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeRouter")
            .field("version", &self.version)
            .field("trees", &self.trees.len())
            .field("named_entries", &self.named_entries.len())
            .finish()
    }
}
