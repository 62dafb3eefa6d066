use std::collections::BTreeMap;
use std::sync::Arc;

use sentier_telemetry::{log_router_built, MetricsRegistry};

use crate::constraints::ConstraintResolver;
use crate::definition::RouteDefinition;
use crate::entry::{LinkGenerationEntry, MatchingEntry};
use crate::error::RouterBuildError;
use crate::router::Router;
use crate::tree::UrlMatchingTree;
use crate::tree_router::TreeRouter;

/// Collects entries and freezes them into a [`TreeRouter`].
///
/// Building does not consume the pending entries; call [`clear`] to start
/// over.
///
/// [`clear`]: TreeRouteBuilder::clear
pub struct TreeRouteBuilder {
    next: Arc<dyn Router>,
    resolver: ConstraintResolver,
    matching_entries: Vec<MatchingEntry>,
    generation_entries: Vec<LinkGenerationEntry>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl TreeRouteBuilder {
    /// `next` receives link generation requests for every entry.
    pub fn new(next: Arc<dyn Router>) -> Self {
        Self {
            next,
            resolver: ConstraintResolver::new(),
            matching_entries: Vec::new(),
            generation_entries: Vec::new(),
            metrics: None,
        }
    }

    pub fn with_resolver(mut self, resolver: ConstraintResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Routers built from here record into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn add_matching_entry(&mut self, entry: MatchingEntry) {
        self.matching_entries.push(entry);
    }

    pub fn add_generation_entry(&mut self, entry: LinkGenerationEntry) {
        self.generation_entries.push(entry);
    }

    /// Compile `definition` and add both of its entries.
    pub fn add_definition(
        &mut self,
        definition: &RouteDefinition,
        target: Arc<dyn Router>,
    ) -> Result<(), RouterBuildError> {
        let compiled = definition.compile(target, &self.resolver)?;
        self.add_matching_entry(compiled.matching);
        self.add_generation_entry(compiled.generation);
        Ok(())
    }

    pub fn matching_entries(&self) -> &[MatchingEntry] {
        &self.matching_entries
    }

    pub fn generation_entries(&self) -> &[LinkGenerationEntry] {
        &self.generation_entries
    }

    /// Build one matching tree per order and the link generation tree.
    pub fn build(&self, version: i32) -> Result<TreeRouter, RouterBuildError> {
        let mut trees: BTreeMap<i32, UrlMatchingTree> = BTreeMap::new();
        for entry in &self.matching_entries {
            trees
                .entry(entry.order)
                .or_insert_with(|| UrlMatchingTree::new(entry.order))
                .insert(entry.clone());
        }

        let trees: Vec<_> = trees
            .into_values()
            .map(|mut tree| {
                tree.sort_matches();
                tree
            })
            .collect();
        let tree_count = trees.len();

        let mut router = TreeRouter::new(
            Arc::clone(&self.next),
            trees,
            self.generation_entries.clone(),
            version,
        )?;

        if let Some(metrics) = &self.metrics {
            metrics.record_router_built(self.matching_entries.len());
            router = router.with_metrics(Arc::clone(metrics));
        }

        log_router_built!(
            version,
            trees = tree_count,
            matching_entries = self.matching_entries.len(),
            generation_entries = self.generation_entries.len(),
            "Tree router built"
        );

        Ok(router)
    }

    /// Drop all pending entries.
    pub fn clear(&mut self) {
        self.matching_entries.clear();
        self.generation_entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{generating, matching, target};

    #[test]
    fn builds_one_tree_per_order_in_ascending_order() {
        let mut builder = TreeRouteBuilder::new(target());
        builder.add_matching_entry(matching("{*path}", 1));
        builder.add_matching_entry(matching("home/{id}", 0));
        builder.add_matching_entry(matching("about", -3));
        builder.add_matching_entry(matching("contact", 0));

        let router = builder.build(7).unwrap();
        let orders: Vec<_> = router.trees().iter().map(|t| t.order()).collect();

        assert_eq!(orders, vec![-3, 0, 1]);
        assert_eq!(router.trees()[1].entries().len(), 2);
        assert_eq!(router.version(), 7);
    }

    #[test]
    fn build_does_not_consume_entries() {
        let mut builder = TreeRouteBuilder::new(target());
        builder.add_matching_entry(matching("a", 0));
        builder.add_generation_entry(generating("a"));

        let first = builder.build(1).unwrap();
        let second = builder.build(2).unwrap();
        assert_eq!(first.trees().len(), second.trees().len());

        builder.clear();
        assert!(builder.matching_entries().is_empty());
        assert!(builder.generation_entries().is_empty());
        assert!(builder.build(3).unwrap().trees().is_empty());
    }

    #[test]
    fn add_definition_registers_both_entries() {
        let mut builder = TreeRouteBuilder::new(target());
        builder
            .add_definition(&RouteDefinition::new("api/{id:int}"), target())
            .unwrap();

        assert_eq!(builder.matching_entries().len(), 1);
        assert_eq!(builder.generation_entries().len(), 1);
    }

    #[test]
    fn duplicate_names_fail_the_build() {
        let mut builder = TreeRouteBuilder::new(target());
        builder.add_generation_entry(generating("a/{id}").with_name("item"));
        builder.add_generation_entry(generating("b/{id}").with_name("ITEM"));

        assert!(matches!(
            builder.build(1),
            Err(RouterBuildError::DuplicateRouteName { .. })
        ));
    }

    #[test]
    fn build_records_metrics() {
        let metrics = Arc::new(MetricsRegistry::new());
        let mut builder = TreeRouteBuilder::new(target()).with_metrics(Arc::clone(&metrics));
        builder.add_matching_entry(matching("a", 0));
        builder.add_matching_entry(matching("b", 0));
        builder.build(1).unwrap();

        assert_eq!(metrics.routers_built_total.get(), 1);
        assert_eq!(metrics.route_entries.get(), 2);
    }
}
