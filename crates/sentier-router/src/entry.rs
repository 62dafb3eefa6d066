//! Compiled route entries consumed by the matching forest and the decision tree.

use std::fmt;
use std::sync::Arc;

use sentier_template::{
    compute_generated, compute_matched, eq_ignore_case, Precedence, RouteTemplate, RouteValues,
    TemplateBinder, TemplateMatcher,
};

use crate::constraints::ConstraintMap;
use crate::router::Router;

/// A template registered for incoming request matching.
#[derive(Clone)]
pub struct MatchingEntry {
    /// Tree the entry belongs to; lower orders are tried first.
    pub order: i32,
    pub precedence: Precedence,
    pub route_name: Option<String>,
    pub template: Arc<RouteTemplate>,
    pub target: Arc<dyn Router>,
    pub matcher: TemplateMatcher,
    pub constraints: ConstraintMap,
}

impl MatchingEntry {
    pub fn new(template: Arc<RouteTemplate>, target: Arc<dyn Router>, order: i32) -> Self {
        Self {
            order,
            precedence: compute_matched(&template),
            route_name: None,
            matcher: TemplateMatcher::new(Arc::clone(&template), RouteValues::new()),
            template,
            target,
            constraints: ConstraintMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.route_name = Some(name.into());
        self
    }

    pub fn with_defaults(mut self, defaults: RouteValues) -> Self {
        self.matcher = TemplateMatcher::new(Arc::clone(&self.template), defaults);
        self
    }

    pub fn with_constraints(mut self, constraints: ConstraintMap) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn template_text(&self) -> &str {
        self.template.text()
    }
}

impl fmt::Debug for MatchingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchingEntry")
            .field("order", &self.order)
            .field("template", &self.template.text())
            .field("route_name", &self.route_name)
            .field("constraints", &self.constraints.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// What a link generation entry needs for one route key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredValue {
    /// The key must have this value (case-insensitive).
    Exact(String),
    /// The key must have some non-empty value.
    Any,
    /// The key must not be supplied.
    Absent,
}

/// Selector values of a link generation entry, keyed case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredLinkValues {
    values: Vec<(String, RequiredValue)>,
}

impl RequiredLinkValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: RequiredValue) {
        let key = key.into();
        match self.values.iter_mut().find(|(k, _)| eq_ignore_case(k, &key)) {
            Some(slot) => slot.1 = value,
            None => self.values.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&RequiredValue> {
        self.values
            .iter()
            .find(|(k, _)| eq_ignore_case(k, key))
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RequiredValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A template registered for link generation.
#[derive(Clone)]
pub struct LinkGenerationEntry {
    pub route_name: Option<String>,
    pub template: Arc<RouteTemplate>,
    pub target: Arc<dyn Router>,
    pub required_link_values: RequiredLinkValues,
    pub route_group: Option<String>,
    pub binder: TemplateBinder,
    pub constraints: ConstraintMap,
    pub generation_precedence: Precedence,
}

impl LinkGenerationEntry {
    pub fn new(template: Arc<RouteTemplate>, target: Arc<dyn Router>) -> Self {
        Self {
            route_name: None,
            generation_precedence: compute_generated(&template),
            binder: TemplateBinder::new(Arc::clone(&template), RouteValues::new()),
            template,
            target,
            required_link_values: RequiredLinkValues::new(),
            route_group: None,
            constraints: ConstraintMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.route_name = Some(name.into());
        self
    }

    pub fn with_defaults(mut self, defaults: RouteValues) -> Self {
        self.binder = TemplateBinder::new(Arc::clone(&self.template), defaults);
        self
    }

    pub fn with_required_value(mut self, key: impl Into<String>, value: RequiredValue) -> Self {
        self.required_link_values.insert(key, value);
        self
    }

    pub fn with_route_group(mut self, group: impl Into<String>) -> Self {
        self.route_group = Some(group.into());
        self
    }

    pub fn with_constraints(mut self, constraints: ConstraintMap) -> Self {
        self.constraints = constraints;
        self
    }

    /// Explicit and inline defaults of the template.
    pub fn defaults(&self) -> &RouteValues {
        self.binder.defaults()
    }

    pub fn template_text(&self) -> &str {
        self.template.text()
    }
}

impl fmt::Debug for LinkGenerationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkGenerationEntry")
            .field("template", &self.template.text())
            .field("route_name", &self.route_name)
            .field("required_link_values", &self.required_link_values)
            .field("route_group", &self.route_group)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_link_values_ignore_case() {
        let mut required = RequiredLinkValues::new();
        required.insert("Controller", RequiredValue::Exact("Products".to_string()));
        required.insert("controller", RequiredValue::Any);
        required.insert("area", RequiredValue::Absent);

        assert_eq!(required.len(), 2);
        assert_eq!(required.get("CONTROLLER"), Some(&RequiredValue::Any));
        assert!(required.contains_key("Area"));
        assert!(!required.contains_key("action"));
    }
}
