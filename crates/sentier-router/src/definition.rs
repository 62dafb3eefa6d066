//! Declarative route definitions.
//!
//! A definition is what an attribute routing layer discovers for one action:
//! a template plus its order, name, defaults and selector values. It
//! compiles into one matching entry and one link generation entry.

use std::collections::BTreeMap;
use std::sync::Arc;

use http::Method;
use serde::{Deserialize, Serialize};
use sentier_template::{fold_case, RouteTemplate, RouteValues};

use crate::constraints::{
    CompositeConstraint, ConstraintMap, ConstraintResolver, HttpMethodConstraint,
    OptionalConstraint, RouteConstraint,
};
use crate::entry::{LinkGenerationEntry, MatchingEntry, RequiredValue};
use crate::error::RouterBuildError;
use crate::router::Router;

/// Constraint key under which allowed HTTP methods are checked.
pub const HTTP_METHOD_KEY: &str = "httpmethod";

/// Required value written as `*` means "any non-empty value".
const ANY_VALUE: &str = "*";

/// One route as written in a route table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteDefinition {
    pub template: String,

    /// Lower orders are matched first.
    #[serde(default)]
    pub order: i32,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub defaults: BTreeMap<String, String>,

    /// Selector values for link generation. `null` requires the key to be
    /// absent, `"*"` requires any value.
    #[serde(default)]
    pub required_values: BTreeMap<String, Option<String>>,

    /// Extra constraints by route key, in inline syntax (`int`, `range(1,5)`).
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,

    /// Allowed HTTP methods; empty allows all.
    #[serde(default)]
    pub methods: Vec<String>,

    #[serde(default)]
    pub route_group: Option<String>,
}

/// The entries produced by compiling a [`RouteDefinition`].
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pub matching: MatchingEntry,
    pub generation: LinkGenerationEntry,
}

impl RouteDefinition {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    /// Compile into entries routing to `target`.
    pub fn compile(
        &self,
        target: Arc<dyn Router>,
        resolver: &ConstraintResolver,
    ) -> Result<CompiledRoute, RouterBuildError> {
        let template = RouteTemplate::parse(&self.template)
            .map(Arc::new)
            .map_err(|source| RouterBuildError::Template {
                template: self.template.clone(),
                source,
            })?;

        let defaults: RouteValues = self
            .defaults
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let constraints = self.constraints(&template, resolver)?;

        let mut matching = MatchingEntry::new(Arc::clone(&template), Arc::clone(&target), self.order)
            .with_defaults(defaults.clone())
            .with_constraints(constraints.clone());

        let mut generation = LinkGenerationEntry::new(template, target)
            .with_defaults(defaults)
            .with_constraints(constraints);

        if let Some(name) = &self.name {
            matching = matching.with_name(name.clone());
            generation = generation.with_name(name.clone());
        }
        if let Some(group) = &self.route_group {
            generation = generation.with_route_group(group.clone());
        }
        for (key, value) in &self.required_values {
            let required = match value.as_deref() {
                None => RequiredValue::Absent,
                Some(ANY_VALUE) => RequiredValue::Any,
                Some(value) => RequiredValue::Exact(value.to_string()),
            };
            generation = generation.with_required_value(key.clone(), required);
        }

        Ok(CompiledRoute {
            matching,
            generation,
        })
    }

    fn constraints(
        &self,
        template: &RouteTemplate,
        resolver: &ConstraintResolver,
    ) -> Result<ConstraintMap, RouterBuildError> {
        let mut map = resolver.resolve_template(template)?;

        for (key, text) in &self.constraints {
            let mut constraint = resolver.resolve_text(text)?;
            if template.parameter(key).is_some_and(|p| p.is_optional) {
                constraint = Arc::new(OptionalConstraint::new(constraint));
            }
            let key = fold_case(key);
            let combined = match map.remove(&key) {
                Some(existing) => {
                    Arc::new(CompositeConstraint::new(vec![existing, constraint]))
                        as Arc<dyn RouteConstraint>
                }
                None => constraint,
            };
            map.insert(key, combined);
        }

        if !self.methods.is_empty() {
            let methods = self
                .methods
                .iter()
                .map(|m| {
                    Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                        .map_err(|_| RouterBuildError::InvalidMethod(m.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            map.insert(
                HTTP_METHOD_KEY.to_string(),
                Arc::new(HttpMethodConstraint::new(methods)),
            );
        }

        Ok(map)
    }
}
