use std::collections::HashMap;
use std::sync::Arc;

use sentier_template::{fold_case, InlineConstraint, RouteTemplate};

use super::builtin::*;
use super::{ConstraintMap, RouteConstraint};
use crate::error::RouterBuildError;

type ConstraintFactory =
    Arc<dyn Fn(Option<&str>) -> Result<Arc<dyn RouteConstraint>, RouterBuildError> + Send + Sync>;

/// Maps inline constraint names such as `int` or `range(1,10)` to instances.
#[derive(Clone)]
pub struct ConstraintResolver {
    factories: HashMap<String, ConstraintFactory>,
}

impl ConstraintResolver {
    /// A resolver knowing the stock constraints.
    pub fn new() -> Self {
        let mut resolver = Self::empty();

        resolver.register("int", |_| Ok(Arc::new(IntConstraint)));
        resolver.register("long", |_| Ok(Arc::new(LongConstraint)));
        resolver.register("bool", |_| Ok(Arc::new(BoolConstraint)));
        resolver.register("alpha", |_| Ok(Arc::new(AlphaConstraint)));
        resolver.register("required", |_| Ok(Arc::new(RequiredConstraint)));
        resolver.register("minlength", |arg| {
            Ok(Arc::new(MinLengthConstraint(parse_arg("minlength", arg)?)))
        });
        resolver.register("maxlength", |arg| {
            Ok(Arc::new(MaxLengthConstraint(parse_arg("maxlength", arg)?)))
        });
        resolver.register("length", |arg| {
            let constraint = match split_pair("length", arg) {
                Ok((min, max)) => LengthConstraint { min, max },
                Err(_) => LengthConstraint::exact(parse_arg("length", arg)?),
            };
            Ok(Arc::new(constraint))
        });
        resolver.register("min", |arg| Ok(Arc::new(MinConstraint(parse_arg("min", arg)?))));
        resolver.register("max", |arg| Ok(Arc::new(MaxConstraint(parse_arg("max", arg)?))));
        resolver.register("range", |arg| {
            let (min, max) = split_pair("range", arg)?;
            Ok(Arc::new(RangeConstraint { min, max }))
        });
        resolver.register("regex", |arg| {
            let pattern = arg.ok_or_else(|| invalid("regex", "missing pattern"))?;
            let constraint =
                RegexConstraint::new(pattern).map_err(|e| invalid("regex", e.to_string()))?;
            Ok(Arc::new(constraint))
        });

        resolver
    }

    /// A resolver without any registered constraint.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register or replace a constraint factory. Names are case-insensitive.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(Option<&str>) -> Result<Arc<dyn RouteConstraint>, RouterBuildError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(fold_case(name), Arc::new(factory));
    }

    pub fn resolve(
        &self,
        constraint: &InlineConstraint,
    ) -> Result<Arc<dyn RouteConstraint>, RouterBuildError> {
        let factory = self
            .factories
            .get(&fold_case(constraint.name()))
            .ok_or_else(|| RouterBuildError::UnknownConstraint(constraint.name().to_string()))?;
        factory(constraint.argument())
    }

    /// Resolve constraint text written outside a template, e.g. `range(1,5)`.
    pub fn resolve_text(&self, text: &str) -> Result<Arc<dyn RouteConstraint>, RouterBuildError> {
        self.resolve(&InlineConstraint::new(text))
    }

    /// Resolve every inline constraint of `template`, one entry per parameter.
    ///
    /// Several constraints on one parameter become a composite; constraints on
    /// optional parameters pass when no value is bound.
    pub fn resolve_template(
        &self,
        template: &RouteTemplate,
    ) -> Result<ConstraintMap, RouterBuildError> {
        let mut map = ConstraintMap::new();

        for parameter in template.parameters().filter(|p| p.is_constrained()) {
            let mut resolved = parameter
                .inline_constraints
                .iter()
                .map(|c| self.resolve(c))
                .collect::<Result<Vec<_>, _>>()?;

            let mut constraint = if resolved.len() == 1 {
                resolved.remove(0)
            } else {
                Arc::new(CompositeConstraint::new(resolved)) as Arc<dyn RouteConstraint>
            };
            if parameter.is_optional {
                constraint = Arc::new(OptionalConstraint::new(constraint));
            }

            map.insert(fold_case(&parameter.name), constraint);
        }

        Ok(map)
    }
}

impl Default for ConstraintResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConstraintResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("ConstraintResolver")
            .field("constraints", &names)
            .finish()
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> RouterBuildError {
    RouterBuildError::InvalidConstraintArgument {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn parse_arg<T: std::str::FromStr>(name: &str, arg: Option<&str>) -> Result<T, RouterBuildError> {
    let arg = arg.ok_or_else(|| invalid(name, "missing argument"))?;
    arg.trim()
        .parse()
        .map_err(|_| invalid(name, format!("'{arg}' is not a number")))
}

fn split_pair<T: std::str::FromStr>(
    name: &str,
    arg: Option<&str>,
) -> Result<(T, T), RouterBuildError> {
    let arg = arg.ok_or_else(|| invalid(name, "missing argument"))?;
    let (a, b) = arg
        .split_once(',')
        .ok_or_else(|| invalid(name, "expected two comma-separated values"))?;
    Ok((parse_arg(name, Some(a))?, parse_arg(name, Some(b))?))
}
