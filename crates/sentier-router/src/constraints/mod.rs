//! Route constraints.
//!
//! A constraint restricts the values a route key may take. Constraints are
//! direction aware: the same constraint is evaluated when matching incoming
//! requests and when generating links, and may behave differently for each.

mod builtin;
mod resolver;

pub use builtin::{
    AlphaConstraint, BoolConstraint, CompositeConstraint, HttpMethodConstraint, IntConstraint,
    LengthConstraint, LongConstraint, MaxConstraint, MaxLengthConstraint, MinConstraint,
    MinLengthConstraint, OptionalConstraint, RangeConstraint, RegexConstraint, RequiredConstraint,
};
pub use resolver::ConstraintResolver;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use sentier_telemetry::{log_constraint_rejected, MetricsRegistry};
use sentier_template::RouteValues;

use crate::context::RouteRequest;

/// Which way the router is being used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteDirection {
    IncomingRequest,
    UrlGeneration,
}

impl RouteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDirection::IncomingRequest => "incoming",
            RouteDirection::UrlGeneration => "generation",
        }
    }
}

/// A predicate over route values.
pub trait RouteConstraint: Send + Sync + fmt::Debug {
    fn matches(
        &self,
        request: &RouteRequest,
        route_key: &str,
        values: &RouteValues,
        direction: RouteDirection,
    ) -> bool;

    /// Short name used in logs and metrics.
    fn name(&self) -> &str;
}

/// Constraints of one entry keyed by route key.
pub type ConstraintMap = BTreeMap<String, Arc<dyn RouteConstraint>>;

/// Evaluate every constraint; stops at the first rejection.
pub fn matches_all(
    constraints: &ConstraintMap,
    request: &RouteRequest,
    values: &RouteValues,
    direction: RouteDirection,
    metrics: Option<&MetricsRegistry>,
) -> bool {
    for (key, constraint) in constraints {
        if !constraint.matches(request, key, values, direction) {
            log_constraint_rejected!(
                route_key = %key,
                constraint = constraint.name(),
                value = values.get(key).unwrap_or_default(),
                direction = direction.as_str(),
                "Route value rejected by constraint"
            );
            if let Some(metrics) = metrics {
                metrics.record_constraint_rejection(constraint.name(), direction.as_str());
            }
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> RouteValues {
        pairs.iter().copied().collect()
    }

    #[test]
    fn all_constraints_must_pass() {
        let mut constraints = ConstraintMap::new();
        constraints.insert("id".to_string(), Arc::new(IntConstraint));
        constraints.insert("name".to_string(), Arc::new(AlphaConstraint));
        let request = RouteRequest::get("/");

        assert!(matches_all(
            &constraints,
            &request,
            &values(&[("id", "5"), ("name", "abc")]),
            RouteDirection::IncomingRequest,
            None,
        ));
        assert!(!matches_all(
            &constraints,
            &request,
            &values(&[("id", "5"), ("name", "abc1")]),
            RouteDirection::IncomingRequest,
            None,
        ));
    }

    #[test]
    fn rejections_are_counted() {
        let mut constraints = ConstraintMap::new();
        constraints.insert("id".to_string(), Arc::new(IntConstraint));
        let metrics = MetricsRegistry::new();

        assert!(!matches_all(
            &constraints,
            &RouteRequest::get("/"),
            &values(&[("id", "x")]),
            RouteDirection::UrlGeneration,
            Some(&metrics),
        ));

        let labels = sentier_telemetry::metrics::ConstraintLabels {
            constraint: "int".to_string(),
            direction: "generation".to_string(),
        };
        assert_eq!(
            metrics.constraint_rejections_total.get_or_create(&labels).get(),
            1
        );
    }
}
