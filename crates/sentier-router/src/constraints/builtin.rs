use std::sync::Arc;

use http::Method;
use regex_lite::Regex;
use sentier_template::RouteValues;

use super::{RouteConstraint, RouteDirection};
use crate::context::RouteRequest;

/// Implements [`RouteConstraint`] for a type with an inherent
/// `fn accepts(&self, value: &str) -> bool`. Missing values are rejected.
macro_rules! value_constraint {
    ($ty:ty, $name:literal) => {
        impl RouteConstraint for $ty {
            fn matches(
                &self,
                _request: &RouteRequest,
                route_key: &str,
                values: &RouteValues,
                _direction: RouteDirection,
            ) -> bool {
                values.get(route_key).is_some_and(|value| self.accepts(value))
            }

            fn name(&self) -> &str {
                $name
            }
        }
    };
}

/// 32-bit signed integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntConstraint;

impl IntConstraint {
    fn accepts(&self, value: &str) -> bool {
        value.parse::<i32>().is_ok()
    }
}

value_constraint!(IntConstraint, "int");

/// 64-bit signed integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongConstraint;

impl LongConstraint {
    fn accepts(&self, value: &str) -> bool {
        value.parse::<i64>().is_ok()
    }
}

value_constraint!(LongConstraint, "long");

/// `true` or `false`, any case.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolConstraint;

impl BoolConstraint {
    fn accepts(&self, value: &str) -> bool {
        value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")
    }
}

value_constraint!(BoolConstraint, "bool");

/// ASCII letters only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphaConstraint;

impl AlphaConstraint {
    fn accepts(&self, value: &str) -> bool {
        !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic())
    }
}

value_constraint!(AlphaConstraint, "alpha");

#[derive(Debug, Clone, Copy)]
pub struct MinLengthConstraint(pub usize);

impl MinLengthConstraint {
    fn accepts(&self, value: &str) -> bool {
        value.chars().count() >= self.0
    }
}

value_constraint!(MinLengthConstraint, "minlength");

#[derive(Debug, Clone, Copy)]
pub struct MaxLengthConstraint(pub usize);

impl MaxLengthConstraint {
    fn accepts(&self, value: &str) -> bool {
        value.chars().count() <= self.0
    }
}

value_constraint!(MaxLengthConstraint, "maxlength");

/// Length in characters within `min..=max`.
#[derive(Debug, Clone, Copy)]
pub struct LengthConstraint {
    pub min: usize,
    pub max: usize,
}

impl LengthConstraint {
    /// Exactly `len` characters.
    pub fn exact(len: usize) -> Self {
        Self { min: len, max: len }
    }

    fn accepts(&self, value: &str) -> bool {
        (self.min..=self.max).contains(&value.chars().count())
    }
}

value_constraint!(LengthConstraint, "length");

#[derive(Debug, Clone, Copy)]
pub struct MinConstraint(pub i64);

impl MinConstraint {
    fn accepts(&self, value: &str) -> bool {
        value.parse::<i64>().is_ok_and(|n| n >= self.0)
    }
}

value_constraint!(MinConstraint, "min");

#[derive(Debug, Clone, Copy)]
pub struct MaxConstraint(pub i64);

impl MaxConstraint {
    fn accepts(&self, value: &str) -> bool {
        value.parse::<i64>().is_ok_and(|n| n <= self.0)
    }
}

value_constraint!(MaxConstraint, "max");

#[derive(Debug, Clone, Copy)]
pub struct RangeConstraint {
    pub min: i64,
    pub max: i64,
}

impl RangeConstraint {
    fn accepts(&self, value: &str) -> bool {
        value
            .parse::<i64>()
            .is_ok_and(|n| (self.min..=self.max).contains(&n))
    }
}

value_constraint!(RangeConstraint, "range");

/// Case-insensitive regular expression, applied as written (add `^`/`$` to anchor).
#[derive(Debug, Clone)]
pub struct RegexConstraint {
    regex: Regex,
}

impl RegexConstraint {
    pub fn new(pattern: &str) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            regex: Regex::new(&format!("(?i){pattern}"))?,
        })
    }

    fn accepts(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

value_constraint!(RegexConstraint, "regex");

/// A non-empty value must be present.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredConstraint;

impl RequiredConstraint {
    fn accepts(&self, value: &str) -> bool {
        !value.is_empty()
    }
}

value_constraint!(RequiredConstraint, "required");

/// Every inner constraint must pass.
#[derive(Debug, Clone)]
pub struct CompositeConstraint {
    constraints: Vec<Arc<dyn RouteConstraint>>,
}

impl CompositeConstraint {
    pub fn new(constraints: Vec<Arc<dyn RouteConstraint>>) -> Self {
        Self { constraints }
    }
}

impl RouteConstraint for CompositeConstraint {
    fn matches(
        &self,
        request: &RouteRequest,
        route_key: &str,
        values: &RouteValues,
        direction: RouteDirection,
    ) -> bool {
        self.constraints
            .iter()
            .all(|c| c.matches(request, route_key, values, direction))
    }

    fn name(&self) -> &str {
        "composite"
    }
}

/// Wraps the constraint of an optional parameter: passes when no value is bound.
#[derive(Debug, Clone)]
pub struct OptionalConstraint {
    inner: Arc<dyn RouteConstraint>,
}

impl OptionalConstraint {
    pub fn new(inner: Arc<dyn RouteConstraint>) -> Self {
        Self { inner }
    }
}

impl RouteConstraint for OptionalConstraint {
    fn matches(
        &self,
        request: &RouteRequest,
        route_key: &str,
        values: &RouteValues,
        direction: RouteDirection,
    ) -> bool {
        match values.get_non_empty(route_key) {
            Some(_) => self.inner.matches(request, route_key, values, direction),
            None => true,
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Restricts incoming requests to a set of methods. Never rejects link generation.
#[derive(Debug, Clone)]
pub struct HttpMethodConstraint {
    methods: Vec<Method>,
}

impl HttpMethodConstraint {
    pub fn new(methods: Vec<Method>) -> Self {
        Self { methods }
    }
}

impl RouteConstraint for HttpMethodConstraint {
    fn matches(
        &self,
        request: &RouteRequest,
        _route_key: &str,
        _values: &RouteValues,
        direction: RouteDirection,
    ) -> bool {
        match direction {
            RouteDirection::IncomingRequest => self.methods.contains(&request.method),
            RouteDirection::UrlGeneration => true,
        }
    }

    fn name(&self) -> &str {
        "http_method"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(constraint: &dyn RouteConstraint, value: &str) -> bool {
        let values: RouteValues = [("v", value)].into_iter().collect();
        constraint.matches(
            &RouteRequest::get("/"),
            "v",
            &values,
            RouteDirection::IncomingRequest,
        )
    }

    #[test]
    fn numeric_constraints() {
        assert!(check(&IntConstraint, "-42"));
        assert!(!check(&IntConstraint, "4294967296"));
        assert!(check(&LongConstraint, "4294967296"));
        assert!(check(&MinConstraint(3), "3"));
        assert!(!check(&MinConstraint(3), "2"));
        assert!(check(&MaxConstraint(3), "3"));
        assert!(!check(&MaxConstraint(3), "abc"));
        assert!(check(&RangeConstraint { min: 1, max: 10 }, "10"));
        assert!(!check(&RangeConstraint { min: 1, max: 10 }, "11"));
    }

    #[test]
    fn text_constraints() {
        assert!(check(&BoolConstraint, "TRUE"));
        assert!(!check(&BoolConstraint, "yes"));
        assert!(check(&AlphaConstraint, "abcXYZ"));
        assert!(!check(&AlphaConstraint, "abc1"));
        assert!(check(&MinLengthConstraint(2), "ab"));
        assert!(!check(&MaxLengthConstraint(2), "abc"));
        assert!(check(&LengthConstraint::exact(3), "abc"));
        assert!(!check(&LengthConstraint { min: 4, max: 6 }, "abc"));
        assert!(!check(&RequiredConstraint, ""));
    }

    #[test]
    fn regex_ignores_case_and_is_not_anchored() {
        let constraint = RegexConstraint::new("^[a-z]{3}$").unwrap();
        assert!(check(&constraint, "ABC"));
        assert!(!check(&constraint, "abcd"));

        let unanchored = RegexConstraint::new("b").unwrap();
        assert!(check(&unanchored, "abc"));
    }

    #[test]
    fn missing_value_is_rejected() {
        assert!(!IntConstraint.matches(
            &RouteRequest::get("/"),
            "id",
            &RouteValues::new(),
            RouteDirection::IncomingRequest,
        ));
    }

    #[test]
    fn optional_passes_when_absent() {
        let constraint = OptionalConstraint::new(Arc::new(IntConstraint));
        assert!(constraint.matches(
            &RouteRequest::get("/"),
            "id",
            &RouteValues::new(),
            RouteDirection::IncomingRequest,
        ));
        assert!(!check(&constraint, "x"));
        assert!(check(&constraint, "7"));
    }

    #[test]
    fn composite_requires_all() {
        let constraint = CompositeConstraint::new(vec![
            Arc::new(IntConstraint),
            Arc::new(RangeConstraint { min: 1, max: 5 }),
        ]);
        assert!(check(&constraint, "3"));
        assert!(!check(&constraint, "9"));
    }

    #[test]
    fn http_method_is_direction_aware() {
        let constraint = HttpMethodConstraint::new(vec![Method::POST]);
        let values = RouteValues::new();

        assert!(!constraint.matches(
            &RouteRequest::get("/"),
            "",
            &values,
            RouteDirection::IncomingRequest,
        ));
        assert!(constraint.matches(
            &RouteRequest::new(Method::POST, "/"),
            "",
            &values,
            RouteDirection::IncomingRequest,
        ));
        assert!(constraint.matches(
            &RouteRequest::get("/"),
            "",
            &values,
            RouteDirection::UrlGeneration,
        ));
    }
}
