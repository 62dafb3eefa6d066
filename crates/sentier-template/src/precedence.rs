//! Template precedence used to order routes.
//!
//! Every segment contributes one digit. Digits compare left to right, so two
//! templates with the same segment count are ordered by their first
//! differing segment.

use crate::model::{RouteTemplate, TemplatePart, TemplateSegment};

/// Per-segment precedence digits.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Precedence(Vec<u8>);

impl Precedence {
    pub fn digits(&self) -> &[u8] {
        &self.0
    }
}

/// Precedence for request matching: lower sorts first.
///
/// literal 1, complex 2, constrained parameter 3, parameter 4,
/// constrained catch-all 5, catch-all 6.
pub fn compute_matched(template: &RouteTemplate) -> Precedence {
    Precedence(
        template
            .segments()
            .iter()
            .map(|segment| 7 - segment_rank(segment))
            .collect(),
    )
}

/// Precedence for link generation: higher sorts first.
///
/// literal 6, complex 5, constrained parameter 4, parameter 3,
/// constrained catch-all 2, catch-all 1.
pub fn compute_generated(template: &RouteTemplate) -> Precedence {
    Precedence(template.segments().iter().map(segment_rank).collect())
}

fn segment_rank(segment: &TemplateSegment) -> u8 {
    if !segment.is_simple() {
        return 5;
    }
    match &segment.parts()[0] {
        TemplatePart::Literal(_) => 6,
        TemplatePart::Parameter(p) => match (p.is_catch_all, p.is_constrained()) {
            (false, true) => 4,
            (false, false) => 3,
            (true, true) => 2,
            (true, false) => 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(text: &str) -> Precedence {
        compute_matched(&RouteTemplate::parse(text).unwrap())
    }

    fn generated(text: &str) -> Precedence {
        compute_generated(&RouteTemplate::parse(text).unwrap())
    }

    #[test]
    fn matched_digits_per_segment() {
        assert_eq!(
            matched("a/{b}.{c}/{d:int}/{e}/{*f}").digits(),
            &[1, 2, 3, 4, 6]
        );
        assert_eq!(matched("{*f:int}").digits(), &[5]);
    }

    #[test]
    fn literal_sorts_before_parameter_when_matching() {
        assert!(matched("api/Products/Featured") < matched("api/Products/{id}"));
        assert!(matched("api/{id:int}") < matched("api/{id}"));
    }

    #[test]
    fn literal_sorts_higher_when_generating() {
        assert!(generated("api/Products/Featured") > generated("api/Products/{id}"));
        assert!(generated("api/{id}") > generated("api/{*rest}"));
    }
}
