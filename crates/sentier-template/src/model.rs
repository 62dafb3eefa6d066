use std::fmt;

use crate::error::TemplateError;
use crate::values::eq_ignore_case;

/// A parsed route template, e.g. `api/Products/{id:int}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    text: String,
    segments: Vec<TemplateSegment>,
}

/// One `/`-delimited unit of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSegment {
    parts: Vec<TemplatePart>,
}

/// A literal run of text or a parameter within a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Parameter(TemplateParameter),
}

/// A named parameter such as `{id}`, `{*path}` or `{id:int=1}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParameter {
    pub name: String,
    pub is_catch_all: bool,
    pub is_optional: bool,
    pub default_value: Option<String>,
    pub inline_constraints: Vec<InlineConstraint>,
}

/// Inline constraint text, e.g. `int` or `range(1,10)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineConstraint {
    text: String,
}

impl RouteTemplate {
    /// Parse template text. See [`crate::parser`] for the syntax.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        crate::parser::parse(text)
    }

    /// Build a template from already-parsed segments.
    ///
    /// The template text is rendered from the segments.
    pub fn from_segments(segments: Vec<TemplateSegment>) -> Self {
        let text = segments
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/");
        Self { text, segments }
    }

    pub(crate) fn with_text(text: String, segments: Vec<TemplateSegment>) -> Self {
        Self { text, segments }
    }

    /// The template text as registered (without leading or trailing `/`).
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn segments(&self) -> &[TemplateSegment] {
        &self.segments
    }

    /// All parameters in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = &TemplateParameter> {
        self.segments
            .iter()
            .flat_map(|s| s.parts.iter())
            .filter_map(TemplatePart::as_parameter)
    }

    /// Find a parameter by name, ignoring case.
    pub fn parameter(&self, name: &str) -> Option<&TemplateParameter> {
        self.parameters().find(|p| eq_ignore_case(&p.name, name))
    }
}

impl fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TemplateSegment {
    pub fn new(parts: Vec<TemplatePart>) -> Self {
        Self { parts }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self::new(vec![TemplatePart::Literal(text.into())])
    }

    pub fn parameter(parameter: TemplateParameter) -> Self {
        Self::new(vec![TemplatePart::Parameter(parameter)])
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    /// A segment is simple when it consists of exactly one part.
    pub fn is_simple(&self) -> bool {
        self.parts.len() == 1
    }

    /// The single parameter of a simple parameter segment.
    pub fn simple_parameter(&self) -> Option<&TemplateParameter> {
        match self.parts.as_slice() {
            [TemplatePart::Parameter(p)] => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for TemplateSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

impl TemplatePart {
    pub fn is_literal(&self) -> bool {
        matches!(self, TemplatePart::Literal(_))
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self, TemplatePart::Parameter(_))
    }

    pub fn as_parameter(&self) -> Option<&TemplateParameter> {
        match self {
            TemplatePart::Parameter(p) => Some(p),
            TemplatePart::Literal(_) => None,
        }
    }
}

impl fmt::Display for TemplatePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplatePart::Literal(text) => {
                f.write_str(&text.replace('{', "{{").replace('}', "}}"))
            }
            TemplatePart::Parameter(p) => write!(f, "{}", p),
        }
    }
}

impl TemplateParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_catch_all: false,
            is_optional: false,
            default_value: None,
            inline_constraints: Vec::new(),
        }
    }

    pub fn catch_all(mut self) -> Self {
        self.is_catch_all = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.inline_constraints.push(InlineConstraint::new(constraint));
        self
    }

    pub fn is_constrained(&self) -> bool {
        !self.inline_constraints.is_empty()
    }
}

impl fmt::Display for TemplateParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        if self.is_catch_all {
            f.write_str("*")?;
        }
        f.write_str(&self.name)?;
        for constraint in &self.inline_constraints {
            write!(f, ":{}", constraint.text)?;
        }
        if let Some(default) = &self.default_value {
            write!(f, "={}", default)?;
        }
        if self.is_optional {
            f.write_str("?")?;
        }
        f.write_str("}")
    }
}

impl InlineConstraint {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The constraint name, i.e. the text before any `(`.
    pub fn name(&self) -> &str {
        match self.text.find('(') {
            Some(idx) => &self.text[..idx],
            None => &self.text,
        }
    }

    /// The argument between the outer parentheses, if any.
    pub fn argument(&self) -> Option<&str> {
        let open = self.text.find('(')?;
        let inner = &self.text[open + 1..];
        Some(inner.strip_suffix(')').unwrap_or(inner))
    }
}
