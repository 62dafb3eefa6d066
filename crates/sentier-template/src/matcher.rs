use std::sync::Arc;

use crate::model::{RouteTemplate, TemplateParameter, TemplatePart, TemplateSegment};
use crate::path::PathTokens;
use crate::values::{eq_ignore_case, RouteValues};

/// Matches request paths against a single template and extracts its values.
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    template: Arc<RouteTemplate>,
    defaults: RouteValues,
}

impl TemplateMatcher {
    /// Create a matcher. Inline parameter defaults take precedence over
    /// `defaults` for the same key.
    pub fn new(template: Arc<RouteTemplate>, defaults: RouteValues) -> Self {
        let defaults = combine_defaults(&template, defaults);
        Self { template, defaults }
    }

    pub fn template(&self) -> &Arc<RouteTemplate> {
        &self.template
    }

    /// Explicit and inline defaults combined.
    pub fn defaults(&self) -> &RouteValues {
        &self.defaults
    }

    /// Whether `segment` can bind without consuming a path token.
    pub fn binds_without_token(&self, segment: &TemplateSegment) -> bool {
        segment.simple_parameter().is_some_and(|p| {
            p.is_optional || p.is_catch_all || self.defaults.contains_key(&p.name)
        })
    }

    /// Match a raw request path.
    pub fn match_path(&self, path: &str) -> Option<RouteValues> {
        self.match_tokens(&PathTokens::new(path))
    }

    /// Match an already tokenized path.
    ///
    /// Returns the bound parameter values plus every default not bound by a
    /// parameter, or `None` when the path does not fit the template.
    pub fn match_tokens(&self, tokens: &PathTokens) -> Option<RouteValues> {
        let segments = self.template.segments();
        let ends_in_catch_all = segments
            .last()
            .and_then(TemplateSegment::simple_parameter)
            .is_some_and(|p| p.is_catch_all);

        if tokens.len() > segments.len() && !ends_in_catch_all {
            return None;
        }

        let mut values = RouteValues::new();

        for (index, segment) in segments.iter().enumerate() {
            let Some(token) = tokens.get(index) else {
                if !self.binds_without_token(segment) {
                    return None;
                }
                continue;
            };

            if !segment.is_simple() {
                if !match_complex_segment(segment, token, &mut values) {
                    return None;
                }
                continue;
            }

            match &segment.parts()[0] {
                TemplatePart::Literal(text) => {
                    if !eq_ignore_case(text, token) {
                        return None;
                    }
                }
                TemplatePart::Parameter(p) if p.is_catch_all => {
                    values.insert(p.name.clone(), tokens.remainder(index));
                    break;
                }
                TemplatePart::Parameter(p) => {
                    values.insert(p.name.clone(), token);
                }
            }
        }

        for (key, value) in &self.defaults {
            if !values.contains_key(key) {
                values.insert(key, value);
            }
        }

        Some(values)
    }
}

pub(crate) fn combine_defaults(template: &RouteTemplate, defaults: RouteValues) -> RouteValues {
    let mut combined = defaults;
    for parameter in template.parameters() {
        if let Some(value) = &parameter.default_value {
            combined.insert(parameter.name.clone(), value.clone());
        }
    }
    combined
}

/// Match a multi-part segment right to left.
///
/// Literals are anchored from the end of the token; a parameter takes
/// everything between its neighbouring literals and must not be empty.
fn match_complex_segment(
    segment: &TemplateSegment,
    token: &str,
    values: &mut RouteValues,
) -> bool {
    let mut end = token.len();
    let mut pending: Option<&TemplateParameter> = None;
    let mut captured = Vec::new();

    for part in segment.parts().iter().rev() {
        match part {
            TemplatePart::Parameter(p) => pending = Some(p),
            TemplatePart::Literal(literal) => {
                let found = if pending.is_some() {
                    rfind_literal(&token[..end], literal)
                } else {
                    literal_suffix_start(&token[..end], literal).map(|start| (start, end))
                };
                let Some((start, literal_end)) = found else {
                    return false;
                };

                if let Some(p) = pending.take() {
                    captured.push((p, &token[literal_end..end]));
                }
                end = start;
            }
        }
    }

    match pending {
        Some(p) => match token.get(..end) {
            Some(value) if !value.is_empty() => captured.push((p, value)),
            _ => return false,
        },
        None if end != 0 => return false,
        None => {}
    }

    for (parameter, value) in captured {
        values.insert(parameter.name.clone(), value);
    }
    true
}

/// Byte length of the shortest prefix of `text` equal to `literal`.
fn literal_prefix_len(text: &str, literal: &str) -> Option<usize> {
    text.char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .find(|&len| eq_ignore_case(&text[..len], literal))
}

/// Start of the suffix of `text` equal to `literal`.
fn literal_suffix_start(text: &str, literal: &str) -> Option<usize> {
    text.char_indices()
        .rev()
        .map(|(i, _)| i)
        .find(|&start| eq_ignore_case(&text[start..], literal))
}

/// Rightmost occurrence of `literal` that leaves at least one byte of `text`
/// after it, as `(start, end)`.
fn rfind_literal(text: &str, literal: &str) -> Option<(usize, usize)> {
    text.char_indices().rev().find_map(|(start, _)| {
        literal_prefix_len(&text[start..], literal)
            .map(|len| (start, start + len))
            .filter(|&(_, literal_end)| literal_end < text.len())
    })
}
