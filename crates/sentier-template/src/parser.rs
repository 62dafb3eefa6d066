//! Route template parser.
//!
//! Syntax, per `/`-separated segment:
//!
//! - `literal` text, with `{{` and `}}` escaping braces
//! - `{name}` parameter, `{name?}` optional, `{name=value}` with a default
//! - `{*name}` catch-all capturing the rest of the path (last segment only)
//! - `{name:int:range(1,10)}` inline constraints
//! - complex segments mixing literals and parameters, e.g. `{file}.{ext}`
//!
//! Leading `~/` or `/` and trailing `/` are ignored.

use std::collections::HashSet;

use crate::error::TemplateError;
use crate::model::{
    InlineConstraint, RouteTemplate, TemplateParameter, TemplatePart, TemplateSegment,
};
use crate::values::fold_case;

/// Characters that may not appear in a parameter name.
const INVALID_NAME_CHARS: &[char] = &['/', '{', '}', '?', '*', '=', ':'];

/// Parse a route template.
pub fn parse(text: &str) -> Result<RouteTemplate, TemplateError> {
    let trimmed = text.strip_prefix('~').unwrap_or(text).trim_matches('/');
    if trimmed.is_empty() {
        return Ok(RouteTemplate::with_text(String::new(), Vec::new()));
    }

    let segments = split_segments(trimmed)
        .into_iter()
        .map(parse_segment)
        .collect::<Result<Vec<_>, _>>()?;

    validate(&segments)?;

    Ok(RouteTemplate::with_text(trimmed.to_string(), segments))
}

/// Split on `/` outside of parameter braces.
fn split_segments(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_parameter = false;
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '{' | '}' if chars.peek().map(|(_, c)| *c) == Some(ch) => {
                chars.next();
            }
            '{' => in_parameter = true,
            '}' => in_parameter = false,
            '/' if !in_parameter => {
                segments.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    segments.push(&text[start..]);
    segments
}

fn parse_segment(raw: &str) -> Result<TemplateSegment, TemplateError> {
    if raw.is_empty() {
        return Err(TemplateError::EmptySegment);
    }

    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }

                let mut body = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '}' | '{' if chars.peek() == Some(&c) => {
                            chars.next();
                            body.push(c);
                        }
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => return Err(TemplateError::UnbalancedBrace(raw.to_string())),
                        _ => body.push(c),
                    }
                }
                if !closed {
                    return Err(TemplateError::UnbalancedBrace(raw.to_string()));
                }

                parts.push(TemplatePart::Parameter(parse_parameter(&body, raw)?));
            }
            '}' => return Err(TemplateError::UnbalancedBrace(raw.to_string())),
            _ => literal.push(ch),
        }
    }

    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }

    if parts.len() > 1 {
        for parameter in parts.iter().filter_map(TemplatePart::as_parameter) {
            if parameter.is_catch_all {
                return Err(TemplateError::CatchAllInComplexSegment(
                    parameter.name.clone(),
                ));
            }
            if parameter.is_optional {
                return Err(TemplateError::OptionalInComplexSegment(
                    parameter.name.clone(),
                ));
            }
        }
        if parts
            .windows(2)
            .any(|pair| pair[0].is_parameter() && pair[1].is_parameter())
        {
            return Err(TemplateError::AdjacentParameters(raw.to_string()));
        }
    }

    Ok(TemplateSegment::new(parts))
}

fn parse_parameter(body: &str, raw: &str) -> Result<TemplateParameter, TemplateError> {
    let (is_catch_all, rest) = match body.strip_prefix('*') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let (rest, is_optional) = match rest.strip_suffix('?') {
        Some(rest) => (rest, true),
        None => (rest, false),
    };

    let name_end = rest.find([':', '=']).unwrap_or(rest.len());
    let name = &rest[..name_end];
    if name.is_empty() {
        return Err(TemplateError::EmptyParameterName(raw.to_string()));
    }
    if name.contains(INVALID_NAME_CHARS) {
        return Err(TemplateError::InvalidParameterName(name.to_string()));
    }

    let mut inline_constraints = Vec::new();
    let mut default_value = None;
    let mut remaining = &rest[name_end..];

    while let Some(after_colon) = remaining.strip_prefix(':') {
        let end = constraint_end(after_colon);
        let text = &after_colon[..end];
        if !text.is_empty() {
            inline_constraints.push(InlineConstraint::new(text));
        }
        remaining = &after_colon[end..];
    }
    if let Some(default) = remaining.strip_prefix('=') {
        default_value = Some(default.to_string());
    }

    if is_catch_all && is_optional {
        return Err(TemplateError::OptionalCatchAll(name.to_string()));
    }
    if is_optional && default_value.is_some() {
        return Err(TemplateError::OptionalWithDefault(name.to_string()));
    }

    Ok(TemplateParameter {
        name: name.to_string(),
        is_catch_all,
        is_optional,
        default_value,
        inline_constraints,
    })
}

/// Byte offset where a constraint ends: the next `:` or `=` outside parentheses.
fn constraint_end(text: &str) -> usize {
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ':' | '=' if depth == 0 => return idx,
            _ => {}
        }
    }
    text.len()
}

fn validate(segments: &[TemplateSegment]) -> Result<(), TemplateError> {
    let mut seen = HashSet::new();
    let last = segments.len().saturating_sub(1);

    for (index, segment) in segments.iter().enumerate() {
        for parameter in segment.parts().iter().filter_map(TemplatePart::as_parameter) {
            if !seen.insert(fold_case(&parameter.name)) {
                return Err(TemplateError::DuplicateParameter(parameter.name.clone()));
            }
            if parameter.is_catch_all && index != last {
                return Err(TemplateError::CatchAllNotLast(parameter.name.clone()));
            }
        }
    }
    Ok(())
}
