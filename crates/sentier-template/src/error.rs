use thiserror::Error;

/// Errors produced while parsing a route template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Two consecutive separators, e.g. `api//products`.
    #[error("template contains an empty segment")]
    EmptySegment,

    /// A `{` without its `}` or a stray `}`.
    #[error("unbalanced braces in segment '{0}'")]
    UnbalancedBrace(String),

    #[error("parameter with an empty name in segment '{0}'")]
    EmptyParameterName(String),

    #[error("invalid parameter name '{0}'")]
    InvalidParameterName(String),

    #[error("parameter '{0}' appears more than once")]
    DuplicateParameter(String),

    #[error("catch-all parameter '{0}' must be in the last segment")]
    CatchAllNotLast(String),

    #[error("catch-all parameter '{0}' cannot share a segment with other parts")]
    CatchAllInComplexSegment(String),

    #[error("optional parameter '{0}' cannot share a segment with other parts")]
    OptionalInComplexSegment(String),

    #[error("parameters in segment '{0}' must be separated by a literal")]
    AdjacentParameters(String),

    #[error("parameter '{0}' cannot be optional and have a default value")]
    OptionalWithDefault(String),

    #[error("catch-all parameter '{0}' cannot be marked optional")]
    OptionalCatchAll(String),
}
