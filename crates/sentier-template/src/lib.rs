//! Route templates for the sentier router.
//!
//! This crate provides:
//! - The template model and parser (`api/Products/{id:int}`)
//! - Case-insensitive route values
//! - Request path matching against a single template
//! - Link binding from route values back to a path
//! - Precedence digits used to order templates
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use sentier_template::{RouteTemplate, RouteValues, TemplateMatcher};
//!
//! let template = Arc::new(RouteTemplate::parse("api/Products/{id}").unwrap());
//! let matcher = TemplateMatcher::new(template, RouteValues::new());
//! let values = matcher.match_path("/api/Products/5").unwrap();
//! assert_eq!(values.get("id"), Some("5"));
//! ```

pub mod binder;
pub mod error;
pub mod matcher;
pub mod model;
pub mod parser;
pub mod path;
pub mod precedence;
pub mod values;

pub use binder::{TemplateBinder, TemplateValuesResult};
pub use error::TemplateError;
pub use matcher::TemplateMatcher;
pub use model::{InlineConstraint, RouteTemplate, TemplateParameter, TemplatePart, TemplateSegment};
pub use path::{normalize_path, PathTokens};
pub use precedence::{compute_generated, compute_matched, Precedence};
pub use values::{eq_ignore_case, fold_case, RouteValues};
