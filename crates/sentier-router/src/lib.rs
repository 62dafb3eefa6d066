//! Tree router for sentier.
//!
//! Incoming requests are matched against a forest of prefix tries, one per
//! route order, walked with an explicit stack in precedence order (literal,
//! constrained parameter, parameter, constrained catch-all, catch-all).
//! Links are generated from a decision tree that prunes entries by the keys
//! they require before binding values.
//!
//! # Usage
//!
//! ```ignore
//! use sentier_router::{RouteContext, RouteDefinition, RouteRequest, TreeRouteBuilder};
//!
//! let mut builder = TreeRouteBuilder::new(next);
//! builder.add_definition(&RouteDefinition::new("api/Products/{id:int}"), target)?;
//! let router = builder.build(1)?;
//!
//! let mut context = RouteContext::new(RouteRequest::get("/api/Products/5"));
//! router.route(&mut context).await?;
//! ```

pub mod builder;
pub mod constraints;
pub mod context;
pub mod decision_tree;
pub mod definition;
pub mod entry;
pub mod error;
pub mod router;
pub mod tree;
pub mod tree_router;

#[cfg(test)]
mod testing;

pub use builder::TreeRouteBuilder;
pub use constraints::{ConstraintMap, ConstraintResolver, RouteConstraint, RouteDirection};
pub use context::{
    HandlerError, RouteContext, RouteData, RouteRequest, VirtualPathContext, VirtualPathData,
    ROUTE_GROUP_KEY,
};
pub use decision_tree::{LinkGenerationDecisionTree, LinkGenerationMatch};
pub use definition::{CompiledRoute, RouteDefinition};
pub use entry::{LinkGenerationEntry, MatchingEntry, RequiredLinkValues, RequiredValue};
pub use error::{RouterBuildError, RoutingError};
pub use router::Router;
pub use tree::{UrlMatchingNode, UrlMatchingTree};
pub use tree_router::TreeRouter;

pub use sentier_template::{RouteTemplate, RouteValues};
