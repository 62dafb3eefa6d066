//! Targets shared by the router integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use sentier_router::{
    HandlerError, RouteContext, RouteValues, Router, TreeRouteBuilder, VirtualPathContext,
    VirtualPathData,
};

/// How a [`Target`] responds to requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Handle,
    Decline,
    Fail,
    Hang,
    Panic,
}

/// A route target recording the values it was invoked with.
#[derive(Debug)]
pub struct Target {
    pub name: &'static str,
    behavior: Behavior,
    hits: Mutex<Vec<RouteValues>>,
}

impl Target {
    pub fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior,
            hits: Mutex::new(Vec::new()),
        })
    }

    pub fn handling(name: &'static str) -> Arc<Self> {
        Self::new(name, Behavior::Handle)
    }

    pub fn hits(&self) -> Vec<RouteValues> {
        self.hits.lock().clone()
    }

    pub fn hit_count(&self) -> usize {
        self.hits.lock().len()
    }
}

impl Router for Target {
    fn route_async<'a>(
        &'a self,
        context: &'a mut RouteContext,
    ) -> BoxFuture<'a, Result<(), HandlerError>> {
        async move {
            self.hits.lock().push(context.route_data.values.clone());
            match self.behavior {
                Behavior::Handle => context.is_handled = true,
                Behavior::Decline => {}
                Behavior::Fail => return Err(format!("{} failed", self.name).into()),
                Behavior::Hang => futures_util::future::pending::<()>().await,
                Behavior::Panic => panic!("{} panicked", self.name),
            }
            Ok(())
        }
        .boxed()
    }

    fn virtual_path(&self, _context: &mut VirtualPathContext) -> Option<VirtualPathData> {
        None
    }
}

/// How the link generation `next` router responds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkBehavior {
    Accept,
    Reject,
    ShortCircuit(String),
}

/// The router receiving link generation requests after binding.
#[derive(Debug)]
pub struct Next {
    behavior: LinkBehavior,
    provided: Mutex<Vec<RouteValues>>,
}

impl Next {
    pub fn new(behavior: LinkBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            provided: Mutex::new(Vec::new()),
        })
    }

    pub fn accepting() -> Arc<Self> {
        Self::new(LinkBehavior::Accept)
    }

    pub fn provided(&self) -> Vec<RouteValues> {
        self.provided.lock().clone()
    }
}

impl Router for Next {
    fn route_async<'a>(
        &'a self,
        _context: &'a mut RouteContext,
    ) -> BoxFuture<'a, Result<(), HandlerError>> {
        async { Ok(()) }.boxed()
    }

    fn virtual_path(&self, context: &mut VirtualPathContext) -> Option<VirtualPathData> {
        if let Some(provided) = &context.provided_values {
            self.provided.lock().push(provided.clone());
        }
        match &self.behavior {
            LinkBehavior::Accept => {
                context.is_bound = true;
                None
            }
            LinkBehavior::Reject => None,
            LinkBehavior::ShortCircuit(path) => Some(VirtualPathData::new(path.clone())),
        }
    }
}

pub fn builder() -> TreeRouteBuilder {
    TreeRouteBuilder::new(Next::accepting())
}

pub fn values(pairs: &[(&str, &str)]) -> RouteValues {
    pairs.iter().copied().collect()
}
