//! Prometheus metrics registry.

use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family, gauge::Gauge, histogram::Histogram},
    registry::Registry,
};

/// Route lookup duration buckets (in seconds).
/// Covers 1µs to 10ms; lookups never leave the process.
const DURATION_BUCKETS: [f64; 9] = [
    0.000_001, 0.000_005, 0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01,
];

/// Candidate count buckets.
const CANDIDATE_BUCKETS: [f64; 7] = [0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 64.0];

/// Incoming routing outcome labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RouteLabels {
    pub outcome: String,
}

/// Constraint rejection labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ConstraintLabels {
    pub constraint: String,
    pub direction: String,
}

/// Link generation labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct LinkLabels {
    pub lookup: String,
    pub outcome: String,
}

/// Metrics registry holding all router metrics.
pub struct MetricsRegistry {
    /// The prometheus-client registry for encoding.
    pub registry: Registry,

    // Incoming routing
    pub route_requests_total: Family<RouteLabels, Counter>,
    pub route_duration_seconds: Family<RouteLabels, Histogram>,
    pub route_candidates: Histogram,

    // Constraints
    pub constraint_rejections_total: Family<ConstraintLabels, Counter>,

    // Link generation
    pub link_generation_total: Family<LinkLabels, Counter>,

    // Router construction
    pub routers_built_total: Counter,
    pub route_entries: Gauge,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let route_requests_total = Family::<RouteLabels, Counter>::default();
        registry.register(
            "sentier_route_requests",
            "Total number of requests routed",
            route_requests_total.clone(),
        );

        let route_duration_seconds =
            Family::<RouteLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(DURATION_BUCKETS.iter().cloned())
            });
        registry.register(
            "sentier_route_duration_seconds",
            "Time spent matching a request against the trees",
            route_duration_seconds.clone(),
        );

        let route_candidates = Histogram::new(CANDIDATE_BUCKETS.iter().cloned());
        registry.register(
            "sentier_route_candidates",
            "Number of matching entries tried per request",
            route_candidates.clone(),
        );

        let constraint_rejections_total = Family::<ConstraintLabels, Counter>::default();
        registry.register(
            "sentier_constraint_rejections",
            "Total number of route values rejected by a constraint",
            constraint_rejections_total.clone(),
        );

        let link_generation_total = Family::<LinkLabels, Counter>::default();
        registry.register(
            "sentier_link_generation",
            "Total number of link generation attempts",
            link_generation_total.clone(),
        );

        let routers_built_total = Counter::default();
        registry.register(
            "sentier_routers_built",
            "Total number of tree routers built",
            routers_built_total.clone(),
        );

        let route_entries = Gauge::default();
        registry.register(
            "sentier_route_entries",
            "Number of matching entries in the most recently built router",
            route_entries.clone(),
        );

        Self {
            registry,
            route_requests_total,
            route_duration_seconds,
            route_candidates,
            constraint_rejections_total,
            link_generation_total,
            routers_built_total,
            route_entries,
        }
    }

    /// Record one routed request. `outcome` is `matched`, `not_found` or `error`.
    pub fn record_route(&self, outcome: &str, candidates: usize, duration_secs: f64) {
        let labels = RouteLabels {
            outcome: outcome.to_string(),
        };
        self.route_requests_total.get_or_create(&labels).inc();
        self.route_duration_seconds
            .get_or_create(&labels)
            .observe(duration_secs);
        self.route_candidates.observe(candidates as f64);
    }

    /// Record a constraint rejecting a value.
    pub fn record_constraint_rejection(&self, constraint: &str, direction: &str) {
        let labels = ConstraintLabels {
            constraint: constraint.to_string(),
            direction: direction.to_string(),
        };
        self.constraint_rejections_total.get_or_create(&labels).inc();
    }

    /// Record a link generation attempt.
    pub fn record_link_generation(&self, named: bool, generated: bool) {
        let labels = LinkLabels {
            lookup: if named { "named" } else { "values" }.to_string(),
            outcome: if generated { "generated" } else { "no_match" }.to_string(),
        };
        self.link_generation_total.get_or_create(&labels).inc();
    }

    /// Record a router build.
    pub fn record_router_built(&self, entries: usize) {
        self.routers_built_total.inc();
        self.route_entries.set(entries as i64);
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
