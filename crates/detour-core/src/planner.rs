//! Planning cycle: provider call, hazard detection, at most one detour pass.
//!
//! [`PlanningCycle`] is a plain state machine with no I/O. It emits
//! [`ProviderRequest`]s and consumes provider results, so the same logic can be
//! driven by [`RoutePlanner`], a server session or a test.

use crate::detector::{detect_hazard_hits, HazardHit};
use crate::detour::{compute_detour_waypoints, detour_arcs, DetourArc};
use crate::error::RouteError;
use crate::models::{
    BoundingBox, Coordinate, HazardZone, ProviderRoute, RoutePlanRequest, RoutePolyline,
    RouteSummary,
};
use crate::provider::{ProviderStrategy, RouteProvider};
use crate::rules::PlannerRules;
use crate::spatial::bounding_box_from_circle;
use crate::summary::summarize_route;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    AwaitingRoute,
    Detecting,
    AwaitingReroute,
    Done,
    Error,
}

impl CyclePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, CyclePhase::Done | CyclePhase::Error)
    }
}

/// One call the driver must make to the route provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub waypoints: Vec<Coordinate>,
    pub avoidance_regions: Vec<BoundingBox>,
}

/// Final result of a planning cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub polyline: RoutePolyline,
    pub summary: RouteSummary,
    /// Hazards the first route intersected, in encounter order
    pub hit_hazards: Vec<HazardZone>,
    /// Waypoints submitted for the detour, empty if no reroute happened
    pub detour_waypoints: Vec<Coordinate>,
    pub detour_arcs: Vec<DetourArc>,
    /// Rectangles sent to a region-avoidance provider
    pub avoidance_regions: Vec<BoundingBox>,
    pub rerouted: bool,
    pub avoid_hazards: bool,
    pub strategy: ProviderStrategy,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum CycleStep {
    Request(ProviderRequest),
    Complete(Box<PlanOutcome>),
    Failed(RouteError),
    /// A response arrived when no request was outstanding.
    Discarded,
}

/// State for exactly one planning cycle. Build a new one whenever inputs change.
#[derive(Debug)]
pub struct PlanningCycle {
    request: RoutePlanRequest,
    strategy: ProviderStrategy,
    rules: PlannerRules,
    phase: CyclePhase,
    rerouting: bool,
    hits: Vec<HazardHit>,
    detour_waypoints: Vec<Coordinate>,
    detour_arcs: Vec<DetourArc>,
    avoidance_regions: Vec<BoundingBox>,
}

impl PlanningCycle {
    pub fn new(request: RoutePlanRequest, strategy: ProviderStrategy, rules: PlannerRules) -> Self {
        Self {
            request,
            strategy,
            rules,
            phase: CyclePhase::Idle,
            rerouting: false,
            hits: Vec::new(),
            detour_waypoints: Vec::new(),
            detour_arcs: Vec::new(),
            avoidance_regions: Vec::new(),
        }
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// True between submitting the detour and receiving its route.
    pub fn is_rerouting(&self) -> bool {
        self.rerouting
    }

    pub fn request(&self) -> &RoutePlanRequest {
        &self.request
    }

    /// Validate inputs and emit the initial provider request.
    pub fn start(&mut self) -> CycleStep {
        if self.phase != CyclePhase::Idle {
            return CycleStep::Discarded;
        }
        self.rerouting = false;

        if let Err(err) = self.rules.validate().and_then(|_| self.request.validate()) {
            self.phase = CyclePhase::Error;
            return CycleStep::Failed(err);
        }

        if self.request.avoid_hazards && self.strategy == ProviderStrategy::RegionAvoidance {
            self.avoidance_regions = self
                .request
                .hazards
                .iter()
                .map(|hazard| bounding_box_from_circle(&hazard.center, hazard.radius_m))
                .collect();
        }

        self.phase = CyclePhase::AwaitingRoute;
        CycleStep::Request(ProviderRequest {
            waypoints: vec![
                self.request.source.unlabeled(),
                self.request.destination.unlabeled(),
            ],
            avoidance_regions: self.avoidance_regions.clone(),
        })
    }

    /// Feed back the provider's answer to the last emitted request.
    pub fn on_response(&mut self, result: Result<ProviderRoute, RouteError>) -> CycleStep {
        if !matches!(
            self.phase,
            CyclePhase::AwaitingRoute | CyclePhase::AwaitingReroute
        ) {
            return CycleStep::Discarded;
        }

        let route = match result {
            Ok(route) => route,
            Err(err) => {
                self.phase = CyclePhase::Error;
                return CycleStep::Failed(err);
            }
        };

        // The detour's own route never triggers another detour, even if it
        // still crosses a hazard.
        if self.rerouting {
            return self.complete(route);
        }

        if !self.request.avoid_hazards {
            return self.complete(route);
        }

        self.phase = CyclePhase::Detecting;
        self.hits = detect_hazard_hits(
            &route.polyline,
            &self.request.source,
            &self.request.hazards,
            &self.rules,
        );

        if self.hits.is_empty() || self.strategy == ProviderStrategy::RegionAvoidance {
            return self.complete(route);
        }

        let hit_hazards = self.hit_hazards();
        self.detour_arcs = detour_arcs(&hit_hazards, &route.polyline, &self.rules);
        self.detour_waypoints = compute_detour_waypoints(
            &self.request.source,
            &self.request.destination,
            &hit_hazards,
            &route.polyline,
            &self.rules,
        );
        self.rerouting = true;
        self.phase = CyclePhase::AwaitingReroute;
        CycleStep::Request(ProviderRequest {
            waypoints: self.detour_waypoints.clone(),
            avoidance_regions: Vec::new(),
        })
    }

    fn hit_hazards(&self) -> Vec<HazardZone> {
        self.hits.iter().map(|hit| hit.hazard.clone()).collect()
    }

    fn complete(&mut self, route: ProviderRoute) -> CycleStep {
        let summary = summarize_route(&route, self.request.avoid_hazards, &self.rules);
        self.phase = CyclePhase::Done;
        CycleStep::Complete(Box::new(PlanOutcome {
            polyline: route.polyline,
            summary,
            hit_hazards: self.hit_hazards(),
            detour_waypoints: self.detour_waypoints.clone(),
            detour_arcs: self.detour_arcs.clone(),
            avoidance_regions: self.avoidance_regions.clone(),
            rerouted: self.rerouting,
            avoid_hazards: self.request.avoid_hazards,
            strategy: self.strategy,
            computed_at: Utc::now(),
        }))
    }
}

/// Drives planning cycles against a concrete provider.
pub struct RoutePlanner<P> {
    provider: P,
    rules: PlannerRules,
}

impl<P: RouteProvider> RoutePlanner<P> {
    pub fn new(provider: P, rules: PlannerRules) -> Self {
        Self { provider, rules }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn rules(&self) -> &PlannerRules {
        &self.rules
    }

    /// Run one full cycle for `request`.
    pub async fn plan(&self, request: RoutePlanRequest) -> Result<PlanOutcome, RouteError> {
        self.plan_observed(request, |_| {}).await
    }

    /// Run one full cycle, reporting every phase change to `observer`.
    pub async fn plan_observed<F>(
        &self,
        request: RoutePlanRequest,
        mut observer: F,
    ) -> Result<PlanOutcome, RouteError>
    where
        F: FnMut(CyclePhase) + Send,
    {
        let mut cycle = PlanningCycle::new(request, self.provider.strategy(), self.rules.clone());
        let mut step = cycle.start();
        loop {
            observer(cycle.phase());
            match step {
                CycleStep::Request(request) => {
                    let result = self
                        .provider
                        .plan_route(&request.waypoints, &request.avoidance_regions)
                        .await;
                    step = cycle.on_response(result);
                }
                CycleStep::Complete(outcome) => return Ok(*outcome),
                CycleStep::Failed(err) => return Err(err),
                CycleStep::Discarded => {
                    return Err(RouteError::unavailable(
                        "planning cycle ended without a result",
                    ))
                }
            }
        }
    }
}
