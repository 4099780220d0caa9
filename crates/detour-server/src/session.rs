//! Debounced planning sessions.
//!
//! Each session owns the latest inputs and the last route that planned
//! successfully. Every input change bumps the generation, aborts the running
//! cycle and schedules a new one; a finished cycle only lands if its
//! generation is still current.

use chrono::{DateTime, Utc};
use detour_core::{
    Coordinate, CyclePhase, HazardZone, PlanOutcome, RouteError, RouteErrorBody,
    RoutePlanRequest, RoutePlanner,
};
use detour_providers::AnyProvider;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInputs {
    pub source: Coordinate,
    pub destination: Coordinate,
    pub avoid_hazards: bool,
}

/// Partial input change; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub source: Option<Coordinate>,
    pub destination: Option<Coordinate>,
    pub avoid_hazards: Option<bool>,
}

impl SessionPatch {
    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.destination.is_none() && self.avoid_hazards.is_none()
    }

    pub fn apply_to(self, inputs: &mut SessionInputs) {
        if let Some(source) = self.source {
            inputs.source = source;
        }
        if let Some(destination) = self.destination {
            inputs.destination = destination;
        }
        if let Some(avoid_hazards) = self.avoid_hazards {
            inputs.avoid_hazards = avoid_hazards;
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub generation: u64,
    pub phase: CyclePhase,
    pub loading: bool,
    pub inputs: SessionInputs,
    /// Last successfully planned route; survives later failures.
    pub route: Option<PlanOutcome>,
    pub error: Option<RouteErrorBody>,
    pub updated_at: DateTime<Utc>,
}

struct SessionInner {
    inputs: SessionInputs,
    generation: u64,
    phase: CyclePhase,
    loading: bool,
    route: Option<PlanOutcome>,
    error: Option<RouteError>,
    task: Option<JoinHandle<()>>,
    updated_at: DateTime<Utc>,
    last_access: DateTime<Utc>,
}

pub struct PlanningSession {
    id: String,
    inner: Mutex<SessionInner>,
    /// Generation of the most recently settled cycle.
    settled: watch::Sender<u64>,
}

impl PlanningSession {
    pub fn new(id: impl Into<String>, inputs: SessionInputs) -> Arc<Self> {
        let (settled, _) = watch::channel(0);
        Arc::new(Self {
            id: id.into(),
            inner: Mutex::new(SessionInner {
                inputs,
                generation: 0,
                phase: CyclePhase::Idle,
                loading: false,
                route: None,
                error: None,
                task: None,
                updated_at: Utc::now(),
                last_access: Utc::now(),
            }),
            settled,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        // A panic while holding the lock leaves plain data behind, still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mark the session as read by a client.
    pub fn touch(&self) {
        self.lock().last_access = Utc::now();
    }

    /// Last activity, or `None` while a cycle is in flight.
    pub fn idle_since(&self) -> Option<DateTime<Utc>> {
        let inner = self.lock();
        if inner.loading {
            None
        } else {
            Some(inner.updated_at.max(inner.last_access))
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            id: self.id.clone(),
            generation: inner.generation,
            phase: inner.phase,
            loading: inner.loading,
            inputs: inner.inputs.clone(),
            route: inner.route.clone(),
            error: inner.error.as_ref().map(RouteErrorBody::from),
            updated_at: inner.updated_at,
        }
    }

    /// Edit the inputs in place and start a fresh cycle.
    ///
    /// `edit` runs under the session lock, so concurrent partial updates
    /// each see the other's fields.
    pub fn update_inputs(
        self: &Arc<Self>,
        edit: impl FnOnce(&mut SessionInputs),
        planner: Arc<RoutePlanner<AnyProvider>>,
        hazards: Vec<HazardZone>,
        debounce: Duration,
    ) -> u64 {
        let mut inner = self.lock();
        edit(&mut inner.inputs);
        self.start_cycle(&mut inner, planner, hazards, debounce)
    }

    /// Start a new cycle for the current inputs, superseding any in flight.
    pub fn schedule(
        self: &Arc<Self>,
        planner: Arc<RoutePlanner<AnyProvider>>,
        hazards: Vec<HazardZone>,
        debounce: Duration,
    ) -> u64 {
        let mut inner = self.lock();
        self.start_cycle(&mut inner, planner, hazards, debounce)
    }

    fn start_cycle(
        self: &Arc<Self>,
        inner: &mut SessionInner,
        planner: Arc<RoutePlanner<AnyProvider>>,
        hazards: Vec<HazardZone>,
        debounce: Duration,
    ) -> u64 {
        inner.generation += 1;
        let generation = inner.generation;
        if let Some(previous) = inner.task.take() {
            previous.abort();
        }
        inner.loading = true;
        inner.phase = CyclePhase::Idle;
        inner.error = None;
        inner.updated_at = Utc::now();

        let request = RoutePlanRequest {
            source: inner.inputs.source.clone(),
            destination: inner.inputs.destination.clone(),
            hazards,
            avoid_hazards: inner.inputs.avoid_hazards,
        };

        let session = Arc::clone(self);
        inner.task = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let observer_session = Arc::clone(&session);
            let result = planner
                .plan_observed(request, move |phase| {
                    observer_session.record_phase(generation, phase)
                })
                .await;
            session.finish(generation, result);
        }));

        tracing::debug!("Session {} scheduled cycle {}", self.id, generation);
        generation
    }

    fn record_phase(&self, generation: u64, phase: CyclePhase) {
        let mut inner = self.lock();
        if inner.generation == generation && !phase.is_terminal() {
            inner.phase = phase;
        }
    }

    fn finish(&self, generation: u64, result: Result<PlanOutcome, RouteError>) {
        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(
                "Session {} discarded stale cycle {} (current {})",
                self.id,
                generation,
                inner.generation
            );
            return;
        }

        match result {
            Ok(outcome) => {
                if outcome.rerouted {
                    tracing::info!(
                        "Session {} rerouted around {} hazard(s)",
                        self.id,
                        outcome.hit_hazards.len()
                    );
                }
                inner.phase = CyclePhase::Done;
                inner.route = Some(outcome);
                inner.error = None;
            }
            Err(err) => {
                tracing::warn!("Session {} cycle {} failed: {}", self.id, generation, err);
                inner.phase = CyclePhase::Error;
                inner.error = Some(err);
            }
        }
        inner.loading = false;
        inner.task = None;
        inner.updated_at = Utc::now();
        drop(inner);
        self.settled.send_replace(generation);
    }

    /// Wait until no cycle is loading, or `timeout` elapses.
    /// Returns `true` if the session settled.
    pub async fn wait_settled(&self, timeout: Duration) -> bool {
        let mut settled = self.settled.subscribe();
        let wait = async {
            loop {
                let loading = self.lock().loading;
                if !loading {
                    return;
                }
                if settled.changed().await.is_err() {
                    return;
                }
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    /// Abort the in-flight cycle, if any, and release anyone waiting on it.
    pub fn cancel(&self) {
        let mut inner = self.lock();
        if let Some(task) = inner.task.take() {
            task.abort();
        }
        inner.loading = false;
        inner.updated_at = Utc::now();
        let generation = inner.generation;
        drop(inner);
        self.settled.send_replace(generation);
    }
}
