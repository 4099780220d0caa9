//! In-memory state store using DashMap.

use crate::config::Config;
use crate::session::{PlanningSession, SessionInputs, SessionPatch, SessionSnapshot};
use dashmap::DashMap;
use detour_core::{presets, validate_hazards, HazardZone, RouteError, RoutePlanner};
use detour_providers::AnyProvider;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session limit of {0} reached")]
    SessionLimit(usize),
    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Application state: hazard feed, planner and planning sessions.
pub struct AppState {
    config: Config,
    planner: Arc<RoutePlanner<AnyProvider>>,
    hazards: RwLock<Vec<HazardZone>>,
    sessions: DashMap<String, Arc<PlanningSession>>,
    /// Reserved session slots; always >= `sessions.len()`.
    session_slots: AtomicUsize,
}

impl AppState {
    /// Build state with the provider selected by `config`, seeded with the mock hazard feed.
    pub fn new(config: Config) -> Result<Self, RouteError> {
        let provider = AnyProvider::from_settings(&config.provider)?;
        Ok(Self::with_provider(config, provider))
    }

    pub fn with_provider(config: Config, provider: AnyProvider) -> Self {
        let planner = Arc::new(RoutePlanner::new(provider, config.rules.clone()));
        Self {
            config,
            planner,
            hazards: RwLock::new(presets::mock_hazards()),
            sessions: DashMap::new(),
            session_slots: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn planner(&self) -> &RoutePlanner<AnyProvider> {
        &self.planner
    }

    /// Snapshot of the current hazard feed.
    pub fn hazards(&self) -> Vec<HazardZone> {
        self.hazards
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the hazard feed and restart planning in every session.
    /// Returns the number of sessions restarted.
    pub fn replace_hazards(&self, hazards: Vec<HazardZone>) -> Result<usize, RouteError> {
        validate_hazards(&hazards)?;
        let count = hazards.len();
        *self
            .hazards
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = hazards;
        tracing::info!("Hazard feed replaced ({} zones)", count);

        let sessions: Vec<Arc<PlanningSession>> =
            self.sessions.iter().map(|entry| entry.value().clone()).collect();
        for session in &sessions {
            self.schedule(session);
        }
        Ok(sessions.len())
    }

    pub fn create_session(&self, inputs: SessionInputs) -> Result<Arc<PlanningSession>, StoreError> {
        let max = self.config.max_sessions;
        self.session_slots
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < max).then_some(used + 1)
            })
            .map_err(|_| StoreError::SessionLimit(max))?;
        let id = uuid::Uuid::new_v4().to_string();
        let session = PlanningSession::new(id.clone(), inputs);
        self.sessions.insert(id.clone(), session.clone());
        self.schedule(&session);
        tracing::info!("Created planning session {}", id);
        Ok(session)
    }

    pub fn get_session(&self, id: &str) -> Option<Arc<PlanningSession>> {
        let session = self.sessions.get(id).map(|entry| entry.value().clone())?;
        session.touch();
        Some(session)
    }

    pub fn list_sessions(&self) -> Vec<SessionSnapshot> {
        self.sessions
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect()
    }

    /// Replace a session's inputs and schedule a new cycle.
    pub fn update_session(&self, id: &str, inputs: SessionInputs) -> Option<u64> {
        self.edit_session(id, move |current| *current = inputs)
    }

    /// Merge a partial change into a session's current inputs and schedule a new cycle.
    pub fn patch_session(&self, id: &str, patch: SessionPatch) -> Option<u64> {
        self.edit_session(id, move |current| patch.apply_to(current))
    }

    fn edit_session(&self, id: &str, edit: impl FnOnce(&mut SessionInputs)) -> Option<u64> {
        let session = self.get_session(id)?;
        Some(session.update_inputs(
            edit,
            self.planner.clone(),
            self.hazards(),
            self.config.planning_debounce,
        ))
    }

    pub fn remove_session(&self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                session.cancel();
                self.session_slots.fetch_sub(1, Ordering::AcqRel);
                tracing::info!("Removed planning session {}", id);
                true
            }
            None => false,
        }
    }

    /// Remove sessions with no cycle in flight and no activity for `max_idle`.
    /// Returns the number removed.
    pub fn expire_idle_sessions(&self, now: DateTime<Utc>, max_idle: Duration) -> usize {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            return 0;
        };
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .idle_since()
                    .is_some_and(|since| now - since >= max_idle)
            })
            .map(|entry| entry.key().clone())
            .collect();
        expired.iter().filter(|id| self.remove_session(id)).count()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn schedule(&self, session: &Arc<PlanningSession>) -> u64 {
        session.schedule(
            self.planner.clone(),
            self.hazards(),
            self.config.planning_debounce,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detour_core::{Coordinate, HazardSeverity};
    use detour_providers::StraightLineProvider;
    use std::time::Duration;

    fn state(max_sessions: usize) -> AppState {
        let config = Config {
            planning_debounce: Duration::ZERO,
            max_sessions,
            ..Config::default()
        };
        AppState::with_provider(config, AnyProvider::Straight(StraightLineProvider::default()))
    }

    fn inputs() -> SessionInputs {
        SessionInputs {
            source: presets::default_source(),
            destination: presets::default_destination(),
            avoid_hazards: true,
        }
    }

    #[tokio::test]
    async fn session_limit_is_enforced() {
        let state = state(1);
        let first = state.create_session(inputs()).unwrap();
        assert!(matches!(
            state.create_session(inputs()),
            Err(StoreError::SessionLimit(1))
        ));
        assert!(state.remove_session(first.id()));
        assert!(!state.remove_session(first.id()));
        assert!(state.create_session(inputs()).is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_respect_limit() {
        let state = Arc::new(state(3));
        let attempts: Vec<_> = (0..16)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move { state.create_session(inputs()).is_ok() })
            })
            .collect();
        let mut created = 0;
        for attempt in attempts {
            if attempt.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 3);
        assert_eq!(state.session_count(), 3);
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let state = state(2);
        let session = state.create_session(inputs()).unwrap();
        assert!(session.wait_settled(Duration::from_secs(5)).await);

        let ttl = Duration::from_secs(600);
        assert_eq!(state.expire_idle_sessions(Utc::now(), ttl), 0);
        assert!(state.get_session(session.id()).is_some());

        let later = Utc::now() + chrono::Duration::seconds(601);
        assert_eq!(state.expire_idle_sessions(later, ttl), 1);
        assert!(state.get_session(session.id()).is_none());
        assert_eq!(state.session_count(), 0);

        // The freed slots are reusable.
        assert!(state.create_session(inputs()).is_ok());
        assert!(state.create_session(inputs()).is_ok());
    }

    #[tokio::test]
    async fn loading_sessions_do_not_expire() {
        let config = Config {
            planning_debounce: Duration::from_secs(60),
            ..Config::default()
        };
        let state =
            AppState::with_provider(config, AnyProvider::Straight(StraightLineProvider::default()));
        let session = state.create_session(inputs()).unwrap();
        let later = Utc::now() + chrono::Duration::hours(2);
        assert_eq!(state.expire_idle_sessions(later, Duration::from_secs(60)), 0);
        assert!(state.remove_session(session.id()));
    }

    #[tokio::test]
    async fn replacing_hazards_restarts_sessions() {
        let state = state(8);
        let session = state.create_session(inputs()).unwrap();
        assert!(session.wait_settled(Duration::from_secs(5)).await);
        assert_eq!(session.snapshot().generation, 1);

        let zone = HazardZone::new(
            "pop-up",
            Coordinate::new(19.08, 72.87),
            200.0,
            "Road closure",
            HazardSeverity::High,
        )
        .unwrap();
        assert_eq!(state.replace_hazards(vec![zone]).unwrap(), 1);
        assert_eq!(session.snapshot().generation, 2);
        assert_eq!(state.hazards().len(), 1);
    }

    #[tokio::test]
    async fn invalid_hazard_feed_is_rejected_whole() {
        let state = state(8);
        let before = state.hazards().len();
        let mut duplicate = presets::mock_hazards();
        duplicate.push(duplicate[0].clone());
        assert!(state.replace_hazards(duplicate).is_err());
        assert_eq!(state.hazards().len(), before);
    }
}
