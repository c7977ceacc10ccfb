//! Event interception for the game's entry points.
//!
//! The game routes each instrumented entry point through
//! [`Interceptor::intercept`], handing over its original behaviour as a
//! closure. Registered [`GameObserver`]s see the event first; whatever they
//! return, the original then runs exactly once and its result is passed
//! back untouched. Observer failures travel as [`HookError`] and are
//! dropped here, after logging, so analytics can never break the game.

use crate::analytics::{Analytics, AnalyticsError, MetricValue, TaskRecord};
use crate::clock::Clock;
use crate::game::{flipped_labels, GameView, UNKNOWN_LABEL};
use crate::level::{GameMode, LevelIds};
use crate::session::Session;
use crate::tracker::SharedTracker;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum GameEvent {
    CampaignLevelStarted { level: u32 },
    ReflexModeStarted,
    MatchCorrect,
    MatchIncorrect,
    CampaignWon,
    ReflexEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TaskOutcome {
    CorrectMatch,
    IncorrectMatch,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HookError {
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("{0} with no level in progress")]
    NoActiveLevel(GameEvent),

    #[error("hook panicked: {0}")]
    Panicked(String),
}

pub trait GameObserver {
    fn name(&self) -> &str;

    fn on_event(&mut self, event: GameEvent, game: &dyn GameView) -> Result<(), HookError>;
}

/// Reports gameplay to an [`Analytics`] backend
pub struct AnalyticsObserver<A: Analytics, C: Clock> {
    analytics: A,
    tracker: SharedTracker,
    clock: C,
    ids: LevelIds,
    unknown_label: String,
}

impl<A: Analytics, C: Clock> AnalyticsObserver<A, C> {
    pub fn new(analytics: A, tracker: SharedTracker, clock: C) -> Self {
        Self {
            analytics,
            tracker,
            clock,
            ids: LevelIds::default(),
            unknown_label: UNKNOWN_LABEL.to_string(),
        }
    }

    pub fn with_level_ids(mut self, ids: LevelIds) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_unknown_label(mut self, label: impl Into<String>) -> Self {
        self.unknown_label = label.into();
        self
    }

    /// Hands the session identity to analytics. Called once, before any event.
    pub fn initialize(&mut self, session: &Session) -> Result<(), HookError> {
        info!(app_id = session.app_id(), session_id = %session.id(), "analytics initializing");
        self.analytics
            .initialize(session.app_id(), session.id().as_str())?;
        Ok(())
    }

    fn start_level(&mut self, mode: GameMode, level_id: String) -> Result<(), HookError> {
        // local state first so a failing backend can't leave stale counters
        self.tracker
            .borrow_mut()
            .start(mode, level_id.as_str(), self.clock.now());
        info!(%mode, level_id = %level_id, "level started");
        self.analytics.start_level(&level_id)?;
        Ok(())
    }

    fn record_match(
        &mut self,
        event: GameEvent,
        outcome: TaskOutcome,
        game: &dyn GameView,
    ) -> Result<(), HookError> {
        let (level_id, task) = {
            let mut tracker = self.tracker.borrow_mut();
            let level_id = tracker
                .level_id()
                .map(str::to_owned)
                .ok_or(HookError::NoActiveLevel(event))?;
            let task = tracker.next_task().ok_or(HookError::NoActiveLevel(event))?;
            (level_id, task)
        };
        let (value1, value2) = flipped_labels(game, &self.unknown_label);
        debug!(level_id = %level_id, task, %outcome, %value1, %value2, "match recorded");

        // per-task timing and XP are not measured; zeros keep the record shape
        self.analytics.record_task(TaskRecord {
            level_id,
            task_id: format!("task_{task}"),
            label: outcome.to_string(),
            value1,
            value2,
            time_taken: Duration::ZERO,
            xp_earned: 0,
        })?;
        Ok(())
    }

    fn end_level(&mut self, event: GameEvent, game: &dyn GameView) -> Result<(), HookError> {
        let summary = self
            .tracker
            .borrow()
            .summary(self.clock.now())
            .ok_or(HookError::NoActiveLevel(event))?;
        let xp = game.calculate_xp();
        info!(
            level_id = %summary.level_id,
            elapsed = ?summary.elapsed,
            xp,
            tasks = summary.tasks,
            "level ended"
        );

        self.analytics
            .end_level(&summary.level_id, true, summary.elapsed, xp)?;
        self.analytics
            .add_raw_metric("turns", MetricValue::from(game.turns()))?;
        self.analytics
            .add_raw_metric("tasks_recorded", MetricValue::from(summary.tasks))?;
        self.analytics
            .add_raw_metric("mode", MetricValue::from(summary.mode.to_string()))?;
        self.analytics.submit_report()?;
        Ok(())
    }
}

impl<A: Analytics, C: Clock> GameObserver for AnalyticsObserver<A, C> {
    fn name(&self) -> &str {
        "analytics"
    }

    fn on_event(&mut self, event: GameEvent, game: &dyn GameView) -> Result<(), HookError> {
        match event {
            GameEvent::CampaignLevelStarted { level } => {
                let id = self.ids.campaign(level);
                self.start_level(GameMode::Campaign, id)
            }
            GameEvent::ReflexModeStarted => {
                let id = self.ids.reflex();
                self.start_level(GameMode::Reflex, id)
            }
            GameEvent::MatchCorrect => self.record_match(event, TaskOutcome::CorrectMatch, game),
            GameEvent::MatchIncorrect => {
                self.record_match(event, TaskOutcome::IncorrectMatch, game)
            }
            GameEvent::CampaignWon | GameEvent::ReflexEnded => self.end_level(event, game),
        }
    }
}

/// Routes game entry points through the registered observers
#[derive(Default)]
pub struct Interceptor {
    observers: Vec<Box<dyn GameObserver>>,
}

impl Interceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: impl GameObserver + 'static) -> &mut Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Runs every observer for `event`, returning the failures it swallowed
    pub fn notify(&mut self, event: GameEvent, game: &dyn GameView) -> usize {
        let mut failures = 0;
        for observer in self.observers.iter_mut() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| observer.on_event(event, game)))
                .unwrap_or_else(|payload| Err(HookError::Panicked(panic_message(&*payload))));
            if let Err(error) = result {
                failures += 1;
                warn!(observer = observer.name(), %event, %error, "hook failed, game continues");
            }
        }
        failures
    }

    /// Notifies observers, then always calls `original` and returns its result
    pub fn intercept<G, R, F>(&mut self, event: GameEvent, game: &mut G, original: F) -> R
    where
        G: GameView,
        F: FnOnce(&mut G) -> R,
    {
        self.notify(event, &*game);
        original(game)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
