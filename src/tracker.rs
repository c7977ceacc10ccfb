use crate::clock::time_diff;
use crate::level::GameMode;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, SystemTime};

/// Tracker handle shared between the host and its hooks
pub type SharedTracker = Rc<RefCell<LevelTracker>>;

#[derive(Debug, Clone, PartialEq)]
struct ActiveLevel {
    mode: GameMode,
    level_id: String,
    started_at: SystemTime,
    tasks: u32,
}

/// What was known about a level at the moment it ended
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSummary {
    pub mode: GameMode,
    pub level_id: String,
    pub elapsed: Duration,
    pub tasks: u32,
}

/// Per-session level/task state. Starting a level always overwrites
/// whatever was there before; ending one leaves it readable until then.
#[derive(Debug, Clone, Default)]
pub struct LevelTracker {
    active: Option<ActiveLevel>,
}

impl LevelTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, mode: GameMode, level_id: impl Into<String>, now: SystemTime) {
        self.active = Some(ActiveLevel {
            mode,
            level_id: level_id.into(),
            started_at: now,
            tasks: 0,
        });
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn mode(&self) -> Option<GameMode> {
        self.active.as_ref().map(|a| a.mode)
    }

    pub fn level_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.level_id.as_str())
    }

    pub fn task_count(&self) -> u32 {
        self.active.as_ref().map_or(0, |a| a.tasks)
    }

    /// Bumps the counter and returns the new value
    pub fn next_task(&mut self) -> Option<u32> {
        let active = self.active.as_mut()?;
        active.tasks += 1;
        Some(active.tasks)
    }

    pub fn elapsed(&self, now: SystemTime) -> Option<Duration> {
        self.active
            .as_ref()
            .map(|a| time_diff(a.started_at, now))
    }

    pub fn summary(&self, now: SystemTime) -> Option<LevelSummary> {
        let active = self.active.as_ref()?;
        Some(LevelSummary {
            mode: active.mode,
            level_id: active.level_id.clone(),
            elapsed: time_diff(active.started_at, now),
            tasks: active.tasks,
        })
    }

    pub fn shared(self) -> SharedTracker {
        Rc::new(RefCell::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn at(ms: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(ms)
    }

    #[test]
    fn idle_tracker_has_no_level() {
        let mut tracker = LevelTracker::new();
        assert!(!tracker.is_active());
        assert_eq!(tracker.next_task(), None);
        assert_eq!(tracker.task_count(), 0);
        assert_eq!(tracker.elapsed(at(10)), None);
        assert_eq!(tracker.summary(at(10)), None);
    }

    #[test]
    fn tasks_increment_by_one() {
        let mut tracker = LevelTracker::new();
        tracker.start(GameMode::Campaign, "campaign_level_1", at(0));
        assert_eq!(tracker.next_task(), Some(1));
        assert_eq!(tracker.next_task(), Some(2));
        assert_eq!(tracker.next_task(), Some(3));
        assert_eq!(tracker.task_count(), 3);
    }

    #[test]
    fn start_resets_counter() {
        let mut tracker = LevelTracker::new();
        tracker.start(GameMode::Campaign, "campaign_level_1", at(0));
        tracker.next_task();
        tracker.next_task();

        tracker.start(GameMode::Reflex, "reflex_mode", at(500));
        assert_eq!(tracker.task_count(), 0);
        assert_eq!(tracker.mode(), Some(GameMode::Reflex));
        assert_eq!(tracker.level_id(), Some("reflex_mode"));
        assert_eq!(tracker.next_task(), Some(1));
    }

    #[test]
    fn summary_reports_elapsed_and_keeps_level() {
        let mut tracker = LevelTracker::new();
        tracker.start(GameMode::Campaign, "campaign_level_4", at(1_000));
        tracker.next_task();

        let summary = tracker.summary(at(3_500)).unwrap();
        assert_eq!(
            summary,
            LevelSummary {
                mode: GameMode::Campaign,
                level_id: "campaign_level_4".into(),
                elapsed: Duration::from_millis(2_500),
                tasks: 1,
            }
        );
        assert!(tracker.is_active());
        assert_eq!(tracker.task_count(), 1);
    }

    #[test]
    fn elapsed_is_zero_when_clock_goes_back() {
        let mut tracker = LevelTracker::new();
        tracker.start(GameMode::Reflex, "reflex_mode", at(5_000));
        assert_eq!(tracker.elapsed(at(1_000)), Some(Duration::ZERO));
    }
}
