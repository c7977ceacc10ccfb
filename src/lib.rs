// Library surface for the cardtrace binary and integration tests.
pub mod analytics;
pub mod app_dirs;
pub mod clock;
pub mod collector;
pub mod config;
pub mod demo;
pub mod error_filter;
pub mod game;
pub mod hooks;
pub mod level;
pub mod runtime;
pub mod session;
pub mod tracker;

pub use analytics::{Analytics, AnalyticsError, MetricValue, TaskRecord};
pub use hooks::{AnalyticsObserver, GameEvent, GameObserver, HookError, Interceptor};
pub use session::{Session, SessionId};
pub use tracker::{LevelTracker, SharedTracker};
