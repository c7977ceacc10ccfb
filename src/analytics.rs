use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("analytics not initialized")]
    NotInitialized,

    #[error("analytics has no open level {0}")]
    UnknownLevel(String),

    #[error("analytics report sink failed: {0}")]
    Sink(String),

    #[error("analytics backend error: {0}")]
    Backend(String),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// One scored match attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub level_id: String,
    pub task_id: String,
    pub label: String,
    pub value1: String,
    pub value2: String,
    #[serde(with = "secs_f64")]
    pub time_taken: Duration,
    pub xp_earned: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<u32> for MetricValue {
    fn from(v: u32) -> Self {
        MetricValue::Int(v.into())
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::Text(v.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        MetricValue::Text(v)
    }
}

/// The external analytics collaborator
pub trait Analytics {
    fn initialize(&mut self, app_id: &str, session_id: &str) -> AnalyticsResult<()>;

    fn start_level(&mut self, level_id: &str) -> AnalyticsResult<()>;

    fn record_task(&mut self, task: TaskRecord) -> AnalyticsResult<()>;

    fn end_level(
        &mut self,
        level_id: &str,
        success: bool,
        time_taken: Duration,
        xp: u32,
    ) -> AnalyticsResult<()>;

    fn add_raw_metric(&mut self, key: &str, value: MetricValue) -> AnalyticsResult<()>;

    fn submit_report(&mut self) -> AnalyticsResult<()>;
}

/// Durations go over the wire as fractional seconds
pub(crate) mod secs_f64 {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
