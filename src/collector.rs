use crate::analytics::{secs_f64, Analytics, AnalyticsError, AnalyticsResult, MetricValue, TaskRecord};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelResult {
    pub success: bool,
    #[serde(with = "secs_f64")]
    pub time_taken: Duration,
    pub xp: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelReport {
    pub level_id: String,
    pub tasks: Vec<TaskRecord>,
    pub result: Option<LevelResult>,
}

/// Everything gathered between two submissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub app_id: String,
    pub session_id: String,
    pub submitted_at: Option<DateTime<Local>>,
    pub levels: Vec<LevelReport>,
    pub raw_metrics: BTreeMap<String, MetricValue>,
}

impl Report {
    fn new(app_id: &str, session_id: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
            session_id: session_id.to_string(),
            submitted_at: None,
            levels: Vec::new(),
            raw_metrics: BTreeMap::new(),
        }
    }

    pub fn task_count(&self) -> usize {
        self.levels.iter().map(|l| l.tasks.len()).sum()
    }
}

pub trait ReportSink {
    fn deliver(&mut self, report: &Report) -> AnalyticsResult<()>;
}

/// Keeps delivered reports in memory. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    reports: Rc<RefCell<Vec<Report>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.borrow().clone()
    }
}

impl ReportSink for MemorySink {
    fn deliver(&mut self, report: &Report) -> AnalyticsResult<()> {
        self.reports.borrow_mut().push(report.clone());
        Ok(())
    }
}

/// Delivers to both sinks even if one fails; reports the first error
impl<A: ReportSink, B: ReportSink> ReportSink for (A, B) {
    fn deliver(&mut self, report: &Report) -> AnalyticsResult<()> {
        let first = self.0.deliver(report);
        let second = self.1.deliver(report);
        first.and(second)
    }
}

/// Appends one JSON object per report to `<dir>/<session_id>.jsonl`
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    dir: PathBuf,
}

impl JsonLinesSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.jsonl"))
    }
}

impl ReportSink for JsonLinesSink {
    fn deliver(&mut self, report: &Report) -> AnalyticsResult<()> {
        let sink_err = |e: std::io::Error| AnalyticsError::Sink(e.to_string());
        fs::create_dir_all(&self.dir).map_err(sink_err)?;
        let path = self.path_for(&report.session_id);
        let mut line =
            serde_json::to_vec(report).map_err(|e| AnalyticsError::Sink(e.to_string()))?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(sink_err)?;
        file.write_all(&line).map_err(sink_err)?;
        debug!(path = %path.display(), "report appended");
        Ok(())
    }
}

/// In-process analytics backend that batches calls into [`Report`]s
#[derive(Debug)]
pub struct ReportCollector<S: ReportSink> {
    sink: S,
    current: Option<Report>,
    submitted: usize,
}

impl<S: ReportSink> ReportCollector<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            current: None,
            submitted: 0,
        }
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    pub fn pending(&self) -> Option<&Report> {
        self.current.as_ref()
    }

    fn report(&mut self) -> AnalyticsResult<&mut Report> {
        self.current.as_mut().ok_or(AnalyticsError::NotInitialized)
    }

    fn level(&mut self, level_id: &str) -> AnalyticsResult<&mut LevelReport> {
        let report = self.report()?;
        report
            .levels
            .iter_mut()
            .rev()
            .find(|l| l.level_id == level_id)
            .ok_or_else(|| AnalyticsError::UnknownLevel(level_id.to_string()))
    }
}

impl<S: ReportSink> Analytics for ReportCollector<S> {
    fn initialize(&mut self, app_id: &str, session_id: &str) -> AnalyticsResult<()> {
        self.current = Some(Report::new(app_id, session_id));
        Ok(())
    }

    fn start_level(&mut self, level_id: &str) -> AnalyticsResult<()> {
        self.report()?.levels.push(LevelReport {
            level_id: level_id.to_string(),
            tasks: Vec::new(),
            result: None,
        });
        Ok(())
    }

    fn record_task(&mut self, task: TaskRecord) -> AnalyticsResult<()> {
        self.level(&task.level_id)?.tasks.push(task);
        Ok(())
    }

    fn end_level(
        &mut self,
        level_id: &str,
        success: bool,
        time_taken: Duration,
        xp: u32,
    ) -> AnalyticsResult<()> {
        self.level(level_id)?.result = Some(LevelResult {
            success,
            time_taken,
            xp,
        });
        Ok(())
    }

    fn add_raw_metric(&mut self, key: &str, value: MetricValue) -> AnalyticsResult<()> {
        self.report()?.raw_metrics.insert(key.to_string(), value);
        Ok(())
    }

    fn submit_report(&mut self) -> AnalyticsResult<()> {
        let report = self.report()?;
        let fresh = Report::new(&report.app_id, &report.session_id);
        let mut done = std::mem::replace(report, fresh);
        done.submitted_at = Some(Local::now());
        self.sink.deliver(&done)?;
        self.submitted += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn task(level_id: &str, n: u32) -> TaskRecord {
        TaskRecord {
            level_id: level_id.into(),
            task_id: format!("task_{n}"),
            label: "correct_match".into(),
            value1: "A".into(),
            value2: "A".into(),
            time_taken: Duration::ZERO,
            xp_earned: 0,
        }
    }

    #[test]
    fn calls_before_initialize_fail() {
        let mut collector = ReportCollector::new(MemorySink::new());
        assert_eq!(
            collector.start_level("campaign_level_1"),
            Err(AnalyticsError::NotInitialized)
        );
        assert_eq!(collector.submit_report(), Err(AnalyticsError::NotInitialized));
    }

    #[test]
    fn task_for_unknown_level_fails() {
        let mut collector = ReportCollector::new(MemorySink::new());
        collector.initialize("app", "s1").unwrap();
        assert_matches!(
            collector.record_task(task("nowhere", 1)),
            Err(AnalyticsError::UnknownLevel(id)) if id == "nowhere"
        );
    }

    #[test]
    fn submit_delivers_and_starts_fresh() {
        let sink = MemorySink::new();
        let mut collector = ReportCollector::new(sink.clone());
        collector.initialize("app", "s1").unwrap();
        collector.start_level("reflex_mode").unwrap();
        collector.record_task(task("reflex_mode", 1)).unwrap();
        collector.record_task(task("reflex_mode", 2)).unwrap();
        collector
            .end_level("reflex_mode", true, Duration::from_secs(30), 55)
            .unwrap();
        collector.add_raw_metric("turns", 4u32.into()).unwrap();
        collector.submit_report().unwrap();

        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.session_id, "s1");
        assert!(report.submitted_at.is_some());
        assert_eq!(report.task_count(), 2);
        assert_eq!(
            report.levels[0].result,
            Some(LevelResult {
                success: true,
                time_taken: Duration::from_secs(30),
                xp: 55
            })
        );
        assert_eq!(report.raw_metrics["turns"], MetricValue::Int(4));

        assert_eq!(collector.submitted(), 1);
        let pending = collector.pending().unwrap();
        assert!(pending.levels.is_empty());
        assert_eq!(pending.session_id, "s1");
    }

    #[test]
    fn repeated_level_id_targets_latest_attempt() {
        let mut collector = ReportCollector::new(MemorySink::new());
        collector.initialize("app", "s1").unwrap();
        collector.start_level("reflex_mode").unwrap();
        collector.start_level("reflex_mode").unwrap();
        collector.record_task(task("reflex_mode", 1)).unwrap();

        let pending = collector.pending().unwrap();
        assert!(pending.levels[0].tasks.is_empty());
        assert_eq!(pending.levels[1].tasks.len(), 1);
    }

    struct BrokenSink;

    impl ReportSink for BrokenSink {
        fn deliver(&mut self, _: &Report) -> AnalyticsResult<()> {
            Err(AnalyticsError::Sink("read-only".into()))
        }
    }

    #[test]
    fn paired_sinks_both_receive() {
        let a = MemorySink::new();
        let b = MemorySink::new();
        let mut collector = ReportCollector::new((a.clone(), b.clone()));
        collector.initialize("app", "s1").unwrap();
        collector.submit_report().unwrap();
        assert_eq!(a.reports().len(), 1);
        assert_eq!(b.reports().len(), 1);
    }

    #[test]
    fn failing_first_sink_still_feeds_second() {
        let memory = MemorySink::new();
        let mut collector = ReportCollector::new((BrokenSink, memory.clone()));
        collector.initialize("app", "s1").unwrap();
        collector.start_level("reflex_mode").unwrap();

        assert_matches!(collector.submit_report(), Err(AnalyticsError::Sink(_)));
        let reports = memory.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].levels[0].level_id, "reflex_mode");
    }

    #[test]
    fn sink_failure_surfaces_as_analytics_error() {
        let mut collector = ReportCollector::new(BrokenSink);
        collector.initialize("app", "s1").unwrap();
        assert_matches!(collector.submit_report(), Err(AnalyticsError::Sink(_)));
        assert_eq!(collector.submitted(), 0);
    }

    #[test]
    fn json_lines_sink_appends_per_report() {
        let dir = tempdir().unwrap();
        let sink = JsonLinesSink::new(dir.path().join("reports"));
        let path = sink.path_for("s42");
        let mut collector = ReportCollector::new(sink);
        collector.initialize("app", "s42").unwrap();
        collector.start_level("campaign_level_1").unwrap();
        collector.submit_report().unwrap();
        collector.start_level("campaign_level_2").unwrap();
        collector.submit_report().unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<Report> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].levels[0].level_id, "campaign_level_1");
        assert_eq!(lines[1].levels[0].level_id, "campaign_level_2");
    }
}
