use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::clock::ManualClock;
use crate::demo::InstrumentedGame;

/// One scripted player action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    CampaignStart { level: u32 },
    ReflexStart,
    Flip { labels: Vec<String> },
    MatchCorrect,
    MatchIncorrect,
    CampaignWon,
    ReflexEnd,
    Wait { ms: u64 },
}

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed script: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Source of scripted steps; `None` ends the replay
pub trait StepSource {
    fn next_step(&mut self) -> Option<ScriptStep>;
}

/// Steps parsed up front from a JSON array
#[derive(Debug, Clone, Default)]
pub struct ScriptSource {
    steps: VecDeque<ScriptStep>,
}

impl ScriptSource {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: steps.into(),
        }
    }

    pub fn parse(json: &str) -> Result<Self, ScriptError> {
        let steps: Vec<ScriptStep> = serde_json::from_str(json)?;
        Ok(Self::new(steps))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl StepSource for ScriptSource {
    fn next_step(&mut self) -> Option<ScriptStep> {
        self.steps.pop_front()
    }
}

/// Steps fed from another thread; ends when every sender is dropped
pub struct ChannelSource {
    rx: Receiver<ScriptStep>,
}

impl ChannelSource {
    pub fn new(rx: Receiver<ScriptStep>) -> Self {
        Self { rx }
    }
}

impl StepSource for ChannelSource {
    fn next_step(&mut self) -> Option<ScriptStep> {
        self.rx.recv().ok()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub steps: usize,
    pub levels_started: usize,
    pub levels_ended: usize,
    pub matches: usize,
    pub waited: Duration,
}

/// Drives an [`InstrumentedGame`] one step at a time; `wait` steps move
/// the replay clock instead of sleeping
pub struct Runner<S: StepSource> {
    source: S,
    clock: ManualClock,
}

impl<S: StepSource> Runner<S> {
    pub fn new(source: S, clock: ManualClock) -> Self {
        Self { source, clock }
    }

    pub fn step(&mut self, game: &mut InstrumentedGame, stats: &mut RunStats) -> bool {
        let Some(step) = self.source.next_step() else {
            return false;
        };
        debug!(?step, "replaying");
        stats.steps += 1;
        match step {
            ScriptStep::CampaignStart { level } => {
                game.start_campaign_level(level);
                stats.levels_started += 1;
            }
            ScriptStep::ReflexStart => {
                game.start_reflex_mode();
                stats.levels_started += 1;
            }
            ScriptStep::Flip { labels } => game.flip(labels),
            ScriptStep::MatchCorrect => {
                game.correct_match();
                stats.matches += 1;
            }
            ScriptStep::MatchIncorrect => {
                game.incorrect_match();
                stats.matches += 1;
            }
            ScriptStep::CampaignWon => {
                game.campaign_win();
                stats.levels_ended += 1;
            }
            ScriptStep::ReflexEnd => {
                game.reflex_end();
                stats.levels_ended += 1;
            }
            ScriptStep::Wait { ms } => {
                let by = Duration::from_millis(ms);
                self.clock.advance(by);
                stats.waited += by;
            }
        }
        true
    }

    pub fn run(&mut self, game: &mut InstrumentedGame) -> RunStats {
        let mut stats = RunStats::default();
        while self.step(game, &mut stats) {}
        stats
    }
}
