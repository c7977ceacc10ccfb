use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Anonymous tracking identity for one run of the game
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self::generate_at(SystemTime::now(), &mut rand::thread_rng())
    }

    /// `session_{unix_millis}_{base36 suffix}`
    pub fn generate_at<R: Rng>(now: SystemTime, rng: &mut R) -> Self {
        let millis = now
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("session_{millis}_{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity handed to analytics once at startup; never mutated afterwards
#[derive(Debug, Clone)]
pub struct Session {
    app_id: String,
    id: SessionId,
    started_at: SystemTime,
}

impl Session {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self::with_id(app_id, SessionId::generate(), SystemTime::now())
    }

    pub fn with_id(app_id: impl Into<String>, id: SessionId, started_at: SystemTime) -> Self {
        Self {
            app_id: app_id.into(),
            id,
            started_at,
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }
}
