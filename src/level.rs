use serde::{Deserialize, Serialize};

pub const DEFAULT_CAMPAIGN_PREFIX: &str = "campaign_level_";
pub const DEFAULT_REFLEX_LEVEL_ID: &str = "reflex_mode";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameMode {
    Campaign,
    Reflex,
}

/// Level id scheme reported to analytics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelIds {
    pub campaign_prefix: String,
    pub reflex_level_id: String,
}

impl Default for LevelIds {
    fn default() -> Self {
        Self {
            campaign_prefix: DEFAULT_CAMPAIGN_PREFIX.to_string(),
            reflex_level_id: DEFAULT_REFLEX_LEVEL_ID.to_string(),
        }
    }
}

impl LevelIds {
    pub fn campaign(&self, level: u32) -> String {
        format!("{}{}", self.campaign_prefix, level)
    }

    pub fn reflex(&self) -> String {
        self.reflex_level_id.clone()
    }
}
