use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "cardtrace").map(|pd| pd.config_dir().join("config.json"))
    }

    /// `$HOME/.local/state/cardtrace/reports`, else the platform data dir
    pub fn report_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("cardtrace");
            Some(state_dir.join("reports"))
        } else {
            ProjectDirs::from("", "", "cardtrace")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("reports"))
        }
    }
}
