//! Server configuration, matching the original `Config` dataclass: a data
//! directory prefix plus suffixes for the pieces external collaborators
//! (persistence, asset serving) care about. The core only reads `http_port`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_prefix: String,
    pub record_directory_suffix: String,
    pub assets_directory_suffix: String,
    pub database_path_suffix: String,
    pub http_port: u16,
    pub gui: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            data_prefix: "./".into(),
            record_directory_suffix: "game_records/".into(),
            assets_directory_suffix: "assets/".into(),
            database_path_suffix: "game_data.db".into(),
            http_port: 8080,
            gui: false,
        }
    }
}

impl Config {
    pub fn record_directory(&self) -> PathBuf {
        self.joined(&self.record_directory_suffix)
    }

    pub fn assets_directory(&self) -> PathBuf {
        self.joined(&self.assets_directory_suffix)
    }

    pub fn database_path(&self) -> PathBuf {
        self.joined(&self.database_path_suffix)
    }

    fn joined(&self, suffix: &str) -> PathBuf {
        expand_home(&self.data_prefix).join(suffix)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
