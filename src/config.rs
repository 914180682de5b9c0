//! Application-level configuration loading: team colors, stage tuning, and storage location.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    dto::validation::is_hex_color,
    state::stage::{Stage, StageConfig},
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CERDAS_CERMAT_CONFIG_PATH";
/// Environment variable that overrides the data directory.
const DATA_DIR_ENV: &str = "SCOREBOARD_DATA_DIR";
/// Directory holding the stage blobs when nothing else is configured.
const DEFAULT_DATA_DIR: &str = "data";
/// Fallback color returned when the colors set is exhausted.
const DEFAULT_COLOR: &str = "#ffffff";
/// Largest roster a stage may be configured with.
const MAX_TEAMS: usize = 9;

/// Where stage blobs are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// One JSON file per stage under the data directory.
    #[default]
    File,
    /// Process memory only; everything is lost on exit.
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct StageOverrides {
    team_count: Option<usize>,
    timer_seconds: Option<u32>,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    colors: Vec<String>,
    semifinal: StageOverrides,
    final_stage: StageOverrides,
    data_dir: PathBuf,
    storage: StorageKind,
    initial_stage: Stage,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        colors = app_config.colors.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };
        config.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .filter(|path| !path.as_os_str().is_empty())
        {
            self.data_dir = dir;
        }
        self
    }

    /// Return the first palette color not already listed in `used`.
    ///
    /// When every palette entry is taken we fall back to white so callers always
    /// receive a value.
    pub fn first_unused_color(&self, used: &[String]) -> String {
        self.colors
            .iter()
            .find(|candidate| !used.contains(candidate))
            .cloned()
            .unwrap_or_else(|| DEFAULT_COLOR.to_string())
    }

    /// Stage configuration with the configured team count and timer applied.
    pub fn stage_config(&self, stage: Stage) -> StageConfig {
        let mut config = StageConfig::for_stage(stage);
        let overrides = match stage {
            Stage::Semifinal => &self.semifinal,
            Stage::Final => &self.final_stage,
        };
        if let Some(count) = overrides.team_count {
            config.team_count = count.clamp(1, MAX_TEAMS);
        }
        if let Some(seconds) = overrides.timer_seconds.filter(|seconds| *seconds > 0) {
            config.timer_seconds = seconds;
        }
        config
    }

    /// Directory holding the stage blobs.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Selected storage backend.
    pub fn storage(&self) -> StorageKind {
        self.storage
    }

    /// Stage loaded at startup.
    pub fn initial_stage(&self) -> Stage {
        self.initial_stage
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            colors: default_colors(),
            semifinal: StageOverrides::default(),
            final_stage: StageOverrides::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage: StorageKind::default(),
            initial_stage: Stage::Final,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    colors: Option<Vec<String>>,
    #[serde(default)]
    semifinal: RawStage,
    #[serde(default, rename = "final")]
    final_stage: RawStage,
    #[serde(default)]
    data_dir: Option<PathBuf>,
    #[serde(default)]
    storage: StorageKind,
    #[serde(default)]
    initial_stage: Option<Stage>,
}

#[derive(Debug, Default, Deserialize)]
/// Per-stage tuning inside the configuration file.
struct RawStage {
    team_count: Option<usize>,
    timer_seconds: Option<u32>,
}

impl From<RawStage> for StageOverrides {
    fn from(value: RawStage) -> Self {
        Self {
            team_count: value.team_count,
            timer_seconds: value.timer_seconds,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        let colors = match value.colors {
            Some(colors) => {
                let (valid, invalid): (Vec<String>, Vec<String>) = colors
                    .into_iter()
                    .map(|color| color.to_lowercase())
                    .partition(|color| is_hex_color(color));
                if !invalid.is_empty() {
                    warn!(?invalid, "ignoring palette entries that are not #RRGGBB");
                }
                valid
            }
            None => defaults.colors,
        };

        Self {
            colors,
            semifinal: value.semifinal.into(),
            final_stage: value.final_stage.into(),
            data_dir: value.data_dir.unwrap_or(defaults.data_dir),
            storage: value.storage,
            initial_stage: value.initial_stage.unwrap_or(defaults.initial_stage),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in palette shipped with the binary.
fn default_colors() -> Vec<String> {
    [
        "#e53935", "#1e88e5", "#43a047", "#fdd835", "#8e24aa", "#fb8c00", "#00acc1", "#d81b60",
        "#6d4c41", "#3949ab",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AppConfig {
        serde_json::from_str::<RawConfig>(json).unwrap().into()
    }

    #[test]
    fn palette_skips_used_colors() {
        let config = AppConfig::default();
        let used = vec!["#e53935".to_string()];
        assert_eq!(config.first_unused_color(&used), "#1e88e5");
    }

    #[test]
    fn exhausted_palette_falls_back_to_white() {
        let config = parse(r##"{"colors": ["#000000"]}"##);
        assert_eq!(config.first_unused_color(&["#000000".into()]), DEFAULT_COLOR);
    }

    #[test]
    fn invalid_palette_entries_are_dropped() {
        let config = parse(r##"{"colors": ["#ABCDEF", "red", "#12345"]}"##);
        assert_eq!(config.colors, vec!["#abcdef"]);
    }

    #[test]
    fn stage_overrides_apply() {
        let config = parse(
            r#"{
                "semifinal": {"team_count": 6, "timer_seconds": 20},
                "final": {"timer_seconds": 0, "team_count": 40},
                "storage": "memory",
                "initial_stage": "semifinal"
            }"#,
        );

        let semifinal = config.stage_config(Stage::Semifinal);
        assert_eq!(semifinal.team_count, 6);
        assert_eq!(semifinal.timer_seconds, 20);

        let final_stage = config.stage_config(Stage::Final);
        assert_eq!(final_stage.team_count, MAX_TEAMS);
        assert_eq!(final_stage.timer_seconds, 10);

        assert_eq!(config.storage(), StorageKind::Memory);
        assert_eq!(config.initial_stage(), Stage::Semifinal);
        assert_eq!(config.data_dir(), Path::new(DEFAULT_DATA_DIR));
    }
}
