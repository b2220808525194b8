// Configuration for version history.
//
// Global config: `~/.quire/config.toml`
// Project config: `<root>/.quire/config.toml`
//
// Both files share one shape; project values override global ones, and
// explicit overrides (CLI flags, API callers) override both.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::lock::{LockOptions, DEFAULT_LOCK_TIMEOUT, DEFAULT_POLL_INTERVAL};

/// Default number of unlabeled versions retained per document.
pub const DEFAULT_MAX_VERSIONS: usize = 20;
/// Default history root, relative to the project root.
pub const DEFAULT_STORAGE_PATH: &str = ".versions";

/// Root directory for quire global state: `~/.quire/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".quire"))
}

/// Path to the global config file: `~/.quire/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

/// Path to the project config file: `<root>/.quire/config.toml`.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".quire").join("config.toml")
}

// ── Resolved history config ────────────────────────────────────────

/// Fully resolved settings every history operation receives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryConfig {
    /// When false every operation is a quiet no-op.
    pub enabled: bool,
    /// Unlabeled versions kept per document; labeled ones are never pruned.
    pub max_versions: usize,
    /// History root, relative to the project root unless absolute.
    pub storage_path: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_versions: DEFAULT_MAX_VERSIONS,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }
}

impl HistoryConfig {
    /// Merge a partial override onto the defaults.
    pub fn resolve(partial: &PartialHistoryConfig) -> Self {
        Self::default().merged(partial)
    }

    /// Apply every field set in `partial` on top of `self`.
    pub fn merged(self, partial: &PartialHistoryConfig) -> Self {
        Self {
            enabled: partial.enabled.unwrap_or(self.enabled),
            max_versions: partial.max_versions.unwrap_or(self.max_versions),
            storage_path: partial.storage_path.clone().unwrap_or(self.storage_path),
        }
    }

    /// Absolute history root for a project.
    pub fn storage_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.storage_path)
    }
}

/// History settings as they appear in a config file or override.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct PartialHistoryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_versions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
}

impl PartialHistoryConfig {
    /// Fields set in `upper` win.
    pub fn overlay(self, upper: PartialHistoryConfig) -> Self {
        Self {
            enabled: upper.enabled.or(self.enabled),
            max_versions: upper.max_versions.or(self.max_versions),
            storage_path: upper.storage_path.or(self.storage_path),
        }
    }
}

// ── Lock settings ──────────────────────────────────────────────────

/// `[lock]` table. Durations are in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct LockConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
}

impl LockConfig {
    pub fn overlay(self, upper: LockConfig) -> Self {
        Self {
            timeout_ms: upper.timeout_ms.or(self.timeout_ms),
            poll_interval_ms: upper.poll_interval_ms.or(self.poll_interval_ms),
        }
    }

    pub fn to_options(&self) -> LockOptions {
        let timeout = self.timeout_ms.map(Duration::from_millis).unwrap_or(DEFAULT_LOCK_TIMEOUT);
        let poll_interval = self
            .poll_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
            .max(Duration::from_millis(1));
        LockOptions { timeout, stale_after: timeout, poll_interval }
    }
}

// ── Config file ────────────────────────────────────────────────────

/// Contents of a global or project `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ConfigFile {
    pub history: PartialHistoryConfig,
    pub lock: LockConfig,
}

impl ConfigFile {
    /// Load global then project config and overlay them. Missing or
    /// unparseable files contribute nothing.
    pub fn load(project_root: &Path) -> Self {
        Self::load_layers(global_config_path().as_deref(), &project_config_path(project_root))
    }

    /// Testable variant with explicit file locations.
    pub fn load_layers(global: Option<&Path>, project: &Path) -> Self {
        let global = global.map(Self::load_or_default).unwrap_or_default();
        global.overlay(Self::load_or_default(project))
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    pub fn overlay(self, upper: ConfigFile) -> Self {
        Self { history: self.history.overlay(upper.history), lock: self.lock.overlay(upper.lock) }
    }

    /// Resolve history settings with caller overrides applied last.
    pub fn history_config(&self, overrides: &PartialHistoryConfig) -> HistoryConfig {
        HistoryConfig::resolve(&self.history.clone().overlay(overrides.clone()))
    }

    pub fn lock_options(&self) -> LockOptions {
        self.lock.to_options()
    }

    fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(ConfigError::Io(error)) if error.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "ignoring unreadable config");
                Self::default()
            }
        }
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config I/O error: {e}"),
            Self::Parse(e) => write!(f, "config parse error: {e}"),
            Self::Serialize(e) => write!(f, "config serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── HistoryConfig ──────────────────────────────────────────────

    #[test]
    fn history_config_defaults() {
        let cfg = HistoryConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.max_versions, 20);
        assert_eq!(cfg.storage_path, PathBuf::from(".versions"));
    }

    #[test]
    fn resolve_empty_partial_is_default() {
        assert_eq!(HistoryConfig::resolve(&PartialHistoryConfig::default()), HistoryConfig::default());
    }

    #[test]
    fn resolve_applies_only_set_fields() {
        let cfg = HistoryConfig::resolve(&PartialHistoryConfig {
            max_versions: Some(5),
            ..Default::default()
        });
        assert_eq!(cfg.max_versions, 5);
        assert!(cfg.enabled);
        assert_eq!(cfg.storage_path, PathBuf::from(".versions"));
    }

    #[test]
    fn storage_root_is_joined_to_project_root() {
        let cfg = HistoryConfig::default();
        assert_eq!(
            cfg.storage_root(Path::new("/projects/site")),
            PathBuf::from("/projects/site/.versions")
        );
    }

    // ── ConfigFile ─────────────────────────────────────────────────

    #[test]
    fn config_file_parse_from_toml() {
        let toml_str = r#"
[history]
enabled = false
max_versions = 7
storage_path = "history"

[lock]
timeout_ms = 5000
"#;
        let cfg: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.history.enabled, Some(false));
        assert_eq!(cfg.history.max_versions, Some(7));
        assert_eq!(cfg.history.storage_path, Some(PathBuf::from("history")));

        let lock = cfg.lock_options();
        assert_eq!(lock.timeout, Duration::from_secs(5));
        assert_eq!(lock.stale_after, Duration::from_secs(5));
        assert_eq!(lock.poll_interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn config_file_rejects_unknown_history_keys() {
        let error = toml::from_str::<ConfigFile>("[history]\nmax_version = 3\n")
            .expect_err("typo should fail");
        assert!(error.to_string().contains("unknown field `max_version`"));
    }

    #[test]
    fn config_file_missing_fields_use_defaults() {
        let cfg: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(cfg, ConfigFile::default());
        assert_eq!(cfg.history_config(&PartialHistoryConfig::default()), HistoryConfig::default());
    }

    #[test]
    fn config_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = ConfigFile {
            history: PartialHistoryConfig {
                enabled: Some(true),
                max_versions: Some(3),
                storage_path: None,
            },
            lock: LockConfig { timeout_ms: Some(100), poll_interval_ms: Some(10) },
        };
        cfg.save_to(&path).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn project_layer_overrides_global_layer() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        let project_root = dir.path().join("site");
        std::fs::write(&global, "[history]\nmax_versions = 50\nstorage_path = \"g\"\n").unwrap();
        ConfigFile {
            history: PartialHistoryConfig { max_versions: Some(4), ..Default::default() },
            ..Default::default()
        }
        .save_to(&project_config_path(&project_root))
        .unwrap();

        let cfg = ConfigFile::load_layers(Some(&global), &project_config_path(&project_root));
        let resolved = cfg.history_config(&PartialHistoryConfig::default());
        assert_eq!(resolved.max_versions, 4);
        assert_eq!(resolved.storage_path, PathBuf::from("g"));
    }

    #[test]
    fn overrides_win_over_files() {
        let cfg = ConfigFile {
            history: PartialHistoryConfig { enabled: Some(true), ..Default::default() },
            ..Default::default()
        };
        let resolved = cfg.history_config(&PartialHistoryConfig {
            enabled: Some(false),
            ..Default::default()
        });
        assert!(!resolved.enabled);
    }

    #[test]
    fn unparseable_layer_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("config.toml");
        std::fs::write(&project, "this is = = not toml").unwrap();

        let cfg = ConfigFile::load_layers(None, &project);
        assert_eq!(cfg, ConfigFile::default());
    }

    // ── Path helpers ───────────────────────────────────────────────

    #[test]
    fn project_config_path_is_correct() {
        let root = PathBuf::from("/projects/site");
        assert_eq!(project_config_path(&root), PathBuf::from("/projects/site/.quire/config.toml"));
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let lock = LockConfig { timeout_ms: None, poll_interval_ms: Some(0) }.to_options();
        assert_eq!(lock.poll_interval, Duration::from_millis(1));
        assert_eq!(lock.timeout, DEFAULT_LOCK_TIMEOUT);
    }
}
