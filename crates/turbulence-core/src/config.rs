//! Configuration loading and discovery.
//!
//! This module provides configuration file discovery by:
//! 1. Walking up from the current directory to find project config
//! 2. Loading user config from XDG config directory
//! 3. Merging with sensible defaults
//!
//! # Supported formats
//!
//! - TOML (`.toml`)
//! - YAML (`.yaml`, `.yml`)
//! - JSON (`.json`)
//!
//! # Config file locations (in order of precedence, highest first):
//! - `turbulence.<ext>` in current directory or any parent
//! - `.turbulence.<ext>` in current directory or any parent
//! - `rtd.<ext>` in current directory or any parent
//! - `.rtd.<ext>` in current directory or any parent
//! - `~/.config/turbulence/config.<ext>` (user config)
//!
//! Where `<ext>` is one of: `toml`, `yaml`, `yml`, `json`
//!
//! When multiple files exist in the same directory, all are merged via figment.
//! Later extensions override earlier: toml < yaml < yml < json.
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use turbulence_core::config::{Config, ConfigLoader};
//!
//! let cwd = std::env::current_dir().unwrap();
//! let cwd = Utf8PathBuf::try_from(cwd).expect("current directory is not valid UTF-8");
//! let (config, _sources) = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! println!("alpha = {}", config.alpha);
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::compare::CompareOptions;
use crate::divergence::DEFAULT_ALPHA;
use crate::error::{ConfigError, ConfigResult, StopwordError};
use crate::hot_words::DEFAULT_TOP_K;
use crate::ranks::TieMethod;
use crate::stopwords::StopwordSet;

/// Default maximum input file size (5 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;

/// The configuration for turbulence.
///
/// Deserialized from config files found during discovery (TOML, YAML, or
/// JSON). Command-line flags override these values.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files (falls back to platform defaults if unset).
    pub log_dir: Option<Utf8PathBuf>,
    /// Rank exponent used when `--alpha` is not given (default 1/3).
    pub alpha: f64,
    /// Hot words per side when `--top-k` is not given (default 30).
    pub top_k: usize,
    /// Tie handling for equal counts.
    pub tie_method: TieMethod,
    /// Word-per-line stopword file.
    pub stopwords_file: Option<Utf8PathBuf>,
    /// Built-in stopword list to use (`en`, `de`, ...).
    pub stopwords_language: Option<String>,
    /// Maximum input size in bytes (default: 5 MiB).
    ///
    /// Guards both the CLI and the MCP server against oversized corpora.
    /// Omit to use the default. Use `disable_input_limit` to remove the
    /// limit entirely.
    pub max_input_bytes: Option<usize>,
    /// Disable the input size limit entirely.
    ///
    /// When `true`, `max_input_bytes` is ignored and no size check is performed.
    pub disable_input_limit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_dir: None,
            alpha: DEFAULT_ALPHA,
            top_k: DEFAULT_TOP_K,
            tie_method: TieMethod::default(),
            stopwords_file: None,
            stopwords_language: None,
            max_input_bytes: None,
            disable_input_limit: false,
        }
    }
}

impl Config {
    /// Effective input size limit, or `None` when disabled.
    pub fn input_limit(&self) -> Option<usize> {
        if self.disable_input_limit {
            None
        } else {
            Some(self.max_input_bytes.unwrap_or(DEFAULT_MAX_INPUT_BYTES))
        }
    }

    /// Comparison settings taken from this config.
    pub const fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            alpha: self.alpha,
            top_k: self.top_k,
            tie_method: self.tie_method,
        }
    }

    /// Build the configured stopword set.
    ///
    /// The language list and the file are unioned; with neither set only
    /// punctuation is filtered.
    pub fn stopwords(&self) -> Result<StopwordSet, StopwordError> {
        let mut set = match self.stopwords_language.as_deref() {
            Some(language) => StopwordSet::for_language(language)?,
            None => StopwordSet::empty(),
        };
        if let Some(ref path) = self.stopwords_file {
            let from_file = StopwordSet::from_file(path)?;
            set.extend(from_file.iter().map(str::to_string));
        }
        Ok(set)
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Metadata about which configuration sources were loaded.
///
/// Returned alongside [`Config`] from [`ConfigLoader::load()`] so commands
/// can report the actual config files without re-discovering them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSources {
    /// Project config files found by walking up, ordered low→high precedence.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_files: Vec<Utf8PathBuf>,
    /// User config file from XDG config directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_file: Option<Utf8PathBuf>,
    /// Explicit config files loaded (e.g., from `--config` flag).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigSources {
    /// Returns the highest-precedence config file that was loaded.
    ///
    /// Precedence: explicit files > project files > user file.
    pub fn primary_file(&self) -> Option<&Utf8Path> {
        self.explicit_files
            .last()
            .map(Utf8PathBuf::as_path)
            .or_else(|| self.project_files.last().map(Utf8PathBuf::as_path))
            .or(self.user_file.as_deref())
    }
}

/// Config file extensions, merged in this order within one directory.
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Name of the XDG config directory.
const APP_NAME: &str = "turbulence";

/// Config file stems, lowest precedence first.
const APP_NAMES: &[&str] = &["rtd", "turbulence"];

/// Directory entry that ends the upward search.
const BOUNDARY_MARKER: &str = ".git";

/// Builder that layers defaults, config files and `TURBULENCE_*` variables.
#[derive(Debug)]
pub struct ConfigLoader {
    project_search_root: Option<Utf8PathBuf>,
    include_user_config: bool,
    explicit_files: Vec<Utf8PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader reading the user config and nothing else until told more.
    pub const fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            explicit_files: Vec::new(),
        }
    }

    /// Walk up from `path` looking for project config files.
    ///
    /// The walk stops at the first directory holding any config file, or
    /// after the directory containing `.git`.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Toggle the user config in the XDG directory.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Merge `path` after every discovered file (`--config`).
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Merge all sources into a [`Config`].
    ///
    /// Later layers win: defaults, user config, project files (closest
    /// directory only), explicit files, then environment variables.
    /// Relative `stopwords_file` and `log_dir` values are anchored at the
    /// directory of the file that set them; values from the environment
    /// stay relative to the working directory.
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<(Config, ConfigSources)> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let mut sources = ConfigSources::default();

        if self.include_user_config
            && let Some(user_config) = find_user_config()
        {
            figment = merge_file(figment, &user_config);
            sources.user_file = Some(user_config);
        }

        if let Some(ref root) = self.project_search_root {
            let project_configs = find_project_configs(root);
            for file in &project_configs {
                figment = merge_file(figment, file);
            }
            sources.project_files = project_configs;
        }

        for file in &self.explicit_files {
            figment = merge_file(figment, file);
        }
        sources.explicit_files = self.explicit_files;

        figment = figment.merge(Env::prefixed("TURBULENCE_").lowercase(true));

        let mut config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        anchor_relative(&figment, "stopwords_file", &mut config.stopwords_file);
        anchor_relative(&figment, "log_dir", &mut config.log_dir);

        tracing::info!(
            log_level = config.log_level.as_str(),
            alpha = config.alpha,
            top_k = config.top_k,
            "configuration loaded"
        );
        Ok((config, sources))
    }
}

/// Config files of the closest directory at or above `start` that has any.
///
/// Ordered low to high precedence: `rtd` before `turbulence`, and the
/// dotfile before the plain name for each.
fn find_project_configs(start: &Utf8Path) -> Vec<Utf8PathBuf> {
    for dir in start.ancestors() {
        let found: Vec<Utf8PathBuf> = APP_NAMES
            .iter()
            .flat_map(|name| [format!(".{name}"), (*name).to_string()])
            .flat_map(|stem| {
                CONFIG_EXTENSIONS
                    .iter()
                    .map(move |ext| dir.join(format!("{stem}.{ext}")))
            })
            .filter(|candidate| candidate.is_file())
            .collect();

        if !found.is_empty() {
            return found;
        }
        // a config beside the marker still counts
        if dir != start && dir.join(BOUNDARY_MARKER).exists() {
            break;
        }
    }
    Vec::new()
}

/// First `config.<ext>` in the XDG config directory.
fn find_user_config() -> Option<Utf8PathBuf> {
    let config_dir = user_config_dir()?;
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| config_dir.join(format!("config.{ext}")))
        .find(|path| path.is_file())
}

fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
    match path.extension() {
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
        Some("json") => figment.merge(Json::file_exact(path.as_str())),
        _ => figment.merge(Toml::file_exact(path.as_str())),
    }
}

/// Rebase a relative path onto the directory of the file that supplied it.
fn anchor_relative(figment: &Figment, key: &str, slot: &mut Option<Utf8PathBuf>) {
    let Some(path) = slot.as_ref().filter(|p| p.is_relative()) else {
        return;
    };
    let Some(dir) = figment
        .find_metadata(key)
        .and_then(|meta| meta.source.as_ref())
        .and_then(|source| source.file_path())
        .and_then(std::path::Path::parent)
        .and_then(Utf8Path::from_path)
    else {
        return;
    };
    let anchored = dir.join(path);
    tracing::debug!(key, path = %anchored, "anchored relative config path");
    *slot = Some(anchored);
}

/// XDG-style directories for the application, if a home directory exists.
fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Directory holding the user config file.
///
/// `~/.config/turbulence/` on Linux, `~/Library/Application Support/turbulence/`
/// on macOS.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serializes tests that mutate environment variables via `set_var`/`remove_var`.
    /// Prevents race conditions when nextest runs tests in the same binary concurrently.
    static TEST_ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn write_config(dir: &TempDir, name: &str, content: &str) -> Utf8PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        Utf8PathBuf::try_from(path).unwrap()
    }

    fn load_file(path: &Utf8Path) -> Config {
        let (config, _sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_file(path)
            .load()
            .unwrap();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.log_dir.is_none());
        assert!((config.alpha - 1.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(config.top_k, 30);
        assert_eq!(config.tie_method, TieMethod::Average);
    }

    #[test]
    fn test_loader_builds_with_defaults() {
        let loader = ConfigLoader::new().with_user_config(false);

        // Should succeed with defaults even if no files found
        let (config, sources) = loader.load().unwrap();
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(sources.primary_file().is_none());
    }

    #[test]
    fn test_single_file_overrides_default() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            "config.toml",
            r#"log_level = "debug"
log_dir = "/tmp/turbulence"
alpha = 0.5
top_k = 12
tie_method = "ordinal"
"#,
        );

        let config = load_file(&path);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(
            config.log_dir.as_ref().map(|dir| dir.as_str()),
            Some("/tmp/turbulence")
        );
        assert!((config.alpha - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.top_k, 12);
        assert_eq!(config.tie_method, TieMethod::Ordinal);
    }

    #[test]
    fn test_later_file_overrides_earlier() {
        let tmp = TempDir::new().unwrap();
        let base = write_config(&tmp, "base.toml", "top_k = 5\nlog_level = \"warn\"\n");
        let over = write_config(&tmp, "override.toml", "top_k = 7\n");

        let (config, _sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&base)
            .with_file(&over)
            .load()
            .unwrap();

        // Later file wins, untouched keys survive
        assert_eq!(config.top_k, 7);
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_yaml_and_json_formats() {
        let tmp = TempDir::new().unwrap();
        let yaml = write_config(&tmp, "c.yaml", "log_dir: /var/log/rtd\ntop_k: 3\n");
        let config = load_file(&yaml);
        assert_eq!(config.log_dir.as_ref().map(|d| d.as_str()), Some("/var/log/rtd"));
        assert_eq!(config.top_k, 3);

        let json = write_config(&tmp, "c.json", r#"{"alpha": 2.0}"#);
        let config = load_file(&json);
        assert!((config.alpha - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_project_config_discovery() {
        let tmp = TempDir::new().unwrap();
        let project_dir = tmp.path().join("project");
        let sub_dir = project_dir.join("data").join("daily");
        fs::create_dir_all(&sub_dir).unwrap();
        fs::write(project_dir.join(".turbulence.toml"), "top_k = 4\n").unwrap();

        let sub_dir = Utf8PathBuf::try_from(sub_dir).unwrap();

        // Search from deep subdirectory
        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_project_search(&sub_dir)
            .load()
            .unwrap();

        assert_eq!(config.top_k, 4);
        assert!(!sources.project_files.is_empty());
    }

    #[test]
    fn test_boundary_marker_stops_search() {
        let tmp = TempDir::new().unwrap();

        // Create structure: /parent/config, /parent/child/.git/, /parent/child/work/
        let parent = tmp.path().join("parent");
        let child = parent.join("child");
        let work = child.join("work");
        fs::create_dir_all(&work).unwrap();

        // Config in parent (should NOT be found due to .git boundary)
        fs::write(parent.join(".turbulence.toml"), r#"log_level = "warn""#).unwrap();
        fs::create_dir(child.join(".git")).unwrap();

        let work = Utf8PathBuf::try_from(work).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_project_search(&work)
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Info);
        assert!(sources.project_files.is_empty());
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        fs::create_dir_all(root.join("static")).unwrap();
        fs::create_dir_all(root.join("data")).unwrap();
        fs::write(root.join("static/stopwords.txt"), "zzyzx\n").unwrap();
        fs::write(
            root.join(".turbulence.toml"),
            "stopwords_file = \"static/stopwords.txt\"\nlog_dir = \"logs\"\n",
        )
        .unwrap();

        let (config, _sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_project_search(root.join("data"))
            .load()
            .unwrap();

        assert_eq!(
            config.stopwords_file.as_deref(),
            Some(root.join("static/stopwords.txt").as_path())
        );
        assert_eq!(config.log_dir.as_deref(), Some(root.join("logs").as_path()));
        assert!(config.stopwords().unwrap().contains("zzyzx"));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "config.toml", "log_dir = \"/var/log/rtd\"\n");
        let config = load_file(&path);
        assert_eq!(config.log_dir.as_ref().map(|d| d.as_str()), Some("/var/log/rtd"));
    }

    #[test]
    fn test_explicit_file_overrides_project_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".turbulence.toml"), "top_k = 4\n").unwrap();
        let over = write_config(&tmp, "override.toml", "top_k = 9\n");
        let tmp_path = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_project_search(&tmp_path)
            .with_file(&over)
            .load()
            .unwrap();

        assert_eq!(config.top_k, 9);
        assert!(!sources.project_files.is_empty());
        assert_eq!(sources.explicit_files.len(), 1);
        assert_eq!(sources.primary_file(), Some(over.as_path()));
    }

    #[test]
    fn test_invalid_value_is_a_deserialize_error() {
        let _lock = TEST_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "config.toml", "tie_method = \"random\"\n");

        let result = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&path)
            .load();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn test_user_config_dir() {
        if let Some(path) = user_config_dir() {
            assert!(path.as_str().contains("turbulence"));
        }
    }

    #[test]
    fn input_limit_defaults_to_five_mebibytes() {
        assert_eq!(Config::default().input_limit(), Some(DEFAULT_MAX_INPUT_BYTES));
    }

    #[test]
    fn disable_input_limit_overrides_max_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            "config.toml",
            "max_input_bytes = 1024\ndisable_input_limit = true\n",
        );

        let config = load_file(&path);
        assert!(config.disable_input_limit);
        assert_eq!(config.max_input_bytes, Some(1024));
        assert_eq!(config.input_limit(), None);
    }

    #[test]
    fn compare_options_follow_config() {
        let config = Config {
            alpha: 0.25,
            top_k: 8,
            tie_method: TieMethod::Ordinal,
            ..Config::default()
        };
        let options = config.compare_options();
        assert!((options.alpha - 0.25).abs() < f64::EPSILON);
        assert_eq!(options.top_k, 8);
        assert_eq!(options.tie_method, TieMethod::Ordinal);
    }

    #[test]
    fn stopwords_union_language_and_file() {
        let tmp = TempDir::new().unwrap();
        let list = write_config(&tmp, "stop.txt", "zzyzx\n");
        let config = Config {
            stopwords_language: Some("en".to_string()),
            stopwords_file: Some(list),
            ..Config::default()
        };
        let set = config.stopwords().unwrap();
        assert!(set.contains("the"));
        assert!(set.contains("zzyzx"));
    }

    #[test]
    fn stopwords_default_to_empty() {
        assert!(Config::default().stopwords().unwrap().is_empty());
    }

    #[test]
    fn stopwords_reject_unknown_language() {
        let config = Config {
            stopwords_language: Some("xx".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            config.stopwords(),
            Err(StopwordError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn config_deserializes_from_yaml() {
        let yaml = r#"
alpha: 0.5
top_k: 20
tie_method: ordinal
stopwords_file: static/stopwords.txt
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.top_k, 20);
        assert_eq!(config.tie_method, TieMethod::Ordinal);
        assert_eq!(
            config.stopwords_file.as_ref().map(|p| p.as_str()),
            Some("static/stopwords.txt")
        );
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    #[allow(unsafe_code)]
    fn test_env_var_override_stopwords_language() {
        let _lock = TEST_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

        // SAFETY: Test environment; mutex serializes env access across tests.
        unsafe {
            std::env::set_var("TURBULENCE_STOPWORDS_LANGUAGE", "fr");
        }

        let result = ConfigLoader::new()
            .with_user_config(false)
            .load();

        // SAFETY: Cleanup after test.
        unsafe {
            std::env::remove_var("TURBULENCE_STOPWORDS_LANGUAGE");
        }

        let (config, _sources) = result.unwrap();
        assert_eq!(config.stopwords_language.as_deref(), Some("fr"));
    }

    #[test]
    #[allow(unsafe_code)]
    fn test_env_var_overrides_file_config() {
        let _lock = TEST_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "config.toml", "tie_method = \"average\"\n");

        // SAFETY: Test environment; mutex serializes env access across tests.
        unsafe {
            std::env::set_var("TURBULENCE_TIE_METHOD", "ordinal");
        }

        let result = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&path)
            .load();

        // SAFETY: Cleanup after test.
        unsafe {
            std::env::remove_var("TURBULENCE_TIE_METHOD");
        }

        let (config, _sources) = result.unwrap();
        assert_eq!(config.tie_method, TieMethod::Ordinal);
    }

    #[test]
    fn rtd_config_discovered() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".rtd.toml"), r#"log_level = "debug""#).unwrap();
        let tmp_path = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_project_search(&tmp_path)
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(sources.project_files.len(), 1);
    }

    #[test]
    fn turbulence_overrides_rtd_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".rtd.toml"), "top_k = 1\nalpha = 2.0\n").unwrap();
        fs::write(tmp.path().join(".turbulence.toml"), "top_k = 2\n").unwrap();
        let tmp_path = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_project_search(&tmp_path)
            .load()
            .unwrap();

        // Both merged, turbulence wins on the shared key
        assert_eq!(config.top_k, 2);
        assert!((config.alpha - 2.0).abs() < f64::EPSILON);
        assert_eq!(sources.project_files.len(), 2);
    }

    #[test]
    fn dotfile_before_regular_same_app_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".turbulence.toml"), r#"log_level = "debug""#).unwrap();
        fs::write(tmp.path().join("turbulence.toml"), r#"log_level = "error""#).unwrap();
        let tmp_path = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_project_search(&tmp_path)
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(sources.project_files.len(), 2);
    }

    #[test]
    fn only_closest_directory_contributes() {
        let tmp = TempDir::new().unwrap();
        let parent = tmp.path().join("parent");
        let child = parent.join("child");
        fs::create_dir_all(&child).unwrap();

        fs::write(parent.join(".rtd.toml"), r#"log_level = "warn""#).unwrap();
        fs::write(child.join(".turbulence.toml"), r#"log_level = "error""#).unwrap();

        let child_path = Utf8PathBuf::try_from(child).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_project_search(&child_path)
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(sources.project_files.len(), 1);
    }
}
