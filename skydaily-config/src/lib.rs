//! Loader for skydaily configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: built-in defaults, the YAML file (if any),
//! `SKYDAILY__`-prefixed environment variables (`__` separates nesting, so
//! `SKYDAILY__SOURCE__URL` overrides `source.url`). String values are then
//! expanded with `${VAR}` / `${VAR:-default}` syntax, which is how the
//! Bluesky credentials reach the config without being stored in it.
//!
//! ```yaml
//! source:
//!   url: "https://bsky-stats.lut.li/"
//!   timeout_secs: 20
//! archive:
//!   root: "${GITHUB_WORKSPACE:-.}/data"
//! publish:
//!   enabled: true
//!   service: "https://bsky.social"
//!   handle: "${BSKY_HANDLE}"
//!   app_password: "${BSKY_APP_PASSWORD}"
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "SKYDAILY";

pub const DEFAULT_STATS_URL: &str = "https://bsky-stats.lut.li/";
pub const DEFAULT_BLUESKY_SERVICE: &str = "https://bsky.social";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_ARCHIVE_ROOT: &str = "${GITHUB_WORKSPACE:-.}/data";
const DEFAULT_HANDLE: &str = "${BSKY_HANDLE}";
const DEFAULT_APP_PASSWORD: &str = "${BSKY_APP_PASSWORD}";

#[derive(Debug, Clone, Deserialize)]
pub struct SkydailyConfig {
    pub source: SourceConfig,
    pub archive: ArchiveConfig,
    pub publish: PublishConfig,
}

/// Where the daily stats document comes from.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Directory holding `<YYYY>/<MM>/<YYYY-MM-DD>.json` entries.
    pub root: PathBuf,
}

/// Bluesky account the summary is posted to.
///
/// `handle` and `app_password` are `None` when the referenced environment
/// variables were unset or empty; posting then fails with an auth error.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    pub enabled: bool,
    pub service: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub app_password: Option<String>,
}

// Anything still carrying a `$` placeholder after expansion counts as unset.
fn normalize_secret(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.contains("${"))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (defaults + YAML + env overrides).
pub struct SkydailyConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SkydailyConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SkydailyConfigLoader {
    /// Start from built-in defaults; environment overrides are applied at
    /// [`load`](Self::load) time so they always win over files.
    ///
    /// ```
    /// use skydaily_config::{SkydailyConfigLoader, DEFAULT_STATS_URL};
    ///
    /// let config = SkydailyConfigLoader::new().load().expect("defaults load");
    /// assert_eq!(config.source.url, DEFAULT_STATS_URL);
    /// assert_eq!(config.source.timeout_secs, 20);
    /// assert!(config.publish.enabled);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use skydaily_config::SkydailyConfigLoader;
    ///
    /// let cfg = SkydailyConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// source:
    ///   url: "http://localhost:8080/"
    /// publish:
    ///   enabled: false
    ///   handle: "stats.example.com"
    ///   app_password: "abcd-efgh-ijkl-mnop"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.source.url, "http://localhost:8080/");
    /// assert!(!cfg.publish.enabled);
    /// assert_eq!(cfg.publish.handle.as_deref(), Some("stats.example.com"));
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly
    /// typed config, expanding `${VAR}` placeholders on the way.
    ///
    /// ```
    /// use skydaily_config::SkydailyConfigLoader;
    ///
    /// temp_env::with_vars(
    ///     [
    ///         ("BSKY_HANDLE", Some("stats.example.com")),
    ///         ("BSKY_APP_PASSWORD", None::<&str>),
    ///     ],
    ///     || {
    ///         let config = SkydailyConfigLoader::new().load().expect("valid configuration");
    ///         assert_eq!(config.publish.handle.as_deref(), Some("stats.example.com"));
    ///         assert_eq!(config.publish.app_password, None);
    ///     },
    /// );
    /// ```
    pub fn load(self) -> Result<SkydailyConfig, ConfigError> {
        let cfg = self
            .builder
            .set_default("source.url", DEFAULT_STATS_URL)?
            .set_default("source.timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
            .set_default("archive.root", DEFAULT_ARCHIVE_ROOT)?
            .set_default("publish.enabled", true)?
            .set_default("publish.service", DEFAULT_BLUESKY_SERVICE)?
            .set_default("publish.handle", DEFAULT_HANDLE)?
            .set_default("publish.app_password", DEFAULT_APP_PASSWORD)?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let mut typed: SkydailyConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        typed.publish.handle = normalize_secret(typed.publish.handle.take());
        typed.publish.app_password = normalize_secret(typed.publish.app_password.take());
        if typed.source.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "source.timeout_secs must be greater than zero".into(),
            ));
        }

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("SKYDAILY_TEST_FOO", Some("bar"), || {
            let mut v = json!("prefix-${SKYDAILY_TEST_FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_defaults_for_unset_vars() {
        temp_env::with_var("SKYDAILY_TEST_WORKSPACE", None::<&str>, || {
            let mut v = json!({ "root": "${SKYDAILY_TEST_WORKSPACE:-.}/data" });
            expand_env_in_value(&mut v);
            assert_eq!(v, json!({ "root": "./data" }));
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("SKYDAILY_TEST_BAZ", Some("qux")),
                ("SKYDAILY_TEST_BAR", Some("mid-${SKYDAILY_TEST_BAZ}")),
            ],
            || {
                let mut v = json!(["x=${SKYDAILY_TEST_BAR}", 42, null]);
                expand_env_in_value(&mut v);
                assert_eq!(v, json!(["x=mid-qux", 42, null]));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars(
            [
                ("SKYDAILY_TEST_A", Some("${SKYDAILY_TEST_B}")),
                ("SKYDAILY_TEST_B", Some("${SKYDAILY_TEST_A}")),
            ],
            || {
                let mut v = json!("x=${SKYDAILY_TEST_A}-y");
                expand_env_in_value(&mut v);
                let s = v.as_str().unwrap();
                assert!(s.starts_with("x=") && s.ends_with("-y"));
                assert!(s.contains("${"));
            },
        );
    }

    #[test]
    fn unexpanded_and_blank_secrets_are_absent() {
        assert_eq!(normalize_secret(Some("${BSKY_HANDLE}".into())), None);
        assert_eq!(normalize_secret(Some("   ".into())), None);
        assert_eq!(normalize_secret(None), None);
        assert_eq!(
            normalize_secret(Some(" me.bsky.social ".into())).as_deref(),
            Some("me.bsky.social")
        );
    }
}
