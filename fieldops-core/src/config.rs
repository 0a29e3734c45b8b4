//! Local configuration.
//!
//! Three files live in `~/.config/fieldops/`:
//! - `config.toml`: where the CRM is and how views behave
//! - `session.toml`: the API token and the signed-in user
//! - `display.toml`: display preferences written by `fieldops config display`
//!
//! `config.toml` and the token can be overridden with `FIELDOPS_*` variables.
//! Nested keys use a double underscore: `FIELDOPS_RECORD_TYPES__SPLICING`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::constants::{
    DEFAULT_DEBOUNCE, DEFAULT_DURATION_MINUTES, DEFAULT_LANE_CAP, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_TIMEZONE, DEFAULT_WINDOW_END_HOUR, DEFAULT_WINDOW_START_HOUR,
};
use crate::error::{FieldOpsError, FieldOpsResult};
use crate::filter::EventFilter;
use crate::status::EventStatus;
use crate::timeline::TimelineWindow;

const ENV_PREFIX: &str = "FIELDOPS";

/// Directory holding all fieldops files. `FIELDOPS_CONFIG_DIR` overrides it.
pub fn config_dir() -> FieldOpsResult<PathBuf> {
    if let Ok(dir) = std::env::var("FIELDOPS_CONFIG_DIR") {
        return Ok(PathBuf::from(shellexpand::tilde(&dir).into_owned()));
    }

    Ok(dirs::config_dir()
        .ok_or_else(|| FieldOpsError::Config("Could not determine config directory".into()))?
        .join("fieldops"))
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_lane_cap() -> usize {
    DEFAULT_LANE_CAP
}

fn default_debounce() -> String {
    DEFAULT_DEBOUNCE.to_string()
}

fn default_request_timeout() -> String {
    DEFAULT_REQUEST_TIMEOUT.to_string()
}

fn default_duration_minutes() -> i64 {
    DEFAULT_DURATION_MINUTES
}

/// `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldOpsConfig {
    /// EspoCRM root, e.g. "https://crm.example.gr"
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_lane_cap")]
    pub lane_cap: usize,

    #[serde(default)]
    pub window: WindowConfig,

    /// humantime duration, e.g. "300ms"
    #[serde(default = "default_debounce")]
    pub debounce: String,

    /// humantime duration, e.g. "15s"
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,

    /// Assumed length of records without an end
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: i64,

    #[serde(default)]
    pub record_types: RecordTypes,
}

impl Default for FieldOpsConfig {
    fn default() -> Self {
        FieldOpsConfig {
            base_url: None,
            timezone: default_timezone(),
            lane_cap: default_lane_cap(),
            window: WindowConfig::default(),
            debounce: default_debounce(),
            request_timeout: default_request_timeout(),
            default_duration_minutes: default_duration_minutes(),
            record_types: RecordTypes::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            start_hour: DEFAULT_WINDOW_START_HOUR,
            end_hour: DEFAULT_WINDOW_END_HOUR,
        }
    }
}

/// EspoCRM entity type per category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordTypes {
    pub autopsy: String,
    pub construction: String,
    pub splicing: String,
    pub earthwork: String,
}

impl Default for RecordTypes {
    fn default() -> Self {
        RecordTypes {
            autopsy: Category::Autopsy.default_entity().to_string(),
            construction: Category::Construction.default_entity().to_string(),
            splicing: Category::Splicing.default_entity().to_string(),
            earthwork: Category::Earthwork.default_entity().to_string(),
        }
    }
}

impl RecordTypes {
    pub fn entity_for(&self, category: Category) -> &str {
        match category {
            Category::Autopsy => &self.autopsy,
            Category::Construction => &self.construction,
            Category::Splicing => &self.splicing,
            Category::Earthwork => &self.earthwork,
        }
    }
}

impl FieldOpsConfig {
    pub fn config_path() -> FieldOpsResult<PathBuf> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Load `config.toml` (creating a commented default on first run) with
    /// `FIELDOPS_*` environment overrides on top.
    pub fn load() -> FieldOpsResult<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            Self::create_default_config(&path)?;
        }

        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(environment())
            .build()
            .map_err(|e| FieldOpsError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| FieldOpsError::Config(e.to_string()))
    }

    /// Parse a config from TOML text, without environment overrides.
    pub fn from_toml_str(contents: &str) -> FieldOpsResult<Self> {
        Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()
            .map_err(|e| FieldOpsError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| FieldOpsError::Config(e.to_string()))
    }

    pub fn base_url(&self) -> FieldOpsResult<&str> {
        self.base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                FieldOpsError::Config(
                    "No base_url configured. Set base_url in config.toml or FIELDOPS_BASE_URL"
                        .into(),
                )
            })
    }

    pub fn timezone(&self) -> FieldOpsResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| FieldOpsError::UnknownTimezone(self.timezone.clone()))
    }

    pub fn window(&self) -> TimelineWindow {
        TimelineWindow::new(self.window.start_hour, self.window.end_hour)
    }

    pub fn debounce(&self) -> FieldOpsResult<Duration> {
        parse_duration(&self.debounce)
    }

    pub fn request_timeout(&self) -> FieldOpsResult<Duration> {
        parse_duration(&self.request_timeout)
    }

    pub fn default_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.default_duration_minutes.max(1))
    }

    pub fn create_default_config(path: &Path) -> FieldOpsResult<()> {
        let contents = format!(
            "\
# fieldops configuration

# EspoCRM root URL:
# base_url = \"https://crm.example.gr\"

# Display timezone:
# timezone = \"{DEFAULT_TIMEZONE}\"

# Maximum lanes per technician on the timeline:
# lane_cap = {DEFAULT_LANE_CAP}

# Delay before refetching after a date change, and per-request timeout:
# debounce = \"{DEFAULT_DEBOUNCE}\"
# request_timeout = \"{DEFAULT_REQUEST_TIMEOUT}\"

# [window]
# start_hour = {DEFAULT_WINDOW_START_HOUR}
# end_hour = {DEFAULT_WINDOW_END_HOUR}

# [record_types]
# autopsy = \"Autopsy\"
# construction = \"Construction\"
# splicing = \"Splicing\"
# earthwork = \"Earthwork\"
"
        );

        write_file(path, &contents)
    }
}

/// `FIELDOPS_BASE_URL` sets `base_url`; `__` reaches into tables, as in
/// `FIELDOPS_WINDOW__START_HOUR` for `window.start_hour`.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

fn parse_duration(value: &str) -> FieldOpsResult<Duration> {
    humantime::parse_duration(value).map_err(|e| FieldOpsError::InvalidDuration {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn write_file(path: &Path, contents: &str) -> FieldOpsResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            FieldOpsError::Config(format!("Could not create config directory: {e}"))
        })?;
    }

    std::fs::write(path, contents)
        .map_err(|e| FieldOpsError::Config(format!("Could not write {}: {e}", path.display())))
}

/// `session.toml`: token and user blob. Never written by fieldops.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Session {
    pub fn path() -> FieldOpsResult<PathBuf> {
        Ok(config_dir()?.join("session.toml"))
    }

    /// Load the session; `FIELDOPS_TOKEN` takes precedence over the file.
    pub fn load() -> FieldOpsResult<Self> {
        let path = Self::path()?;
        let mut session = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str(&contents).map_err(|e| {
                FieldOpsError::Config(format!("Could not parse {}: {e}", path.display()))
            })?
        } else {
            Session::default()
        };

        if let Ok(token) = std::env::var("FIELDOPS_TOKEN") {
            session.token = Some(token);
        }

        Ok(session)
    }

    pub fn token(&self) -> FieldOpsResult<&str> {
        self.token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                FieldOpsError::Config(
                    "No API token found. Add token to session.toml or set FIELDOPS_TOKEN".into(),
                )
            })
    }

    /// Display name of the signed-in user, if known
    pub fn display_name(&self) -> Option<&str> {
        let user = self.user.as_ref()?;
        Some(user.name.as_deref().unwrap_or(&user.user_name))
    }
}

fn default_compact_threshold() -> usize {
    8
}

/// `display.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayPrefs {
    #[serde(default)]
    pub hidden_categories: Vec<Category>,

    /// Status codes hidden in every view
    #[serde(default)]
    pub hidden_statuses: Vec<String>,

    /// Above this many events per day, week view shows counts only
    #[serde(default = "default_compact_threshold")]
    pub compact_threshold: usize,
}

impl Default for DisplayPrefs {
    fn default() -> Self {
        DisplayPrefs {
            hidden_categories: Vec::new(),
            hidden_statuses: Vec::new(),
            compact_threshold: default_compact_threshold(),
        }
    }
}

impl DisplayPrefs {
    pub fn path() -> FieldOpsResult<PathBuf> {
        Ok(config_dir()?.join("display.toml"))
    }

    pub fn load() -> FieldOpsResult<Self> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(DisplayPrefs::default());
        }
        let contents = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> FieldOpsResult<Self> {
        toml::from_str(contents).map_err(|e| FieldOpsError::Serialization(e.to_string()))
    }

    pub fn save(&self) -> FieldOpsResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| FieldOpsError::Serialization(e.to_string()))?;
        write_file(&Self::path()?, &content)
    }

    /// Starting filter for every view
    pub fn base_filter(&self) -> EventFilter {
        let mut filter = EventFilter::new();
        for category in &self.hidden_categories {
            filter.hide(*category);
        }
        for status in &self.hidden_statuses {
            filter.hide_status(EventStatus::parse(status));
        }
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = FieldOpsConfig::from_toml_str("").unwrap();
        assert!(cfg.base_url().is_err());
        assert_eq!(cfg.timezone().unwrap(), chrono_tz::Europe::Athens);
        assert_eq!(cfg.lane_cap, DEFAULT_LANE_CAP);
        assert_eq!(cfg.window(), TimelineWindow::default());
        assert_eq!(cfg.debounce().unwrap(), Duration::from_millis(300));
        assert_eq!(cfg.request_timeout().unwrap(), Duration::from_secs(15));
        assert_eq!(cfg.record_types.entity_for(Category::Splicing), "Splicing");
    }

    #[test]
    fn environment_overrides_top_level_and_nested_keys() {
        let vars: config::Map<String, String> = [
            ("FIELDOPS_BASE_URL", "https://env.example.gr"),
            ("FIELDOPS_LANE_CAP", "3"),
            ("FIELDOPS_WINDOW__START_HOUR", "6"),
            ("FIELDOPS_RECORD_TYPES__SPLICING", "CSplicing"),
            ("FIELDOPS_TOKEN", "ignored"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let cfg: FieldOpsConfig = Config::builder()
            .add_source(File::from_str("lane_cap = 5", FileFormat::Toml))
            .add_source(environment().source(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.base_url().unwrap(), "https://env.example.gr");
        assert_eq!(cfg.lane_cap, 3);
        assert_eq!(cfg.window(), TimelineWindow::new(6, 21));
        assert_eq!(cfg.record_types.entity_for(Category::Splicing), "CSplicing");
        assert_eq!(cfg.record_types.entity_for(Category::Autopsy), "Autopsy");
    }

    #[test]
    fn parses_full_config() {
        let cfg = FieldOpsConfig::from_toml_str(
            r#"
base_url = "https://crm.example.gr"
timezone = "UTC"
lane_cap = 4
debounce = "1s"

[window]
start_hour = 6
end_hour = 22

[record_types]
autopsy = "CAutopsies"
construction = "CConstruction"
splicing = "CSplicing"
earthwork = "CEarthwork"
"#,
        )
        .unwrap();

        assert_eq!(cfg.base_url().unwrap(), "https://crm.example.gr");
        assert_eq!(cfg.timezone().unwrap(), chrono_tz::UTC);
        assert_eq!(cfg.lane_cap, 4);
        assert_eq!(cfg.window(), TimelineWindow::new(6, 22));
        assert_eq!(cfg.debounce().unwrap(), Duration::from_secs(1));
        assert_eq!(cfg.record_types.entity_for(Category::Autopsy), "CAutopsies");
    }

    #[test]
    fn rejects_unknown_timezone_and_bad_duration() {
        let cfg = FieldOpsConfig::from_toml_str(
            "timezone = \"Mars/Olympus\"\nrequest_timeout = \"soon\"",
        )
        .unwrap();
        assert!(matches!(cfg.timezone(), Err(FieldOpsError::UnknownTimezone(_))));
        assert!(matches!(cfg.request_timeout(), Err(FieldOpsError::InvalidDuration { .. })));
    }

    #[test]
    fn default_duration_is_at_least_a_minute() {
        let cfg = FieldOpsConfig {
            default_duration_minutes: 0,
            ..FieldOpsConfig::default()
        };
        assert_eq!(cfg.default_duration(), chrono::Duration::minutes(1));
    }

    #[test]
    fn blank_token_is_missing() {
        let session = Session {
            token: Some("  ".into()),
            user: None,
        };
        assert!(session.token().is_err());
    }

    #[test]
    fn display_name_prefers_full_name() {
        let session = Session {
            token: Some("dG9rZW4=".into()),
            user: Some(SessionUser {
                user_name: "nikos".into(),
                name: Some("Nikos Papadopoulos".into()),
            }),
        };
        assert_eq!(session.display_name(), Some("Nikos Papadopoulos"));
        assert_eq!(session.token().unwrap(), "dG9rZW4=");
    }

    #[test]
    fn display_prefs_build_base_filter() {
        let prefs = DisplayPrefs::from_toml_str(
            "hidden_categories = [\"EARTHWORK\"]\nhidden_statuses = [\"cancelled\"]",
        )
        .unwrap();
        assert_eq!(prefs.compact_threshold, 8);

        let filter = prefs.base_filter();
        assert!(!filter.is_visible(Category::Earthwork));
        assert!(filter.is_visible(Category::Autopsy));

        let mut expected = EventFilter::new();
        expected.hide(Category::Earthwork);
        expected.hide_status(EventStatus::Cancelled);
        assert_eq!(filter, expected);
    }
}
