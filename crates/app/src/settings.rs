//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml`, then from `JIZHANG_*` environment variables
//! (`JIZHANG_LINE__CHANNEL_SECRET` sets `line.channel_secret`), then from the
//! plain variable names the bot has always been deployed with.
//!
//! See `settings.example.toml` for the configuration.

use std::path::PathBuf;

use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File, Map, Source};
use serde::Deserialize;

/// Plain environment variables and the keys they override.
const LEGACY_VARIABLES: [(&str, &str); 5] = [
    ("LINE_CHANNEL_SECRET", "line.channel_secret"),
    ("LINE_CHANNEL_ACCESS_TOKEN", "line.channel_access_token"),
    ("GOOGLE_SHEET_NAME", "storage.spreadsheet_title"),
    ("GOOGLE_SHEET_ID", "storage.spreadsheet_id"),
    ("GOOGLE_APPLICATION_CREDENTIALS", "storage.credentials"),
];

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub month_filter: MonthFilterKind,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthFilterKind {
    #[default]
    Prefix,
    Calendar,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Line {
    pub channel_secret: String,
    pub channel_access_token: String,
    pub api_base: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Memory,
    Csv,
    #[default]
    GoogleSheets,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    #[serde(default)]
    pub kind: StorageKind,
    /// Takes precedence over `spreadsheet_title`.
    pub spreadsheet_id: Option<String>,
    /// Looked up through the Drive API at startup.
    pub spreadsheet_title: Option<String>,
    #[serde(default = "default_credentials")]
    pub credentials: PathBuf,
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_ledger_sheet")]
    pub ledger_sheet: String,
    #[serde(default = "default_budget_sheet")]
    pub budget_sheet: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub server: Server,
    pub line: Line,
    #[serde(default)]
    pub storage: Storage,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_timezone() -> String {
    "Asia/Taipei".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_credentials() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_directory() -> PathBuf {
    PathBuf::from("data")
}

fn default_ledger_sheet() -> String {
    sheets::DEFAULT_LEDGER_SHEET.to_string()
}

fn default_budget_sheet() -> String {
    sheets::DEFAULT_BUDGET_SHEET.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
            timezone: default_timezone(),
            month_filter: MonthFilterKind::default(),
        }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: None,
            port: default_port(),
        }
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            kind: StorageKind::default(),
            spreadsheet_id: None,
            spreadsheet_title: None,
            credentials: default_credentials(),
            directory: default_directory(),
            ledger_sheet: default_ledger_sheet(),
            budget_sheet: default_budget_sheet(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_sources(
            File::with_name("settings").required(false),
            None,
            |name| std::env::var(name).ok(),
        )
    }

    /// `env` replaces the process environment for the `JIZHANG_*` layer when
    /// given; `legacy` looks up the plain variable names.
    fn from_sources<S>(
        file: S,
        env: Option<Map<String, String>>,
        legacy: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let mut builder = Config::builder().add_source(file).add_source(
            Environment::with_prefix("JIZHANG")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        for (variable, key) in LEGACY_VARIABLES {
            builder = builder.set_override_option(key, legacy(variable))?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.app
            .timezone
            .parse()
            .map_err(|err| ConfigError::Message(format!("invalid app.timezone: {err}")))
    }

    pub fn bind_address(&self) -> String {
        let bind = self.server.bind.as_deref().unwrap_or("127.0.0.1");
        format!("{}:{}", bind, self.server.port)
    }
}
