use crate::domain::widgets::{ChartKind, KpiKind, RankMetric};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const WIDGETS_FILE: &str = "config/widgets.toml";
const BUILTIN_WIDGETS: &str = include_str!("../../config/widgets.toml");

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub data: DataSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DataSettings {
    Csv {
        path: String,
    },
    Synthetic {
        #[serde(default = "default_rows")]
        rows: usize,
        #[serde(default = "default_seed")]
        seed: u64,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    /// Zero disables memoization entirely
    pub capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    pub title: String,
    pub currency: String,
    /// Sessions whose last valid filter is remembered
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            title: "Retail Sales Dashboard".to_string(),
            currency: "₹".to_string(),
            max_sessions: default_max_sessions(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetsConfig {
    #[serde(default)]
    pub tiles: Vec<TileConfig>,
    #[serde(default)]
    pub charts: Vec<ChartConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TileConfig {
    pub id: String,
    pub title: String,
    pub unit: String,
    pub precision: i32,
    pub kpi: KpiKind,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartConfig {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub unit: Option<String>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub metric: RankMetric,
}

impl WidgetsConfig {
    /// The widget set compiled into the binary.
    pub fn builtin() -> anyhow::Result<Self> {
        Ok(toml::from_str(BUILTIN_WIDGETS)?)
    }
}

fn default_rows() -> usize {
    2500
}

fn default_seed() -> u64 {
    42
}

fn default_top_n() -> usize {
    10
}

fn default_max_sessions() -> usize {
    1024
}

/// `DASHBOARD__SERVER__PORT=9000` overrides `[server] port`
fn dashboard_env() -> config::Environment {
    config::Environment::with_prefix("DASHBOARD")
        .separator("__")
        .try_parsing(true)
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard"))
        .add_source(dashboard_env())
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Widget lists are file-only; environment overrides apply to `config/dashboard.toml`.
pub fn load_widgets_config() -> anyhow::Result<WidgetsConfig> {
    if !Path::new(WIDGETS_FILE).exists() {
        tracing::info!("{} not found, using built-in widgets", WIDGETS_FILE);
        return WidgetsConfig::builtin();
    }

    let settings = config::Config::builder()
        .add_source(config::File::new(WIDGETS_FILE, config::FileFormat::Toml))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Replace template variables in a widget title or unit
pub fn render_template(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}
