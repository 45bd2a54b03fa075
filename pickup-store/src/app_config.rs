use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub planning: PlanningConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    #[serde(default = "default_aviationstack_url")]
    pub aviationstack_base_url: String,
    #[serde(default)]
    pub aviationstack_api_key: String,
    #[serde(default = "default_google_maps_url")]
    pub google_maps_base_url: String,
    #[serde(default)]
    pub google_maps_api_key: String,
    #[serde(default = "default_openai_url")]
    pub openai_base_url: String,
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            aviationstack_base_url: default_aviationstack_url(),
            aviationstack_api_key: String::new(),
            google_maps_base_url: default_google_maps_url(),
            google_maps_api_key: String::new(),
            openai_base_url: default_openai_url(),
            openai_api_key: String::new(),
            openai_model: default_openai_model(),
        }
    }
}

fn default_aviationstack_url() -> String { "http://api.aviationstack.com/v1".to_string() }
fn default_google_maps_url() -> String { "https://maps.googleapis.com/maps/api".to_string() }
fn default_openai_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_openai_model() -> String { "gpt-3.5-turbo".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct PlanningConfig {
    #[serde(default = "default_buffer_minutes")]
    pub default_buffer_minutes: f64,
}

fn default_buffer_minutes() -> f64 { 30.0 }

impl Default for PlanningConfig {
    fn default() -> Self {
        Self { default_buffer_minutes: default_buffer_minutes() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemindersConfig {
    #[serde(default = "default_lead_minutes")]
    pub default_lead_minutes: f64,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_retention_seconds")]
    pub retention_seconds: u64,
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

fn default_lead_minutes() -> f64 { 15.0 }
fn default_max_entries() -> usize { 10_000 }
fn default_retention_seconds() -> u64 { 3600 }
fn default_sweep_interval_seconds() -> u64 { 60 }

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            default_lead_minutes: default_lead_minutes(),
            max_entries: default_max_entries(),
            retention_seconds: default_retention_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Never checked in; holds API keys during local development
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `PICKUP__PROVIDERS__OPENAI_API_KEY=sk-...`
            .add_source(config::Environment::with_prefix("PICKUP").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
