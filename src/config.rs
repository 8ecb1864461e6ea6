use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use crate::models::{MatchingParams, UnionPolicy};
use crate::services::BackendTables;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub email: EmailSettings,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub assistant: AssistantSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    pub url: String,
    pub api_key: String,
    #[serde(default)]
    pub tables: TableSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub categories: String,
    pub entries: String,
    pub entry_photos: String,
    pub entry_feedback: String,
    pub assistant_feedback: String,
    pub tickets: String,
    pub comments: String,
    pub agents: String,
    pub criteria: String,
    pub evaluations: String,
    pub evaluation_results: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        let tables = BackendTables::default();
        Self {
            categories: tables.categories,
            entries: tables.entries,
            entry_photos: tables.entry_photos,
            entry_feedback: tables.entry_feedback,
            assistant_feedback: tables.assistant_feedback,
            tickets: tables.tickets,
            comments: tables.comments,
            agents: tables.agents,
            criteria: tables.criteria,
            evaluations: tables.evaluations,
            evaluation_results: tables.evaluation_results,
        }
    }
}

impl From<TableSettings> for BackendTables {
    fn from(value: TableSettings) -> Self {
        Self {
            categories: value.categories,
            entries: value.entries,
            entry_photos: value.entry_photos,
            entry_feedback: value.entry_feedback,
            assistant_feedback: value.assistant_feedback,
            tickets: value.tickets,
            comments: value.comments,
            agents: value.agents,
            criteria: value.criteria,
            evaluations: value.evaluations,
            evaluation_results: value.evaluation_results,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    #[serde(default = "default_audience")]
    pub audience: String,
}

fn default_audience() -> String { "authenticated".to_string() }

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub entry_photos_bucket: String,
    pub ticket_images_bucket: String,
    pub max_upload_bytes: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            entry_photos_bucket: "error-photos".to_string(),
            ticket_images_bucket: "ticket-images".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub from: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.resend.com".to_string(),
            api_key: None,
            from: "Helpdesk <noreply@yourdomain.com>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_threshold")]
    pub category_threshold: f64,
    #[serde(default = "default_threshold")]
    pub entry_threshold: f64,
    #[serde(default)]
    pub union_policy: UnionPolicy,
    #[serde(default = "default_limit")]
    pub default_limit: u16,
    #[serde(default = "default_max_limit")]
    pub max_limit: u16,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            category_threshold: default_threshold(),
            entry_threshold: default_threshold(),
            union_policy: UnionPolicy::default(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl MatchingSettings {
    pub fn params(&self) -> MatchingParams {
        MatchingParams {
            category_threshold: self.category_threshold,
            entry_threshold: self.entry_threshold,
            union_policy: self.union_policy,
        }
    }
}

fn default_threshold() -> f64 { 0.3 }
fn default_limit() -> u16 { 5 }
fn default_max_limit() -> u16 { 50 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantSettings {
    /// Ask the chat completion service when nothing in the knowledge base matches
    #[serde(default)]
    pub llm_fallback: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: default_cache_ttl() }
    }
}

fn default_cache_ttl() -> u64 { 60 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with HELPDESK_)
    /// 5. Well-known secret variables (SUPABASE_URL, OPENAI_API_KEY, ...)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., HELPDESK__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("HELPDESK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }
}

/// Secrets the hosted services hand out under their own variable names
const SECRET_OVERRIDES: &[(&str, &str)] = &[
    ("SUPABASE_URL", "backend.url"),
    ("SUPABASE_KEY", "backend.api_key"),
    ("SUPABASE_JWT_SECRET", "auth.jwt_secret"),
    ("RESEND_API_KEY", "email.api_key"),
    ("OPENAI_API_KEY", "chat.api_key"),
];

/// Apply the well-known secret variables on top of the layered config
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in SECRET_OVERRIDES {
        if let Ok(value) = std::env::var(var) {
            if !value.is_empty() {
                builder = builder.set_override(*key, value)?;
            }
        }
    }

    builder.build()
}
