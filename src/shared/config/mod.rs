use anyhow::{anyhow, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

const DEFAULT_PHARMACY_API_URL: &str = "https://67e14fb758cc6bf785254550.mockapi.io/pharmacies";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Clone, Debug)]
pub struct Config {
    pub http_bind_addr: SocketAddr,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Reads the server settings from the environment.
    ///
    /// - `HTTP_BIND_ADDR` (default `0.0.0.0:3001`, or `0.0.0.0:$PORT` when only `PORT` is set)
    /// - `CORS_ALLOWED_ORIGINS` (comma separated, default the two local dev front-ends)
    pub fn from_env() -> Result<Self> {
        let raw_addr = env_non_empty("HTTP_BIND_ADDR").unwrap_or_else(|| {
            let port = env_non_empty("PORT").unwrap_or_else(|| "3001".to_string());
            format!("0.0.0.0:{}", port)
        });
        let http_bind_addr = raw_addr
            .parse()
            .map_err(|e| anyhow!("invalid HTTP_BIND_ADDR {}: {}", raw_addr, e))?;
        let cors_allowed_origins = env_list("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| split_list(DEFAULT_CORS_ORIGINS));
        Ok(Self {
            http_bind_addr,
            cors_allowed_origins,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectoryKind {
    Http,
    Memory,
}

impl DirectoryKind {
    fn from_env(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Some(Self::Http),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DirectoryConfig {
    pub kind: DirectoryKind,
    pub api_url: String,
    /// JSON array of records preloaded into the in-memory directory.
    pub seed_path: Option<PathBuf>,
}

impl DirectoryConfig {
    fn from_env() -> Self {
        let kind = match env_non_empty("PHARMACY_DIRECTORY") {
            Some(value) => DirectoryKind::from_env(&value).unwrap_or_else(|| {
                log::warn!(
                    "[config] unknown PHARMACY_DIRECTORY={}, fallback to http",
                    value
                );
                DirectoryKind::Http
            }),
            None => DirectoryKind::Http,
        };
        let api_url = env_non_empty("PHARMACY_API_URL")
            .unwrap_or_else(|| DEFAULT_PHARMACY_API_URL.to_string());
        let seed_path = env_non_empty("PHARMACY_SEED_PATH").map(PathBuf::from);
        Self {
            kind,
            api_url,
            seed_path,
        }
    }
}

static DIRECTORY_CONFIG: OnceLock<DirectoryConfig> = OnceLock::new();

pub fn directory_config() -> &'static DirectoryConfig {
    DIRECTORY_CONFIG.get_or_init(DirectoryConfig::from_env)
}

#[derive(Clone, Debug)]
pub struct AiConfig {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub chat_model: String,
    pub extraction_model: String,
}

impl AiConfig {
    /// Reads the language-model settings.
    ///
    /// - `OPENAI_API_KEY`: optional; without it every model call fails soft.
    /// - `OPENAI_BASE_URL`: defaults to `https://api.openai.com/v1`.
    /// - `OPENAI_CHAT_MODEL`: reply model, defaults to `gpt-4`.
    /// - `OPENAI_EXTRACTION_MODEL`: field extraction model, defaults to `gpt-3.5-turbo`.
    fn from_env() -> Self {
        let openai_api_key = env_non_empty("OPENAI_API_KEY");
        if openai_api_key.is_none() {
            log::warn!("[config] OPENAI_API_KEY is not set; replies will use the apology fallback");
        }
        Self {
            openai_api_key,
            openai_base_url: env_non_empty("OPENAI_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            chat_model: env_non_empty("OPENAI_CHAT_MODEL").unwrap_or_else(|| "gpt-4".to_string()),
            extraction_model: env_non_empty("OPENAI_EXTRACTION_MODEL")
                .unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
        }
    }
}

static AI_CONFIG: OnceLock<AiConfig> = OnceLock::new();

pub fn ai_config() -> &'static AiConfig {
    AI_CONFIG.get_or_init(AiConfig::from_env)
}

#[derive(Clone, Debug)]
pub struct Timeouts {
    pub directory_http: Duration,
    pub ai_http: Duration,
}

impl Timeouts {
    fn from_env() -> Self {
        // Env: DIRECTORY_HTTP_TIMEOUT_MS / AI_HTTP_TIMEOUT_MS.
        // A timeout surfaces as an ordinary transport failure of that call.
        Self {
            directory_http: env_duration_ms("DIRECTORY_HTTP_TIMEOUT_MS", 10_000),
            ai_http: env_duration_ms("AI_HTTP_TIMEOUT_MS", 20_000),
        }
    }
}

static TIMEOUTS: OnceLock<Timeouts> = OnceLock::new();

pub fn timeouts() -> &'static Timeouts {
    TIMEOUTS.get_or_init(Timeouts::from_env)
}

/// Location of the optional sales script override (`SALES_SCRIPT_PATH`).
pub fn sales_script_path() -> PathBuf {
    env_non_empty("SALES_SCRIPT_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sales_script.yaml"))
}

#[derive(Clone, Debug)]
pub enum LogMode {
    Stdout,
    File,
}

#[derive(Clone, Debug)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub mode: LogMode,
    pub format: LogFormat,
    pub dir: Option<String>,
    pub file_name: String,
}

impl LoggingConfig {
    fn from_env() -> Self {
        let dir_env = std::env::var("LOG_DIR").ok();
        let mode_env = std::env::var("LOG_MODE").ok();
        let format_env = std::env::var("LOG_FORMAT").ok();

        let format = match format_env.as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let mode = match mode_env.as_deref() {
            Some("file") => LogMode::File,
            Some("stdout") => LogMode::Stdout,
            _ => {
                if dir_env.is_some() {
                    LogMode::File
                } else {
                    LogMode::Stdout
                }
            }
        };

        let dir = match mode {
            LogMode::File => Some(dir_env.unwrap_or_else(|| "logs".to_string())),
            LogMode::Stdout => None,
        };

        let file_name = std::env::var("LOG_FILE_NAME").unwrap_or_else(|_| "app.log".to_string());

        Self {
            mode,
            format,
            dir,
            file_name,
        }
    }
}

static LOGGING: OnceLock<LoggingConfig> = OnceLock::new();

pub fn logging_config() -> &'static LoggingConfig {
    LOGGING.get_or_init(LoggingConfig::from_env)
}

fn env_duration_ms(key: &str, default_ms: u64) -> Duration {
    let ms = std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_list(key: &str) -> Option<Vec<String>> {
    env_non_empty(key).map(|value| split_list(&value))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
