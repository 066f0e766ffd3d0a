pub mod file_types;

pub use file_types::{CategoryOptions, FileTypeOptions};

use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use anyhow::{Result, Context};
use tracing::{info, warn};

pub const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    Local,
    Dropbox,
}

impl FromStr for StorageBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "disk" => Ok(StorageBackendKind::Local),
            "dropbox" => Ok(StorageBackendKind::Dropbox),
            other => Err(anyhow::anyhow!("Unknown STORAGE_BACKEND '{}'", other)),
        }
    }
}

#[derive(Clone)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    /// Prefix of every stored path, shared by all backends.
    pub base_path: String,
    /// Directory backing the local store.
    pub local_root: PathBuf,
    pub public_base_url: String,
    pub dropbox_access_token: Option<String>,
    pub dropbox_api_url: String,
    pub dropbox_content_url: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("base_path", &self.base_path)
            .field("local_root", &self.local_root)
            .field("public_base_url", &self.public_base_url)
            .field("dropbox_access_token", &self.dropbox_access_token.as_ref().map(|_| "<redacted>"))
            .field("dropbox_api_url", &self.dropbox_api_url)
            .field("dropbox_content_url", &self.dropbox_content_url)
            .finish()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::Local,
            base_path: "uploads".to_string(),
            local_root: PathBuf::from("./data"),
            public_base_url: "http://localhost:8080/files".to_string(),
            dropbox_access_token: None,
            dropbox_api_url: "https://api.dropboxapi.com".to_string(),
            dropbox_content_url: "https://content.dropboxapi.com".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub max_file_size_bytes: u64,
    pub max_total_size_bytes: u64,
    pub max_concurrent_requests: usize,
    pub request_timeout_seconds: u64,
    pub storage: StorageConfig,
    pub file_types: FileTypeOptions,
    pub api_keys: HashSet<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("max_file_size_bytes", &self.max_file_size_bytes)
            .field("max_total_size_bytes", &self.max_total_size_bytes)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("storage", &self.storage)
            .field("file_types", &self.file_types)
            .field("api_keys", &self.api_keys.len())
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            max_file_size_bytes: 10 * MIB,
            max_total_size_bytes: 100 * MIB,
            max_concurrent_requests: 100,
            request_timeout_seconds: 30,
            storage: StorageConfig::default(),
            file_types: FileTypeOptions::default(),
            api_keys: HashSet::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        let defaults = Config::default();
        let storage_defaults = defaults.storage;

        let backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse().context("Failed to parse STORAGE_BACKEND")?,
            Err(_) => {
                info!("STORAGE_BACKEND not set, using default: local");
                storage_defaults.backend
            }
        };

        let file_types_path = env::var("FILE_TYPE_OPTIONS_PATH").ok().map(PathBuf::from);
        let file_types = FileTypeOptions::load(file_types_path.as_deref())
            .context("Failed to load file type options")?;

        let config = Config {
            server_host: Self::env_string("SERVER_HOST", &defaults.server_host),
            server_port: Self::parse_env_var("SERVER_PORT", defaults.server_port)
                .context("Failed to parse SERVER_PORT")?,
            max_file_size_bytes: Self::parse_env_var("MAX_FILE_SIZE_BYTES", defaults.max_file_size_bytes)
                .context("Failed to parse MAX_FILE_SIZE_BYTES")?,
            max_total_size_bytes: Self::parse_env_var("MAX_TOTAL_SIZE_BYTES", defaults.max_total_size_bytes)
                .context("Failed to parse MAX_TOTAL_SIZE_BYTES")?,
            max_concurrent_requests: Self::parse_env_var("MAX_CONCURRENT_REQUESTS", defaults.max_concurrent_requests)
                .context("Failed to parse MAX_CONCURRENT_REQUESTS")?,
            request_timeout_seconds: Self::parse_env_var("REQUEST_TIMEOUT_SECONDS", defaults.request_timeout_seconds)
                .context("Failed to parse REQUEST_TIMEOUT_SECONDS")?,
            storage: StorageConfig {
                backend,
                base_path: Self::env_string("STORAGE_BASE_PATH", &storage_defaults.base_path),
                local_root: PathBuf::from(Self::env_string(
                    "STORAGE_ROOT",
                    &storage_defaults.local_root.to_string_lossy(),
                )),
                public_base_url: Self::env_string("PUBLIC_BASE_URL", &storage_defaults.public_base_url),
                dropbox_access_token: env::var("DROPBOX_ACCESS_TOKEN")
                    .ok()
                    .filter(|t| !t.trim().is_empty()),
                dropbox_api_url: Self::env_string("DROPBOX_API_URL", &storage_defaults.dropbox_api_url),
                dropbox_content_url: Self::env_string("DROPBOX_CONTENT_URL", &storage_defaults.dropbox_content_url),
            },
            file_types,
            api_keys: Self::parse_api_keys(&env::var("VALID_API_KEYS").unwrap_or_default()),
        };

        config.validate()?;

        if config.api_keys.is_empty() {
            warn!("No valid API keys configured. Set VALID_API_KEYS environment variable.");
        } else {
            info!("Loaded {} valid API keys", config.api_keys.len());
        }

        info!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    fn env_string(var_name: &str, default: &str) -> String {
        env::var(var_name).unwrap_or_else(|_| {
            info!("{} not set, using default: {}", var_name, default);
            default.to_string()
        })
    }

    fn parse_env_var<T>(var_name: &str, default: T) -> Result<T>
    where
        T: FromStr + Copy + std::fmt::Debug,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(val) => match val.trim().parse() {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                    Ok(default)
                }
            },
            Err(_) => {
                info!("{} not set, using default: {:?}", var_name, default);
                Ok(default)
            }
        }
    }

    pub fn parse_api_keys(raw: &str) -> HashSet<String> {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT must be greater than 0"));
        }
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_BYTES must be greater than 0"));
        }
        if self.max_total_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_TOTAL_SIZE_BYTES must be greater than 0"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(anyhow::anyhow!("MAX_CONCURRENT_REQUESTS must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECONDS must be greater than 0"));
        }
        if self.storage.backend == StorageBackendKind::Dropbox && self.storage.dropbox_access_token.is_none() {
            return Err(anyhow::anyhow!("DROPBOX_ACCESS_TOKEN is required when STORAGE_BACKEND=dropbox"));
        }
        Ok(())
    }

    pub fn validate_api_key(&self, key: &str) -> bool {
        self.api_keys.contains(key)
    }

    /// Largest request body accepted by the HTTP layer: the batch cap plus multipart framing.
    pub fn body_limit_bytes(&self) -> usize {
        usize::try_from(self.max_total_size_bytes + MIB).unwrap_or(usize::MAX)
    }
}
