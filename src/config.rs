//! Configuration loading and types for AlbumStore.
//!
//! Configuration is read from an optional YAML file and deserialized into
//! the [`Config`] struct, then overlaid with process environment variables.
//! Each subsection governs a different part of the system: networking,
//! the backing bucket, signed URL lifetimes, catalog building, logging, and
//! observability.

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// Environment variables consulted for the bucket name, in order.
pub const BUCKET_ENV_VARS: &[&str] = &["S3_BUCKET_NAME", "AWS_S3_BUCKET", "S3_BUCKET", "AWS_BUCKET"];

/// Longest lifetime SigV4 allows for a presigned URL (one week).
pub const MAX_SIGNED_URL_TTL: u64 = 7 * 24 * 60 * 60;

/// Environment variables consulted for the region, in order.
pub const REGION_ENV_VARS: &[&str] = &["AWS_REGION", "AWS_DEFAULT_REGION"];

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Backing bucket settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Signed URL lifetimes.
    #[serde(default)]
    pub signing: SigningConfig,

    /// Catalog build settings.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Observability settings (metrics + health probes).
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind host address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,

    /// Origins allowed by CORS.  `*` allows any origin; empty disables CORS.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout: default_shutdown_timeout(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend type: `aws` or `memory`.
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// AWS S3 gateway configuration.
    #[serde(default)]
    pub aws: AwsStorageConfig,

    /// Memory gateway configuration.
    #[serde(default)]
    pub memory: MemoryStorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            aws: AwsStorageConfig::default(),
            memory: MemoryStorageConfig::default(),
        }
    }
}

/// AWS S3 gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AwsStorageConfig {
    /// Backing S3 bucket name.  No default: requests fail until it is set.
    #[serde(default)]
    pub bucket: Option<String>,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom S3-compatible endpoint (e.g. MinIO, LocalStack).
    #[serde(default)]
    pub endpoint_url: String,
    /// Force path-style URL addressing.
    #[serde(default)]
    pub use_path_style: bool,
    /// Explicit AWS access key (falls back to env/credential chain).
    #[serde(default)]
    pub access_key_id: String,
    /// Explicit AWS secret key (falls back to env/credential chain).
    #[serde(default)]
    pub secret_access_key: String,
}

impl Default for AwsStorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            region: default_region(),
            endpoint_url: String::new(),
            use_path_style: false,
            access_key_id: String::new(),
            secret_access_key: String::new(),
        }
    }
}

/// Memory gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryStorageConfig {
    /// Root of minted URLs.
    #[serde(default = "default_memory_base_url")]
    pub base_url: String,
    /// Keys per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for MemoryStorageConfig {
    fn default() -> Self {
        Self {
            base_url: default_memory_base_url(),
            page_size: default_page_size(),
        }
    }
}

/// Signed URL lifetimes, in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SigningConfig {
    /// Lifetime of URLs issued by `createUploadUrl`.
    #[serde(default = "default_upload_ttl")]
    pub upload_ttl_seconds: u64,
    /// Lifetime of URLs issued by `createDownloadUrl`.
    #[serde(default = "default_download_ttl")]
    pub download_ttl_seconds: u64,
    /// Lifetime of the cover, primary, and track URLs in the catalog.
    #[serde(default = "default_download_ttl")]
    pub catalog_ttl_seconds: u64,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            upload_ttl_seconds: default_upload_ttl(),
            download_ttl_seconds: default_download_ttl(),
            catalog_ttl_seconds: default_download_ttl(),
        }
    }
}

/// Catalog build settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Maximum album builds in flight at once.  0 means unbounded.
    #[serde(default)]
    pub max_concurrency: usize,

    /// Drop an album whose build fails instead of failing the whole catalog.
    #[serde(default = "default_true")]
    pub skip_failed_albums: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 0,
            skip_failed_albums: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: text or json.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Observability settings.
///
/// Controls Prometheus metrics collection and the health probe.
/// Both are enabled by default.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable Prometheus metrics collection and `/metrics` endpoint.
    #[serde(default = "default_true")]
    pub metrics: bool,

    /// Enable the `/health` probe.
    #[serde(default = "default_true")]
    pub health_check: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics: true,
            health_check: true,
        }
    }
}

impl Config {
    /// The configured bucket, if any non-blank name was given.
    pub fn bucket(&self) -> Option<&str> {
        self.storage
            .aws
            .bucket
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }

    /// Overlay values from an environment lookup function.
    ///
    /// Takes the lookup as a parameter so tests need not touch the real
    /// process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first_set = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(name))
                .find(|value| !value.trim().is_empty())
        };

        if let Some(bucket) = first_set(BUCKET_ENV_VARS) {
            self.storage.aws.bucket = Some(bucket.trim().to_string());
        }
        if let Some(region) = first_set(REGION_ENV_VARS) {
            self.storage.aws.region = region;
        }

        let ttl = |name: &str| -> anyhow::Result<Option<u64>> {
            match lookup(name).filter(|v| !v.trim().is_empty()) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Some)
                    .with_context(|| format!("parsing {name} value `{raw}`")),
                None => Ok(None),
            }
        };

        if let Some(secs) = ttl("S3_UPLOAD_SIGNED_URL_TTL")? {
            self.signing.upload_ttl_seconds = secs;
        }
        if let Some(secs) = ttl("S3_DOWNLOAD_SIGNED_URL_TTL")? {
            self.signing.download_ttl_seconds = secs;
        }
        if let Some(secs) = ttl("S3_SIGNED_URL_TTL")? {
            self.signing.catalog_ttl_seconds = secs;
        }

        Ok(())
    }

    /// Check values that would otherwise only fail at request time.
    pub fn validate(&self) -> anyhow::Result<()> {
        let signing = &self.signing;
        let ttls = [
            (
                "signing.upload_ttl_seconds",
                "S3_UPLOAD_SIGNED_URL_TTL",
                signing.upload_ttl_seconds,
            ),
            (
                "signing.download_ttl_seconds",
                "S3_DOWNLOAD_SIGNED_URL_TTL",
                signing.download_ttl_seconds,
            ),
            (
                "signing.catalog_ttl_seconds",
                "S3_SIGNED_URL_TTL",
                signing.catalog_ttl_seconds,
            ),
        ];
        for (key, env_var, secs) in ttls {
            if secs == 0 || secs > MAX_SIGNED_URL_TTL {
                anyhow::bail!(
                    "{key} ({env_var}) must be between 1 and {MAX_SIGNED_URL_TTL} seconds, got {secs}"
                );
            }
        }
        Ok(())
    }
}

// -- Defaults ----------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9012
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_storage_backend() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-2".to_string()
}

fn default_memory_base_url() -> String {
    "http://localhost:9012/objects".to_string()
}

fn default_page_size() -> usize {
    1000
}

fn default_upload_ttl() -> u64 {
    900
}

fn default_download_ttl() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

// -- Loader ------------------------------------------------------------------

/// Load configuration from a YAML file at `path`, then apply environment
/// overrides.  A missing file yields the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let mut config: Config = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))?
    } else {
        Config::default()
    };
    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 9012);
        assert_eq!(config.storage.aws.region, "us-east-2");
        assert_eq!(config.signing.upload_ttl_seconds, 900);
        assert_eq!(config.signing.download_ttl_seconds, 3600);
        assert_eq!(config.signing.catalog_ttl_seconds, 3600);
        assert_eq!(config.catalog.max_concurrency, 0);
        assert!(config.catalog.skip_failed_albums);
        assert!(config.bucket().is_none());
    }

    #[test]
    fn test_bucket_env_precedence() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("S3_BUCKET", "third"), ("AWS_S3_BUCKET", "second")]))
            .unwrap();
        assert_eq!(config.bucket(), Some("second"));
    }

    #[test]
    fn test_blank_bucket_env_is_ignored() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("S3_BUCKET_NAME", "  "), ("AWS_BUCKET", "fallback")]))
            .unwrap();
        assert_eq!(config.bucket(), Some("fallback"));
    }

    #[test]
    fn test_region_and_ttl_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("AWS_DEFAULT_REGION", "eu-west-1"),
                ("S3_UPLOAD_SIGNED_URL_TTL", "120"),
                ("S3_DOWNLOAD_SIGNED_URL_TTL", "240"),
                ("S3_SIGNED_URL_TTL", "600"),
            ]))
            .unwrap();
        assert_eq!(config.storage.aws.region, "eu-west-1");
        assert_eq!(config.signing.upload_ttl_seconds, 120);
        assert_eq!(config.signing.download_ttl_seconds, 240);
        assert_eq!(config.signing.catalog_ttl_seconds, 600);
    }

    #[test]
    fn test_invalid_ttl_is_an_error() {
        let mut config = Config::default();
        let err = config
            .apply_env(env(&[("S3_UPLOAD_SIGNED_URL_TTL", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("S3_UPLOAD_SIGNED_URL_TTL"));
    }

    #[test]
    fn test_defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_ttl_over_one_week_is_rejected() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("S3_SIGNED_URL_TTL", "700000")]))
            .unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("signing.catalog_ttl_seconds"), "{err}");
        assert!(err.contains("S3_SIGNED_URL_TTL"), "{err}");

        let mut config = Config::default();
        config.signing.upload_ttl_seconds = MAX_SIGNED_URL_TTL;
        assert!(config.validate().is_ok());
        config.signing.upload_ttl_seconds = MAX_SIGNED_URL_TTL + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        let config: Config =
            serde_yaml::from_str("signing:\n  download_ttl_seconds: 0\n").unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("signing.download_ttl_seconds"), "{err}");
    }

    #[test]
    fn test_load_config_rejects_out_of_range_ttl() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "signing:\n  upload_ttl_seconds: 604801").unwrap();
        let err = load_config(file.path()).unwrap_err().to_string();
        assert!(err.contains("signing.upload_ttl_seconds"), "{err}");
    }

    #[test]
    fn test_parse_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server:\n  port: 8080\nstorage:\n  backend: memory\n  aws:\n    bucket: tunes\ncatalog:\n  max_concurrency: 4\n  skip_failed_albums: false\n"
        )
        .unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let config: Config = serde_yaml::from_str(&contents).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.bucket(), Some("tunes"));
        assert_eq!(config.storage.aws.region, "us-east-2");
        assert_eq!(config.catalog.max_concurrency, 4);
        assert!(!config.catalog.skip_failed_albums);
    }

    #[test]
    fn test_example_file_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/albumstore.example.yaml");
        let contents = std::fs::read_to_string(path).unwrap();
        let config: Config = serde_yaml::from_str(&contents).unwrap();
        assert_eq!(config.server.port, 9012);
        assert_eq!(config.storage.backend, "aws");
        assert!(config.bucket().is_none());
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.server.port, 9012);
    }
}
