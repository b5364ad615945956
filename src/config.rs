//! Application configuration.
//!
//! Configuration is layered: stock defaults, then the user's
//! `pixel-forge.toml`, then a handful of environment variables. Each layer is
//! a sparse TOML table merged onto the previous one with [`merge_toml`], and
//! the result is deserialized and validated once.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [storage]
//! backend = "local"          # "local" (filesystem) or "bucket" (object store)
//! media_root = "media"       # Root directory for the local backend
//! media_url = "/media/"      # URL prefix for files under media_root
//! records_dir = "records"    # One JSON file per processed image
//! # work_dir = "/tmp"        # Where temporary encode files go (default: system temp)
//!
//! [output]
//! jpeg_quality = 90          # 1-100
//!
//! [remote]
//! mirror = true              # Mirror processed results to the bucket
//! bucket = "your-bucket-name-here"
//! region = "us-east-1"
//! access_key_id = ""
//! secret_access_key = ""
//! public_read = true
//! # endpoint_url = "http://localhost:9000"   # S3-compatible endpoint
//! # public_base_url = "https://cdn.example.com"
//!
//! [processing]
//! # max_workers = 4          # Parallel uploads in batch mode (default: CPU cores)
//! ```
//!
//! ## Placeholders
//!
//! Template values such as `your-bucket-name-here`, `changeme`, `${VAR}` or
//! `<bucket>`, and empty strings, count as "not configured". Mirroring is
//! skipped silently rather than attempted against a bucket that can't exist.
//!
//! ## Environment
//!
//! | Variable | Key |
//! |---|---|
//! | `PIXEL_FORGE_STORAGE_BACKEND` | `storage.backend` |
//! | `PIXEL_FORGE_MIRROR` | `remote.mirror` |
//! | `AWS_STORAGE_BUCKET_NAME` | `remote.bucket` |
//! | `AWS_S3_REGION_NAME` | `remote.region` |
//! | `AWS_ACCESS_KEY_ID` | `remote.access_key_id` |
//! | `AWS_SECRET_ACCESS_KEY` | `remote.secret_access_key` |
//! | `AWS_S3_ENDPOINT_URL` | `remote.endpoint_url` |
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pixel-forge.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Primary store settings.
    pub storage: StorageConfig,
    /// Encoding settings for processed results.
    pub output: OutputConfig,
    /// Remote object store used for mirroring (and for the bucket backend).
    pub remote: RemoteConfig,
    /// Batch processing settings.
    pub processing: ProcessingConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(ConfigError::Validation(
                "output.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.storage.media_url.is_empty() {
            return Err(ConfigError::Validation(
                "storage.media_url must not be empty".into(),
            ));
        }
        if self.storage.backend == StorageBackend::Bucket && !self.remote.is_configured() {
            return Err(ConfigError::Validation(
                "storage.backend = \"bucket\" requires remote.bucket and credentials".into(),
            ));
        }
        if self.processing.max_workers == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_workers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files under `media_root`, addressable by filesystem path.
    #[default]
    Local,
    /// Objects in the remote bucket, addressable by URL only.
    Bucket,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub media_root: PathBuf,
    pub media_url: String,
    pub records_dir: PathBuf,
    /// Directory for scoped temporary files. `None` uses the system default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            media_root: PathBuf::from("media"),
            media_url: "/media/".to_string(),
            records_dir: PathBuf::from("records"),
            work_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub jpeg_quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { jpeg_quality: 90 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// Mirror processed results to the bucket after the primary write.
    pub mirror: bool,
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom S3-compatible endpoint. Switches URLs to path style.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    /// Public URL prefix (e.g. a CDN) used instead of the bucket URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
    /// Upload mirrored objects with a public-read ACL.
    pub public_read: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            mirror: true,
            bucket: "your-bucket-name-here".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            endpoint_url: None,
            public_base_url: None,
            public_read: true,
        }
    }
}

impl RemoteConfig {
    /// Bucket, region and credentials all hold real values.
    pub fn is_configured(&self) -> bool {
        [
            &self.bucket,
            &self.region,
            &self.access_key_id,
            &self.secret_access_key,
        ]
        .iter()
        .all(|v| !is_placeholder(v))
    }

    /// Mirroring is switched on and has somewhere to go.
    pub fn mirror_enabled(&self) -> bool {
        self.mirror && self.is_configured()
    }

    /// Custom endpoint, if one is actually set.
    pub fn endpoint(&self) -> Option<&str> {
        configured(self.endpoint_url.as_deref())
    }

    /// Public URL prefix, if one is actually set.
    pub fn public_base(&self) -> Option<&str> {
        configured(self.public_base_url.as_deref())
    }

    /// Public URL of an object.
    pub fn object_url(&self, key: &str) -> String {
        if let Some(base) = self.public_base() {
            return format!("{}/{}", base.trim_end_matches('/'), key);
        }
        match self.endpoint() {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket,
                key
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }
}

fn configured(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !is_placeholder(v))
}

/// Whether a setting still holds an unfilled template value.
pub fn is_placeholder(value: &str) -> bool {
    let v = value.trim();
    if v.is_empty() {
        return true;
    }
    let lower = v.to_ascii_lowercase();
    lower.starts_with("your-")
        || lower.starts_with("your_")
        || lower == "changeme"
        || lower == "change-me"
        || lower == "xxx"
        || (v.starts_with("${") && v.ends_with('}'))
        || (v.starts_with('<') && v.ends_with('>'))
}

/// Batch processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of uploads processed in parallel.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_workers.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(AppConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Validation(format!(
            "{var} must be a boolean, got {other:?}"
        ))),
    }
}

/// Build the environment layer from a variable lookup.
///
/// Returns `Ok(None)` when none of the recognised variables are set.
pub fn env_overlay(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Option<toml::Value>, ConfigError> {
    let mut storage = toml::Table::new();
    let mut remote = toml::Table::new();

    if let Some(backend) = lookup("PIXEL_FORGE_STORAGE_BACKEND") {
        storage.insert("backend".into(), toml::Value::String(backend));
    }
    if let Some(mirror) = lookup("PIXEL_FORGE_MIRROR") {
        let enabled = parse_bool("PIXEL_FORGE_MIRROR", &mirror)?;
        remote.insert("mirror".into(), toml::Value::Boolean(enabled));
    }
    for (var, key) in [
        ("AWS_STORAGE_BUCKET_NAME", "bucket"),
        ("AWS_S3_REGION_NAME", "region"),
        ("AWS_ACCESS_KEY_ID", "access_key_id"),
        ("AWS_SECRET_ACCESS_KEY", "secret_access_key"),
        ("AWS_S3_ENDPOINT_URL", "endpoint_url"),
    ] {
        if let Some(value) = lookup(var) {
            remote.insert(key.into(), toml::Value::String(value));
        }
    }

    let mut root = toml::Table::new();
    if !storage.is_empty() {
        root.insert("storage".into(), toml::Value::Table(storage));
    }
    if !remote.is_empty() {
        root.insert("remote".into(), toml::Value::Table(remote));
    }
    Ok((!root.is_empty()).then_some(toml::Value::Table(root)))
}

/// Merge the optional layers onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    layers: impl IntoIterator<Item = Option<toml::Value>>,
) -> Result<AppConfig, ConfigError> {
    let merged = layers
        .into_iter()
        .flatten()
        .fold(base, merge_toml);
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from `path` plus the process environment.
///
/// A missing file is fine; stock defaults apply.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let file = load_raw_config(path)?;
    let env = env_overlay(|var| std::env::var(var).ok())?;
    resolve_config(base, [file, env])
}

/// Returns a fully-commented stock `pixel-forge.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pixel-forge configuration
# =========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.
#
# Environment variables override this file:
#   PIXEL_FORGE_STORAGE_BACKEND, PIXEL_FORGE_MIRROR,
#   AWS_STORAGE_BUCKET_NAME, AWS_S3_REGION_NAME, AWS_ACCESS_KEY_ID,
#   AWS_SECRET_ACCESS_KEY, AWS_S3_ENDPOINT_URL

# ---------------------------------------------------------------------------
# Primary storage
# ---------------------------------------------------------------------------
[storage]
# "local" keeps originals and results under media_root.
# "bucket" stores them in the [remote] bucket instead.
backend = "local"
media_root = "media"
# URL prefix under which media_root is served.
media_url = "/media/"
# One JSON record per processed image.
records_dir = "records"
# Directory for temporary encode files. Omit to use the system temp dir.
# work_dir = "/var/tmp/pixel-forge"

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# JPEG quality (1 = smallest, 100 = best).
jpeg_quality = 90

# ---------------------------------------------------------------------------
# Remote object store
# ---------------------------------------------------------------------------
[remote]
# Mirror processed results to the bucket. Skipped silently while the
# bucket or credentials below still hold placeholder values.
mirror = true
bucket = "your-bucket-name-here"
region = "us-east-1"
access_key_id = ""
secret_access_key = ""
# Upload mirrored objects as publicly readable.
public_read = true
# S3-compatible endpoint (MinIO, R2, ...). Enables path-style URLs.
# endpoint_url = "http://localhost:9000"
# Public URL prefix, e.g. a CDN in front of the bucket.
# public_base_url = "https://cdn.example.com"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum uploads processed in parallel by `pixel-forge process`.
# Omit to auto-detect (= number of CPU cores).
# max_workers = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    fn configured_remote() -> RemoteConfig {
        RemoteConfig {
            bucket: "photos".into(),
            access_key_id: "AKIAEXAMPLE".into(),
            secret_access_key: "secret".into(),
            ..RemoteConfig::default()
        }
    }

    #[test]
    fn default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(config.storage.media_root, PathBuf::from("media"));
        assert_eq!(config.output.jpeg_quality, 90);
        assert!(config.remote.mirror);
        assert_eq!(config.processing.max_workers, None);
    }

    #[test]
    fn default_remote_is_not_configured() {
        let remote = RemoteConfig::default();
        assert!(!remote.is_configured());
        assert!(!remote.mirror_enabled());
    }

    #[test]
    fn configured_remote_enables_mirror() {
        let remote = configured_remote();
        assert!(remote.is_configured());
        assert!(remote.mirror_enabled());

        let off = RemoteConfig {
            mirror: false,
            ..configured_remote()
        };
        assert!(!off.mirror_enabled());
    }

    #[test]
    fn placeholder_detection() {
        for v in [
            "",
            "   ",
            "your-bucket-name-here",
            "YOUR_ACCESS_KEY",
            "changeme",
            "${AWS_SECRET}",
            "<bucket>",
        ] {
            assert!(is_placeholder(v), "{v:?} should be a placeholder");
        }
        for v in ["photos", "AKIA123", "eu-west-1", "my-your-bucket"] {
            assert!(!is_placeholder(v), "{v:?} should be a real value");
        }
    }

    #[test]
    fn object_url_virtual_hosted_style() {
        let remote = RemoteConfig {
            region: "eu-west-1".into(),
            ..configured_remote()
        };
        assert_eq!(
            remote.object_url("processed_images/a.jpg"),
            "https://photos.s3.eu-west-1.amazonaws.com/processed_images/a.jpg"
        );
    }

    #[test]
    fn object_url_custom_endpoint_is_path_style() {
        let remote = RemoteConfig {
            endpoint_url: Some("http://localhost:9000/".into()),
            ..configured_remote()
        };
        assert_eq!(
            remote.object_url("k.jpg"),
            "http://localhost:9000/photos/k.jpg"
        );
    }

    #[test]
    fn object_url_ignores_blank_endpoint_and_base() {
        let remote = RemoteConfig {
            endpoint_url: Some("".into()),
            public_base_url: Some("  ".into()),
            ..configured_remote()
        };
        assert_eq!(remote.endpoint(), None);
        assert_eq!(remote.public_base(), None);
        assert_eq!(
            remote.object_url("k.jpg"),
            "https://photos.s3.us-east-1.amazonaws.com/k.jpg"
        );
    }

    #[test]
    fn blank_endpoint_from_env_keeps_aws_urls() {
        let env = env_overlay(env_from(&[
            ("AWS_STORAGE_BUCKET_NAME", "photos"),
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_S3_ENDPOINT_URL", ""),
        ]))
        .unwrap();
        let config = resolve_config(stock_defaults_value().unwrap(), [env]).unwrap();
        assert!(config.remote.mirror_enabled());
        assert_eq!(
            config.remote.object_url("processed_images/a.jpg"),
            "https://photos.s3.us-east-1.amazonaws.com/processed_images/a.jpg"
        );
    }

    #[test]
    fn object_url_prefers_public_base() {
        let remote = RemoteConfig {
            endpoint_url: Some("http://localhost:9000".into()),
            public_base_url: Some("https://cdn.example.com/".into()),
            ..configured_remote()
        };
        assert_eq!(remote.object_url("k.jpg"), "https://cdn.example.com/k.jpg");
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_quality_bounds() {
        let mut config = AppConfig::default();
        config.output.jpeg_quality = 0;
        assert!(config.validate().is_err());
        config.output.jpeg_quality = 101;
        assert!(config.validate().is_err());
        config.output.jpeg_quality = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_bucket_backend_requires_credentials() {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Bucket;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("bucket"));

        config.remote = configured_remote();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_zero_workers() {
        let mut config = AppConfig::default();
        config.processing.max_workers = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_workers: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_workers: Some(99999),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    // =========================================================================
    // Parsing and layering
    // =========================================================================

    #[test]
    fn parse_partial_config() {
        let config: AppConfig = toml::from_str(
            r#"
[output]
jpeg_quality = 75
"#,
        )
        .unwrap();
        assert_eq!(config.output.jpeg_quality, 75);
        assert_eq!(config.storage.media_url, "/media/");
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<AppConfig, _> = toml::from_str(
            r#"
[remote]
bukket = "x"
"#,
        );
        assert!(result.unwrap_err().to_string().contains("unknown field"));
    }

    #[test]
    fn unknown_backend_rejected() {
        let result: Result<AppConfig, _> = toml::from_str(
            r#"
[storage]
backend = "ftp"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value = toml::from_str(
            r#"
[remote]
bucket = "a"
region = "us-east-1"
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[remote]
bucket = "b"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let remote = merged.get("remote").unwrap();
        assert_eq!(remote.get("bucket").unwrap().as_str(), Some("b"));
        assert_eq!(remote.get("region").unwrap().as_str(), Some("us-east-1"));
    }

    #[test]
    fn env_overlay_empty_when_nothing_set() {
        assert!(env_overlay(no_env).unwrap().is_none());
    }

    #[test]
    fn env_overlay_maps_aws_variables() {
        let overlay = env_overlay(env_from(&[
            ("AWS_STORAGE_BUCKET_NAME", "photos"),
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("PIXEL_FORGE_MIRROR", "off"),
            ("PIXEL_FORGE_STORAGE_BACKEND", "bucket"),
        ]))
        .unwrap()
        .unwrap();
        let remote = overlay.get("remote").unwrap();
        assert_eq!(remote.get("bucket").unwrap().as_str(), Some("photos"));
        assert_eq!(remote.get("access_key_id").unwrap().as_str(), Some("AKIA"));
        assert_eq!(remote.get("mirror").unwrap().as_bool(), Some(false));
        assert_eq!(
            overlay.get("storage").unwrap().get("backend").unwrap().as_str(),
            Some("bucket")
        );
    }

    #[test]
    fn env_overlay_rejects_bad_boolean() {
        let result = env_overlay(env_from(&[("PIXEL_FORGE_MIRROR", "maybe")]));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn env_layer_wins_over_file_layer() {
        let base = stock_defaults_value().unwrap();
        let file: toml::Value = toml::from_str(
            r#"
[remote]
bucket = "from-file"
"#,
        )
        .unwrap();
        let env = env_overlay(env_from(&[("AWS_STORAGE_BUCKET_NAME", "from-env")])).unwrap();
        let config = resolve_config(base, [Some(file), env]).unwrap();
        assert_eq!(config.remote.bucket, "from-env");
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[output]
jpeg_quality = 0
"#,
        )
        .unwrap();
        let result = resolve_config(base, [Some(overlay)]);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_raw_config_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let result = load_raw_config(&tmp.path().join("nope.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_raw_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_raw_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        for section in ["storage", "output", "remote", "processing"] {
            assert!(val.get(section).is_some(), "missing [{section}]");
        }
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: AppConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(config.storage.backend, defaults.storage.backend);
        assert_eq!(config.storage.media_root, defaults.storage.media_root);
        assert_eq!(config.storage.records_dir, defaults.storage.records_dir);
        assert_eq!(config.output.jpeg_quality, defaults.output.jpeg_quality);
        assert_eq!(config.remote.bucket, defaults.remote.bucket);
        assert_eq!(config.remote.mirror, defaults.remote.mirror);
        assert_eq!(config.processing.max_workers, None);
    }
}
