//! Configuration loading from `~/.starli.yaml` and the environment.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use url::Url;

use crate::{
    error::{Error, Result},
    paths::{self, CachePaths},
};

/// Public bucket serving the specs archive.
pub const DEFAULT_BUCKET: &str = "starli-cli.appspot.com";
/// Object key of the specs archive.
pub const DEFAULT_OBJECT: &str = "specs.tar";
/// Deadline applied to every remote call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 50;
/// Base URL of the object storage HTTP API.
pub const DEFAULT_STORAGE_URL: &str = "https://storage.googleapis.com";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "STARLI_";

/// Resolved configuration for the CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit cache root, if configured.
    cache_dir: Option<PathBuf>,
    /// Bucket holding the specs archive.
    bucket: String,
    /// Object key of the specs archive.
    object: String,
    /// Deadline for remote calls.
    timeout: Duration,
    /// Base URL of the storage API.
    storage_url: Url,
    /// Config file that was read, if any.
    source: Option<PathBuf>,
}

/// Raw config file structure.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    /// Cache root override.
    cache_dir: Option<String>,
    /// Bucket override.
    bucket: Option<String>,
    /// Object key override.
    object: Option<String>,
    /// Timeout override in seconds.
    timeout_secs: Option<u64>,
    /// Storage API base URL override.
    storage_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            bucket: DEFAULT_BUCKET.to_string(),
            object: DEFAULT_OBJECT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            storage_url: default_storage_url(),
            source: None,
        }
    }
}

impl Config {
    /// Load config from an explicit path or `~/.starli.yaml`, then apply
    /// `STARLI_*` environment overrides.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (paths::default_config_path()?, false),
        };
        Self::load_with(&path, required, |key| env::var(key).ok())
    }

    /// Load a config file, resolving overrides through `lookup`.
    pub(crate) fn load_with(
        path: &Path,
        required: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let (raw, source) = match fs::read_to_string(path) {
            Ok(contents) => (parse(path, &contents)?, Some(path.to_path_buf())),
            Err(error) if error.kind() == ErrorKind::NotFound && !required => {
                (RawConfig::default(), None)
            }
            Err(error) => {
                return Err(Error::ConfigRead {
                    path: path.to_path_buf(),
                    source: error,
                });
            }
        };

        let base_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self {
            source,
            ..Self::default()
        };
        config.apply(raw, base_dir)?;
        config.apply(env_overrides(&lookup)?, base_dir)?;
        Ok(config)
    }

    /// Overlay set fields from a raw config.
    fn apply(&mut self, raw: RawConfig, base_dir: &Path) -> Result<()> {
        if let Some(dir) = raw.cache_dir {
            self.cache_dir = Some(paths::expand_path(&dir, base_dir)?);
        }
        if let Some(bucket) = raw.bucket {
            self.bucket = non_empty("bucket", bucket)?;
        }
        if let Some(object) = raw.object {
            self.object = non_empty("object", object)?;
        }
        if let Some(secs) = raw.timeout_secs {
            if secs == 0 {
                return Err(Error::ConfigValue {
                    key: "timeout_secs".to_string(),
                    value: secs.to_string(),
                });
            }
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(url) = raw.storage_url {
            self.storage_url = Url::parse(&url).map_err(|_| Error::ConfigValue {
                key: "storage_url".to_string(),
                value: url.clone(),
            })?;
        }
        Ok(())
    }

    /// Return the cache layout, defaulting to `~/.starli`.
    pub(crate) fn cache_paths(&self) -> Result<CachePaths> {
        match &self.cache_dir {
            Some(dir) => Ok(CachePaths::new(dir)),
            None => CachePaths::resolve(),
        }
    }

    /// Bucket holding the specs archive.
    pub(crate) fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key of the specs archive.
    pub(crate) fn object(&self) -> &str {
        &self.object
    }

    /// Deadline for remote calls.
    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Base URL of the storage API.
    pub(crate) fn storage_url(&self) -> &Url {
        &self.storage_url
    }

    /// Config file that was read, if any.
    pub(crate) fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

/// Parse config contents, treating a blank file as empty config.
fn parse(path: &Path, contents: &str) -> Result<RawConfig> {
    if contents.trim().is_empty() {
        return Ok(RawConfig::default());
    }
    serde_yaml::from_str(contents).map_err(|error| Error::ConfigParse {
        path: path.to_path_buf(),
        source: error,
    })
}

/// Collect `STARLI_*` overrides.
fn env_overrides(lookup: &impl Fn(&str) -> Option<String>) -> Result<RawConfig> {
    let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.is_empty());
    let timeout_secs = match var("TIMEOUT_SECS") {
        Some(value) => Some(value.trim().parse().map_err(|_| Error::ConfigValue {
            key: format!("{ENV_PREFIX}TIMEOUT_SECS"),
            value,
        })?),
        None => None,
    };
    Ok(RawConfig {
        cache_dir: var("CACHE_DIR"),
        bucket: var("BUCKET"),
        object: var("OBJECT"),
        timeout_secs,
        storage_url: var("STORAGE_URL"),
    })
}

/// Reject blank string values.
fn non_empty(key: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::ConfigValue {
            key: key.to_string(),
            value,
        });
    }
    Ok(trimmed.to_string())
}

/// Parse the built-in storage URL.
fn default_storage_url() -> Url {
    Url::parse(DEFAULT_STORAGE_URL).unwrap_or_else(|_| unreachable!("static URL is valid"))
}
