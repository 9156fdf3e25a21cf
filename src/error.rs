//! Error types for the starli CLI.

use std::{env::VarError, io, path::PathBuf, process::ExitCode, result::Result as StdResult};

use thiserror::Error;

/// Result type for starli operations.
pub type Result<T> = StdResult<T, Error>;

/// Errors that can occur while running the CLI.
#[derive(Debug, Error)]
pub enum Error {
    /// Home directory resolution failed.
    #[error("Failed to resolve the home directory.")]
    HomeDirectoryUnavailable,
    /// The cache root could not be created.
    #[error("Failed to create starli directory at {path}: {source}")]
    CacheDirectoryCreateFailed {
        /// Cache root that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The storage client could not be built.
    #[error("Failed to initialize the storage client: {message}")]
    RemoteClientInitFailed {
        /// Error message from the HTTP client builder.
        message: String,
    },
    /// The remote object metadata could not be fetched.
    #[error("Failed to get starli specs attributes from {url}: {message}")]
    RemoteMetadataFetchFailed {
        /// Metadata URL that failed.
        url: String,
        /// Error message.
        message: String,
    },
    /// The remote object could not be downloaded.
    #[error("Failed to download starli specs from {url}: {message}")]
    RemoteDownloadFailed {
        /// Download URL that failed.
        url: String,
        /// Error message.
        message: String,
    },
    /// The specs archive could not be extracted.
    #[error("Failed to untar starli specs into {path}: {message}")]
    ArchiveExtractFailed {
        /// Destination directory.
        path: PathBuf,
        /// Error message.
        message: String,
    },
    /// The marker file could not be written.
    #[error("Failed to write starli specs etag at {path}: {source}")]
    MarkerWriteFailed {
        /// Marker file path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The marker file could not be read.
    #[error("Failed to read starli specs etag at {path}: {source}")]
    MarkerReadFailed {
        /// Marker file path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// No template directory matched the requested name.
    #[error("Template not found: {name}")]
    TemplateNotFound {
        /// Requested template name.
        name: String,
    },
    /// A template descriptor was present but not valid JSON.
    #[error("Malformed template descriptor at {path}: {message}")]
    MalformedDescriptor {
        /// Descriptor file path.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },
    /// A cache path could not be inspected.
    #[error("Failed to read cache path {path}: {source}")]
    CacheRead {
        /// Path that failed to stat or read.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A cache path could not be removed.
    #[error("Failed to delete {path}: {source}")]
    CacheDelete {
        /// Path that failed to delete.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The cache lock could not be acquired.
    #[error("Failed to lock the specs cache at {path}: {source}")]
    CacheLock {
        /// Lock file path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The configuration file could not be read.
    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The configuration file could not be parsed.
    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_yaml::Error,
    },
    /// A configuration value was invalid.
    #[error("Invalid value for {key}: {value}")]
    ConfigValue {
        /// Config key or environment variable.
        key: String,
        /// Offending value.
        value: String,
    },
    /// A configured path could not be expanded.
    #[error("Invalid path in config: {path}: {source}")]
    PathExpansion {
        /// Input path that failed to expand.
        path: String,
        /// Underlying expansion error.
        source: shellexpand::LookupError<VarError>,
    },
    /// An interactive prompt was interrupted or canceled.
    #[error("Prompt canceled.")]
    PromptCanceled,
    /// An interactive prompt failed.
    #[error("Prompt failed: {message}")]
    PromptFailed {
        /// Error message describing the prompt failure.
        message: String,
    },
    /// The cache holds no templates.
    #[error("No templates found in {path}; run `starli update` to refresh the cache.")]
    NoTemplates {
        /// Specs directory that was scanned.
        path: PathBuf,
    },
    /// A template file could not be rendered.
    #[error("Failed to render {name}: {message}")]
    TemplateRender {
        /// Logical name of the rendered file.
        name: String,
        /// Error message describing the render failure.
        message: String,
    },
    /// A required path already exists.
    #[error("Path already exists: {path}. Use --force to overwrite.")]
    PathExists {
        /// Path that already exists.
        path: PathBuf,
    },
    /// A path was not a valid file system location.
    #[error("Invalid path: {path}")]
    InvalidPath {
        /// Path that could not be used.
        path: PathBuf,
    },
    /// A generated project file could not be written.
    #[error("Failed to write {path}: {source}")]
    ProjectWrite {
        /// Path that failed to write.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl Error {
    /// Map errors to exit codes for CLI termination.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::PromptCanceled => ExitCode::from(130),
            _ => ExitCode::from(1),
        }
    }
}
