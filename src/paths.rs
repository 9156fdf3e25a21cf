//! Cache path resolution and path display helpers.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use path_clean::PathClean;

use crate::error::{Error, Result};

/// Directory name of the cache root under the home directory.
const CACHE_DIR_NAME: &str = ".starli";
/// Directory holding one subdirectory per template.
const SPECS_DIR_NAME: &str = "templates";
/// File holding the remote revision tag of the extracted specs.
const MARKER_FILE_NAME: &str = "specs.etag";
/// Advisory lock file guarding cache mutation.
const LOCK_FILE_NAME: &str = ".lock";
/// Default config file name under the home directory.
const CONFIG_FILE_NAME: &str = ".starli.yaml";

/// Well-known locations inside the specs cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    /// Cache root directory.
    root: PathBuf,
}

impl CachePaths {
    /// Build cache paths rooted at an explicit directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Build cache paths under a home directory.
    pub fn from_home(home: &Path) -> Self {
        Self::new(home.join(CACHE_DIR_NAME))
    }

    /// Resolve cache paths under the current user's home directory.
    pub fn resolve() -> Result<Self> {
        let home = dirs::home_dir().ok_or(Error::HomeDirectoryUnavailable)?;
        Ok(Self::from_home(&home))
    }

    /// The cache root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The extracted specs directory.
    pub fn specs_dir(&self) -> PathBuf {
        self.root.join(SPECS_DIR_NAME)
    }

    /// The version marker file.
    pub fn marker_file(&self) -> PathBuf {
        self.root.join(MARKER_FILE_NAME)
    }

    /// The lock file guarding cache mutation.
    pub fn lock_file(&self) -> PathBuf {
        self.root.join(LOCK_FILE_NAME)
    }

    /// Name of the specs directory as it appears inside the archive.
    pub(crate) fn specs_dir_name() -> &'static str {
        SPECS_DIR_NAME
    }
}

/// Return the default config path for the current platform.
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(Error::HomeDirectoryUnavailable)?;
    Ok(home.join(CONFIG_FILE_NAME))
}

/// Expand a config-provided path and resolve it relative to a base directory.
pub fn expand_path(raw: &str, base_dir: &Path) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw).map_err(|error| Error::PathExpansion {
        path: raw.to_string(),
        source: error,
    })?;
    let expanded_path = PathBuf::from(expanded.as_ref());
    let resolved = if expanded_path.is_relative() {
        base_dir.join(expanded_path)
    } else {
        expanded_path
    };
    Ok(normalize_path(&resolved))
}

/// Normalize a path by cleaning and canonicalizing when possible.
pub fn normalize_path(path: &Path) -> PathBuf {
    match dunce::canonicalize(path) {
        Ok(canonical) => canonical,
        Err(_) => path.clean(),
    }
}

/// Render a path for display, using a tilde prefix for the home directory.
pub fn display_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        if stripped.as_os_str().is_empty() {
            return "~".to_string();
        }
        return format!("~{}{}", MAIN_SEPARATOR, stripped.display());
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::tempdir;

    use super::{CachePaths, expand_path};

    #[test]
    fn derives_cache_layout_from_home() {
        let paths = CachePaths::from_home(Path::new("/home/user"));
        assert_eq!(paths.root(), Path::new("/home/user/.starli"));
        assert_eq!(paths.specs_dir(), Path::new("/home/user/.starli/templates"));
        assert_eq!(paths.marker_file(), Path::new("/home/user/.starli/specs.etag"));
        assert_eq!(paths.lock_file(), Path::new("/home/user/.starli/.lock"));
    }

    #[test]
    fn explicit_root_is_used_verbatim() {
        let paths = CachePaths::new("/tmp/x");
        assert_eq!(paths.specs_dir(), Path::new("/tmp/x/templates"));
        assert_eq!(paths.marker_file(), Path::new("/tmp/x/specs.etag"));
    }

    #[test]
    fn expands_relative_paths_against_base() {
        let dir = tempdir().expect("tempdir");
        let expanded = expand_path("cache/../cache", dir.path()).expect("expand");
        assert!(expanded.ends_with("cache"));
        assert!(!expanded.to_string_lossy().contains(".."));
    }
}
