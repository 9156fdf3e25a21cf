//! Template catalog backed by the synchronized specs directory.

use std::{
    fmt, fs,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use crate::{
    error::{Error, Result},
    lock::CacheLock,
    paths::CachePaths,
    template::{DESCRIPTOR_FILE_NAME, TemplateDescriptor, parse_descriptor},
};

/// A template as listed: the directory it is looked up by and its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    /// Directory name under the specs directory.
    pub dir: String,
    /// Descriptor `name`.
    pub name: String,
}

impl fmt::Display for TemplateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Read-only view over `<specs>/<template>/starli.json`.
///
/// Every public read holds the shared cache lock, so a concurrent refresh
/// cannot swap the specs directory out from under it.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Directory holding one subdirectory per template.
    specs_dir: PathBuf,
    /// Cache lock file.
    lock_file: PathBuf,
}

impl Catalog {
    /// Create a catalog over a cache layout.
    pub fn new(paths: &CachePaths) -> Self {
        Self {
            specs_dir: paths.specs_dir(),
            lock_file: paths.lock_file(),
        }
    }

    /// The scanned specs directory.
    pub fn specs_dir(&self) -> &Path {
        &self.specs_dir
    }

    /// Run `read` while holding the shared cache lock.
    ///
    /// A cache root that does not exist yet has nothing to guard.
    pub fn locked<T>(&self, read: impl FnOnce() -> Result<T>) -> Result<T> {
        if !self.lock_file.parent().is_some_and(Path::is_dir) {
            return read();
        }
        let lock = CacheLock::open(&self.lock_file)?;
        let _guard = lock.shared()?;
        read()
    }

    /// Every template with a descriptor, in directory order.
    ///
    /// A single malformed descriptor fails the whole listing.
    pub fn entries(&self) -> Result<Vec<TemplateEntry>> {
        self.locked(|| {
            let mut entries = Vec::new();
            for dir in self.template_dirs()? {
                let descriptor_path = dir.join(DESCRIPTOR_FILE_NAME);
                if !descriptor_path.is_file() {
                    continue;
                }
                let Some(dir_name) = dir.file_name().and_then(|name| name.to_str()) else {
                    continue;
                };
                entries.push(TemplateEntry {
                    dir: dir_name.to_string(),
                    name: read_descriptor(&descriptor_path)?.name,
                });
            }
            Ok(entries)
        })
    }

    /// Names of every template, in directory order.
    pub fn list_names(&self) -> Result<Vec<String>> {
        Ok(self
            .entries()?
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }

    /// Load a template descriptor by directory or display name, ignoring case.
    pub fn get(&self, name: &str) -> Result<TemplateDescriptor> {
        self.locked(|| {
            let dir = self.find_dir(name)?;
            read_descriptor(&dir.join(DESCRIPTOR_FILE_NAME))
        })
    }

    /// Directory backing a template, by directory or display name, ignoring case.
    pub fn template_dir(&self, name: &str) -> Result<PathBuf> {
        self.locked(|| self.find_dir(name))
    }

    /// Resolve a template directory. The caller holds the shared lock.
    ///
    /// Directory names win over display names. Descriptors that fail to parse
    /// never match a display name.
    fn find_dir(&self, name: &str) -> Result<PathBuf> {
        let wanted = name.to_lowercase();
        let has_descriptor = |dir: &Path| dir.join(DESCRIPTOR_FILE_NAME).is_file();
        let single = is_single_component(&wanted);

        if single {
            let direct = self.specs_dir.join(&wanted);
            if direct.is_dir() && has_descriptor(&direct) {
                return Ok(direct);
            }
        }

        let dirs = self.template_dirs()?;
        if single
            && let Some(dir) = dirs.iter().find(|dir| {
                dir.file_name()
                    .and_then(|file_name| file_name.to_str())
                    .is_some_and(|file_name| file_name.to_lowercase() == wanted)
                    && has_descriptor(dir)
            })
        {
            return Ok(dir.clone());
        }

        dirs.into_iter()
            .find(|dir| {
                read_descriptor(&dir.join(DESCRIPTOR_FILE_NAME))
                    .is_ok_and(|descriptor| descriptor.name.to_lowercase() == wanted)
            })
            .ok_or_else(|| Error::TemplateNotFound {
                name: name.to_string(),
            })
    }

    /// Immediate subdirectories of the specs directory, sorted by name.
    fn template_dirs(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.specs_dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => {
                return Err(Error::CacheRead {
                    path: self.specs_dir.clone(),
                    source: error,
                });
            }
        };

        let mut dirs = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect::<Vec<_>>();
        dirs.sort();
        Ok(dirs)
    }
}

/// Whether a name is exactly one normal path component.
fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Read and parse a descriptor file.
fn read_descriptor(path: &Path) -> Result<TemplateDescriptor> {
    let contents = fs::read_to_string(path).map_err(|error| Error::CacheRead {
        path: path.to_path_buf(),
        source: error,
    })?;
    parse_descriptor(path, &contents)
}
