//! Specs cache synchronization.
//!
//! The cache holds exactly one remote revision: the extracted `templates/`
//! directory plus a marker file carrying the remote entity tag it came from.
//! Staleness is decided by tag equality alone.
//!
//! Archives are unpacked into a staging directory inside the cache root and
//! the staged `templates/` directory is renamed over the live one, so a failed
//! download or extraction leaves the previous templates and marker in place.
//! Downloads and unpacking run unlocked. The swap, the marker write and
//! deletion hold the exclusive [`CacheLock`], and catalog reads hold the
//! shared one, so readers never see the specs directory missing mid-swap.

use std::{
    fs,
    io::{Cursor, ErrorKind},
    path::Path,
    sync::Arc,
};

use tempfile::{Builder as TempBuilder, TempDir};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{
    archive,
    error::{Error, Result},
    lock::CacheLock,
    paths::CachePaths,
    progress::Progress,
    remote::RemoteStore,
};

/// Keeps the local specs cache in step with the remote archive.
#[derive(Clone)]
pub struct Synchronizer {
    /// Cache layout.
    paths: CachePaths,
    /// Remote archive.
    store: Arc<dyn RemoteStore>,
    /// Whether foreground operations show progress.
    show_progress: bool,
    /// Whether progress lines are colorized.
    use_color: bool,
}

impl Synchronizer {
    /// Create a synchronizer over a cache layout and remote store.
    pub fn new(paths: CachePaths, store: Arc<dyn RemoteStore>) -> Self {
        Self {
            paths,
            store,
            show_progress: true,
            use_color: false,
        }
    }

    /// Colorize progress output.
    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    /// Suppress all progress output.
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Cache layout used by this synchronizer.
    pub fn paths(&self) -> &CachePaths {
        &self.paths
    }

    /// Whether both the marker and the specs directory are present.
    pub fn exists(&self) -> Result<bool> {
        Ok(is_present(&self.paths.marker_file(), false)?
            && is_present(&self.paths.specs_dir(), true)?)
    }

    /// Download and install the current remote revision unconditionally.
    pub async fn install(&self) -> Result<()> {
        let progress = Progress::start(
            "Downloading starli specs...",
            self.show_progress,
            self.use_color,
        );
        self.ensure_root()
            .inspect_err(|_| progress.fail("Failed to create starli directory"))?;

        info!(remote = %self.store.location(), root = %self.paths.root().display(), "installing specs");
        let staging = self.fetch_and_stage(&progress).await?;

        progress.set_message("Fetching starli specs attributes...");
        let etag = self
            .store
            .etag()
            .await
            .inspect_err(|_| progress.fail("Failed to get starli specs attributes"))?;

        let mut lock = CacheLock::open(&self.paths.lock_file())
            .inspect_err(|_| progress.fail("Failed to lock starli specs"))?;
        let _guard = lock
            .acquire()
            .inspect_err(|_| progress.fail("Failed to lock starli specs"))?;
        self.commit(&StagedRevision { staging, etag }, &progress)?;

        progress.succeed("Specs downloaded");
        Ok(())
    }

    /// Update the cache when the remote tag differs from the local marker.
    ///
    /// `verbose` only controls whether progress is shown.
    pub async fn refresh(&self, verbose: bool) -> Result<()> {
        let progress = Progress::start(
            "Updating starli specs...",
            verbose && self.show_progress,
            self.use_color,
        );
        self.ensure_root()
            .inspect_err(|_| progress.fail("Failed to create starli directory"))?;
        let Some(staged) = self.stage_if_stale(&progress).await? else {
            return Ok(());
        };

        let mut lock = CacheLock::open(&self.paths.lock_file())
            .inspect_err(|_| progress.fail("Failed to lock starli specs"))?;
        let _guard = lock
            .acquire()
            .inspect_err(|_| progress.fail("Failed to lock starli specs"))?;
        self.commit(&staged, &progress)?;
        progress.succeed("Specs updated");
        Ok(())
    }

    /// Run a quiet refresh as a detached task.
    ///
    /// The handle is meant to be dropped: failures are logged at debug level
    /// and nothing waits for completion, so the task may be cut short when the
    /// process exits. A downloaded revision is discarded when the cache lock
    /// is held elsewhere at swap time.
    pub fn spawn_background_refresh(&self) -> JoinHandle<()> {
        let sync = self.clone();
        tokio::spawn(async move {
            if let Err(error) = sync.refresh_if_unlocked().await {
                debug!(%error, "background specs refresh failed");
            }
        })
    }

    /// Refresh quietly, skipping the swap when the cache lock is busy.
    async fn refresh_if_unlocked(&self) -> Result<()> {
        self.ensure_root()?;
        let progress = Progress::hidden();
        let Some(staged) = self.stage_if_stale(&progress).await? else {
            return Ok(());
        };

        let mut lock = CacheLock::open(&self.paths.lock_file())?;
        let Some(_guard) = lock.try_acquire()? else {
            debug!(etag = %staged.etag, "specs cache busy, discarding background refresh");
            return Ok(());
        };
        self.commit(&staged, &progress)
    }

    /// Compare tags and stage the remote revision when the cache is stale.
    async fn stage_if_stale(&self, progress: &Progress) -> Result<Option<StagedRevision>> {
        let remote = self
            .store
            .etag()
            .await
            .inspect_err(|_| progress.fail("Failed to get starli specs attributes"))?;
        let local = self
            .read_marker()
            .inspect_err(|_| progress.fail("Failed to read starli specs etag"))?;

        if local.as_deref() == Some(remote.as_str()) {
            debug!(etag = %remote, "specs up to date");
            progress.succeed("Specs up to date");
            return Ok(None);
        }

        info!(local = ?local, remote = %remote, "specs out of date");
        let staging = self.fetch_and_stage(progress).await?;
        Ok(Some(StagedRevision {
            staging,
            etag: remote,
        }))
    }

    /// Remove the specs directory, then the marker.
    ///
    /// Missing entries are not errors. A failure part-way leaves whatever was
    /// already removed gone.
    pub fn delete(&self) -> Result<()> {
        if !self.paths.root().is_dir() {
            return Ok(());
        }
        let mut lock = CacheLock::open(&self.paths.lock_file())?;
        let _guard = lock.acquire()?;

        let specs_dir = self.paths.specs_dir();
        match fs::remove_dir_all(&specs_dir) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(Error::CacheDelete {
                    path: specs_dir,
                    source,
                });
            }
        }

        let marker = self.paths.marker_file();
        match fs::remove_file(&marker) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(Error::CacheDelete {
                    path: marker,
                    source,
                });
            }
        }

        info!(root = %self.paths.root().display(), "specs deleted");
        Ok(())
    }

    /// Create the cache root if it is missing.
    fn ensure_root(&self) -> Result<()> {
        let root = self.paths.root();
        fs::create_dir_all(root).map_err(|source| Error::CacheDirectoryCreateFailed {
            path: root.to_path_buf(),
            source,
        })
    }

    /// Download the archive and unpack it into a staging directory.
    async fn fetch_and_stage(&self, progress: &Progress) -> Result<TempDir> {
        progress.set_message("Downloading starli specs...");
        let bytes = self
            .store
            .download()
            .await
            .inspect_err(|_| progress.fail("Failed to download starli specs"))?;
        debug!(bytes = bytes.len(), "downloaded specs archive");

        progress.set_message("Extracting starli specs...");
        self.stage(&bytes)
            .inspect_err(|_| progress.fail("Failed to untar starli specs"))
    }

    /// Unpack into a fresh staging directory inside the cache root.
    fn stage(&self, bytes: &[u8]) -> Result<TempDir> {
        let root = self.paths.root();
        let staging = TempBuilder::new()
            .prefix(".staging-")
            .tempdir_in(root)
            .map_err(|error| extract_failed(root, error.to_string()))?;
        archive::unpack(Cursor::new(bytes), staging.path())?;

        if !staging.path().join(CachePaths::specs_dir_name()).is_dir() {
            return Err(extract_failed(
                root,
                format!("archive has no {}/ directory", CachePaths::specs_dir_name()),
            ));
        }
        Ok(staging)
    }

    /// Swap the staged templates into place and record their tag.
    ///
    /// The caller holds the exclusive cache lock.
    fn commit(&self, staged: &StagedRevision, progress: &Progress) -> Result<()> {
        let root = self.paths.root();
        let live = self.paths.specs_dir();
        let swap = || {
            match fs::remove_dir_all(&live) {
                Ok(()) => {}
                Err(error) if error.kind() == ErrorKind::NotFound => {}
                Err(error) => return Err(extract_failed(root, error.to_string())),
            }
            let staged_dir = staged.staging.path().join(CachePaths::specs_dir_name());
            fs::rename(&staged_dir, &live).map_err(|error| extract_failed(root, error.to_string()))
        };
        swap().inspect_err(|_| progress.fail("Failed to untar starli specs"))?;
        self.write_marker(&staged.etag)
            .inspect_err(|_| progress.fail("Failed to write starli specs etag"))
    }

    /// Read the local marker; `None` when it does not exist.
    fn read_marker(&self) -> Result<Option<String>> {
        let path = self.paths.marker_file();
        match fs::read_to_string(&path) {
            Ok(tag) => Ok(Some(tag)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::MarkerReadFailed { path, source }),
        }
    }

    /// Persist the marker.
    fn write_marker(&self, etag: &str) -> Result<()> {
        let path = self.paths.marker_file();
        fs::write(&path, etag).map_err(|source| Error::MarkerWriteFailed { path, source })
    }
}

/// A downloaded revision unpacked next to the live cache.
struct StagedRevision {
    /// Staging directory holding the unpacked `templates/`.
    staging: TempDir,
    /// Remote tag the revision is recorded under.
    etag: String,
}

/// Build an extraction error rooted at the cache directory.
fn extract_failed(root: &Path, message: String) -> Error {
    Error::ArchiveExtractFailed {
        path: root.to_path_buf(),
        message,
    }
}

/// Whether a path exists with the expected kind; not-found is `false`.
fn is_present(path: &Path, want_dir: bool) -> Result<bool> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(metadata.is_dir() == want_dir),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(Error::CacheRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}
