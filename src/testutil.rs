//! Test utilities for setting up mock specs caches and remotes.
//!
//! This module provides a `CacheFixture` builder for creating isolated cache
//! roots, an `ArchiveBuilder` for in-memory tar archives, and a `FakeStore`
//! standing in for the remote bucket.

#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use tar::{Builder, EntryType, Header};
use tempfile::TempDir;

use crate::{
    catalog::Catalog,
    error::{Error, Result},
    paths::CachePaths,
    remote::RemoteStore,
    template::DESCRIPTOR_FILE_NAME,
};

/// Minimal descriptor JSON with a name and no files or questions.
pub fn descriptor_json(name: &str) -> String {
    format!(r#"{{"name": "{name}", "staticFiles": [], "questions": []}}"#)
}

/// Test fixture for an isolated cache root.
pub struct CacheFixture {
    /// Temp directory holding the cache root and a scratch project dir.
    root: TempDir,
    /// Cache layout under the temp directory.
    paths: CachePaths,
}

impl CacheFixture {
    /// Create a fixture whose cache root does not exist yet.
    pub fn new() -> Self {
        let root = TempDir::new().expect("create temp dir");
        let paths = CachePaths::new(root.path().join("cache"));
        Self { root, paths }
    }

    /// Add a template directory with the given descriptor contents.
    pub fn with_template(self, dir: &str, descriptor: &str) -> Self {
        let path = self.paths.specs_dir().join(dir).join(DESCRIPTOR_FILE_NAME);
        write_file(&path, descriptor);
        self
    }

    /// Add an arbitrary file relative to the cache root.
    pub fn with_file(self, relative: &str, contents: &str) -> Self {
        write_file(&self.paths.root().join(relative), contents);
        self
    }

    /// Write the version marker.
    pub fn with_marker(self, tag: &str) -> Self {
        write_file(&self.paths.marker_file(), tag);
        self
    }

    /// Cache layout for this fixture.
    pub fn paths(&self) -> &CachePaths {
        &self.paths
    }

    /// Catalog over the fixture's specs directory.
    pub fn catalog(&self) -> Catalog {
        Catalog::new(&self.paths)
    }

    /// A scratch directory outside the cache, for generated projects.
    pub fn scratch_dir(&self) -> PathBuf {
        self.root.path().join("project")
    }

    /// Read the marker contents, if present.
    pub fn marker(&self) -> Option<String> {
        fs::read_to_string(self.paths.marker_file()).ok()
    }

    /// Read a file relative to the specs directory.
    pub fn read_spec(&self, relative: &str) -> Option<String> {
        fs::read_to_string(self.paths.specs_dir().join(relative)).ok()
    }
}

impl Default for CacheFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a file, creating parent directories.
fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write file");
}

/// Builder for in-memory tar archives.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    /// Files to append, in order.
    files: Vec<(String, Vec<u8>)>,
}

impl ArchiveBuilder {
    /// Create an empty archive builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a regular file.
    pub fn file(mut self, path: &str, contents: &str) -> Self {
        self.files.push((path.to_string(), contents.as_bytes().to_vec()));
        self
    }

    /// Append a template with the minimal descriptor.
    pub fn template(self, dir: &str, name: &str) -> Self {
        self.file(
            &format!("templates/{dir}/{DESCRIPTOR_FILE_NAME}"),
            &descriptor_json(name),
        )
    }

    /// Produce the archive bytes.
    pub fn build(self) -> Vec<u8> {
        let mut builder = Builder::new(Vec::new());
        for (path, contents) in self.files {
            let mut header = Header::new_gnu();
            header.set_entry_type(EntryType::Regular);
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            builder
                .append_data(&mut header, &path, contents.as_slice())
                .expect("append archive entry");
        }
        builder.into_inner().expect("finish archive")
    }
}

/// In-memory remote with call counters and failure switches.
#[derive(Debug)]
pub struct FakeStore {
    /// Current entity tag.
    etag: Mutex<String>,
    /// Current archive bytes.
    archive: Mutex<Vec<u8>>,
    /// Number of metadata fetches.
    metadata_calls: AtomicUsize,
    /// Number of downloads.
    download_calls: AtomicUsize,
    /// Fail metadata fetches when set.
    fail_metadata: AtomicBool,
    /// Fail downloads when set.
    fail_download: AtomicBool,
}

impl FakeStore {
    /// Create a store serving `archive` under `etag`.
    pub fn new(etag: &str, archive: Vec<u8>) -> Self {
        Self {
            etag: Mutex::new(etag.to_string()),
            archive: Mutex::new(archive),
            metadata_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
            fail_metadata: AtomicBool::new(false),
            fail_download: AtomicBool::new(false),
        }
    }

    /// Publish a new revision.
    pub fn publish(&self, etag: &str, archive: Vec<u8>) {
        *self.etag.lock().expect("etag lock") = etag.to_string();
        *self.archive.lock().expect("archive lock") = archive;
    }

    /// Toggle metadata failures.
    pub fn fail_metadata(&self, fail: bool) {
        self.fail_metadata.store(fail, Ordering::SeqCst);
    }

    /// Toggle download failures.
    pub fn fail_download(&self, fail: bool) {
        self.fail_download.store(fail, Ordering::SeqCst);
    }

    /// Number of metadata fetches so far.
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    /// Number of downloads so far.
    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    fn location(&self) -> String {
        "fake://specs.tar".to_string()
    }

    async fn etag(&self) -> Result<String> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_metadata.load(Ordering::SeqCst) {
            return Err(Error::RemoteMetadataFetchFailed {
                url: self.location(),
                message: "unavailable".to_string(),
            });
        }
        Ok(self.etag.lock().expect("etag lock").clone())
    }

    async fn download(&self) -> Result<Vec<u8>> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_download.load(Ordering::SeqCst) {
            return Err(Error::RemoteDownloadFailed {
                url: self.location(),
                message: "unavailable".to_string(),
            });
        }
        Ok(self.archive.lock().expect("archive lock").clone())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn creates_fixture_without_cache() {
        let fixture = CacheFixture::new();
        assert!(!fixture.paths().root().exists());
        assert!(fixture.marker().is_none());
    }

    #[test]
    fn adds_template_and_marker() {
        let fixture = CacheFixture::new()
            .with_template("react", &descriptor_json("React"))
            .with_marker("abc");

        assert_eq!(fixture.marker().as_deref(), Some("abc"));
        assert!(fixture.read_spec("react/starli.json").is_some());
    }

    #[test]
    fn builds_readable_archives() {
        let bytes = ArchiveBuilder::new().template("react", "React").build();
        let mut archive = tar::Archive::new(Cursor::new(bytes));
        let paths = archive
            .entries()
            .expect("entries")
            .map(|entry| entry.expect("entry").path().expect("path").display().to_string())
            .collect::<Vec<_>>();
        assert_eq!(paths, vec!["templates/react/starli.json".to_string()]);
    }
}
