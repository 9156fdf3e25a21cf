//! Tar extraction for the specs archive.

use std::{
    io::Read,
    path::{Component, Path},
};

use tar::Archive;

use crate::error::{Error, Result};

/// Extract a tar stream into `dest`, rejecting entries that would escape it.
pub fn unpack(reader: impl Read, dest: &Path) -> Result<()> {
    let failed = |message: String| Error::ArchiveExtractFailed {
        path: dest.to_path_buf(),
        message,
    };

    let mut archive = Archive::new(reader);
    archive.set_preserve_permissions(false);
    archive.set_overwrite(true);

    let entries = archive.entries().map_err(|error| failed(error.to_string()))?;
    for entry in entries {
        let mut entry = entry.map_err(|error| failed(error.to_string()))?;
        let path = entry
            .path()
            .map_err(|error| failed(error.to_string()))?
            .into_owned();
        if !is_contained(&path) {
            return Err(failed(format!(
                "entry escapes destination: {}",
                path.display()
            )));
        }
        entry
            .unpack_in(dest)
            .map_err(|error| failed(format!("{}: {error}", path.display())))?;
    }
    Ok(())
}

/// Whether a relative archive path stays below its extraction root.
pub(crate) fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
