//! Capability-based file access for documents and the fingerprint cache.

use std::io::ErrorKind;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Metadata;
use cap_std::fs_utf8::Dir;

use crate::{WeaveError, WeaveResult};

/// Splits `path` into its parent directory and file name.
fn split(path: &Utf8Path) -> Option<(Utf8PathBuf, &str)> {
    let name = path.file_name()?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    };
    Some((parent, name))
}

/// Opens a directory if it exists, returning `None` when the path is missing.
pub(crate) fn open_optional_dir(path: &Utf8Path) -> WeaveResult<Option<Dir>> {
    match Dir::open_ambient_dir(path, ambient_authority()) {
        Ok(dir) => Ok(Some(dir)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(WeaveError::io(path, err)),
    }
}

fn ensure_dir(path: &Utf8Path) -> WeaveResult<Dir> {
    if let Some(dir) = open_optional_dir(path)? {
        return Ok(dir);
    }
    Dir::create_ambient_dir_all(path, ambient_authority()).map_err(|err| WeaveError::io(path, err))?;
    Dir::open_ambient_dir(path, ambient_authority()).map_err(|err| WeaveError::io(path, err))
}

/// Metadata of `path`, or `None` when it does not exist.
pub(crate) fn metadata_optional(path: &Utf8Path) -> WeaveResult<Option<Metadata>> {
    let Some((parent, name)) = split(path) else {
        return open_optional_dir(path)?
            .map(|dir| dir.dir_metadata().map_err(|err| WeaveError::io(path, err)))
            .transpose();
    };
    let Some(dir) = open_optional_dir(&parent)? else {
        return Ok(None);
    };
    match dir.metadata(name) {
        Ok(metadata) => Ok(Some(metadata)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(WeaveError::io(path, err)),
    }
}

/// Reads `path` as UTF-8 text, or `None` when it does not exist.
pub(crate) fn read_optional(path: &Utf8Path) -> WeaveResult<Option<String>> {
    let Some((parent, name)) = split(path) else {
        return Ok(None);
    };
    let Some(dir) = open_optional_dir(&parent)? else {
        return Ok(None);
    };
    match dir.read_to_string(name) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(WeaveError::io(path, err)),
    }
}

/// Reads the raw bytes of `path`.
pub(crate) fn read_bytes(path: &Utf8Path) -> WeaveResult<Vec<u8>> {
    let (parent, name) = split(path).ok_or_else(|| {
        WeaveError::io(path, std::io::Error::new(ErrorKind::InvalidInput, "path has no file name"))
    })?;
    let dir = Dir::open_ambient_dir(&parent, ambient_authority()).map_err(|err| WeaveError::io(path, err))?;
    dir.read(name).map_err(|err| WeaveError::io(path, err))
}

/// Writes `contents` to `path`, creating parent directories as needed.
pub(crate) fn write_text(path: &Utf8Path, contents: &str) -> WeaveResult<()> {
    let (parent, name) = split(path).ok_or_else(|| {
        WeaveError::io(path, std::io::Error::new(ErrorKind::InvalidInput, "path has no file name"))
    })?;
    let dir = ensure_dir(&parent)?;
    dir.write(name, contents).map_err(|err| WeaveError::io(path, err))
}
