//! Content fingerprints of files, directories and configuration values.

use std::time::UNIX_EPOCH;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs::Metadata;
use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::fs::{metadata_optional, open_optional_dir, read_bytes};
use crate::{WeaveError, WeaveResult, WeaveResultExt};

/// Fingerprint of one tracked input.
///
/// For a directory, `mtime` is the newest modification time and `size` the
/// total size of the files below it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFingerprint {
    /// Path as it was tracked.
    pub path: String,
    /// Hex SHA-256 digest.
    pub hash: String,
    /// Modification time in milliseconds since the Unix epoch.
    pub mtime: u64,
    /// Size in bytes.
    pub size: u64,
}

/// Fingerprint `path`, or return `None` when it does not exist.
///
/// A file hashes its content followed by its modification time and size.
/// A directory hashes the relative path and fingerprint of every file below
/// it, visited in sorted order.
///
/// # Errors
///
/// Returns [`WeaveError::Io`] when the input exists but cannot be read.
pub fn fingerprint(path: &Utf8Path) -> WeaveResult<Option<FileFingerprint>> {
    let Some(metadata) = metadata_optional(path)? else {
        return Ok(None);
    };
    if !metadata.is_dir() {
        let contents = read_bytes(path)?;
        return Ok(Some(file_fingerprint(path.as_str(), &contents, &metadata)));
    }
    let Some(dir) = open_optional_dir(path)? else {
        return Ok(None);
    };
    let mut hasher = Sha256::new();
    let mut totals = Totals::default();
    hash_directory_recursive(&dir, path, Utf8Path::new(""), &mut hasher, &mut totals)?;
    Ok(Some(FileFingerprint {
        path: path.as_str().to_owned(),
        hash: format!("{:x}", hasher.finalize()),
        mtime: totals.mtime,
        size: totals.size,
    }))
}

fn file_fingerprint(path: &str, contents: &[u8], metadata: &Metadata) -> FileFingerprint {
    let mtime = modified_ms(metadata);
    let size = metadata.len();
    let mut hasher = Sha256::new();
    hasher.update(contents);
    hasher.update(mtime.to_string().as_bytes());
    hasher.update(size.to_string().as_bytes());
    FileFingerprint {
        path: path.to_owned(),
        hash: format!("{:x}", hasher.finalize()),
        mtime,
        size,
    }
}

fn modified_ms(metadata: &Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|time| time.into_std().duration_since(UNIX_EPOCH).ok())
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

#[derive(Default)]
struct Totals {
    mtime: u64,
    size: u64,
}

fn hash_directory_recursive(
    dir: &Dir,
    root: &Utf8Path,
    base: &Utf8Path,
    hasher: &mut Sha256,
    totals: &mut Totals,
) -> WeaveResult<()> {
    let here = root.join(base);
    let io = |err| WeaveError::io(&here, err);
    let mut entries = Vec::new();
    for entry_result in dir.read_dir(".").map_err(io)? {
        let entry = entry_result.map_err(io)?;
        let file_name = Utf8PathBuf::from(entry.file_name().map_err(io)?);
        let file_type = entry.file_type().map_err(io)?;
        entries.push((file_name, file_type));
    }

    entries.sort_by(|(left, _), (right, _)| left.cmp(right));

    for (name, file_type) in entries {
        let rel = base.join(&name);
        if file_type.is_dir() {
            let subdir = dir.open_dir(&name).map_err(|err| WeaveError::io(&root.join(&rel), err))?;
            hash_directory_recursive(&subdir, root, &rel, hasher, totals)?;
        } else if file_type.is_file() {
            let full = root.join(&rel);
            let contents = dir.read(&name).map_err(|err| WeaveError::io(&full, err))?;
            let metadata = dir.metadata(&name).map_err(|err| WeaveError::io(&full, err))?;
            let file = file_fingerprint(rel.as_str(), &contents, &metadata);
            totals.mtime = totals.mtime.max(file.mtime);
            totals.size = totals.size.saturating_add(file.size);
            hasher.update(rel.as_str().as_bytes());
            hasher.update(file.hash.as_bytes());
        }
    }

    Ok(())
}

/// Hash a configuration value.
///
/// The value is serialised to JSON with object keys sorted, so two
/// configurations that differ only in field order hash the same.
///
/// # Errors
///
/// Returns [`WeaveError::Serialization`] when `config` cannot be represented
/// as JSON.
pub fn config_hash<T: Serialize + ?Sized>(config: &T) -> WeaveResult<String> {
    let normalised = canonical(serde_json::to_value(config).into_weave()?);
    let mut hasher = Sha256::new();
    hasher.update(normalised.to_string().as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

fn canonical(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key, canonical(inner)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonical).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    //! Tests for input fingerprinting.

    use camino::Utf8PathBuf;
    use rstest::rstest;
    use serde_json::json;

    use super::{config_hash, fingerprint};
    use crate::fs::write_text;

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let tempdir = tempfile::tempdir().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(tempdir.path().to_path_buf())
            .expect("tempdir path is UTF-8");
        (tempdir, root)
    }

    #[rstest]
    fn fingerprint_changes_on_file_update() {
        let (_guard, root) = temp_root();
        let path = root.join("weaver.toml");
        write_text(&path, "name = \"demo\"\n").expect("write");
        let first = fingerprint(&path).expect("fingerprint").expect("file exists");
        assert_eq!(first.size, 14);
        write_text(&path, "name = \"demo2\"\n").expect("rewrite");
        let second = fingerprint(&path).expect("fingerprint").expect("file exists");
        assert_ne!(first.hash, second.hash, "fingerprint should change when files change");
    }

    #[rstest]
    fn directory_fingerprint_covers_nested_files() {
        let (_guard, root) = temp_root();
        write_text(&root.join("templates/a.yml"), "a: 1\n").expect("write");
        write_text(&root.join("templates/nested/b.yml"), "b: 2\n").expect("write");
        let dir = root.join("templates");
        let first = fingerprint(&dir).expect("fingerprint").expect("dir exists");
        assert_eq!(first.size, 10);
        assert_eq!(fingerprint(&dir).expect("fingerprint"), Some(first.clone()));
        write_text(&root.join("templates/nested/c.yml"), "c: 3\n").expect("write");
        let second = fingerprint(&dir).expect("fingerprint").expect("dir exists");
        assert_ne!(first.hash, second.hash);
    }

    #[rstest]
    fn missing_inputs_have_no_fingerprint() {
        let (_guard, root) = temp_root();
        assert!(fingerprint(&root.join("absent")).expect("fingerprint").is_none());
    }

    #[rstest]
    fn config_hash_ignores_key_order() {
        let first = config_hash(&json!({"a": 1, "b": {"x": true, "y": [1, 2]}})).expect("hash");
        let second = config_hash(&json!({"b": {"y": [1, 2], "x": true}, "a": 1})).expect("hash");
        assert_eq!(first, second);
        let third = config_hash(&json!({"a": 2, "b": {"x": true, "y": [1, 2]}})).expect("hash");
        assert_ne!(first, third);
    }
}
