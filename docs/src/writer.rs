//! Writes generated documents and the run manifest.
//!
//! Documents are written atomically: the full text goes to a temporary file
//! in the output directory, which is then renamed over the target. A reader
//! never sees a partial document, and an interrupted run leaves every
//! already-written file intact.
//!
//! Persistence is keyed to the `_<hash>.<ext>` identity suffix, not to the
//! label stem. A document whose label changed since the last run replaces the
//! file already on disk for its identifier under that file's name. Files with
//! other suffixes are never touched.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::DocsError;
use crate::naming::generated_suffix;
use crate::report::GenerationReport;

/// Name of the manifest written by [`write_manifest`].
pub const MANIFEST_NAME: &str = "index.json";

/// Generated documents already present in an output directory, grouped by
/// identity suffix.
#[derive(Debug, Clone, Default)]
pub struct ExistingDocuments {
    by_suffix: HashMap<String, Vec<String>>,
}

impl ExistingDocuments {
    /// Lists the generated documents in `out_dir`. A missing directory has
    /// none.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::Persistence`] if the directory cannot be listed.
    pub fn scan(out_dir: &Path) -> Result<Self, DocsError> {
        let mut existing = Self::default();
        if !out_dir.exists() {
            return Ok(existing);
        }
        for path in generated_files(out_dir)? {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(suffix) = generated_suffix(name) {
                existing
                    .by_suffix
                    .entry(suffix.to_string())
                    .or_default()
                    .push(name.to_string());
            }
        }
        for names in existing.by_suffix.values_mut() {
            names.sort();
        }
        Ok(existing)
    }

    /// Existing files sharing `file_name`'s identity suffix, sorted.
    #[must_use]
    pub fn same_identity(&self, file_name: &str) -> &[String] {
        generated_suffix(file_name)
            .and_then(|suffix| self.by_suffix.get(suffix))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of generated documents found.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_suffix.values().map(Vec::len).sum()
    }

    /// Returns true if no generated document was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_suffix.is_empty()
    }
}

/// Writes an entity document, keeping the name of the file already on disk
/// for the same identifier when there is one.
///
/// Any further files with the same identity suffix are removed after the
/// write succeeds, so one identifier has one document per format.
///
/// # Errors
///
/// Returns [`DocsError::Persistence`] if the write fails or a stale duplicate
/// cannot be removed.
pub fn persist_document(
    out_dir: &Path,
    existing: &ExistingDocuments,
    file_name: &str,
    content: &str,
) -> Result<PathBuf, DocsError> {
    let previous = existing.same_identity(file_name);
    let target = previous.first().map_or(file_name, String::as_str);
    let path = write_document(out_dir, target, content)?;

    for stale in previous.iter().filter(|name| name.as_str() != target) {
        let stale_path = out_dir.join(stale);
        fs::remove_file(&stale_path).map_err(|source| DocsError::Persistence {
            path: stale_path.clone(),
            source,
        })?;
    }
    Ok(path)
}

/// Writes `content` to `out_dir/file_name`, replacing any previous file of
/// that name.
///
/// The output directory must already exist; creating it is the caller's job.
///
/// # Errors
///
/// Returns [`DocsError::Persistence`] if the temporary file cannot be created
/// or written, or the final rename fails.
pub fn write_document(
    out_dir: &Path,
    file_name: &str,
    content: &str,
) -> Result<PathBuf, DocsError> {
    let target = out_dir.join(file_name);
    let fail = |source: std::io::Error| DocsError::Persistence {
        path: target.clone(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(out_dir).map_err(fail)?;
    tmp.write_all(content.as_bytes()).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(fail)?;
    }
    tmp.persist(&target).map_err(|e| fail(e.error))?;
    Ok(target)
}

/// Writes `index.json`: identifier, label and filename of every document
/// written in this run.
///
/// # Errors
///
/// Returns [`DocsError::Persistence`] if the manifest cannot be serialized or
/// written.
pub fn write_manifest(out_dir: &Path, report: &GenerationReport) -> Result<PathBuf, DocsError> {
    let target = out_dir.join(MANIFEST_NAME);
    let json = serde_json::to_string_pretty(&report.manifest()).map_err(|e| {
        DocsError::Persistence {
            path: target.clone(),
            source: std::io::Error::other(e),
        }
    })?;
    write_document(out_dir, MANIFEST_NAME, &json)
}

/// Removes documents left by earlier runs (generated `<label>_<hash>.md` and
/// `.html` files, and the manifest) from `out_dir`. Other files and
/// subdirectories are left alone. Returns the number of files removed.
///
/// # Errors
///
/// Returns [`DocsError::Persistence`] if the directory cannot be listed or a
/// file cannot be removed.
pub fn clear_output_dir(out_dir: &Path) -> Result<usize, DocsError> {
    if !out_dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for path in generated_files(out_dir)? {
        fs::remove_file(&path).map_err(|source| DocsError::Persistence {
            path: path.clone(),
            source,
        })?;
        removed += 1;
    }
    Ok(removed)
}

/// Regular files in `out_dir` that this crate writes: generated documents and
/// the manifest.
fn generated_files(out_dir: &Path) -> Result<Vec<PathBuf>, DocsError> {
    let fail = |path: &Path, source: std::io::Error| DocsError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(out_dir).map_err(|e| fail(out_dir, e))? {
        let entry = entry.map_err(|e| fail(out_dir, e))?;
        let path = entry.path();
        if !entry.file_type().map_err(|e| fail(&path, e))?.is_file() {
            continue;
        }
        let generated = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n == MANIFEST_NAME || generated_suffix(n).is_some());
        if generated {
            files.push(path);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_overwrites_same_name_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_document(dir.path(), "A_00000001.md", "first").expect("write");
        write_document(dir.path(), "B_00000002.md", "other").expect("write");
        let path = write_document(dir.path(), "A_00000001.md", "second").expect("rewrite");

        assert_eq!(fs::read_to_string(path).expect("read"), "second");
        assert_eq!(
            fs::read_to_string(dir.path().join("B_00000002.md")).expect("read"),
            "other"
        );
        let count = fs::read_dir(dir.path()).expect("list").count();
        assert_eq!(count, 2, "no temporary files left behind");
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing");
        assert!(matches!(
            write_document(&missing, "A_00000001.md", "x"),
            Err(DocsError::Persistence { .. })
        ));
    }

    #[test]
    fn clear_removes_generated_files_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("A_0000000a.md"), "x").expect("write");
        fs::write(dir.path().join("B_0000000b.html"), "x").expect("write");
        fs::write(dir.path().join(MANIFEST_NAME), "[]").expect("write");
        fs::write(dir.path().join("README.md"), "keep").expect("write");
        fs::write(dir.path().join("notes_1.html"), "keep").expect("write");
        fs::create_dir(dir.path().join("C_0000000c.md")).expect("mkdir");

        assert_eq!(clear_output_dir(dir.path()).expect("clear"), 3);
        assert!(dir.path().join("README.md").exists());
        assert!(dir.path().join("notes_1.html").exists());
        assert!(dir.path().join("C_0000000c.md").is_dir());
    }

    #[test]
    fn persist_reuses_name_on_disk_for_same_identity() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("Old_name_4e5312e1.md"), "old").expect("write");
        fs::write(dir.path().join("Other_0badf00d.md"), "other").expect("write");

        let existing = ExistingDocuments::scan(dir.path()).expect("scan");
        assert_eq!(existing.len(), 2);
        let path = persist_document(dir.path(), &existing, "New_name_4e5312e1.md", "new")
            .expect("persist");

        assert_eq!(path, dir.path().join("Old_name_4e5312e1.md"));
        assert_eq!(fs::read_to_string(&path).expect("read"), "new");
        assert!(!dir.path().join("New_name_4e5312e1.md").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("Other_0badf00d.md")).expect("read"),
            "other"
        );
    }

    #[test]
    fn persist_collapses_duplicate_identity_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("A_4e5312e1.md"), "one").expect("write");
        fs::write(dir.path().join("B_4e5312e1.md"), "two").expect("write");

        let existing = ExistingDocuments::scan(dir.path()).expect("scan");
        persist_document(dir.path(), &existing, "C_4e5312e1.md", "three").expect("persist");

        let names: Vec<String> = fs::read_dir(dir.path())
            .expect("list")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A_4e5312e1.md".to_string()]);
    }

    #[test]
    fn scan_of_missing_directory_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let existing = ExistingDocuments::scan(&dir.path().join("missing")).expect("scan");
        assert!(existing.is_empty());
    }
}
