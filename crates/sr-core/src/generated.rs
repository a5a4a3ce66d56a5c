//! Generated-file bookkeeping.
//!
//! Emitters never touch disk. They fill a [`Staging`] set, and only after
//! every generator of a run has succeeded is the set committed: new content
//! is written atomically, then stale generated files in directories the run
//! owns are removed. A failed run leaves the project exactly as it was.

use crate::error::{GenError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// First line of every file the generator writes.
pub const GENERATED_HEADER: &str = "// Code generated by sr. DO NOT EDIT.";

/// Whether Go source carries the generated header before its package clause.
pub fn is_generated(content: &str) -> bool {
    content
        .lines()
        .map(str::trim_end)
        .take_while(|line| !line.starts_with("package "))
        .any(|line| line == GENERATED_HEADER)
}

/// Whether the file at `path` exists and carries the generated header.
pub fn is_generated_file(path: &Path) -> Result<bool> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(is_generated(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Ok(false),
        Err(e) => Err(GenError::io(path, e)),
    }
}

/// What a commit did to the file system.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

/// Output of one generation run, held in memory until [`Staging::commit`].
#[derive(Debug, Default)]
pub struct Staging {
    files: BTreeMap<PathBuf, String>,
    owned_dirs: BTreeSet<PathBuf>,
    owned_files: BTreeSet<PathBuf>,
}

impl Staging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `content` for `path`, replacing anything staged there before.
    pub fn add(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        let path = path.into();
        tracing::debug!(path = %path.display(), "staged");
        self.files.insert(path, content.into());
    }

    /// Claim every generated `.go` file directly inside `dir`. Those not
    /// staged by this run are removed on commit.
    pub fn own_dir(&mut self, dir: impl Into<PathBuf>) {
        self.owned_dirs.insert(dir.into());
    }

    /// Claim a single output path. It is removed on commit if this run did
    /// not stage it and it carries the generated header.
    pub fn own_file(&mut self, path: impl Into<PathBuf>) {
        self.owned_files.insert(path.into());
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn files(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files.iter().map(|(p, c)| (p.as_path(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Merge another run's output into this one.
    pub fn extend(&mut self, other: Staging) {
        self.files.extend(other.files);
        self.owned_dirs.extend(other.owned_dirs);
        self.owned_files.extend(other.owned_files);
    }

    /// Write staged files and remove stale generated ones.
    ///
    /// Every target is checked before the first write, so a hand-written
    /// file in the way aborts the commit without side effects.
    pub fn commit(self) -> Result<CommitReport> {
        for path in self.files.keys() {
            if path.exists() && !is_generated_file(path)? {
                return Err(GenError::WouldOverwrite(path.clone()));
            }
        }

        let mut report = CommitReport::default();
        for (path, content) in &self.files {
            if std::fs::read_to_string(path).is_ok_and(|old| old == *content) {
                report.unchanged.push(path.clone());
                continue;
            }
            write_atomic(path, content)?;
            tracing::info!(path = %path.display(), "generated");
            report.written.push(path.clone());
        }

        for stale in self.stale_files()? {
            std::fs::remove_file(&stale).map_err(|e| GenError::io(&stale, e))?;
            tracing::info!(path = %stale.display(), "removed stale generated file");
            report.removed.push(stale);
        }
        Ok(report)
    }

    fn stale_files(&self) -> Result<Vec<PathBuf>> {
        let mut candidates = BTreeSet::new();
        for dir in &self.owned_dirs {
            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(GenError::io(dir, e)),
            };
            for entry in entries {
                let path = entry.map_err(|e| GenError::io(dir, e))?.path();
                if path.is_file() && path.extension().is_some_and(|ext| ext == "go") {
                    candidates.insert(path);
                }
            }
        }
        candidates.extend(self.owned_files.iter().cloned());

        let mut stale = Vec::new();
        for path in candidates {
            if !self.files.contains_key(&path) && is_generated_file(&path)? {
                stale.push(path);
            }
        }
        Ok(stale)
    }
}

/// Write through a sibling temp file and rename it over the target.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| GenError::io(parent, e))?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.sr-tmp"));
    std::fs::write(&tmp, content).map_err(|e| GenError::io(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(GenError::io(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated(body: &str) -> String {
        format!("{GENERATED_HEADER}\n\npackage x\n{body}")
    }

    #[test]
    fn test_is_generated() {
        assert!(is_generated(&generated("")));
        assert!(!is_generated("package x\n// Code generated by sr. DO NOT EDIT.\n"));
        assert!(!is_generated("// hand written\npackage x\n"));
    }

    #[test]
    fn test_commit_writes_and_removes_stale() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("slot");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("old.go"), generated("var A = 1\n")).unwrap();
        std::fs::write(dir.join("manual.go"), "package x\n").unwrap();

        let mut staging = Staging::new();
        staging.own_dir(&dir);
        staging.add(dir.join("user.go"), generated("var B = 2\n"));
        let report = staging.commit().unwrap();

        assert_eq!(report.written, vec![dir.join("user.go")]);
        assert_eq!(report.removed, vec![dir.join("old.go")]);
        assert!(dir.join("manual.go").exists());
        assert!(!dir.join("old.go").exists());
        assert!(!dir.join(".user.go.sr-tmp").exists());
    }

    #[test]
    fn test_commit_refuses_hand_written_target() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("generate.go");
        std::fs::write(&target, "package x\n").unwrap();
        let other = tmp.path().join("other.go");

        let mut staging = Staging::new();
        staging.add(&other, generated(""));
        staging.add(&target, generated(""));
        assert!(matches!(
            staging.commit(),
            Err(GenError::WouldOverwrite(path)) if path == target
        ));
        // Nothing was written before the check failed.
        assert!(!other.exists());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "package x\n");
    }

    #[test]
    fn test_commit_skips_identical_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.go");
        std::fs::write(&path, generated("")).unwrap();

        let mut staging = Staging::new();
        staging.add(&path, generated(""));
        let report = staging.commit().unwrap();
        assert_eq!(report.unchanged, vec![path]);
        assert!(report.written.is_empty());
    }

    #[test]
    fn test_owned_file_removed_only_when_generated() {
        let tmp = tempfile::tempdir().unwrap();
        let stale = tmp.path().join("generate.go");
        std::fs::write(&stale, generated("")).unwrap();

        let mut staging = Staging::new();
        staging.own_file(&stale);
        let report = staging.commit().unwrap();
        assert_eq!(report.removed, vec![stale.clone()]);

        std::fs::write(&stale, "package x\n").unwrap();
        let mut staging = Staging::new();
        staging.own_file(&stale);
        assert!(staging.commit().unwrap().removed.is_empty());
        assert!(stale.exists());
    }
}
