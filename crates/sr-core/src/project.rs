//! The Go project being generated for: its root directory and module path.

use crate::error::{GenError, Result};
use crate::naming::slash_path;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "go.mod";

/// Immutable project context threaded through parsing, resolution and emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root: PathBuf,
    module: String,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, module: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            module: module.into(),
        }
    }

    /// Open the project rooted at `root`, reading the module path from `go.mod`.
    pub fn load(root: &Path) -> Result<Self> {
        let root = std::fs::canonicalize(root).map_err(|e| GenError::io(root, e))?;
        let manifest = root.join(MANIFEST_FILE);
        if !manifest.is_file() {
            return Err(GenError::ManifestNotFound(root));
        }
        let content =
            std::fs::read_to_string(&manifest).map_err(|e| GenError::io(&manifest, e))?;
        let module =
            module_name_from_manifest(&content).ok_or(GenError::ManifestInvalid(manifest))?;
        tracing::debug!(module = %module, root = %root.display(), "loaded project");
        Ok(Self { root, module })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Whether an import path names a package of this module.
    pub fn is_project_package(&self, path: &str) -> bool {
        path == self.module
            || path
                .strip_prefix(&self.module)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Import path of the package in directory `dir`.
    pub fn package_path(&self, dir: &Path) -> Result<String> {
        let rel = dir
            .strip_prefix(&self.root)
            .map_err(|_| GenError::OutsideProject(dir.to_path_buf()))?;
        let rel = slash_path(rel);
        if rel.is_empty() {
            Ok(self.module.clone())
        } else {
            Ok(format!("{}/{rel}", self.module))
        }
    }

    /// Import path of the package a Go file belongs to.
    pub fn package_path_of_file(&self, file: &Path) -> Result<String> {
        let dir = file
            .parent()
            .ok_or_else(|| GenError::OutsideProject(file.to_path_buf()))?;
        self.package_path(dir)
    }

    /// Directory of a project package. `None` for packages of other modules.
    pub fn package_dir(&self, package: &str) -> Option<PathBuf> {
        if !self.is_project_package(package) {
            return None;
        }
        let rest = package[self.module.len()..].trim_start_matches('/');
        let mut dir = self.root.clone();
        for segment in rest.split('/').filter(|s| !s.is_empty()) {
            dir.push(segment);
        }
        Some(dir)
    }

    /// Path relative to the root for diagnostics; absolute paths outside the
    /// project are returned unchanged.
    pub fn display_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
    }

    /// `internal/logic`: one package per slot/listen implementation.
    pub fn logic_dir(&self) -> PathBuf {
        self.root.join("internal").join("logic")
    }

    /// `internal/srpc`: generated runtime glue.
    pub fn srpc_dir(&self) -> PathBuf {
        self.root.join("internal").join("srpc")
    }

    pub fn slot_dir(&self) -> PathBuf {
        self.srpc_dir().join("slot")
    }

    pub fn signal_dir(&self) -> PathBuf {
        self.srpc_dir().join("signal")
    }

    /// `internal/srpc/service`: one directory per remote target.
    pub fn services_dir(&self) -> PathBuf {
        self.srpc_dir().join("service")
    }

    pub fn service_dir(&self, target: &str) -> PathBuf {
        self.services_dir().join(target)
    }

    /// Import path of the package holding a remote target's declarations.
    pub fn service_package(&self, target: &str) -> String {
        format!("{}/internal/srpc/service/{target}", self.module)
    }

    /// Import path of the project's `service` registry package.
    pub fn service_import(&self) -> String {
        format!("{}/internal/service", self.module)
    }

    /// Import path of the listener manager package.
    pub fn manager_import(&self) -> String {
        format!("{}/internal/srpc/manager", self.module)
    }

    /// Default target name for signals: the module's last path segment.
    pub fn default_service_name(&self) -> &str {
        crate::naming::last_segment(&self.module)
    }
}

/// Module path declared by a `go.mod` file.
pub fn module_name_from_manifest(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let name = rest
            .split("//")
            .next()
            .unwrap_or_default()
            .trim()
            .trim_matches('"');
        (!name.is_empty()).then(|| name.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_name_from_manifest() {
        assert_eq!(
            module_name_from_manifest("module demo\n\ngo 1.20\n").as_deref(),
            Some("demo")
        );
        assert_eq!(
            module_name_from_manifest("// comment\r\nmodule \"github.com/x/y\" // note\r\n")
                .as_deref(),
            Some("github.com/x/y")
        );
        assert_eq!(module_name_from_manifest("go 1.20\n"), None);
        assert_eq!(module_name_from_manifest("modules x\n"), None);
    }

    #[test]
    fn test_is_project_package() {
        let project = Project::new("/p", "demo");
        assert!(project.is_project_package("demo"));
        assert!(project.is_project_package("demo/internal/model"));
        assert!(!project.is_project_package("demox/internal"));
        assert!(!project.is_project_package("github.com/demo/x"));
    }

    #[test]
    fn test_package_path_round_trip() {
        let project = Project::new("/p", "demo");
        let dir = Path::new("/p/internal/model");
        assert_eq!(project.package_path(dir).unwrap(), "demo/internal/model");
        assert_eq!(
            project.package_dir("demo/internal/model").unwrap(),
            PathBuf::from("/p/internal/model")
        );
        assert_eq!(project.package_path(Path::new("/p")).unwrap(), "demo");
        assert!(project.package_path(Path::new("/elsewhere")).is_err());
        assert!(project.package_dir("time").is_none());
    }

    #[test]
    fn test_load_requires_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            Project::load(tmp.path()),
            Err(GenError::ManifestNotFound(_))
        ));
        std::fs::write(tmp.path().join("go.mod"), "module abc\n").unwrap();
        let project = Project::load(tmp.path()).unwrap();
        assert_eq!(project.module(), "abc");
        assert_eq!(project.default_service_name(), "abc");
    }
}
