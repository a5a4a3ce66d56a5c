//! Everything a generation run shares: the project, its configuration and
//! the package model cache.

use sr_core::config::SrConfig;
use sr_core::project::Project;
use sr_core::Result;
use sr_parser::PackageModelCache;
use std::path::Path;

#[derive(Debug)]
pub struct GenContext {
    pub project: Project,
    pub config: SrConfig,
    pub cache: PackageModelCache,
}

impl GenContext {
    pub fn new(project: Project, config: SrConfig) -> Self {
        Self {
            project,
            config,
            cache: PackageModelCache::new(),
        }
    }

    /// Open the project at `root` and load its configuration.
    pub fn load(root: &Path) -> Result<Self> {
        let project = Project::load(root)?;
        let config = SrConfig::load(project.root())?;
        Ok(Self::new(project, config))
    }

    /// Name this service goes by as an RPC target.
    pub fn service_name(&self) -> &str {
        self.config
            .project
            .service_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.project.default_service_name())
    }
}
