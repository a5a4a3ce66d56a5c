//! Configuration for generation and remote helper lookups.
//!
//! Load order: `.srpc/config.toml` → environment variables → defaults.

use crate::error::{GenError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level generator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SrConfig {
    pub project: ProjectConfig,
    pub runtime: RuntimeConfig,
    pub remote: RemoteConfig,
    pub format: FormatConfig,
}

/// Project conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Last path segment expected for packages whose types get relocated.
    /// Types found elsewhere still relocate, with a naming warning.
    pub model_package: String,
    /// Target name stamped into signal requests. Defaults to the last
    /// segment of the module path.
    pub service_name: Option<String>,
}

/// Import paths of the runtime libraries the generated code calls into.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub srpc_import: String,
    pub meta_import: String,
    pub garray_import: String,
}

/// Where `get`, `ols` and `fls` fetch helper metadata from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the helper bridge, e.g. `http://localhost:8000`.
    pub address: String,
    pub timeout_secs: u64,
}

/// Post-processing of generated files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Run `gofmt -w` over every written file.
    pub gofmt: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            model_package: "model".to_string(),
            service_name: None,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            srpc_import: "github.com/aundis/srpc".to_string(),
            meta_import: "github.com/aundis/meta".to_string(),
            garray_import: "github.com/gogf/gf/v2/container/garray".to_string(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            address: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

fn invalid(path: &Path, message: impl Into<String>) -> GenError {
    GenError::io(
        path,
        std::io::Error::new(std::io::ErrorKind::InvalidData, message.into()),
    )
}

impl SrConfig {
    /// Path of the config file for a project root.
    pub fn path(project_root: &Path) -> std::path::PathBuf {
        project_root.join(".srpc").join("config.toml")
    }

    /// Load config from `.srpc/config.toml` in the project root, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = Self::path(project_root);

        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| GenError::io(&config_path, e))?;
            toml::from_str(&content).map_err(|e| invalid(&config_path, e.to_string()))?
        } else {
            Self::default()
        };

        env_override("SR_REMOTE_ADDRESS", &mut config.remote.address);
        env_override("SR_REMOTE_TIMEOUT_SECS", &mut config.remote.timeout_secs);
        env_override("SR_MODEL_PACKAGE", &mut config.project.model_package);
        env_override("SR_GOFMT", &mut config.format.gofmt);

        // Trailing slashes would double up when request paths are appended.
        while config.remote.address.ends_with('/') {
            config.remote.address.pop();
        }

        if config.remote.timeout_secs == 0 {
            return Err(invalid(&config_path, "remote.timeout_secs must be positive"));
        }
        if config.project.model_package.trim().is_empty() {
            return Err(invalid(&config_path, "project.model_package must not be empty"));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SrConfig::default();
        assert_eq!(config.project.model_package, "model");
        assert!(config.project.service_name.is_none());
        assert_eq!(config.runtime.srpc_import, "github.com/aundis/srpc");
        assert_eq!(config.remote.address, "http://localhost:8000");
        assert_eq!(config.remote.timeout_secs, 30);
        assert!(!config.format.gofmt);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[project]
model_package = "entity"
service_name = "billing"

[remote]
address = "http://10.0.0.2:9000"
"#;
        let config: SrConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.project.model_package, "entity");
        assert_eq!(config.project.service_name.as_deref(), Some("billing"));
        assert_eq!(config.remote.address, "http://10.0.0.2:9000");
        // Defaults for unspecified fields
        assert_eq!(config.remote.timeout_secs, 30);
        assert_eq!(config.runtime.meta_import, "github.com/aundis/meta");
    }

    #[test]
    fn test_config_load_nonexistent() {
        let config = SrConfig::load(Path::new("/nonexistent/path")).unwrap();
        assert_eq!(config.project.model_package, "model");
    }

    #[test]
    fn test_load_trims_trailing_slash_and_rejects_zero_timeout() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".srpc");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.toml"),
            "[remote]\naddress = \"http://svc:8000/\"\n",
        )
        .unwrap();
        let config = SrConfig::load(tmp.path()).unwrap();
        assert_eq!(config.remote.address, "http://svc:8000");

        std::fs::write(dir.join("config.toml"), "[remote]\ntimeout_secs = 0\n").unwrap();
        assert!(SrConfig::load(tmp.path()).is_err());
    }
}
