//! Project configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::layout::ArtifactLayout;
use crate::Result;

/// Default artifact namespace below the project root
pub const DEFAULT_NAMESPACE: &str = ".specshot";

/// Default per-channel difference threshold (fraction of full scale)
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Environment variable overriding the acceptance identity
pub const ENV_IDENTITY: &str = "SPECSHOT_USER";

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecshotConfig {
    /// Project root the artifact namespace lives under
    pub project_root: PathBuf,

    /// Directory name of the artifact namespace
    pub namespace: String,

    /// Identity recorded in acceptance records
    pub identity: Option<String>,

    /// Image comparison settings
    pub compare: CompareSettings,
}

impl Default for SpecshotConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            namespace: DEFAULT_NAMESPACE.to_string(),
            identity: None,
            compare: CompareSettings::default(),
        }
    }
}

/// Image comparison settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareSettings {
    /// Per-channel difference tolerated before a pixel counts as mismatched
    pub threshold: f64,

    /// Write a diff image when a comparison finds mismatches
    pub generate_diff: bool,
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            generate_diff: true,
        }
    }
}

impl SpecshotConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the artifact root
    pub fn artifact_root(&self) -> PathBuf {
        self.project_root.join(&self.namespace)
    }

    pub fn layout(&self) -> ArtifactLayout {
        ArtifactLayout::new(self.artifact_root())
    }

    /// Identity to stamp on acceptance records
    pub fn accepted_by(&self) -> String {
        self.identity.clone().unwrap_or_else(default_identity)
    }
}

/// `$SPECSHOT_USER`, else `user@host`, else `"unknown"`
pub fn default_identity() -> String {
    if let Ok(id) = std::env::var(ENV_IDENTITY) {
        if !id.trim().is_empty() {
            return id;
        }
    }

    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|u| !u.trim().is_empty());
    let host = hostname::get()
        .ok()
        .map(|h| h.to_string_lossy().to_string())
        .filter(|h| !h.is_empty());

    match (user, host) {
        (Some(user), Some(host)) => format!("{}@{}", user, host),
        (Some(user), None) => user,
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = SpecshotConfig::default();
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.compare.threshold, DEFAULT_THRESHOLD);
        assert!(config.compare.generate_diff);
        assert_eq!(config.artifact_root(), PathBuf::from("./.specshot"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = SpecshotConfig::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_save_load_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("specshot.toml");
        std::fs::write(&path, "identity = \"qa-bot\"\n[compare]\nthreshold = 0.25\n").unwrap();

        let config = SpecshotConfig::load(&path).unwrap();
        assert_eq!(config.identity.as_deref(), Some("qa-bot"));
        assert_eq!(config.compare.threshold, 0.25);
        assert!(config.compare.generate_diff);
        assert_eq!(config.accepted_by(), "qa-bot");

        let nested = tmp.path().join("conf").join("specshot.toml");
        config.save(&nested).unwrap();
        let reloaded = SpecshotConfig::load(&nested).unwrap();
        assert_eq!(reloaded.compare.threshold, 0.25);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("specshot.toml");
        std::fs::write(&path, "compare = 3").unwrap();
        assert!(matches!(
            SpecshotConfig::load(&path),
            Err(crate::Error::Config(_))
        ));
    }
}
