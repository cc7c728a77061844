use std::path::{Path, PathBuf};

use rill_typeck::InferConfig;
use serde::Deserialize;

/// File name looked up next to the checked source when no `--config` is given.
pub const CONFIG_FILE: &str = "rill.toml";

/// A parsed rill.toml.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub typeck: InferConfig,
}

impl ProjectConfig {
    /// Read and parse a rill.toml from a file path.
    pub fn from_file(path: &Path) -> Result<ProjectConfig, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        Self::from_str(&content)
            .map_err(|e| format!("{} ({})", e, path.display()))
    }

    /// Parse a rill.toml from a string.
    pub fn from_str(content: &str) -> Result<ProjectConfig, String> {
        toml::from_str(content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Load `explicit` if given, else the rill.toml beside `source` if there
    /// is one, else the defaults.
    pub fn load(explicit: Option<&Path>, source: &Path) -> Result<ProjectConfig, String> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match discover(source) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using project config");
                Self::from_file(&path)
            }
            None => Ok(ProjectConfig::default()),
        }
    }
}

fn discover(source: &Path) -> Option<PathBuf> {
    let dir = source.parent()?;
    let candidate = dir.join(CONFIG_FILE);
    candidate.is_file().then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_typeck_table() {
        let config = ProjectConfig::from_str("[typeck]\nmax_depth = 12\n").unwrap();
        assert_eq!(config.typeck.max_depth, 12);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = ProjectConfig::from_str("").unwrap();
        assert_eq!(config.typeck, InferConfig::default());
        let config = ProjectConfig::from_str("[typeck]\n").unwrap();
        assert_eq!(config.typeck, InferConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ProjectConfig::from_str("[typeck]\nmax_dpeth = 3\n").unwrap_err();
        assert!(err.starts_with("failed to parse config"), "{err}");
        assert!(ProjectConfig::from_str("[codegen]\n").is_err());
    }

    #[test]
    fn wrong_type_is_an_error() {
        assert!(ProjectConfig::from_str("[typeck]\nmax_depth = \"deep\"\n").is_err());
    }
}
