use crate::globals::KnownGlobals;
use crate::query::TopLevelOptions;
use crate::syntax::ParseOptions;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LexscopeConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub walk: WalkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AnalysisConfig {
    /// Analyse files that contain syntax errors instead of rejecting them
    #[serde(default)]
    pub allow_syntax_errors: bool,
    /// Honor `/*global a, b*/` comments
    #[serde(default)]
    pub jslint_global_comment: bool,
    /// Extra names treated as host globals
    #[serde(default)]
    pub known_globals: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalkConfig {
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    ["js", "mjs", "cjs", "jsx"].iter().map(|s| s.to_string()).collect()
}

impl AnalysisConfig {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            allow_syntax_errors: self.allow_syntax_errors,
        }
    }

    pub fn top_level_options(&self) -> TopLevelOptions {
        TopLevelOptions {
            jslint_global_comment: self.jslint_global_comment,
        }
    }

    pub fn known_globals(&self) -> KnownGlobals {
        KnownGlobals::default().with_extra(self.known_globals.iter().cloned())
    }
}

impl WalkConfig {
    /// Whether a file path carries one of the configured extensions
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.trim_start_matches('.') == ext))
            .unwrap_or(false)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("lexscope.toml")
}

pub fn load_config(path: Option<&Path>) -> Result<Option<LexscopeConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: LexscopeConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &LexscopeConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_none() {
        let dir = TempDir::new().unwrap();
        let loaded = load_config(Some(&dir.path().join("lexscope.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_write_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lexscope.toml");

        let mut config = LexscopeConfig::default();
        config.analysis.known_globals = vec!["jQuery".to_string()];
        config.walk.exclude = vec!["fixtures/".to_string()];
        write_config(&path, &config, false).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded, config);
        assert!(loaded.analysis.known_globals().contains("jQuery"));
        assert!(loaded.analysis.known_globals().contains("Object"));
    }

    #[test]
    fn test_write_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lexscope.toml");
        write_config(&path, &LexscopeConfig::default(), false).unwrap();

        let err = write_config(&path, &LexscopeConfig::default(), false).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(write_config(&path, &LexscopeConfig::default(), true).is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lexscope.toml");
        std::fs::write(&path, "[analysis]\njslint_global_comment = true\n").unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert!(loaded.analysis.top_level_options().jslint_global_comment);
        assert!(!loaded.analysis.parse_options().allow_syntax_errors);
        assert_eq!(loaded.walk.extensions, vec!["js", "mjs", "cjs", "jsx"]);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lexscope.toml");
        std::fs::write(&path, "[analysis\n").unwrap();
        assert!(matches!(load_config(Some(&path)), Err(Error::Config(_))));
    }

    #[test]
    fn test_walk_extensions() {
        let walk = WalkConfig::default();
        assert!(walk.accepts(Path::new("src/app.mjs")));
        assert!(walk.accepts(Path::new("src/App.jsx")));
        assert!(!walk.accepts(Path::new("README.md")));
        assert!(!walk.accepts(Path::new("Makefile")));
    }
}
