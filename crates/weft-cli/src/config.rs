//! Configuration file loading
//!
//! Search order: explicit `--config` path, then `./weft.toml`, then defaults.
//! Command-line flags override whatever the file sets.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use weft::PipelineConfig;
use weft_ast::Platform;
use weft_graph::LinkerConfig;
use weft_lexer::{LexerConfig, DEFAULT_SENTINEL};

pub const LOCAL_CONFIG: &str = "weft.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Unknown platform '{0}'. Expected one of OSX, macOS, iOS, watchOS, tvOS")]
    InvalidPlatform(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeftConfig {
    pub platform: Option<Platform>,
    pub project: Option<String>,
    pub sentinel: Option<String>,
    pub inputs: Vec<PathBuf>,
}

impl WeftConfig {
    /// Apply command-line overrides
    pub fn with_overrides(mut self, platform: Option<&str>, project: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(name) = platform {
            let platform = Platform::from_name(name).ok_or_else(|| ConfigError::InvalidPlatform(name.to_string()))?;
            self.platform = Some(platform);
        }
        if let Some(project) = project {
            self.project = Some(project.to_string());
        }
        Ok(self)
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            lexer: LexerConfig {
                sentinel: self.sentinel.clone().unwrap_or_else(|| DEFAULT_SENTINEL.to_string()),
            },
            linker: LinkerConfig::new(self.platform, self.project.clone()),
        }
    }
}

pub fn load_config(explicit_path: Option<&Path>) -> Result<WeftConfig, ConfigError> {
    if let Some(path) = explicit_path {
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local = Path::new(LOCAL_CONFIG);
    if local.exists() {
        info!(path = local.display().to_string(); "Loading configuration from local path");
        return load_config_file(local);
    }

    debug!("No configuration file found, using default configuration");
    Ok(WeftConfig::default())
}

fn load_config_file(path: &Path) -> Result<WeftConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

fn parse_config(content: &str) -> Result<WeftConfig, String> {
    toml::from_str(content).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
platform = "iOS"
project = "App"
sentinel = "inject"
inputs = ["Sources/App.swift"]
"#,
        )
        .unwrap();
        assert_eq!(config.platform, Some(Platform::IOS));
        assert_eq!(config.project.as_deref(), Some("App"));
        assert_eq!(config.pipeline().lexer.sentinel, "inject");
        assert_eq!(config.inputs, vec![PathBuf::from("Sources/App.swift")]);
    }

    #[test]
    fn test_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, WeftConfig::default());
        assert_eq!(config.pipeline().lexer.sentinel, DEFAULT_SENTINEL);
        assert_eq!(config.pipeline().linker, LinkerConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(parse_config("platfrom = \"iOS\"").is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let config = parse_config("platform = \"iOS\"\nproject = \"App\"")
            .unwrap()
            .with_overrides(Some("tvOS"), None)
            .unwrap();
        assert_eq!(config.platform, Some(Platform::TvOS));
        assert_eq!(config.project.as_deref(), Some("App"));

        assert!(matches!(
            WeftConfig::default().with_overrides(Some("android"), None),
            Err(ConfigError::InvalidPlatform(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file() {
        let error = load_config(Some(Path::new("does/not/exist.toml"))).unwrap_err();
        assert!(matches!(error, ConfigError::MissingFile(_)));
    }
}
