use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;
use serde::Deserialize;

use crate::backend::HeadlessConfig;
use crate::dispatch::Policy;
use crate::error::{Error, Result};

/// Runner settings, read from a TOML file.
///
/// ```toml
/// script = "main.lua"
/// log_level = "debug"
///
/// [dispatch]
/// unknown_write = "raise"
/// name_collision = "shadow"
///
/// [headless]
/// max_frames = 600
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub script: PathBuf,
    pub log_level: Option<String>,
    pub dispatch: Policy,
    pub headless: HeadlessConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            script: PathBuf::from("init.lua"),
            log_level: None,
            dispatch: Policy::default(),
            headless: HeadlessConfig::default(),
        }
    }
}

impl Config {
    /// Read `path`. A missing file gives the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => content.parse(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{NameCollision, UnknownWrite};

    #[test]
    fn empty_file_is_default() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config.script, PathBuf::from("init.lua"));
        assert_eq!(config.dispatch, Policy::default());
        assert_eq!(config.headless.max_frames, None);
    }

    #[test]
    fn sections_override_defaults() {
        let config: Config = r#"
            script = "game.lua"

            [dispatch]
            unknown_write = "raise"
            name_collision = "shadow"

            [headless]
            max_frames = 3
        "#
        .parse()
        .unwrap();
        assert_eq!(config.script, PathBuf::from("game.lua"));
        assert_eq!(config.dispatch.unknown_write, UnknownWrite::Raise);
        assert_eq!(config.dispatch.name_collision, NameCollision::Shadow);
        assert_eq!(config.headless.max_frames, Some(3));
        assert_eq!(config.headless.width, 800);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = "scripts = 1".parse::<Config>().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("raylua.toml")).unwrap();
        assert_eq!(config.script, PathBuf::from("init.lua"));
    }
}
