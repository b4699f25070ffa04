//! Adapter configuration.

use std::path::PathBuf;

use crate::spawner::BootstrapCommand;

/// Executable spawned when nothing else is configured.
pub const DEFAULT_BOOTSTRAP: &str = "./bootstrap";

pub const ENV_BOOTSTRAP: &str = "RELAY_BOOTSTRAP";
pub const ENV_WORKDIR: &str = "RELAY_WORKDIR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("bootstrap executable path is empty")]
    EmptyBootstrap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub bootstrap: PathBuf,
    pub working_dir: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bootstrap: PathBuf::from(DEFAULT_BOOTSTRAP),
            working_dir: None,
        }
    }
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bootstrap(mut self, path: impl Into<PathBuf>) -> Self {
        self.bootstrap = path.into();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Load from `RELAY_BOOTSTRAP` / `RELAY_WORKDIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Self::default();
        if let Some(path) = get(ENV_BOOTSTRAP) {
            config.bootstrap = PathBuf::from(path);
        }
        if let Some(dir) = get(ENV_WORKDIR) {
            config.working_dir = Some(PathBuf::from(dir));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bootstrap.as_os_str().is_empty() {
            return Err(ConfigError::EmptyBootstrap);
        }
        Ok(())
    }

    /// Build the command for one invocation.
    pub fn command(&self, payload: impl Into<String>) -> BootstrapCommand {
        let command = BootstrapCommand::new(&self.bootstrap, payload);
        match self.working_dir {
            Some(ref dir) => command.with_working_dir(dir),
            None => command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_local_bootstrap() {
        let config = RelayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bootstrap, PathBuf::from("./bootstrap"));
        assert_eq!(config.working_dir, None);
        assert_eq!(config, RelayConfig::new());
    }

    #[test]
    fn env_overrides() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("RELAY_BOOTSTRAP", "/opt/app/server"),
            ("RELAY_WORKDIR", "/var/task"),
        ]))
        .unwrap();
        assert_eq!(config.bootstrap, PathBuf::from("/opt/app/server"));
        assert_eq!(config.working_dir, Some(PathBuf::from("/var/task")));
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("RELAY_BOOTSTRAP", "  "),
            ("RELAY_WORKDIR", ""),
        ]))
        .unwrap();
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn empty_bootstrap_is_rejected() {
        let err = RelayConfig::new().with_bootstrap("").validate().unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"bootstrap executable path is empty");
    }

    #[test]
    fn command_carries_payload_and_dir() {
        let config = RelayConfig::new()
            .with_bootstrap("./bin/handler")
            .with_working_dir("/srv");
        let command = config.command(r#"{"a":1}"#);

        assert_eq!(command.program, PathBuf::from("./bin/handler"));
        assert_eq!(command.payload, r#"{"a":1}"#);
        assert_eq!(command.working_dir, Some(PathBuf::from("/srv")));
    }
}
