//! Configuration loading and defaults for `revshell`, plus the error type
//! shared with `redirect.toml` loading.
//!
//! Configuration is resolved in order of precedence (highest wins):
//!
//! 1. **Command-line flags** - `--host`, `--port` (applied by the binary)
//! 2. **Environment variables** - `REVSHELL_HOST`, `REVSHELL_PORT`
//! 3. **Config file** - path via `--config <path>`, or `revshell.toml` in CWD
//! 4. **Compiled defaults** - see each field's default value below
//!
//! ```toml
//! [target]
//! host = "127.0.0.1"
//! port = 8084
//! greeting = "New connection\n"
//!
//! [shell]
//! program = "/bin/sh"
//! args = ["-i"]
//! # working_dir = "/"          # default: inherit the current directory
//! rows = 24
//! cols = 80
//!
//! [logging]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Config file looked up in the current directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "revshell.toml";

/// Errors raised while loading any configuration source.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        source: toml::de::Error,
    },
    #[error("entry `{entry}` is missing required field `{field}`")]
    MissingField { entry: String, field: &'static str },
    #[error("entry `{entry}` has an unusable path: {reason}")]
    InvalidPath { entry: String, reason: &'static str },
    #[error("environment variable {var} has invalid value `{value}`")]
    InvalidEnv { var: &'static str, value: String },
}

/// Top-level `revshell` configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote endpoint the shell is relayed to.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Host name or address to connect to (default `127.0.0.1`).
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port (default 8084).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Sent once right after the connection is established.
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

/// Shell launched on the PTY slave.
#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    /// Shell binary (default `/bin/sh`).
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments passed to the shell (default `["-i"]`).
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Working directory. Inherited from `revshell` when unset.
    pub working_dir: Option<String>,
    #[serde(default = "default_rows")]
    pub rows: u16,
    #[serde(default = "default_cols")]
    pub cols: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter level (default `info`). Overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8084
}
fn default_greeting() -> String {
    "New connection\n".to_string()
}
fn default_program() -> String {
    "/bin/sh".to_string()
}
fn default_args() -> Vec<String> {
    vec!["-i".to_string()]
}
fn default_rows() -> u16 {
    24
}
fn default_cols() -> u16 {
    80
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            greeting: default_greeting(),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            working_dir: None,
            rows: default_rows(),
            cols: default_cols(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration with the precedence chain: env vars > file > defaults.
    ///
    /// If `path` is `Some`, that file must exist. Otherwise `revshell.toml` in
    /// the current directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Parse a TOML document. `origin` names the source in error messages.
    pub fn from_toml(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, &path.display().to_string())
    }

    /// Apply `REVSHELL_*` overrides looked up through `lookup`.
    fn apply_env(
        &mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("REVSHELL_HOST") {
            self.target.host = host;
        }
        if let Some(port) = lookup("REVSHELL_PORT") {
            self.target.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "REVSHELL_PORT",
                value: port,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.target.host, "127.0.0.1");
        assert_eq!(config.target.port, 8084);
        assert_eq!(config.target.greeting, "New connection\n");
        assert_eq!(config.shell.program, "/bin/sh");
        assert_eq!(config.shell.args, vec!["-i".to_string()]);
        assert!(config.shell.working_dir.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml("[target]\nhost = \"relay.lan\"\n", "test").unwrap();
        assert_eq!(config.target.host, "relay.lan");
        assert_eq!(config.target.port, 8084);
        assert_eq!(config.shell.rows, 24);
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = Config::from_toml("[target]\nport = \"high\"\n", "bad.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(|var| match var {
                "REVSHELL_HOST" => Some("10.0.0.2".to_string()),
                "REVSHELL_PORT" => Some("9001".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.target.host, "10.0.0.2");
        assert_eq!(config.target.port, 9001);
    }

    #[test]
    fn test_env_invalid_port() {
        let mut config = Config::default();
        let err = config
            .apply_env(|var| (var == "REVSHELL_PORT").then(|| "70000".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                var: "REVSHELL_PORT",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/revshell.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
