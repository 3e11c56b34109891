//! Invocation mode and the policy each mode implies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::options::DevOptions;

/// Build mode passed by the invoking command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Iterative local development
    Development,
    /// Deployable output
    #[default]
    Production,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }

    /// Diagnostic and server policy for this mode.
    ///
    /// | Mode        | Source maps | Dev server       |
    /// |-------------|-------------|------------------|
    /// | development | inline      | enabled, `port`  |
    /// | production  | external    | disabled         |
    pub fn policy(self, dev: &DevOptions) -> ModePolicy {
        match self {
            Mode::Development => ModePolicy {
                source_maps: SourceMapMode::Inline,
                dev_server: Some(DevServerPolicy {
                    host: dev.host.clone(),
                    port: dev.port,
                }),
            },
            Mode::Production => ModePolicy {
                source_maps: SourceMapMode::External,
                dev_server: None,
            },
        }
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Mode::Development),
            "production" | "prod" => Ok(Mode::Production),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How source maps are attached to emitted bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMapMode {
    /// Full map embedded in the bundle as a base64 data URL
    Inline,
    /// Separate `.map` file referenced by a `sourceMappingURL` comment
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevServerPolicy {
    pub host: String,
    pub port: u16,
}

/// Mode-dependent settings resolved once per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModePolicy {
    pub source_maps: SourceMapMode,
    pub dev_server: Option<DevServerPolicy>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_names() {
        assert_eq!("development".parse::<Mode>().unwrap(), Mode::Development);
        assert_eq!("DEV".parse::<Mode>().unwrap(), Mode::Development);
        assert_eq!(" production ".parse::<Mode>().unwrap(), Mode::Production);
        assert_eq!("prod".parse::<Mode>().unwrap(), Mode::Production);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = "staging".parse::<Mode>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownMode(ref m) if m == "staging"));
    }

    #[test]
    fn development_policy_inlines_maps_and_serves() {
        let dev = DevOptions::default();
        let policy = Mode::Development.policy(&dev);
        assert_eq!(policy.source_maps, SourceMapMode::Inline);
        let server = policy.dev_server.expect("server enabled in development");
        assert_eq!(server.port, 80);
    }

    #[test]
    fn production_policy_externalizes_maps_without_server() {
        let policy = Mode::Production.policy(&DevOptions::default());
        assert_eq!(policy.source_maps, SourceMapMode::External);
        assert!(policy.dev_server.is_none());
    }

    #[test]
    fn default_mode_is_production() {
        assert_eq!(Mode::default(), Mode::Production);
    }
}
